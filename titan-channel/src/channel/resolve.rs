//! Turns checked parameters into the four channel addresses.
//!
//! ```text
//!                 remote data   local data    remote control   local control
//! multicast       group         group         group + 1        interface
//! explicit ctrl   endpoint      control       endpoint         control
//! unicast         endpoint      interface     endpoint         interface
//! ```
//!
//! A missing endpoint is the wildcard of the channel's family.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use super::ChannelConfig;
use super::error::ChannelError;
use crate::net::address::HostPort;
use crate::net::interface::{InterfaceSpec, resolve_interface};
use crate::net::{AddressFamily, Endpoint, InterfaceSource, NameResolver, ResolvedInterface};
use crate::trace::trace;
use crate::uri::params::{CONTROL, CONTROL_MODE, ENDPOINT, INTERFACE};
use crate::uri::{ChannelParams, ControlMode};

/// Unicast or multicast delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Addressing {
    Unicast,
    /// The endpoint is a multicast group; `ttl` bounds how far it travels.
    Multicast { ttl: u8 },
}

/// The resolved addresses of a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub remote_data: Endpoint,
    pub local_data: Endpoint,
    pub remote_control: Endpoint,
    pub local_control: Endpoint,
    /// Local interface used for binding and multicast membership.
    pub interface: ResolvedInterface,
    pub addressing: Addressing,
    pub has_explicit_control: bool,
}

impl Resolution {
    /// A URI that only refers to a tagged channel defines no addresses of
    /// its own; everything is the IPv4 wildcard.
    #[must_use]
    pub const fn tag_reference() -> Self {
        let any = Endpoint::wildcard(AddressFamily::Ipv4);
        Self {
            remote_data: any,
            local_data: any,
            remote_control: any,
            local_control: any,
            interface: ResolvedInterface::wildcard(AddressFamily::Ipv4, 0),
            addressing: Addressing::Unicast,
            has_explicit_control: false,
        }
    }
}

/// Resolves the endpoint, control and interface parameters.
///
/// # Errors
///
/// Returns an error if any address is malformed or cannot be resolved, or if
/// a multicast endpoint is combined with control parameters.
pub fn resolve<N, I>(
    params: &ChannelParams<'_>,
    config: &ChannelConfig,
    names: &N,
    interfaces: &I,
) -> Result<Resolution, ChannelError>
where
    N: NameResolver + ?Sized,
    I: InterfaceSource + ?Sized,
{
    let endpoint = params
        .endpoint
        .map(|text| resolve_host(ENDPOINT, text, names))
        .transpose()?;
    let control = params
        .control
        .map(|text| resolve_host(CONTROL, text, names))
        .transpose()?;

    let family = endpoint
        .or(control)
        .map_or(AddressFamily::Ipv4, |ep| ep.family());
    let remote = endpoint.unwrap_or(Endpoint::wildcard(family));

    if remote.is_multicast() {
        if params.control.is_some() {
            return Err(ChannelError::ConflictingParameters {
                first: ENDPOINT,
                second: CONTROL,
            });
        }
        if params.control_mode != ControlMode::None {
            return Err(ChannelError::ConflictingParameters {
                first: ENDPOINT,
                second: CONTROL_MODE,
            });
        }

        let remote_control =
            multicast_control_address(remote).ok_or_else(|| ChannelError::InvalidParameterValue {
                key: ENDPOINT,
                value: params.endpoint.unwrap_or_default().to_string(),
                reason: "multicast data address must be odd".to_string(),
            })?;
        let interface = resolve_local(params.interface, family, true, names, interfaces)?;
        let ttl = params.ttl.unwrap_or(config.default_multicast_ttl);

        trace!(
            group = %remote,
            control = %remote_control,
            interface = %interface.endpoint,
            ttl,
            "multicast channel"
        );
        return Ok(Resolution {
            remote_data: remote,
            local_data: remote,
            remote_control,
            local_control: interface.endpoint,
            interface,
            addressing: Addressing::Multicast { ttl },
            has_explicit_control: false,
        });
    }

    if let Some(control) = control {
        if control.family() != family {
            return Err(ChannelError::ConflictingParameters {
                first: ENDPOINT,
                second: CONTROL,
            });
        }
        trace!(remote = %remote, control = %control, "explicit control channel");
        return Ok(Resolution {
            remote_data: remote,
            local_data: control,
            remote_control: remote,
            local_control: control,
            interface: ResolvedInterface {
                endpoint: control,
                index: None,
            },
            addressing: Addressing::Unicast,
            has_explicit_control: true,
        });
    }

    let interface = resolve_local(params.interface, family, false, names, interfaces)?;
    trace!(remote = %remote, interface = %interface.endpoint, "unicast channel");
    Ok(Resolution {
        remote_data: remote,
        local_data: interface.endpoint,
        remote_control: remote,
        local_control: interface.endpoint,
        interface,
        addressing: Addressing::Unicast,
        has_explicit_control: false,
    })
}

/// The control group paired with a multicast data group: the data address
/// plus one. The data address's last byte must be odd.
#[must_use]
pub fn multicast_control_address(data: Endpoint) -> Option<Endpoint> {
    let ip = match data.ip() {
        IpAddr::V4(v4) => {
            let mut octets = v4.octets();
            octets[3] = odd_successor(octets[3])?;
            IpAddr::from(octets)
        }
        IpAddr::V6(v6) => {
            let mut octets = v6.octets();
            octets[15] = odd_successor(octets[15])?;
            IpAddr::from(octets)
        }
    };
    Some(Endpoint::new(ip, data.port()))
}

const fn odd_successor(byte: u8) -> Option<u8> {
    if byte & 1 == 0 {
        None
    } else {
        Some(byte.wrapping_add(1))
    }
}

fn resolve_host<N: NameResolver + ?Sized>(
    key: &'static str,
    text: &str,
    names: &N,
) -> Result<Endpoint, ChannelError> {
    HostPort::parse(text)
        .and_then(|hp| hp.resolve(names, None))
        .map_err(|e| ChannelError::address(key, text, &e))
}

fn resolve_local<N, I>(
    text: Option<&str>,
    family: AddressFamily,
    multicast: bool,
    names: &N,
    interfaces: &I,
) -> Result<ResolvedInterface, ChannelError>
where
    N: NameResolver + ?Sized,
    I: InterfaceSource + ?Sized,
{
    let Some(text) = text else {
        return Ok(ResolvedInterface::wildcard(family, 0));
    };
    InterfaceSpec::parse(text)
        .and_then(|spec| resolve_interface(&spec, family, multicast, names, interfaces))
        .map_err(|e| ChannelError::interface(INTERFACE, text, &e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ep(text: &str) -> Endpoint {
        Endpoint::from(text.parse::<std::net::SocketAddr>().unwrap())
    }

    #[test]
    fn control_address_is_data_plus_one() {
        assert_eq!(
            multicast_control_address(ep("224.0.1.1:40001")),
            Some(ep("224.0.1.2:40001"))
        );
        assert_eq!(
            multicast_control_address(ep("[ff02::3]:40001")),
            Some(ep("[ff02::4]:40001"))
        );
        assert_eq!(
            multicast_control_address(ep("239.255.255.255:1")),
            Some(ep("239.255.255.0:1"))
        );
    }

    #[test]
    fn even_data_group_has_no_control_address() {
        assert_eq!(multicast_control_address(ep("224.0.1.2:40001")), None);
        assert_eq!(multicast_control_address(ep("[ff02::2]:1")), None);
    }

    #[test]
    fn tag_reference_is_wildcard() {
        let r = Resolution::tag_reference();
        assert!(r.remote_data.is_wildcard_addr() && r.remote_data.is_wildcard_port());
        assert!(r.local_data.is_wildcard_addr() && r.local_data.is_wildcard_port());
        assert_eq!(r.interface.index, None);
    }
}
