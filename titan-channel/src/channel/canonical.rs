//! Canonical channel form.
//!
//! The canonical form is the identity of a channel inside the driver: two
//! requests share a transport resource exactly when their canonical forms are
//! equal. It is built only from resolved values, so parameter order, host
//! names, leading zeros, IPv6 case and ignored keys never leak into it.
//!
//! ```text
//! UDP-<remote data>-<local data>-<remote control>-<local control>[-ttl=<n>]-<mode>
//! UDP-224.0.1.1:40001-224.0.1.1:40001-224.0.1.2:40001-0.0.0.0:0-ttl=1-none
//! UDP-[::1]:40001-[::]:0-[::1]:40001-[::]:0-none
//! ```
//!
//! `-` cannot occur inside a rendered socket address, so fields never run
//! into each other.
//!
//! A URI that only names a tag gets `UDP-tag=<id>` instead. `tag=` never
//! starts a rendered address, so tag references cannot collide with
//! address-based channels, nor with references to other tags.

use super::resolve::{Addressing, Resolution};
use crate::uri::{ChannelTag, ControlMode};

/// Leading token of every UDP canonical form.
pub const CANONICAL_MEDIA: &str = "UDP";

/// Separator between canonical fields.
pub const FIELD_SEPARATOR: char = '-';

/// Builds the canonical form of a resolved channel.
#[must_use]
pub fn canonical_form(resolution: &Resolution, control_mode: ControlMode) -> String {
    const S: char = FIELD_SEPARATOR;

    let mut out = format!(
        "{CANONICAL_MEDIA}{S}{}{S}{}{S}{}{S}{}",
        resolution.remote_data,
        resolution.local_data,
        resolution.remote_control,
        resolution.local_control,
    );
    if let Addressing::Multicast { ttl } = resolution.addressing {
        out.push(S);
        out.push_str(&format!("ttl={ttl}"));
    }
    out.push(S);
    out.push_str(control_mode.as_str());
    out
}

/// Builds the canonical form of a tag-only reference.
#[must_use]
pub fn tag_reference_form(tag: ChannelTag) -> String {
    format!("{CANONICAL_MEDIA}{FIELD_SEPARATOR}tag={tag}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{AddressFamily, Endpoint, ResolvedInterface};

    fn ep(text: &str) -> Endpoint {
        Endpoint::from(text.parse::<std::net::SocketAddr>().unwrap())
    }

    fn unicast(remote: &str, local: &str) -> Resolution {
        Resolution {
            remote_data: ep(remote),
            local_data: ep(local),
            remote_control: ep(remote),
            local_control: ep(local),
            interface: ResolvedInterface::wildcard(AddressFamily::Ipv4, 0),
            addressing: Addressing::Unicast,
            has_explicit_control: false,
        }
    }

    #[test]
    fn unicast_layout() {
        let r = unicast("192.168.1.1:40001", "0.0.0.0:0");
        assert_eq!(
            canonical_form(&r, ControlMode::None),
            "UDP-192.168.1.1:40001-0.0.0.0:0-192.168.1.1:40001-0.0.0.0:0-none"
        );
        assert_eq!(
            canonical_form(&r, ControlMode::Manual),
            "UDP-192.168.1.1:40001-0.0.0.0:0-192.168.1.1:40001-0.0.0.0:0-manual"
        );
    }

    #[test]
    fn multicast_includes_ttl() {
        let r = Resolution {
            remote_data: ep("224.0.1.1:40001"),
            local_data: ep("224.0.1.1:40001"),
            remote_control: ep("224.0.1.2:40001"),
            local_control: ep("0.0.0.0:0"),
            interface: ResolvedInterface::wildcard(AddressFamily::Ipv4, 0),
            addressing: Addressing::Multicast { ttl: 16 },
            has_explicit_control: false,
        };
        assert_eq!(
            canonical_form(&r, ControlMode::None),
            "UDP-224.0.1.1:40001-224.0.1.1:40001-224.0.1.2:40001-0.0.0.0:0-ttl=16-none"
        );
    }

    #[test]
    fn tag_reference_keys_carry_the_tag() {
        let five = tag_reference_form(ChannelTag::try_from(5).unwrap());
        let six = tag_reference_form(ChannelTag::try_from(6).unwrap());
        assert_eq!(five, "UDP-tag=5");
        assert_ne!(five, six);

        let wildcard = canonical_form(&Resolution::tag_reference(), ControlMode::None);
        assert_ne!(five, wildcard);
    }

    #[test]
    fn ipv6_is_bracketed_and_compressed() {
        let r = unicast("[2001:db8:0:0:0:0:0:1]:40001", "[::]:0");
        assert_eq!(
            canonical_form(&r, ControlMode::None),
            "UDP-[2001:db8::1]:40001-[::]:0-[2001:db8::1]:40001-[::]:0-none"
        );
    }
}
