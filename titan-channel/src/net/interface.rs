//! Local network interface lookup.
//!
//! An `interface` channel parameter names the local address the driver binds
//! for outbound traffic and joins multicast groups on. It may be written as:
//!
//! ```text
//! 192.168.1.5            a local address
//! 192.168.1.0/24         any local address inside a subnet
//! 192.168.1.5:40002      a local address with a fixed source port
//! eth0                   an interface name
//! 0.0.0.0                the wildcard; no lookup is done
//! ```
//!
//! Searching picks, among the interfaces that are up, of the right family and
//! inside the searched subnet, the one with the longest own prefix. Ties go
//! to the first interface in enumeration order.

use std::ffi::CStr;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use thiserror::Error;

use super::address::{AddressError, Host, HostPort, NameResolver, resolve_name};
use super::{AddressFamily, Endpoint};
use crate::trace::trace;

/// Errors resolving an `interface` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterfaceError {
    /// The `host[:port]` part is malformed or its name did not resolve.
    #[error(transparent)]
    Address(#[from] AddressError),
    /// The `/prefix` suffix is not a valid prefix length for the family.
    #[error("invalid subnet prefix `{0}`")]
    InvalidPrefix(String),
    /// The interface address is of a different family than the channel.
    #[error("interface `{spec}` is not an {family} address")]
    FamilyMismatch { spec: String, family: AddressFamily },
    /// No local interface satisfies the specification.
    #[error("no local interface matches `{0}`")]
    NoMatch(String),
    /// The operating system refused to list interfaces.
    #[error("could not enumerate interfaces: {0}")]
    Enumerate(String),
}

impl InterfaceError {
    /// True for lookup failures, false for malformed specifications.
    #[must_use]
    pub const fn is_resolution(&self) -> bool {
        match self {
            Self::Address(e) => e.is_resolution(),
            Self::InvalidPrefix(_) => false,
            Self::FamilyMismatch { .. } | Self::NoMatch(_) | Self::Enumerate(_) => true,
        }
    }
}

/// One address assigned to a local interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    /// Interface name, e.g. `eth0`.
    pub name: String,
    /// Kernel interface index (`0` if unknown).
    pub index: u32,
    /// The assigned address.
    pub addr: IpAddr,
    /// Prefix length of the address's subnet.
    pub prefix_len: u8,
    pub is_up: bool,
    pub is_loopback: bool,
    pub supports_multicast: bool,
}

/// Source of local interface information.
pub trait InterfaceSource {
    /// Lists every address on every local interface.
    ///
    /// # Errors
    ///
    /// Returns an error if the interfaces cannot be enumerated.
    fn interfaces(&self) -> io::Result<Vec<NetworkInterface>>;
}

/// Reads interfaces from the operating system via `getifaddrs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn interfaces(&self) -> io::Result<Vec<NetworkInterface>> {
        let mut head: *mut libc::ifaddrs = std::ptr::null_mut();
        // SAFETY: on success `head` owns a list that is released below with
        // freeifaddrs and not touched afterwards.
        if unsafe { libc::getifaddrs(&raw mut head) } != 0 {
            return Err(io::Error::last_os_error());
        }

        let mut out = Vec::new();
        let mut cursor = head;
        while !cursor.is_null() {
            // SAFETY: cursor is a non-null node of the list returned above.
            let entry = unsafe { &*cursor };
            cursor = entry.ifa_next;

            // SAFETY: ifa_addr is null or points at a sockaddr of its family.
            let Some(addr) = (unsafe { sockaddr_ip(entry.ifa_addr) }) else {
                continue;
            };
            let family = AddressFamily::of(&addr);
            // SAFETY: as above, for the netmask.
            let prefix_len = unsafe { sockaddr_ip(entry.ifa_netmask) }
                .filter(|mask| AddressFamily::of(mask) == family)
                .map_or(family.bits(), mask_prefix_len);
            // SAFETY: ifa_name is a valid NUL-terminated string for the list's life.
            let name = unsafe { CStr::from_ptr(entry.ifa_name) };
            // SAFETY: same string, passed back to libc unchanged.
            let index = unsafe { libc::if_nametoindex(entry.ifa_name) };
            let flags = entry.ifa_flags;

            out.push(NetworkInterface {
                name: name.to_string_lossy().into_owned(),
                index,
                addr,
                prefix_len,
                is_up: flags & (libc::IFF_UP as libc::c_uint) != 0,
                is_loopback: flags & (libc::IFF_LOOPBACK as libc::c_uint) != 0,
                supports_multicast: flags & (libc::IFF_MULTICAST as libc::c_uint) != 0,
            });
        }

        // SAFETY: head came from getifaddrs and is freed exactly once.
        unsafe { libc::freeifaddrs(head) };
        Ok(out)
    }
}

/// Fixed interface table, for tests and for drivers pinned to known NICs.
#[derive(Debug, Clone, Default)]
pub struct StaticInterfaces(pub Vec<NetworkInterface>);

impl InterfaceSource for StaticInterfaces {
    fn interfaces(&self) -> io::Result<Vec<NetworkInterface>> {
        Ok(self.0.clone())
    }
}

/// Reads the IP address out of a `sockaddr`, if it is IPv4 or IPv6.
///
/// # Safety
///
/// `sa` must be null or point to a valid `sockaddr` whose real size matches
/// its `sa_family`.
unsafe fn sockaddr_ip(sa: *const libc::sockaddr) -> Option<IpAddr> {
    if sa.is_null() {
        return None;
    }
    // SAFETY: caller guarantees `sa` is valid; the casts follow sa_family.
    unsafe {
        match i32::from((*sa).sa_family) {
            libc::AF_INET => {
                let sin = &*sa.cast::<libc::sockaddr_in>();
                Some(IpAddr::V4(Ipv4Addr::from(u32::from_be(
                    sin.sin_addr.s_addr,
                ))))
            }
            libc::AF_INET6 => {
                let sin6 = &*sa.cast::<libc::sockaddr_in6>();
                Some(IpAddr::V6(Ipv6Addr::from(sin6.sin6_addr.s6_addr)))
            }
            _ => None,
        }
    }
}

/// Number of leading one bits in a netmask.
fn mask_prefix_len(mask: IpAddr) -> u8 {
    let ones = match mask {
        IpAddr::V4(v4) => u32::from(v4).leading_ones(),
        IpAddr::V6(v6) => u128::from(v6).leading_ones(),
    };
    // At most 128, always fits.
    ones as u8
}

/// An address and prefix length to match local interfaces against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceSearch {
    addr: IpAddr,
    prefix_len: u8,
}

impl InterfaceSearch {
    /// Creates a search. `prefix_len` is clamped to the family width.
    #[must_use]
    pub fn new(addr: IpAddr, prefix_len: u8) -> Self {
        let bits = AddressFamily::of(&addr).bits();
        Self {
            addr,
            prefix_len: prefix_len.min(bits),
        }
    }

    /// Search address.
    #[must_use]
    pub const fn addr(&self) -> IpAddr {
        self.addr
    }

    /// Subnet prefix length.
    #[must_use]
    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// True if `candidate` is in the searched subnet.
    #[must_use]
    pub fn matches(&self, candidate: &IpAddr) -> bool {
        match (self.addr, candidate) {
            (IpAddr::V4(want), IpAddr::V4(have)) => {
                let mask = prefix_mask_u32(self.prefix_len);
                u32::from(want) & mask == u32::from(*have) & mask
            }
            (IpAddr::V6(want), IpAddr::V6(have)) => {
                let mask = prefix_mask_u128(self.prefix_len);
                u128::from(want) & mask == u128::from(*have) & mask
            }
            _ => false,
        }
    }
}

fn prefix_mask_u32(len: u8) -> u32 {
    u32::MAX.checked_shl(32 - u32::from(len)).unwrap_or(0)
}

fn prefix_mask_u128(len: u8) -> u128 {
    u128::MAX.checked_shl(128 - u32::from(len)).unwrap_or(0)
}

/// A parsed `interface` parameter: `host-or-name[:port][/prefix]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceSpec {
    text: String,
    host_port: HostPort,
    prefix_len: Option<u8>,
}

impl InterfaceSpec {
    /// Parses an interface specification.
    ///
    /// # Errors
    ///
    /// Returns an error if the address part or the prefix is malformed.
    pub fn parse(text: &str) -> Result<Self, InterfaceError> {
        let (address, prefix_len) = match text.rsplit_once('/') {
            Some((address, prefix)) => {
                if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(InterfaceError::InvalidPrefix(prefix.to_string()));
                }
                let len: u8 = prefix
                    .parse()
                    .map_err(|_| InterfaceError::InvalidPrefix(prefix.to_string()))?;
                (address, Some(len))
            }
            None => (text, None),
        };

        let host_port = HostPort::parse(address)?;
        if let (Host::Literal(ip), Some(len)) = (host_port.host(), prefix_len)
            && len > AddressFamily::of(ip).bits()
        {
            return Err(InterfaceError::InvalidPrefix(len.to_string()));
        }

        Ok(Self {
            text: text.to_string(),
            host_port,
            prefix_len,
        })
    }

    /// The specification as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Where an interface specification landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInterface {
    /// Local address and port to bind.
    pub endpoint: Endpoint,
    /// Kernel index of the chosen interface; `None` for the wildcard.
    pub index: Option<u32>,
}

impl ResolvedInterface {
    /// The wildcard interface of `family`, on `port`.
    #[must_use]
    pub const fn wildcard(family: AddressFamily, port: u16) -> Self {
        Self {
            endpoint: Endpoint::new(family.wildcard_addr(), port),
            index: None,
        }
    }

    fn from_interface(iface: &NetworkInterface, port: u16) -> Self {
        Self {
            endpoint: Endpoint::new(iface.addr, port),
            index: (iface.index != 0).then_some(iface.index),
        }
    }
}

/// Resolves an interface specification for a channel of `family`.
///
/// With `multicast` set only multicast-capable interfaces qualify.
///
/// # Errors
///
/// Returns an error if the specification names no usable local interface.
pub fn resolve_interface<N, I>(
    spec: &InterfaceSpec,
    family: AddressFamily,
    multicast: bool,
    names: &N,
    source: &I,
) -> Result<ResolvedInterface, InterfaceError>
where
    N: NameResolver + ?Sized,
    I: InterfaceSource + ?Sized,
{
    let port = spec.host_port.port();
    let mismatch = || InterfaceError::FamilyMismatch {
        spec: spec.text.clone(),
        family,
    };

    let search_addr = match spec.host_port.host() {
        Host::Omitted if spec.prefix_len.is_none() => {
            return Ok(ResolvedInterface::wildcard(family, port));
        }
        Host::Omitted => family.wildcard_addr(),
        Host::Literal(ip) if AddressFamily::of(ip) != family => return Err(mismatch()),
        Host::Literal(ip) if ip.is_unspecified() && spec.prefix_len.is_none() => {
            return Ok(ResolvedInterface::wildcard(family, port));
        }
        Host::Literal(ip) => *ip,
        Host::Name(name) => {
            let interfaces = enumerate(source)?;
            let named: Vec<&NetworkInterface> =
                interfaces.iter().filter(|i| &i.name == name).collect();
            if !named.is_empty() {
                if let Some(len) = spec.prefix_len {
                    return Err(InterfaceError::InvalidPrefix(len.to_string()));
                }
                let chosen = match named.iter().find(|i| usable(i, family, multicast)) {
                    Some(chosen) => *chosen,
                    None if named.iter().any(|i| AddressFamily::of(&i.addr) == family) => {
                        return Err(InterfaceError::NoMatch(spec.text.clone()));
                    }
                    None => return Err(mismatch()),
                };
                trace!(interface = %name, addr = %chosen.addr, "interface matched by name");
                return Ok(ResolvedInterface::from_interface(chosen, port));
            }
            let ip = resolve_name(names, name, Some(family))?;
            if AddressFamily::of(&ip) != family {
                return Err(mismatch());
            }
            ip
        }
    };

    let search = InterfaceSearch::new(search_addr, spec.prefix_len.unwrap_or(family.bits()));
    let interfaces = enumerate(source)?;
    let mut best: Option<&NetworkInterface> = None;
    for iface in interfaces
        .iter()
        .filter(|i| usable(i, family, multicast) && search.matches(&i.addr))
    {
        if best.is_none_or(|b| iface.prefix_len > b.prefix_len) {
            best = Some(iface);
        }
    }

    let chosen = best.ok_or_else(|| InterfaceError::NoMatch(spec.text.clone()))?;
    trace!(
        interface = %chosen.name,
        addr = %chosen.addr,
        search = %search.addr(),
        prefix = search.prefix_len(),
        "interface matched by subnet"
    );
    Ok(ResolvedInterface::from_interface(chosen, port))
}

fn usable(iface: &NetworkInterface, family: AddressFamily, multicast: bool) -> bool {
    iface.is_up
        && AddressFamily::of(&iface.addr) == family
        && (!multicast || iface.supports_multicast)
}

fn enumerate<I: InterfaceSource + ?Sized>(
    source: &I,
) -> Result<Vec<NetworkInterface>, InterfaceError> {
    source
        .interfaces()
        .map_err(|e| InterfaceError::Enumerate(e.to_string()))
}
