//! Network endpoint types.
//!
//! An [`Endpoint`] is the structured form of every address a channel
//! descriptor carries: family, host bytes and port. The wildcard predicates
//! here are what receive-any channel matching is built on.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

use serde::{Deserialize, Serialize};

/// Address family of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    /// Width of an address of this family in bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Ipv4 => 32,
            Self::Ipv6 => 128,
        }
    }

    /// The unspecified ("any") address of this family.
    #[must_use]
    pub const fn wildcard_addr(self) -> IpAddr {
        match self {
            Self::Ipv4 => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            Self::Ipv6 => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        }
    }

    /// Family of the given address.
    #[must_use]
    pub const fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => Self::Ipv4,
            IpAddr::V6(_) => Self::Ipv6,
        }
    }
}

impl std::fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ipv4 => f.write_str("IPv4"),
            Self::Ipv6 => f.write_str("IPv6"),
        }
    }
}

/// A network endpoint (IP address + port).
///
/// Wrapper around [`SocketAddr`]. IPv6 endpoints never carry flow info or a
/// scope id, so two endpoints compare equal exactly when family, host bytes
/// and port agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint(SocketAddr);

impl Endpoint {
    /// Creates a new endpoint from an IP address and port.
    #[must_use]
    pub const fn new(addr: IpAddr, port: u16) -> Self {
        match addr {
            IpAddr::V4(v4) => Self(SocketAddr::V4(SocketAddrV4::new(v4, port))),
            IpAddr::V6(v6) => Self(SocketAddr::V6(SocketAddrV6::new(v6, port, 0, 0))),
        }
    }

    /// Creates a new IPv4 endpoint.
    #[must_use]
    pub const fn new_v4(a: u8, b: u8, c: u8, d: u8, port: u16) -> Self {
        Self(SocketAddr::V4(SocketAddrV4::new(
            Ipv4Addr::new(a, b, c, d),
            port,
        )))
    }

    /// The wildcard address and wildcard port of the given family.
    #[must_use]
    pub const fn wildcard(family: AddressFamily) -> Self {
        Self::new(family.wildcard_addr(), 0)
    }

    /// Creates an endpoint bound to all IPv4 interfaces on the given port.
    #[must_use]
    pub const fn any(port: u16) -> Self {
        Self::new_v4(0, 0, 0, 0, port)
    }

    /// Returns the IP address.
    #[must_use]
    pub const fn ip(&self) -> IpAddr {
        self.0.ip()
    }

    /// Returns the port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.0.port()
    }

    /// Returns the address family.
    #[must_use]
    pub const fn family(&self) -> AddressFamily {
        match self.0 {
            SocketAddr::V4(_) => AddressFamily::Ipv4,
            SocketAddr::V6(_) => AddressFamily::Ipv6,
        }
    }

    /// Host portion as raw network-order bytes (4 or 16 of them).
    #[must_use]
    pub fn host_bytes(&self) -> Vec<u8> {
        match self.0.ip() {
            IpAddr::V4(v4) => v4.octets().to_vec(),
            IpAddr::V6(v6) => v6.octets().to_vec(),
        }
    }

    /// Returns the underlying [`SocketAddr`].
    #[must_use]
    pub const fn as_socket_addr(&self) -> SocketAddr {
        self.0
    }

    /// True if the host is `0.0.0.0` or `::`.
    #[must_use]
    pub fn is_wildcard_addr(&self) -> bool {
        self.0.ip().is_unspecified()
    }

    /// True if the port is `0`.
    #[must_use]
    pub const fn is_wildcard_port(&self) -> bool {
        self.0.port() == 0
    }

    /// True if the host lies in 224.0.0.0/4 or ff00::/8.
    #[must_use]
    pub fn is_multicast(&self) -> bool {
        self.0.ip().is_multicast()
    }

    /// Same host, different port.
    #[must_use]
    pub const fn with_port(self, port: u16) -> Self {
        Self::new(self.0.ip(), port)
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip(), addr.port())
    }
}

impl From<Endpoint> for SocketAddr {
    fn from(ep: Endpoint) -> Self {
        ep.0
    }
}

impl From<SocketAddrV4> for Endpoint {
    fn from(addr: SocketAddrV4) -> Self {
        Self(SocketAddr::V4(addr))
    }
}

/// Canonical text: `a.b.c.d:port` or `[v6]:port`, the v6 host in RFC 5952
/// lowercase compressed form.
impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
