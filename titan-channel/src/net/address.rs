//! `host[:port]` parsing and host name resolution.
//!
//! Accepted forms:
//!
//! ```text
//! 192.168.1.10:40001      IPv4 literal, leading zeros tolerated (decimal)
//! [fe80::1]:40001         IPv6 literal, brackets required with a port
//! ff02::1                 bare IPv6 literal, no port
//! :40001                  omitted host = wildcard address
//! media-host.local:40001  symbolic name, resolved through a NameResolver
//! ```
//!
//! An omitted or `0` port is the wildcard port.

use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, ToSocketAddrs};

use thiserror::Error;

use super::{AddressFamily, Endpoint};
use crate::trace::trace;

/// Errors parsing or resolving a `host[:port]` string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The address text is empty.
    #[error("address is empty")]
    Empty,
    /// The host part is neither a valid literal nor a valid name.
    #[error("invalid host `{0}`")]
    InvalidHost(String),
    /// The port is not a number in 0..=65535.
    #[error("invalid port `{0}`")]
    InvalidPort(String),
    /// Name resolution failed or returned nothing usable.
    #[error("could not resolve host `{host}`: {reason}")]
    Unresolved { host: String, reason: String },
}

impl AddressError {
    /// True for errors raised by the resolver rather than by the syntax.
    #[must_use]
    pub const fn is_resolution(&self) -> bool {
        matches!(self, Self::Unresolved { .. })
    }
}

/// The host part of a parsed address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Host {
    /// No host given (`:40001`); the wildcard address.
    Omitted,
    /// A numeric address.
    Literal(IpAddr),
    /// A symbolic name needing resolution.
    Name(String),
}

/// A parsed but not yet resolved `host[:port]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPort {
    host: Host,
    port: u16,
}

impl HostPort {
    /// Parses `host[:port]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host or port is syntactically invalid.
    pub fn parse(text: &str) -> Result<Self, AddressError> {
        if text.is_empty() {
            return Err(AddressError::Empty);
        }

        if let Some(rest) = text.strip_prefix('[') {
            let Some((inner, tail)) = rest.split_once(']') else {
                return Err(AddressError::InvalidHost(text.to_string()));
            };
            let addr: Ipv6Addr = inner
                .parse()
                .map_err(|_| AddressError::InvalidHost(inner.to_string()))?;
            let port = match tail {
                "" => 0,
                _ => match tail.strip_prefix(':') {
                    Some(port) => parse_port(port)?,
                    None => return Err(AddressError::InvalidHost(text.to_string())),
                },
            };
            return Ok(Self {
                host: Host::Literal(IpAddr::V6(addr)),
                port,
            });
        }

        // More than one colon without brackets can only be a bare IPv6 host.
        if text.matches(':').count() > 1 {
            let addr: Ipv6Addr = text
                .parse()
                .map_err(|_| AddressError::InvalidHost(text.to_string()))?;
            return Ok(Self {
                host: Host::Literal(IpAddr::V6(addr)),
                port: 0,
            });
        }

        let (host, port) = match text.split_once(':') {
            Some((host, port)) => (host, parse_port(port)?),
            None => (text, 0),
        };

        Ok(Self {
            host: parse_host(host)?,
            port,
        })
    }

    /// The host part.
    #[must_use]
    pub const fn host(&self) -> &Host {
        &self.host
    }

    /// The port, `0` when omitted.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Resolves to an endpoint, consulting `resolver` only for names.
    ///
    /// An omitted host becomes the wildcard address of `family`, or IPv4 when
    /// no family is preferred.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::Unresolved`] if a name cannot be resolved.
    pub fn resolve<R: NameResolver + ?Sized>(
        &self,
        resolver: &R,
        family: Option<AddressFamily>,
    ) -> Result<Endpoint, AddressError> {
        let ip = match &self.host {
            Host::Omitted => family.unwrap_or(AddressFamily::Ipv4).wildcard_addr(),
            Host::Literal(ip) => *ip,
            Host::Name(name) => resolve_name(resolver, name, family)?,
        };
        Ok(Endpoint::new(ip, self.port))
    }
}

/// Resolves a symbolic host name to one address.
///
/// Among the returned addresses the first of the preferred family wins, then
/// the first IPv4 address, then whatever came first.
///
/// # Errors
///
/// Returns [`AddressError::Unresolved`] on resolver failure or empty result.
pub fn resolve_name<R: NameResolver + ?Sized>(
    resolver: &R,
    name: &str,
    family: Option<AddressFamily>,
) -> Result<IpAddr, AddressError> {
    let addrs = resolver
        .resolve(name)
        .map_err(|e| AddressError::Unresolved {
            host: name.to_string(),
            reason: e.to_string(),
        })?;

    let preferred = family.unwrap_or(AddressFamily::Ipv4);
    let chosen = addrs
        .iter()
        .find(|ip| AddressFamily::of(ip) == preferred)
        .or_else(|| addrs.iter().find(|ip| ip.is_ipv4()))
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| AddressError::Unresolved {
            host: name.to_string(),
            reason: "no addresses returned".to_string(),
        })?;

    trace!(host = %name, addr = %chosen, "resolved host name");
    Ok(chosen)
}

fn parse_port(text: &str) -> Result<u16, AddressError> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AddressError::InvalidPort(text.to_string()));
    }
    text.parse()
        .map_err(|_| AddressError::InvalidPort(text.to_string()))
}

fn parse_host(text: &str) -> Result<Host, AddressError> {
    if text.is_empty() {
        return Ok(Host::Omitted);
    }
    if text.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return parse_ipv4_lenient(text)
            .map(|v4| Host::Literal(IpAddr::V4(v4)))
            .ok_or_else(|| AddressError::InvalidHost(text.to_string()));
    }
    if is_host_name(text) {
        Ok(Host::Name(text.to_string()))
    } else {
        Err(AddressError::InvalidHost(text.to_string()))
    }
}

/// Dotted-quad parser that reads `010` as ten rather than rejecting it.
#[must_use]
pub fn parse_ipv4_lenient(text: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut parts = text.split('.');
    for octet in &mut octets {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *octet = part.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(Ipv4Addr::from(octets))
}

/// Letters, digits, `-`, `_` and `.`; no empty labels.
fn is_host_name(text: &str) -> bool {
    text.split('.').all(|label| {
        !label.is_empty()
            && label
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    })
}

/// Source of host name resolution.
///
/// Implementations may block; the channel parser calls them only for
/// symbolic names, never for literals.
pub trait NameResolver {
    /// Returns every address `host` resolves to.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Resolves through the operating system (`getaddrinfo`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemNameResolver;

impl NameResolver for SystemNameResolver {
    fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        Ok((host, 0).to_socket_addrs()?.map(|a| a.ip()).collect())
    }
}

/// Fixed host table, for embedding drivers with pinned names and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticNameResolver {
    hosts: HashMap<String, Vec<IpAddr>>,
}

impl StaticNameResolver {
    /// Creates an empty table; every lookup fails.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `addr` to the addresses of `host`.
    #[must_use]
    pub fn with(mut self, host: &str, addr: IpAddr) -> Self {
        self.hosts.entry(host.to_string()).or_default().push(addr);
        self
    }
}

impl NameResolver for StaticNameResolver {
    fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        self.hosts.get(host).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("unknown host {host}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn parse_ipv4_with_port() {
        let hp = HostPort::parse("192.168.1.10:40001").unwrap();
        assert_eq!(hp.host(), &Host::Literal(v4(192, 168, 1, 10)));
        assert_eq!(hp.port(), 40001);
    }

    #[test]
    fn parse_ipv4_leading_zeros_are_decimal() {
        let hp = HostPort::parse("010.000.000.001:0040001").unwrap();
        assert_eq!(hp.host(), &Host::Literal(v4(10, 0, 0, 1)));
        assert_eq!(hp.port(), 40001);
    }

    #[test]
    fn parse_omitted_parts() {
        let hp = HostPort::parse(":40001").unwrap();
        assert_eq!(hp.host(), &Host::Omitted);
        assert_eq!(hp.port(), 40001);

        let hp = HostPort::parse("10.0.0.1").unwrap();
        assert_eq!(hp.port(), 0);
    }

    #[test]
    fn parse_ipv6_forms() {
        let hp = HostPort::parse("[FE80::0001]:40001").unwrap();
        assert_eq!(hp.host(), &Host::Literal("fe80::1".parse().unwrap()));
        assert_eq!(hp.port(), 40001);

        let hp = HostPort::parse("ff02::1").unwrap();
        assert_eq!(hp.host(), &Host::Literal("ff02::1".parse().unwrap()));
        assert_eq!(hp.port(), 0);

        let hp = HostPort::parse("[::]").unwrap();
        assert_eq!(hp.host(), &Host::Literal("::".parse().unwrap()));
    }

    #[test]
    fn parse_names() {
        let hp = HostPort::parse("media-host.local:9000").unwrap();
        assert_eq!(hp.host(), &Host::Name("media-host.local".into()));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(HostPort::parse(""), Err(AddressError::Empty));
        assert!(matches!(
            HostPort::parse("10.0.0.1:"),
            Err(AddressError::InvalidPort(_))
        ));
        assert!(matches!(
            HostPort::parse("10.0.0.1:70000"),
            Err(AddressError::InvalidPort(_))
        ));
        assert!(matches!(
            HostPort::parse("10.0.0.1:+5"),
            Err(AddressError::InvalidPort(_))
        ));
        assert!(matches!(
            HostPort::parse("256.0.0.1:1"),
            Err(AddressError::InvalidHost(_))
        ));
        assert!(matches!(
            HostPort::parse("[::1:1"),
            Err(AddressError::InvalidHost(_))
        ));
        assert!(matches!(
            HostPort::parse("bad host:1"),
            Err(AddressError::InvalidHost(_))
        ));
    }

    #[test]
    fn resolve_omitted_host_uses_family() {
        let hp = HostPort::parse(":7").unwrap();
        let ep = hp
            .resolve(&StaticNameResolver::new(), Some(AddressFamily::Ipv6))
            .unwrap();
        assert!(ep.is_wildcard_addr());
        assert_eq!(ep.family(), AddressFamily::Ipv6);
        assert_eq!(ep.port(), 7);
    }

    #[test]
    fn resolve_name_prefers_ipv4() {
        let resolver = StaticNameResolver::new()
            .with("dual", "::1".parse().unwrap())
            .with("dual", v4(127, 0, 0, 1));
        let ep = HostPort::parse("dual:1")
            .unwrap()
            .resolve(&resolver, None)
            .unwrap();
        assert_eq!(ep.ip(), v4(127, 0, 0, 1));

        let ep = HostPort::parse("dual:1")
            .unwrap()
            .resolve(&resolver, Some(AddressFamily::Ipv6))
            .unwrap();
        assert_eq!(ep.ip(), "::1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn resolve_unknown_name_fails() {
        let err = HostPort::parse("nowhere:1")
            .unwrap()
            .resolve(&StaticNameResolver::new(), None)
            .unwrap_err();
        assert!(err.is_resolution());
    }

    #[test]
    fn literals_never_hit_the_resolver() {
        struct Panicking;
        impl NameResolver for Panicking {
            fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
                panic!("resolver called for {host}");
            }
        }
        let ep = HostPort::parse("10.1.2.3:4")
            .unwrap()
            .resolve(&Panicking, None)
            .unwrap();
        assert_eq!(ep.to_string(), "10.1.2.3:4");
    }
}
