//! The resolved UDP channel descriptor and the pipeline that builds it.

use std::fmt;

use super::canonical::{canonical_form, tag_reference_form};
use super::config::ChannelConfig;
use super::error::ChannelError;
use super::resolve::{self, Addressing, Resolution};
use crate::net::{
    Endpoint, InterfaceSource, NameResolver, SystemInterfaces, SystemNameResolver,
};
use crate::trace::debug;
use crate::uri::params::{self, ChannelTag, ControlMode};
use crate::uri::{ChannelUri, Media, UriError, UriParams};

/// A fully resolved, immutable UDP channel.
///
/// Built once per channel request by [`UdpChannel::parse`] or
/// [`ChannelContext::parse`]. Nothing about it changes afterwards, so it can
/// be shared freely (typically behind an `Arc` owned by the channel registry).
/// Two channels refer to the same transport resource exactly when their
/// [`canonical_form`](Self::canonical_form)s are equal.
#[derive(Debug, PartialEq, Eq)]
pub struct UdpChannel {
    original: String,
    canonical: String,
    uri: ChannelUri,
    remote_data: Endpoint,
    local_data: Endpoint,
    remote_control: Endpoint,
    local_control: Endpoint,
    interface_address: Endpoint,
    interface_index: Option<u32>,
    tag: Option<ChannelTag>,
    pub_sub_tag: Option<ChannelTag>,
    control_mode: ControlMode,
    addressing: Addressing,
    has_explicit_control: bool,
    is_tag_reference: bool,
}

impl UdpChannel {
    /// Parses and resolves `uri` with the default configuration, the system
    /// name resolver and the system interface list.
    ///
    /// May block on name resolution when the URI uses host names.
    ///
    /// # Errors
    ///
    /// Returns the first error found by any stage; see [`ChannelError`].
    pub fn parse(uri: impl AsRef<[u8]>) -> Result<Self, ChannelError> {
        ChannelContext::new(ChannelConfig::default()).parse(uri)
    }

    /// Releases the channel.
    ///
    /// Parsing acquires no network resources, so this only drops the value;
    /// it exists so owners end a channel's life at an explicit point.
    pub fn release(self) {
        debug!(canonical = %self.canonical, "released channel");
    }

    /// True if both the remote and the local data endpoints have wildcard
    /// address and wildcard port: a receive-from-anyone channel.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.remote_data.is_wildcard_addr()
            && self.remote_data.is_wildcard_port()
            && self.local_data.is_wildcard_addr()
            && self.local_data.is_wildcard_port()
    }

    /// The URI exactly as given.
    #[must_use]
    pub fn original_uri(&self) -> &str {
        &self.original
    }

    /// The canonical form; the channel's identity.
    #[must_use]
    pub fn canonical_form(&self) -> &str {
        &self.canonical
    }

    /// The tokenized URI.
    #[must_use]
    pub const fn uri(&self) -> &ChannelUri {
        &self.uri
    }

    /// All parameters, including ones this crate does not interpret.
    #[must_use]
    pub const fn params(&self) -> &UriParams {
        self.uri.params()
    }

    #[must_use]
    pub const fn remote_data(&self) -> Endpoint {
        self.remote_data
    }

    #[must_use]
    pub const fn local_data(&self) -> Endpoint {
        self.local_data
    }

    #[must_use]
    pub const fn remote_control(&self) -> Endpoint {
        self.remote_control
    }

    #[must_use]
    pub const fn local_control(&self) -> Endpoint {
        self.local_control
    }

    /// Local address for outbound binding and multicast membership.
    #[must_use]
    pub const fn interface_address(&self) -> Endpoint {
        self.interface_address
    }

    /// Index of the resolved interface; `None` when bound to the wildcard.
    #[must_use]
    pub const fn interface_index(&self) -> Option<u32> {
        self.interface_index
    }

    /// Channel tag from `tags`, if any.
    #[must_use]
    pub const fn tag_id(&self) -> Option<ChannelTag> {
        self.tag
    }

    /// Second element of `tags`, if any.
    #[must_use]
    pub const fn pub_sub_tag(&self) -> Option<ChannelTag> {
        self.pub_sub_tag
    }

    #[must_use]
    pub const fn control_mode(&self) -> ControlMode {
        self.control_mode
    }

    #[must_use]
    pub const fn addressing(&self) -> Addressing {
        self.addressing
    }

    /// TTL of a multicast channel; `None` for unicast.
    #[must_use]
    pub const fn multicast_ttl(&self) -> Option<u8> {
        match self.addressing {
            Addressing::Multicast { ttl } => Some(ttl),
            Addressing::Unicast => None,
        }
    }

    /// True if the URI had a `control` parameter.
    #[must_use]
    pub const fn has_explicit_control(&self) -> bool {
        self.has_explicit_control
    }

    #[must_use]
    pub const fn is_manual_control_mode(&self) -> bool {
        matches!(self.control_mode, ControlMode::Manual)
    }

    #[must_use]
    pub const fn is_dynamic_control_mode(&self) -> bool {
        matches!(self.control_mode, ControlMode::Dynamic)
    }

    #[must_use]
    pub const fn is_multicast(&self) -> bool {
        matches!(self.addressing, Addressing::Multicast { .. })
    }

    /// True if the URI only refers to a channel by tag.
    ///
    /// Such channels carry wildcard addresses and a canonical form built from
    /// the tag alone, so references to the same tag share a key and never
    /// collide with an address-based channel.
    #[must_use]
    pub const fn is_tag_reference(&self) -> bool {
        self.is_tag_reference
    }
}

impl fmt::Display for UdpChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

/// Everything channel parsing depends on: limits, name resolution and the
/// local interface list.
///
/// The default uses the operating system for both lookups. Drivers pinned to
/// known hosts, and tests, substitute fixed tables.
#[derive(Debug, Clone, Default)]
pub struct ChannelContext<N = SystemNameResolver, I = SystemInterfaces> {
    pub config: ChannelConfig,
    pub names: N,
    pub interfaces: I,
}

impl ChannelContext {
    /// System lookups with the given configuration.
    #[must_use]
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            names: SystemNameResolver,
            interfaces: SystemInterfaces,
        }
    }
}

impl<N: NameResolver, I: InterfaceSource> ChannelContext<N, I> {
    /// Custom lookups with the given configuration.
    #[must_use]
    pub const fn with_resolvers(config: ChannelConfig, names: N, interfaces: I) -> Self {
        Self {
            config,
            names,
            interfaces,
        }
    }

    /// Runs tokenize → validate → resolve → canonicalize on `uri`.
    ///
    /// Each stage stops the pipeline on its first error; no partial channel
    /// is ever produced. No state is kept between calls.
    ///
    /// # Errors
    ///
    /// Returns the first error found by any stage; see [`ChannelError`].
    pub fn parse(&self, uri: impl AsRef<[u8]>) -> Result<UdpChannel, ChannelError> {
        let bytes = uri.as_ref();
        let tokens = ChannelUri::parse(bytes, self.config.max_uri_length)?;
        if tokens.media() != Media::Udp {
            return Err(ChannelError::UnsupportedMedia {
                media: tokens.media().to_string(),
            });
        }

        let checked = params::validate(tokens.params())?;
        let control_mode = checked.control_mode;
        let (tag, pub_sub_tag) = checked
            .tags
            .map_or((None, None), |t| (Some(t.channel), t.pub_sub));

        let (resolution, canonical) = match tag.filter(|_| checked.is_tag_reference()) {
            Some(tag) => (Resolution::tag_reference(), tag_reference_form(tag)),
            None => {
                let resolution =
                    resolve::resolve(&checked, &self.config, &self.names, &self.interfaces)?;
                let canonical = canonical_form(&resolution, control_mode);
                (resolution, canonical)
            }
        };
        let is_tag_reference = checked.is_tag_reference();

        let original = String::from_utf8(bytes.to_vec()).map_err(|_| UriError::NotUtf8)?;
        debug!(uri = %original, canonical = %canonical, "parsed channel");

        Ok(UdpChannel {
            original,
            canonical,
            uri: tokens,
            remote_data: resolution.remote_data,
            local_data: resolution.local_data,
            remote_control: resolution.remote_control,
            local_control: resolution.local_control,
            interface_address: resolution.interface.endpoint,
            interface_index: resolution.interface.index,
            tag,
            pub_sub_tag,
            control_mode,
            addressing: resolution.addressing,
            has_explicit_control: resolution.has_explicit_control,
            is_tag_reference,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::net::IpAddr;

    use super::*;
    use crate::channel::ErrorKind;
    use crate::net::{NetworkInterface, StaticInterfaces, StaticNameResolver};

    fn context() -> ChannelContext<StaticNameResolver, StaticInterfaces> {
        let names = StaticNameResolver::new()
            .with("localhost", "127.0.0.1".parse().unwrap())
            .with("pub-host", "192.168.1.20".parse().unwrap());
        let interfaces = StaticInterfaces(vec![NetworkInterface {
            name: "eth0".into(),
            index: 2,
            addr: "192.168.1.5".parse().unwrap(),
            prefix_len: 24,
            is_up: true,
            is_loopback: false,
            supports_multicast: true,
        }]);
        ChannelContext::with_resolvers(ChannelConfig::default(), names, interfaces)
    }

    fn parse(uri: &str) -> Result<UdpChannel, ChannelError> {
        context().parse(uri)
    }

    #[test]
    fn unicast_channel() {
        let ch = parse("aeron:udp?endpoint=192.168.1.1:40001").unwrap();
        assert!(!ch.is_multicast());
        assert!(!ch.is_wildcard());
        assert_eq!(ch.remote_data().to_string(), "192.168.1.1:40001");
        assert_eq!(ch.remote_control(), ch.remote_data());
        assert!(ch.local_data().is_wildcard_addr());
        assert_eq!(ch.interface_index(), None);
        assert_eq!(ch.multicast_ttl(), None);
        assert_eq!(ch.control_mode(), ControlMode::None);
        assert!(!ch.has_explicit_control());
        assert_eq!(ch.tag_id(), None);
        assert_eq!(ch.original_uri(), "aeron:udp?endpoint=192.168.1.1:40001");
    }

    #[test]
    fn unicast_with_interface() {
        let ch = parse("aeron:udp?endpoint=pub-host:40001|interface=192.168.1.0:40002/24").unwrap();
        assert_eq!(ch.remote_data().to_string(), "192.168.1.20:40001");
        assert_eq!(ch.local_data().to_string(), "192.168.1.5:40002");
        assert_eq!(ch.interface_address(), ch.local_data());
        assert_eq!(ch.interface_index(), Some(2));
    }

    #[test]
    fn multicast_channel() {
        let ch = parse("aeron:udp?endpoint=224.0.1.1:40001|interface=eth0").unwrap();
        assert!(ch.is_multicast());
        assert_eq!(ch.multicast_ttl(), Some(1));
        assert_eq!(ch.local_data(), ch.remote_data());
        assert_eq!(ch.remote_control().to_string(), "224.0.1.2:40001");
        assert_eq!(ch.local_control().ip(), "192.168.1.5".parse::<IpAddr>().unwrap());
        assert_eq!(ch.interface_index(), Some(2));
        assert_eq!(
            ch.canonical_form(),
            "UDP-224.0.1.1:40001-224.0.1.1:40001-224.0.1.2:40001-192.168.1.5:0-ttl=1-none"
        );
    }

    #[test]
    fn explicit_control_channel() {
        let ch = parse("aeron:udp?endpoint=192.168.1.1:40001|control=192.168.1.5:40002").unwrap();
        assert!(ch.has_explicit_control());
        assert_eq!(ch.local_data().to_string(), "192.168.1.5:40002");
        assert_eq!(ch.local_control(), ch.local_data());
        assert_eq!(ch.remote_control(), ch.remote_data());
    }

    #[test]
    fn dynamic_control_mode_without_endpoint() {
        let ch = parse("aeron:udp?control=192.168.1.5:40002|control-mode=dynamic").unwrap();
        assert!(ch.is_dynamic_control_mode());
        assert!(!ch.is_manual_control_mode());
        assert!(ch.remote_data().is_wildcard_addr());
        assert!(ch.canonical_form().ends_with("-dynamic"));
    }

    #[test]
    fn tags_are_exposed() {
        let ch = parse("aeron:udp?endpoint=192.168.1.1:40001|tags=1001,2002").unwrap();
        assert_eq!(ch.tag_id().map(ChannelTag::as_i64), Some(1001));
        assert_eq!(ch.pub_sub_tag().map(ChannelTag::as_i64), Some(2002));
        assert!(!ch.is_tag_reference());

        let by_tag = parse("aeron:udp?tags=1001").unwrap();
        assert!(by_tag.is_tag_reference());
        assert!(by_tag.is_wildcard());
        assert_eq!(by_tag.canonical_form(), "UDP-tag=1001");
    }

    #[test]
    fn ipc_is_unsupported() {
        let err = parse("aeron:ipc").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedMedia);
    }

    #[test]
    fn configured_length_bound() {
        let ctx = ChannelContext::with_resolvers(
            ChannelConfig {
                max_uri_length: 16,
                ..ChannelConfig::default()
            },
            StaticNameResolver::new(),
            StaticInterfaces::default(),
        );
        let err = ctx.parse("aeron:udp?endpoint=1.2.3.4:5").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedUri);
    }

    #[test]
    fn configured_default_ttl() {
        let ctx = ChannelContext::with_resolvers(
            ChannelConfig {
                default_multicast_ttl: 4,
                ..ChannelConfig::default()
            },
            StaticNameResolver::new(),
            StaticInterfaces::default(),
        );
        let ch = ctx.parse("aeron:udp?endpoint=239.1.1.1:7000").unwrap();
        assert_eq!(ch.multicast_ttl(), Some(4));
    }

    #[test]
    fn release_consumes() {
        let ch = parse("aeron:udp?endpoint=192.168.1.1:40001").unwrap();
        ch.release();
    }
}
