//! Compiled-in defaults for channel parsing.

/// Longest channel URI accepted, in bytes.
pub const MAX_URI_LENGTH: usize = 4096;

/// TTL applied to multicast channels that do not set `ttl`.
pub const DEFAULT_MULTICAST_TTL: u8 = 1;

/// Configuration for channel parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    /// URIs longer than this are rejected, not truncated.
    pub max_uri_length: usize,
    /// TTL for multicast channels without an explicit `ttl`.
    pub default_multicast_ttl: u8,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_uri_length: MAX_URI_LENGTH,
            default_multicast_ttl: DEFAULT_MULTICAST_TTL,
        }
    }
}
