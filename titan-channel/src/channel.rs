//! UDP channel descriptors.
//!
//! # Pipeline
//!
//! ```text
//! bytes ──> uri::parser ──> uri::params ──> resolve ──> canonical ──> UdpChannel
//!          (tokenize)      (validate)      (addresses)  (identity)
//! ```
//!
//! Every stage returns a `Result`; the first error ends the parse and is
//! reported as a [`ChannelError`]. Nothing is cached between parses.
//!
//! # Example
//!
//! ```
//! use titan_channel::channel::UdpChannel;
//!
//! let a = UdpChannel::parse("aeron:udp?endpoint=224.0.1.1:40001|ttl=8")?;
//! let b = UdpChannel::parse("aeron:udp?ttl=8|endpoint=224.000.001.001:40001")?;
//!
//! assert!(a.is_multicast());
//! assert_eq!(a.multicast_ttl(), Some(8));
//! assert_eq!(a.canonical_form(), b.canonical_form());
//!
//! a.release();
//! b.release();
//! # Ok::<(), titan_channel::channel::ChannelError>(())
//! ```

pub mod canonical;
pub mod config;
pub mod error;
pub mod resolve;
pub mod udp;

pub use canonical::{canonical_form, tag_reference_form};
pub use config::{ChannelConfig, DEFAULT_MULTICAST_TTL, MAX_URI_LENGTH};
pub use error::{ChannelError, ErrorKind};
pub use resolve::{Addressing, Resolution};
pub use udp::{ChannelContext, UdpChannel};
