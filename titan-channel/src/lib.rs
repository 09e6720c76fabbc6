//! UDP channel resolution for the titan driver.
//!
//! Turns a channel URI such as
//! `aeron:udp?endpoint=224.0.1.1:40001|interface=192.168.1.0/24|ttl=8` into a
//! resolved, immutable [`UdpChannel`]: the four data/control addresses, the
//! local interface, control mode, multicast TTL and tags, plus a canonical
//! form the driver uses to decide whether two requests share a transport.
//!
//! - [`uri`]: tokenizing and parameter checks.
//! - [`net`]: endpoints, host names and local interfaces.
//! - [`channel`]: resolution, canonical form and the descriptor.

pub mod channel;
pub mod net;
pub mod uri;

mod trace;

pub use channel::{ChannelConfig, ChannelContext, ChannelError, ErrorKind, UdpChannel};
pub use net::Endpoint;
pub use trace::init_tracing;
pub use uri::{ChannelTag, ControlMode};
