//! Channel URI text handling.
//!
//! ```text
//! aeron:udp?endpoint=224.0.1.1:40001|interface=192.168.1.0/24|ttl=8
//! └─┬─┘ └┬┘ └───────────────────────┬────────────────────────────┘
//! scheme media            `|`-separated key=value parameters
//! ```
//!
//! - `parser`: splits the text into media and an ordered parameter list.
//! - `params`: checks the UDP parameters before anything is resolved.

pub mod params;
pub mod parser;

pub use params::{ChannelParams, ChannelTag, ControlMode, ParamError, Tags};
pub use parser::{ChannelUri, Media, UriError, UriParams};
