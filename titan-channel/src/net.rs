//! Network address primitives for channel resolution.
//!
//! - `endpoint`: the resolved address value stored in a channel descriptor.
//! - `address`: `host[:port]` parsing and host name resolution.
//! - `interface`: local interface enumeration and subnet search.
//!
//! Nothing here opens a socket; the driver's transport layer binds the
//! endpoints produced by this module.

pub mod address;
pub mod endpoint;
pub mod interface;

pub use address::{
    AddressError, Host, HostPort, NameResolver, StaticNameResolver, SystemNameResolver,
};
pub use endpoint::{AddressFamily, Endpoint};
pub use interface::{
    InterfaceError, InterfaceSearch, InterfaceSource, InterfaceSpec, NetworkInterface,
    ResolvedInterface, StaticInterfaces, SystemInterfaces, resolve_interface,
};
