//! Device addresses and residency.
//!
//! Tokens never carry object handles; they carry raw 64-bit device addresses.
//! An address is only meaningful while the resource it points into is pinned.

mod resolver;
mod table;
mod target;

pub use resolver::{AddressRange, AddressResolver, DeviceAddress, ResourceId, ResourceKind};
pub use table::AddressTable;
pub use target::RenderTarget;
