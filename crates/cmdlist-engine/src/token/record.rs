//! Fixed-layout token records.
//!
//! Records are `repr(C)` and padding-free so they can be copied into and out
//! of the byte stream with `bytemuck`. Fields are native-endian.

use bytemuck::{Pod, Zeroable};

/// Binds a uniform block range to `slot` for one shader stage.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct UniformAddressRecord {
    pub header: u32,
    pub slot: u16,
    pub stage: u16,
    pub address_lo: u32,
    pub address_hi: u32,
    pub size: u32,
    pub _pad: u32,
}

/// Binds a vertex buffer address to a vertex binding point.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct AttributeAddressRecord {
    pub header: u32,
    pub binding: u32,
    pub address_lo: u32,
    pub address_hi: u32,
}

/// Binds an index buffer address.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ElementAddressRecord {
    pub header: u32,
    pub address_lo: u32,
    pub address_hi: u32,
    pub type_size_bytes: u32,
}

/// Indexed draw from the bound index buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawElementsRecord {
    pub header: u32,
    pub count: u32,
    pub first_index: u32,
    pub base_vertex: i32,
    pub mode: u32,
    pub _pad: u32,
}

impl UniformAddressRecord {
    pub const SIZE_BYTES: usize = core::mem::size_of::<Self>();
}

impl AttributeAddressRecord {
    pub const SIZE_BYTES: usize = core::mem::size_of::<Self>();
}

impl ElementAddressRecord {
    pub const SIZE_BYTES: usize = core::mem::size_of::<Self>();
}

impl DrawElementsRecord {
    pub const SIZE_BYTES: usize = core::mem::size_of::<Self>();
}

const _: () = assert!(UniformAddressRecord::SIZE_BYTES == 24);
const _: () = assert!(AttributeAddressRecord::SIZE_BYTES == 16);
const _: () = assert!(ElementAddressRecord::SIZE_BYTES == 16);
const _: () = assert!(DrawElementsRecord::SIZE_BYTES == 24);
