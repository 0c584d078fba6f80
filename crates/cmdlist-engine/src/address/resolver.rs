use std::fmt;

/// Device-visible 64-bit address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DeviceAddress(pub u64);

impl DeviceAddress {
    pub const NULL: Self = Self(0);

    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn offset(self, bytes: u64) -> Self {
        Self(self.0 + bytes)
    }

    /// Low 32 bits, as stored in token records.
    #[inline]
    pub fn lo(self) -> u32 {
        self.0 as u32
    }

    /// High 32 bits, as stored in token records.
    #[inline]
    pub fn hi(self) -> u32 {
        (self.0 >> 32) as u32
    }

    #[inline]
    pub fn from_parts(lo: u32, hi: u32) -> Self {
        Self((u64::from(hi) << 32) | u64::from(lo))
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:012x}", self.0)
    }
}

/// Address plus byte length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AddressRange {
    pub address: DeviceAddress,
    pub size: u64,
}

impl AddressRange {
    pub const fn new(address: DeviceAddress, size: u64) -> Self {
        Self { address, size }
    }
}

/// Buffer or texture registered with an address table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u32);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Buffer,
    Texture,
}

/// Maps resources to device addresses and controls their residency.
///
/// Contract:
/// - `pin` must happen before any address derived from the resource is encoded
/// - `unpin` must happen before the resource is destroyed
/// - `resolve` on a non-resident resource is a programming error and panics
pub trait AddressResolver {
    fn resolve(&self, resource: ResourceId) -> DeviceAddress;
    fn pin(&mut self, resource: ResourceId);
    fn unpin(&mut self, resource: ResourceId);
    fn is_resident(&self, resource: ResourceId) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_round_trip_high_addresses() {
        let addr = DeviceAddress(0x0000_0001_2345_6780);
        assert_eq!(addr.hi(), 1);
        assert_eq!(addr.lo(), 0x2345_6780);
        assert_eq!(DeviceAddress::from_parts(addr.lo(), addr.hi()), addr);
    }

    #[test]
    fn null_address() {
        assert!(DeviceAddress::NULL.is_null());
        assert!(!DeviceAddress(64).is_null());
    }
}
