use std::collections::BTreeMap;

use super::{AddressRange, AddressResolver, DeviceAddress, ResourceId, ResourceKind};

/// Granularity of the virtual address space.
const PAGE_SIZE: u64 = 64 * 1024;

/// First address handed out. Starting above 4 GiB keeps the high word of
/// every address non-zero.
const BASE_ADDRESS: u64 = 1 << 32;

#[derive(Debug, Clone)]
struct Entry {
    kind: ResourceKind,
    base: DeviceAddress,
    size: u64,
    resident: bool,
}

/// Host-side virtual address allocator with residency tracking.
///
/// Every registered resource gets a page-aligned address range that is never
/// reused, so a stale address can't alias a newer resource.
#[derive(Debug)]
pub struct AddressTable {
    entries: Vec<Option<Entry>>,
    by_base: BTreeMap<u64, ResourceId>,
    next_base: u64,
}

impl Default for AddressTable {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            by_base: BTreeMap::new(),
            next_base: BASE_ADDRESS,
        }
    }

    /// Registers a resource. It starts out non-resident.
    pub fn register(&mut self, kind: ResourceKind, size: u64) -> ResourceId {
        let id = ResourceId(self.entries.len() as u32);
        let base = self.next_base;
        self.next_base += size.max(1).div_ceil(PAGE_SIZE) * PAGE_SIZE;

        self.entries.push(Some(Entry {
            kind,
            base: DeviceAddress(base),
            size,
            resident: false,
        }));
        self.by_base.insert(base, id);
        id
    }

    /// Forgets a destroyed resource.
    ///
    /// Panics if it is still resident.
    pub fn release(&mut self, resource: ResourceId) {
        let entry = self.entry(resource);
        assert!(
            !entry.resident,
            "{resource} released while resident; unpin it first"
        );
        let base = entry.base.0;
        self.by_base.remove(&base);
        self.entries[resource.0 as usize] = None;
    }

    pub fn kind(&self, resource: ResourceId) -> ResourceKind {
        self.entry(resource).kind
    }

    pub fn size(&self, resource: ResourceId) -> u64 {
        self.entry(resource).size
    }

    /// Resolves the full range of a resident resource.
    pub fn range(&self, resource: ResourceId) -> AddressRange {
        AddressRange::new(self.resolve(resource), self.size(resource))
    }

    /// Maps an address back to the resident resource containing it and the
    /// byte offset within that resource.
    pub fn lookup(&self, address: DeviceAddress) -> Option<(ResourceId, u64)> {
        let (&base, &id) = self.by_base.range(..=address.0).next_back()?;
        let entry = self.entries.get(id.0 as usize)?.as_ref()?;
        let offset = address.0 - base;
        if entry.resident && offset < entry.size.max(1) {
            Some((id, offset))
        } else {
            None
        }
    }

    /// True if `[address, address + size)` lies inside one resident resource.
    pub fn is_resident_range(&self, address: DeviceAddress, size: u64) -> bool {
        match self.lookup(address) {
            Some((id, offset)) => offset + size <= self.entry(id).size.max(1),
            None => false,
        }
    }

    pub fn resident_count(&self) -> usize {
        self.entries
            .iter()
            .flatten()
            .filter(|e| e.resident)
            .count()
    }

    fn entry(&self, resource: ResourceId) -> &Entry {
        self.entries
            .get(resource.0 as usize)
            .and_then(Option::as_ref)
            .unwrap_or_else(|| panic!("{resource} is not registered"))
    }

    fn entry_mut(&mut self, resource: ResourceId) -> &mut Entry {
        self.entries
            .get_mut(resource.0 as usize)
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("{resource} is not registered"))
    }
}

impl AddressResolver for AddressTable {
    fn resolve(&self, resource: ResourceId) -> DeviceAddress {
        let entry = self.entry(resource);
        assert!(
            entry.resident,
            "address of {resource} requested while it is not resident"
        );
        entry.base
    }

    fn pin(&mut self, resource: ResourceId) {
        let entry = self.entry_mut(resource);
        if !entry.resident {
            entry.resident = true;
            log::trace!("pinned {resource} at {}", entry.base);
        }
    }

    fn unpin(&mut self, resource: ResourceId) {
        let entry = self.entry_mut(resource);
        if entry.resident {
            entry.resident = false;
            log::trace!("unpinned {resource}");
        }
    }

    fn is_resident(&self, resource: ResourceId) -> bool {
        self.entry(resource).resident
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pinned(table: &mut AddressTable, size: u64) -> ResourceId {
        let id = table.register(ResourceKind::Buffer, size);
        table.pin(id);
        id
    }

    // ── allocation ────────────────────────────────────────────────────────

    #[test]
    fn bases_are_page_aligned_and_disjoint() {
        let mut table = AddressTable::new();
        let a = pinned(&mut table, 100);
        let b = pinned(&mut table, PAGE_SIZE + 1);
        let c = pinned(&mut table, 8);

        let (a, b, c) = (table.resolve(a), table.resolve(b), table.resolve(c));
        assert_eq!(a.0 % PAGE_SIZE, 0);
        assert_eq!(b.0 - a.0, PAGE_SIZE);
        assert_eq!(c.0 - b.0, 2 * PAGE_SIZE);
        assert_ne!(a.hi(), 0);
    }

    #[test]
    fn lookup_finds_owner_and_offset() {
        let mut table = AddressTable::new();
        let _a = pinned(&mut table, 256);
        let b = pinned(&mut table, 1024);

        let addr = table.resolve(b).offset(512);
        assert_eq!(table.lookup(addr), Some((b, 512)));
        assert!(table.is_resident_range(addr, 512));
        assert!(!table.is_resident_range(addr, 513));
    }

    // ── residency ─────────────────────────────────────────────────────────

    #[test]
    fn unpinned_addresses_do_not_resolve_back() {
        let mut table = AddressTable::new();
        let a = pinned(&mut table, 64);
        let addr = table.resolve(a);

        table.unpin(a);
        assert_eq!(table.lookup(addr), None);
        assert!(!table.is_resident(a));
    }

    #[test]
    #[should_panic(expected = "not resident")]
    fn resolve_non_resident_panics() {
        let mut table = AddressTable::new();
        let a = table.register(ResourceKind::Texture, 64);
        table.resolve(a);
    }

    #[test]
    #[should_panic(expected = "unpin it first")]
    fn release_while_resident_panics() {
        let mut table = AddressTable::new();
        let a = pinned(&mut table, 64);
        table.release(a);
    }

    #[test]
    fn released_ranges_are_not_reused() {
        let mut table = AddressTable::new();
        let a = pinned(&mut table, 64);
        let old = table.resolve(a);
        table.unpin(a);
        table.release(a);

        let b = pinned(&mut table, 64);
        assert_ne!(table.resolve(b), old);
        assert_eq!(table.lookup(old), None);
    }
}
