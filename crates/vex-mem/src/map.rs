//! Page Map - Sparse Virtual-to-Physical Mapping
//!
//! The core dictionary from page-aligned virtual address to mapping entry.
//! Invariants: every key is a multiple of the page size, keys are unique,
//! and an unmapped address simply has no key. The map is owned by one
//! address-space instance and mutated only through the operations here.
//!
//! Alignment preconditions are caller contracts: violating them, or mapping
//! over an existing page without clobber permission, indicates an aliasing
//! bug in the simulated program's address space and aborts the run.

use crate::page::{align_down, is_aligned, offset_in, Addr};
use rustc_hash::FxHashMap;

/// Mapping attribute bits stored in an [`Entry`]
pub mod flags {
    /// `map` may silently overwrite an existing entry
    pub const CLOBBER: u64 = 1;
    /// The mapping refers to uncacheable memory
    pub const UNCACHEABLE: u64 = 2;
    /// The mapping is read-only for the simulated program
    pub const READ_ONLY: u64 = 4;
}

/// One mapped page: physical backing address plus attribute bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// Physical address of the backing page
    pub paddr: Addr,
    /// Mapping attribute bits (see [`flags`])
    pub flags: u64,
}

impl Entry {
    /// Create an entry
    #[inline]
    pub fn new(paddr: Addr, flags: u64) -> Self {
        Self { paddr, flags }
    }
}

/// PageMap - sparse dictionary of mapped pages
///
/// Lookup, insert, and erase are O(1) amortized; ordered views are produced
/// on demand for introspection and checkpointing.
#[derive(Debug)]
pub struct PageMap {
    /// Page-aligned vaddr -> entry
    entries: FxHashMap<Addr, Entry>,
    /// Simulated page size
    page_size: u64,
}

impl PageMap {
    /// Create an empty map for pages of `page_size` bytes
    pub fn new(page_size: u64) -> Self {
        Self { entries: FxHashMap::default(), page_size }
    }

    /// Simulated page size in bytes
    #[inline]
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Page-aligned base of the page containing `addr`
    #[inline]
    pub fn page_align(&self, addr: Addr) -> Addr {
        align_down(addr, self.page_size)
    }

    /// Offset of `addr` within its page
    #[inline]
    pub fn page_offset(&self, addr: Addr) -> u64 {
        offset_in(addr, self.page_size)
    }

    /// Map `[vaddr, vaddr + size)` to physical memory starting at `paddr`
    ///
    /// Inserts one entry per page, advancing both addresses by the page size
    /// each step. An existing entry is overwritten only when `flags` carries
    /// [`flags::CLOBBER`].
    ///
    /// # Panics
    /// If `vaddr` is not page aligned, or a page is already mapped and
    /// clobbering was not requested.
    pub fn map(&mut self, vaddr: Addr, paddr: Addr, size: u64, flags: u64) {
        let clobber = flags & flags::CLOBBER != 0;
        assert!(
            is_aligned(vaddr, self.page_size),
            "map: vaddr {vaddr:#x} is not page aligned"
        );

        log::debug!("allocating pages: {:#x}-{:#x}", vaddr, vaddr + size);

        let mut vaddr = vaddr;
        let mut paddr = paddr;
        let mut remaining = size;
        while remaining > 0 {
            if self.entries.contains_key(&vaddr) && !clobber {
                panic!("map: address {vaddr:#x} already mapped");
            }
            self.entries.insert(vaddr, Entry::new(paddr, flags));

            remaining = remaining.saturating_sub(self.page_size);
            vaddr += self.page_size;
            paddr += self.page_size;
        }
    }

    /// Move the mappings under `[vaddr, vaddr + size)` to `new_vaddr`
    ///
    /// Entries keep their physical address and flags.
    ///
    /// # Panics
    /// If either address is not page aligned, a source page is unmapped, or
    /// a destination page is already mapped.
    pub fn remap(&mut self, vaddr: Addr, size: u64, new_vaddr: Addr) {
        assert!(
            is_aligned(vaddr, self.page_size),
            "remap: vaddr {vaddr:#x} is not page aligned"
        );
        assert!(
            is_aligned(new_vaddr, self.page_size),
            "remap: new vaddr {new_vaddr:#x} is not page aligned"
        );

        log::debug!(
            "moving pages from vaddr {:#x} to {:#x}, size = {}",
            vaddr,
            new_vaddr,
            size
        );

        let mut vaddr = vaddr;
        let mut new_vaddr = new_vaddr;
        let mut remaining = size;
        while remaining > 0 {
            let entry = self
                .entries
                .remove(&vaddr)
                .unwrap_or_else(|| panic!("remap: source page {vaddr:#x} not mapped"));
            if self.entries.insert(new_vaddr, entry).is_some() {
                panic!("remap: destination page {new_vaddr:#x} already mapped");
            }

            remaining = remaining.saturating_sub(self.page_size);
            vaddr += self.page_size;
            new_vaddr += self.page_size;
        }
    }

    /// Remove the mappings under `[vaddr, vaddr + size)`
    ///
    /// # Panics
    /// If `vaddr` is not page aligned or a page in the range is not mapped.
    pub fn unmap(&mut self, vaddr: Addr, size: u64) {
        assert!(
            is_aligned(vaddr, self.page_size),
            "unmap: vaddr {vaddr:#x} is not page aligned"
        );

        log::debug!("unmapping pages: {:#x}-{:#x}", vaddr, vaddr + size);

        let mut vaddr = vaddr;
        let mut remaining = size;
        while remaining > 0 {
            if self.entries.remove(&vaddr).is_none() {
                panic!("unmap: page {vaddr:#x} not mapped");
            }
            remaining = remaining.saturating_sub(self.page_size);
            vaddr += self.page_size;
        }
    }

    /// Check that no page in `[vaddr, vaddr + size)` is mapped
    ///
    /// Pure query, no side effects.
    ///
    /// # Panics
    /// If `vaddr` is not page aligned.
    pub fn is_unmapped(&self, vaddr: Addr, size: u64) -> bool {
        assert!(
            is_aligned(vaddr, self.page_size),
            "is_unmapped: vaddr {vaddr:#x} is not page aligned"
        );

        let mut offset = 0;
        while offset < size {
            if self.entries.contains_key(&(vaddr + offset)) {
                return false;
            }
            offset += self.page_size;
        }
        true
    }

    /// Entry for the page containing `vaddr`, if mapped
    ///
    /// No side effects and no access-stats update.
    pub fn lookup(&self, vaddr: Addr) -> Option<&Entry> {
        self.entries.get(&self.page_align(vaddr))
    }

    /// Remove the page at `page` unconditionally
    ///
    /// The hotness evaluator's removal path: unlike [`PageMap::unmap`] this
    /// tolerates an address that is already absent. Returns whether an entry
    /// was removed.
    pub fn evict(&mut self, page: Addr) -> bool {
        self.entries.remove(&page).is_some()
    }

    /// All mapped (virtual page, physical page) pairs in ascending
    /// virtual-address order
    ///
    /// Introspection and checkpoint tooling only, not a hot-path operation.
    pub fn mappings(&self) -> Vec<(Addr, Addr)> {
        let mut pairs: Vec<(Addr, Addr)> =
            self.entries.iter().map(|(&v, e)| (v, e.paddr)).collect();
        pairs.sort_unstable_by_key(|&(v, _)| v);
        pairs
    }

    /// Number of mapped pages
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no page is mapped
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Debug-only text dump: `hex(vaddr):hex(paddr);` per mapped page
    ///
    /// Ascending virtual-address order. Not a restore format.
    pub fn externalize(&self) -> String {
        let mut out = String::new();
        for (vaddr, entry) in self.sorted_entries() {
            out.push_str(&format!("{:x}:{:x};", vaddr, entry.paddr));
        }
        out
    }

    /// All entries in ascending virtual-address order
    pub(crate) fn sorted_entries(&self) -> Vec<(Addr, Entry)> {
        let mut pairs: Vec<(Addr, Entry)> =
            self.entries.iter().map(|(&v, &e)| (v, e)).collect();
        pairs.sort_unstable_by_key(|&(v, _)| v);
        pairs
    }

    /// Insert a restored entry without contract checks
    pub(crate) fn insert_restored(&mut self, vaddr: Addr, entry: Entry) {
        self.entries.insert(vaddr, entry);
    }
}
