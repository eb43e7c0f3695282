//! Test Utilities for the vex-mem Test Suite
//!
//! Shared fixture for address-space tests: constructs clean spaces and
//! drives simulated accesses through the hot translation path.

#![allow(dead_code)]

use vex_mem::{AccessRequest, AddressSpace, MemConfig, HUGE_REGION_SIZE, PAGE_SIZE};

/// A 64KB-aligned virtual base used by the huge-page scenarios
pub const HUGE_VADDR: u64 = 0x10_0000;

/// Physical base backing the test mappings
pub const PHYS_BASE: u64 = 0x80_0000;

/// Test fixture wrapping one simulated address space
pub struct SpaceFixture {
    pub space: AddressSpace,
}

impl SpaceFixture {
    /// Create a fixture with the default configuration (4KB pages)
    pub fn with_defaults() -> Self {
        let space = AddressSpace::new(MemConfig::default())
            .expect("address-space construction should succeed with a valid config");
        Self { space }
    }

    /// Create a fixture with one simulated huge page mapped
    ///
    /// Maps exactly 64KB at [`HUGE_VADDR`], which registers the region for
    /// 64KB-granularity access tracking.
    pub fn with_huge_page() -> Self {
        let mut fixture = Self::with_defaults();
        fixture.space.map(HUGE_VADDR, PHYS_BASE, HUGE_REGION_SIZE, 0);
        fixture
    }

    /// Drive one 4-byte simulated access through the translator
    ///
    /// Panics on a fault; scenario tests access mapped pages only.
    pub fn access(&mut self, vaddr: u64) {
        let mut req = AccessRequest::new(vaddr, 4);
        self.space
            .translate_request(&mut req)
            .expect("scenario access should hit a mapped page");
    }

    /// Drive `count` accesses at the same virtual address
    pub fn access_n(&mut self, vaddr: u64, count: usize) {
        for _ in 0..count {
            self.access(vaddr);
        }
    }

    /// Pages currently mapped inside `[base, base + 64KB)`
    pub fn mapped_in_region(&self, base: u64) -> Vec<u64> {
        (0..HUGE_REGION_SIZE / PAGE_SIZE)
            .map(|i| base + i * PAGE_SIZE)
            .filter(|&page| self.space.lookup(page).is_some())
            .collect()
    }
}
