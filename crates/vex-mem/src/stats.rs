//! Access Statistics - Per-Region Bias Counters
//!
//! Tracks where inside a registered region the simulated program's accesses
//! land. The counters are *signed running biases*, not plain counts: each
//! access moves each counter up or down depending on which half/quarter of
//! the region the access offset falls in, so the sign and magnitude encode
//! directional skew. The hotness evaluator's decisions depend on the sign,
//! so the exact increment/decrement rule matters.

use crate::page::{align_down, Addr};
use rustc_hash::FxHashMap;

/// Signed access-bias counters for one tracked region
///
/// Invariants: `total_accesses` only increases; the three bias counters move
/// in either direction and their magnitude is a proxy for directional access
/// concentration, not an absolute count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageAccessStats {
    /// Accesses recorded since registration
    pub total_accesses: i64,
    /// Upper half (+1) vs lower half (-1)
    pub upper_half_bias: i64,
    /// Within the upper half: fourth quarter (+1) vs third quarter (-1)
    pub upper_quarter_bias: i64,
    /// Within the lower half: first quarter (+1) vs second quarter (-1)
    pub lower_quarter_bias: i64,
}

impl PageAccessStats {
    /// Create zeroed counters
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one access at `offset` within a region of `region_size` bytes
    ///
    /// The quarter biases only move on the side of the region the access
    /// fell in: `upper_quarter_bias` tracks the skew between the third and
    /// fourth quarter, `lower_quarter_bias` the skew between the first and
    /// second quarter.
    pub fn record(&mut self, offset: u64, region_size: u64) {
        self.total_accesses += 1;

        if offset >= region_size / 2 {
            self.upper_half_bias += 1;
            if offset >= region_size * 3 / 4 {
                self.upper_quarter_bias += 1;
            } else {
                self.upper_quarter_bias -= 1;
            }
        } else {
            self.upper_half_bias -= 1;
            if offset < region_size / 4 {
                self.lower_quarter_bias += 1;
            } else {
                self.lower_quarter_bias -= 1;
            }
        }
    }
}

/// RegionTracker - registered regions of one granularity
///
/// A thin map from region-aligned base address to [`PageAccessStats`]. A
/// region only appears once explicitly registered (simulated huge-page
/// allocation, or demotion from the coarser granularity) and is removed when
/// the hotness evaluator fires for it.
#[derive(Debug)]
pub struct RegionTracker {
    /// Region granularity in bytes (64KB or 16KB)
    region_size: u64,
    /// Base address -> counters
    stats: FxHashMap<Addr, PageAccessStats>,
}

impl RegionTracker {
    /// Create an empty tracker for regions of `region_size` bytes
    pub fn new(region_size: u64) -> Self {
        Self { region_size, stats: FxHashMap::default() }
    }

    /// Region granularity in bytes
    #[inline]
    pub fn region_size(&self) -> u64 {
        self.region_size
    }

    /// Base address of the region containing `addr`
    #[inline]
    pub fn base_of(&self, addr: Addr) -> Addr {
        align_down(addr, self.region_size)
    }

    /// Register `base` with zeroed counters
    ///
    /// Re-registering an already tracked region resets its counters.
    pub fn register(&mut self, base: Addr) {
        self.stats.insert(base, PageAccessStats::new());
    }

    /// Check if `base` is currently tracked
    #[inline]
    pub fn is_tracked(&self, base: Addr) -> bool {
        self.stats.contains_key(&base)
    }

    /// Get the counters for `base`, if tracked
    pub fn get(&self, base: Addr) -> Option<&PageAccessStats> {
        self.stats.get(&base)
    }

    /// Get mutable counters for `base`, if tracked
    pub fn get_mut(&mut self, base: Addr) -> Option<&mut PageAccessStats> {
        self.stats.get_mut(&base)
    }

    /// Stop tracking `base`, returning its final counters
    pub fn remove(&mut self, base: Addr) -> Option<PageAccessStats> {
        self.stats.remove(&base)
    }

    /// Number of tracked regions
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    /// Check if no region is tracked
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}
