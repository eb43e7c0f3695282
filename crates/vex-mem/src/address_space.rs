//! Address Space - One Simulated Process View of Memory
//!
//! Owns the page map and both access-tracking granularities for a single
//! simulated address space and wires them together: translation feeds the
//! trackers, the trackers trigger the hotness evaluator, and the evaluator
//! mutates the page map. There is no hidden shared instance; every simulated
//! address space constructs its own.
//!
//! All operations are synchronous in-memory data-structure updates. If
//! multiple simulated thread contexts share one address space, they must
//! serialize their calls externally; this type exposes only `&mut self`
//! mutation and holds no locks.

use crate::checkpoint::Section;
use crate::config::MemConfig;
use crate::error::{PageFault, Result};
use crate::hotness::{self, EVAL_ACCESS_COUNT};
use crate::map::{Entry, PageMap};
use crate::page::{Addr, HUGE_REGION_SIZE, SUB_REGION_SIZE};
use crate::range::RangeTranslator;
use crate::request::AccessRequest;
use crate::stats::RegionTracker;

/// One simulated address space: page map, access trackers, configuration
///
/// # Examples
///
/// ```rust
/// use vex_mem::{AddressSpace, MemConfig};
///
/// let mut space = AddressSpace::new(MemConfig::default()).unwrap();
/// space.map(0x4000, 0x10_0000, 0x1000, 0);
/// assert_eq!(space.translate(0x4123).unwrap(), 0x10_0123);
/// ```
#[derive(Debug)]
pub struct AddressSpace {
    /// Sparse virtual-to-physical mapping
    pages: PageMap,
    /// 64KB-granularity access tracking (simulated huge pages)
    tracked_huge: RegionTracker,
    /// 16KB-granularity access tracking (demoted regions)
    tracked_sub: RegionTracker,
}

impl AddressSpace {
    /// Create an empty address space
    ///
    /// # Returns
    /// The address space, or `VmError::Configuration` if `config` is
    /// rejected by [`MemConfig::validate`].
    pub fn new(config: MemConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pages: PageMap::new(config.page_size),
            tracked_huge: RegionTracker::new(HUGE_REGION_SIZE),
            tracked_sub: RegionTracker::new(SUB_REGION_SIZE),
        })
    }

    /// Simulated page size in bytes
    #[inline]
    pub fn page_size(&self) -> u64 {
        self.pages.page_size()
    }

    /// Map `[vaddr, vaddr + size)` to physical memory starting at `paddr`
    ///
    /// A mapping of exactly 64KB counts as a simulated huge-page allocation
    /// and registers the 64KB-aligned region for access tracking.
    ///
    /// # Panics
    /// Per the page-map contract: unaligned `vaddr`, or an existing page
    /// without [`crate::map::flags::CLOBBER`].
    pub fn map(&mut self, vaddr: Addr, paddr: Addr, size: u64, flags: u64) {
        if size == HUGE_REGION_SIZE {
            let base = self.tracked_huge.base_of(vaddr);
            log::debug!("simulating huge page at {:#x} ({}KB)", vaddr, size / 1024);
            self.tracked_huge.register(base);
        }
        self.pages.map(vaddr, paddr, size, flags);
    }

    /// Move the mappings under `[vaddr, vaddr + size)` to `new_vaddr`
    pub fn remap(&mut self, vaddr: Addr, size: u64, new_vaddr: Addr) {
        self.pages.remap(vaddr, size, new_vaddr);
    }

    /// Remove the mappings under `[vaddr, vaddr + size)`
    pub fn unmap(&mut self, vaddr: Addr, size: u64) {
        self.pages.unmap(vaddr, size);
    }

    /// Check that no page in `[vaddr, vaddr + size)` is mapped
    pub fn is_unmapped(&self, vaddr: Addr, size: u64) -> bool {
        self.pages.is_unmapped(vaddr, size)
    }

    /// Entry for the page containing `vaddr`, if mapped
    ///
    /// No side effects; does not feed the access trackers.
    pub fn lookup(&self, vaddr: Addr) -> Option<&Entry> {
        self.pages.lookup(vaddr)
    }

    /// Translate a single virtual address
    ///
    /// Pure lookup plus in-page offset; no access-stats update. Used by the
    /// range translator and by callers that inspect memory without
    /// simulating an access.
    ///
    /// # Returns
    /// The physical address, or a [`PageFault`] carrying `vaddr`.
    pub fn translate(&self, vaddr: Addr) -> std::result::Result<Addr, PageFault> {
        match self.pages.lookup(vaddr) {
            Some(entry) => {
                let paddr = entry.paddr + self.pages.page_offset(vaddr);
                log::trace!("translating {:#x} -> {:#x}", vaddr, paddr);
                Ok(paddr)
            }
            None => {
                log::trace!("couldn't translate {:#x}", vaddr);
                Err(PageFault { vaddr })
            }
        }
    }

    /// Translate one simulated access and record it in the trackers
    ///
    /// On success the request's physical address is set and the access is
    /// counted for the containing 64KB region first, then the 16KB region,
    /// each only if currently registered. The ordering is observable: a
    /// demotion triggered by the 64KB update can register the 16KB region
    /// that this same access then counts.
    ///
    /// # Returns
    /// `Ok(())`, or the [`PageFault`] for the caller's fault-handling path.
    ///
    /// # Panics
    /// If the request's byte range crosses a page boundary; callers must
    /// pre-split such accesses (see [`AddressSpace::translate_range`]).
    pub fn translate_request(
        &mut self,
        req: &mut AccessRequest,
    ) -> std::result::Result<(), PageFault> {
        let vaddr = req.vaddr();
        let last = vaddr + req.size().saturating_sub(1);
        assert!(
            self.pages.page_align(vaddr) == self.pages.page_align(last),
            "request {vaddr:#x}+{} spans page boundaries",
            req.size()
        );

        let paddr = self.translate(vaddr)?;
        req.set_paddr(paddr);
        self.record_access(vaddr);
        Ok(())
    }

    /// Lazily translate an arbitrary `[vaddr, vaddr + size)` range
    ///
    /// Splits the range into page-bounded segments and translates each on
    /// demand; see [`RangeTranslator`].
    pub fn translate_range(&self, vaddr: Addr, size: u64) -> RangeTranslator<'_> {
        RangeTranslator::new(self, vaddr, size)
    }

    /// All mapped (virtual page, physical page) pairs in ascending order
    pub fn mappings(&self) -> Vec<(Addr, Addr)> {
        self.pages.mappings()
    }

    /// Number of mapped pages
    pub fn mapped_pages(&self) -> usize {
        self.pages.len()
    }

    /// Number of regions tracked at the 64KB granularity
    pub fn tracked_huge_regions(&self) -> usize {
        self.tracked_huge.len()
    }

    /// Number of regions tracked at the 16KB granularity
    pub fn tracked_sub_regions(&self) -> usize {
        self.tracked_sub.len()
    }

    /// Debug-only text dump of the page map
    pub fn externalize(&self) -> String {
        self.pages.externalize()
    }

    /// Count one translated access against the registered trackers
    fn record_access(&mut self, vaddr: Addr) {
        // Coarse granularity first; its evaluation may demote into the fine
        // tracker that the second update then sees.
        let base = self.tracked_huge.base_of(vaddr);
        let fire = match self.tracked_huge.get_mut(base) {
            Some(stats) => {
                stats.record(vaddr - base, HUGE_REGION_SIZE);
                stats.total_accesses == EVAL_ACCESS_COUNT
            }
            None => false,
        };
        if fire {
            hotness::evaluate_region(
                base,
                &mut self.tracked_huge,
                Some(&mut self.tracked_sub),
                &mut self.pages,
            );
        }

        let base = self.tracked_sub.base_of(vaddr);
        let fire = match self.tracked_sub.get_mut(base) {
            Some(stats) => {
                stats.record(vaddr - base, SUB_REGION_SIZE);
                stats.total_accesses == EVAL_ACCESS_COUNT
            }
            None => false,
        };
        if fire {
            hotness::evaluate_region(base, &mut self.tracked_sub, None, &mut self.pages);
        }
    }

    /// Flatten the page map into the checkpoint section
    ///
    /// Writes the entry count under `size`, then one `EntryN` subsection per
    /// mapped page (scalars `vaddr`, `paddr`, `flags`), in ascending
    /// virtual-address order so identical maps produce identical
    /// checkpoints. Access-tracking state is not persisted.
    ///
    /// # Panics
    /// If the written entry count disagrees with the map size.
    pub fn save(&self, cp: &mut Section) {
        let sec = cp.section_mut("ptable");
        sec.write_param("size", self.pages.len() as u64);

        let mut count: usize = 0;
        for (vaddr, entry) in self.pages.sorted_entries() {
            let entry_sec = sec.section_mut(&format!("Entry{count}"));
            entry_sec.write_param("vaddr", vaddr);
            entry_sec.write_param("paddr", entry.paddr);
            entry_sec.write_param("flags", entry.flags);
            count += 1;
        }
        assert!(
            count == self.pages.len(),
            "checkpoint entry count mismatch: wrote {count}, map holds {}",
            self.pages.len()
        );
    }

    /// Rebuild the page map from a checkpoint section
    ///
    /// Reads the entry count, then reconstructs each `EntryN` into this
    /// address space's page map, which is expected to be freshly
    /// constructed and empty. All regions restart untracked; the huge-page
    /// heuristic state is deliberately not part of a checkpoint.
    pub fn restore(&mut self, cp: &Section) -> Result<()> {
        let sec = cp.section("ptable")?;
        let count = sec.read_param("size")?;

        for i in 0..count {
            let entry_sec = sec.section(&format!("Entry{i}"))?;
            let vaddr = entry_sec.read_param("vaddr")?;
            let paddr = entry_sec.read_param("paddr")?;
            let flags = entry_sec.read_param("flags")?;
            self.pages.insert_restored(vaddr, Entry::new(paddr, flags));
        }
        Ok(())
    }
}
