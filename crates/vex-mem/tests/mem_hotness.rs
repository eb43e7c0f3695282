//! Hotness Tests - Huge-Page Heuristic Scenarios
//!
//! End-to-end scenarios driving the access path against simulated huge
//! pages: 64KB allocations register tracking, the twentieth access
//! evaluates the region, and skewed access patterns evict or demote pages
//! according to the quadrant decision table.

mod common;

use common::{SpaceFixture, HUGE_VADDR};
use vex_mem::{flags, HUGE_REGION_SIZE, PAGE_SIZE, SUB_REGION_SIZE};

/// Offset of the last page of the 64KB region (fourth quarter)
const TOP_PAGE: u64 = HUGE_REGION_SIZE - PAGE_SIZE;

/// ============================================================================
/// TOP-QUARTER CONCENTRATION
/// ============================================================================

/// Twenty accesses in the top quarter evict the rest and demote the top
///
/// **Bug this finds:** quadrant misclassification, wrong comparison pair,
/// eviction hitting the wrong pages
#[test]
fn test_top_quarter_concentration() {
    let mut fixture = SpaceFixture::with_huge_page();
    assert_eq!(fixture.space.tracked_huge_regions(), 1);

    fixture.access_n(HUGE_VADDR + TOP_PAGE, 20);

    // The evaluated region's tracking entry is removed.
    assert_eq!(fixture.space.tracked_huge_regions(), 0);
    // Top-quarter pages survive, everything below is evicted.
    let survivors = fixture.mapped_in_region(HUGE_VADDR);
    assert_eq!(
        survivors,
        vec![
            HUGE_VADDR + 12 * PAGE_SIZE,
            HUGE_VADDR + 13 * PAGE_SIZE,
            HUGE_VADDR + 14 * PAGE_SIZE,
            HUGE_VADDR + 15 * PAGE_SIZE,
        ]
    );
    // Survivors were demoted to 16KB tracking (one region, already counting
    // the access that triggered the evaluation).
    assert_eq!(fixture.space.tracked_sub_regions(), 1);
}

/// Evicted pages fault on the next translation
#[test]
fn test_evicted_pages_fault() {
    let mut fixture = SpaceFixture::with_huge_page();
    fixture.access_n(HUGE_VADDR + TOP_PAGE, 20);

    let fault = fixture.space.translate(HUGE_VADDR).unwrap_err();
    assert_eq!(fault.vaddr, HUGE_VADDR);
    assert!(fixture.space.translate(HUGE_VADDR + TOP_PAGE).is_ok());
}

/// ============================================================================
/// BOTTOM-QUARTER CONCENTRATION
/// ============================================================================

/// Twenty accesses in the bottom quarter keep only that quarter
#[test]
fn test_bottom_quarter_concentration() {
    let mut fixture = SpaceFixture::with_huge_page();

    fixture.access_n(HUGE_VADDR, 20);

    assert_eq!(fixture.space.tracked_huge_regions(), 0);
    let survivors = fixture.mapped_in_region(HUGE_VADDR);
    assert_eq!(
        survivors,
        vec![
            HUGE_VADDR,
            HUGE_VADDR + PAGE_SIZE,
            HUGE_VADDR + 2 * PAGE_SIZE,
            HUGE_VADDR + 3 * PAGE_SIZE,
        ]
    );
    assert_eq!(fixture.space.tracked_sub_regions(), 1);
}

/// ============================================================================
/// COLD REGION
/// ============================================================================

/// A uniform pattern clears tracking without evicting or demoting
///
/// **Bug this finds:** tracking entry surviving a below-threshold
/// evaluation, or eviction firing on balanced biases
#[test]
fn test_uniform_accesses_only_reset_tracking() {
    let mut fixture = SpaceFixture::with_huge_page();

    // 20 accesses spread across all 16 pages: biases stay under threshold.
    for i in 0..20u64 {
        fixture.access(HUGE_VADDR + (i % 16) * PAGE_SIZE);
    }

    // Evaluation fired at access 20 and cleared the tracking entry anyway.
    assert_eq!(fixture.space.tracked_huge_regions(), 0);
    assert_eq!(fixture.space.tracked_sub_regions(), 0);
    assert_eq!(fixture.mapped_in_region(HUGE_VADDR).len(), 16);

    // With tracking gone, further skewed accesses change nothing.
    fixture.access_n(HUGE_VADDR + TOP_PAGE, 40);
    assert_eq!(fixture.mapped_in_region(HUGE_VADDR).len(), 16);
}

/// A fresh 64KB mapping re-registers tracking after a reset
#[test]
fn test_remapping_reregisters_tracking() {
    let mut fixture = SpaceFixture::with_huge_page();
    for i in 0..20u64 {
        fixture.access(HUGE_VADDR + (i % 16) * PAGE_SIZE);
    }
    assert_eq!(fixture.space.tracked_huge_regions(), 0);

    fixture
        .space
        .map(HUGE_VADDR, 0x90_0000, HUGE_REGION_SIZE, flags::CLOBBER);
    assert_eq!(fixture.space.tracked_huge_regions(), 1);
}

/// ============================================================================
/// DEMOTION
/// ============================================================================

/// A demoted region keeps counting at 16KB granularity and can evict again
///
/// **Bug this finds:** demotion registering the wrong base, the finer
/// tracker not being fed, or demotion itself mutating the page map
#[test]
fn test_demoted_region_evaluates_at_fine_granularity() {
    let mut fixture = SpaceFixture::with_huge_page();

    // Phase 1: top-quarter skew demotes the surviving 16KB region. The
    // triggering access is already counted there.
    fixture.access_n(HUGE_VADDR + TOP_PAGE, 20);
    let sub_base = HUGE_VADDR + HUGE_REGION_SIZE - SUB_REGION_SIZE;
    assert_eq!(fixture.space.tracked_sub_regions(), 1);
    assert_eq!(fixture.mapped_in_region(HUGE_VADDR).len(), 4);

    // Phase 2: nineteen more accesses at the same page reach the fine
    // tracker's threshold with a top-quarter skew of its own.
    fixture.access_n(HUGE_VADDR + TOP_PAGE, 19);

    assert_eq!(fixture.space.tracked_sub_regions(), 0);
    // Within the 16KB region only its top page survives.
    assert_eq!(fixture.mapped_in_region(HUGE_VADDR), vec![HUGE_VADDR + TOP_PAGE]);
    assert!(fixture.space.translate(sub_base).is_err());
    assert!(fixture.space.translate(HUGE_VADDR + TOP_PAGE).is_ok());
}

/// Accesses to an unregistered region never trigger the heuristic
///
/// **Bug this finds:** tracking being created implicitly on access rather
/// than on allocation/demotion
#[test]
fn test_sub_huge_mappings_are_never_tracked() {
    let mut fixture = SpaceFixture::with_defaults();
    // 32KB: two 16KB regions worth of pages, but not a huge-page allocation.
    fixture.space.map(HUGE_VADDR, 0x90_0000, HUGE_REGION_SIZE / 2, 0);

    fixture.access_n(HUGE_VADDR, 100);

    assert_eq!(fixture.space.tracked_huge_regions(), 0);
    assert_eq!(fixture.space.tracked_sub_regions(), 0);
    assert_eq!(fixture.mapped_in_region(HUGE_VADDR).len(), 8);
}
