//! Hotness Evaluator - Simulated Huge-Page Heuristic
//!
//! Consumes the accumulated bias counters of one tracked region and decides,
//! page by page, whether to evict the underlying page-map entries or demote
//! tracking to the finer 16KB granularity. This approximates hardware
//! huge-page promotion/demotion behavior; it is a heuristic, not a model of
//! a real MMU.
//!
//! Evaluation fires when a region's access count reaches exactly
//! [`EVAL_ACCESS_COUNT`]. The evict/demote pass only runs when some bias
//! magnitude reaches [`BIAS_THRESHOLD`], but the region's tracking entry is
//! removed afterwards in every case, so counting restarts from a fresh
//! registration every 20 accesses whether or not the region was hot.

use crate::map::PageMap;
use crate::page::{align_down, Addr};
use crate::stats::{PageAccessStats, RegionTracker};

/// Bias magnitude at which a region is hot enough to re-decide
pub const BIAS_THRESHOLD: i64 = 10;

/// Access count at which a tracked region is evaluated
pub const EVAL_ACCESS_COUNT: i64 = 20;

/// Check whether any bias counter reached the decision threshold
#[inline]
pub fn is_hot(stats: &PageAccessStats) -> bool {
    stats.upper_half_bias.abs() >= BIAS_THRESHOLD
        || stats.upper_quarter_bias.abs() >= BIAS_THRESHOLD
        || stats.lower_quarter_bias.abs() >= BIAS_THRESHOLD
}

/// Decide eviction for the page at `offset` within a hot region
///
/// Each quadrant compares the signs of two of the three bias counters; a
/// disagreement evicts the page, agreement keeps it (and demotes it when the
/// region is tracked at the coarse granularity). The three counters are used
/// conservatively: the half bias is XORed against the quarter bias matching
/// the page's quadrant.
pub fn should_evict(offset: u64, region_size: u64, stats: &PageAccessStats) -> bool {
    let t = BIAS_THRESHOLD;
    if offset >= region_size * 3 / 4 {
        (stats.upper_half_bias <= -t) != (stats.upper_quarter_bias <= -t)
    } else if offset >= region_size / 2 {
        (stats.upper_half_bias <= -t) != (stats.upper_quarter_bias >= t)
    } else if offset >= region_size / 4 {
        (stats.upper_half_bias >= t) != (stats.lower_quarter_bias >= t)
    } else {
        (stats.upper_half_bias >= t) != (stats.lower_quarter_bias <= -t)
    }
}

/// Evaluate the tracked region at `base` and clear its tracking entry
///
/// If the region is hot, every page in it is classified by quadrant:
/// pages failing the sign comparison are evicted from `pages`
/// unconditionally; surviving pages of a coarse-granularity region are
/// demoted by registering their 16KB-aligned base in `demote_into` (when not
/// already tracked). Demotion never touches the page map, and the region's
/// own tracking entry is only removed here, at the end, regardless of the
/// outcome.
pub(crate) fn evaluate_region(
    base: Addr,
    tracker: &mut RegionTracker,
    mut demote_into: Option<&mut RegionTracker>,
    pages: &mut PageMap,
) {
    let Some(stats) = tracker.get(base).copied() else {
        return;
    };
    let region_size = tracker.region_size();

    if is_hot(&stats) {
        log::debug!(
            "evaluating hot region {:#x} ({}KB): half={} upper={} lower={}",
            base,
            region_size / 1024,
            stats.upper_half_bias,
            stats.upper_quarter_bias,
            stats.lower_quarter_bias
        );

        let page_size = pages.page_size();
        let mut offset = 0;
        while offset < region_size {
            let page = base + offset;
            if should_evict(offset, region_size, &stats) {
                log::trace!("evicting page {:#x}", page);
                pages.evict(page);
            } else if let Some(sub) = demote_into.as_deref_mut() {
                let sub_base = align_down(page, sub.region_size());
                if !sub.is_tracked(sub_base) {
                    log::trace!("demoting {:#x} to {}KB tracking", sub_base, sub.region_size() / 1024);
                    sub.register(sub_base);
                }
            }
            offset += page_size;
        }
    }

    // Tracking always resets after an evaluation, hot or not.
    tracker.remove(base);
}
