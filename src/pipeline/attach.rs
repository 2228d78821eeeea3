//! Missing-bin attachment
//!
//! Runs once, after the merge engine has converged on the non-missing values.
//! The missing group either folds into the interval bin with the closest bad
//! rate or becomes a standalone bin listed after every interval bin.
//!
//! Folding into the closest-rate bin cannot break monotonicity: the merged
//! rate lies between the target's rate and the missing rate, and the missing
//! rate is nearer the target than either neighbour.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::merge::{MergeConfig, MergedBin, Thresholds};
use super::missing::MissingGroup;
use super::stats::BinCounts;

/// Where the missing values of a fit ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MissingPlacement {
    /// No missing values at fit time
    Absent,
    /// Folded into the interval bin at this 0-based index
    Folded { index: usize },
    /// Kept as its own bin
    Standalone,
}

/// Interval bins plus the placement of the missing group
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub bins: Vec<MergedBin>,
    /// Counts of the standalone missing bin, when there is one
    pub standalone: Option<BinCounts>,
    pub placement: MissingPlacement,
}

/// Index of the interval bin whose bad rate is closest to `rate`, the
/// leftmost on ties
fn closest_rate_bin(bins: &[MergedBin], rate: f64) -> usize {
    let mut best = 0;
    let mut best_gap = f64::MAX;
    for (i, bin) in bins.iter().enumerate() {
        let gap = (bin.counts.rate() - rate).abs();
        if gap < best_gap {
            best_gap = gap;
            best = i;
        }
    }
    best
}

/// Attach the missing group to a converged partition.
///
/// The group folds into its closest-rate bin when it has no bads or no goods,
/// when its rate is within `missing_rate_tolerance` of that bin's rate, or
/// when it falls short of the size minimums. Otherwise it stays standalone.
///
/// A partition collapsed into one bin without bads or without goods always
/// absorbs the group, so no fit ends with a degenerate interval bin beside a
/// standalone missing bin.
pub fn attach_missing(
    mut bins: Vec<MergedBin>,
    missing: &MissingGroup,
    config: &MergeConfig,
    thresholds: &Thresholds,
) -> Attachment {
    if missing.is_empty() || bins.is_empty() {
        return Attachment {
            bins,
            standalone: None,
            placement: MissingPlacement::Absent,
        };
    }

    let counts = missing.counts();
    let rate = counts.rate();
    let target = closest_rate_bin(&bins, rate);
    let gap = (bins[target].counts.rate() - rate).abs();

    let degenerate = counts.is_degenerate() || bins[target].counts.is_degenerate();
    let within_tolerance = gap <= config.missing_rate_tolerance;
    let undersized = thresholds.is_undersized(&counts);

    if degenerate || within_tolerance || undersized {
        debug!(
            missing = counts.freq,
            rate,
            target,
            degenerate,
            within_tolerance,
            undersized,
            "Folding missing values into closest bin"
        );
        bins[target].counts = bins[target].counts.merged(&counts);
        Attachment {
            bins,
            standalone: None,
            placement: MissingPlacement::Folded { index: target },
        }
    } else {
        debug!(missing = counts.freq, rate, gap, "Keeping standalone missing bin");
        Attachment {
            bins,
            standalone: Some(counts),
            placement: MissingPlacement::Standalone,
        }
    }
}
