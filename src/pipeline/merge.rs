//! Monotonic bin-merge engine
//!
//! Starting from a generator's initial partition, adjacent bins are merged
//! until every bin has both bads and goods, meets the size minimums, and the
//! bad rates move strictly in one direction. An optional bin cap is then
//! enforced by greedy merges that lose the least Information Value.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::BinningError;
use super::generators::InitialBin;
use super::missing::SplitSample;
use super::monotonicity::Direction;
use super::stats::{calculate_woe_iv, BinCounts, Totals};

/// Minimum bin size, either a share of the non-missing sample or a row count
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinBinSize {
    Fraction(f64),
    Count(usize),
}

impl MinBinSize {
    /// Minimum number of observations for a sample of `non_missing` rows
    pub fn resolve(&self, non_missing: usize) -> usize {
        match *self {
            MinBinSize::Fraction(f) => (f * non_missing as f64).ceil() as usize,
            MinBinSize::Count(n) => n,
        }
    }
}

impl Default for MinBinSize {
    fn default() -> Self {
        MinBinSize::Count(1)
    }
}

impl std::fmt::Display for MinBinSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MinBinSize::Fraction(v) => write!(f, "{}", v),
            MinBinSize::Count(n) => write!(f, "{}", n),
        }
    }
}

impl std::str::FromStr for MinBinSize {
    type Err = String;

    /// Values below 1 are fractions, whole numbers from 1 up are counts
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| format!("'{}' is not a number", s))?;

        if !value.is_finite() || value <= 0.0 {
            return Err(format!("min bin size must be positive, got {}", s));
        }
        if value < 1.0 {
            return Ok(MinBinSize::Fraction(value));
        }
        if value.fract() != 0.0 {
            return Err(format!(
                "min bin size must be a fraction below 1 or a whole count, got {}",
                s
            ));
        }
        Ok(MinBinSize::Count(value as usize))
    }
}

/// Options controlling the merge engine and missing-bin attachment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeConfig {
    pub direction: Direction,
    pub min_bin_size: MinBinSize,
    /// Minimum number of bads per bin
    pub min_bads: f64,
    /// Optional cap on the number of interval bins
    pub max_bins: Option<usize>,
    /// Largest bad-rate gap at which the missing group still folds into its
    /// closest bin
    pub missing_rate_tolerance: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            direction: Direction::Auto,
            min_bin_size: MinBinSize::default(),
            min_bads: 1.0,
            max_bins: None,
            missing_rate_tolerance: 0.0,
        }
    }
}

impl MergeConfig {
    pub fn validate(&self) -> Result<(), BinningError> {
        if let MinBinSize::Fraction(f) = self.min_bin_size {
            if !(f > 0.0 && f <= 1.0) {
                return Err(BinningError::InvalidConfig(format!(
                    "min_bin_size fraction must be in (0, 1], got {}",
                    f
                )));
            }
        }
        if !self.min_bads.is_finite() || self.min_bads < 0.0 {
            return Err(BinningError::InvalidConfig(format!(
                "min_bads must be a non-negative number, got {}",
                self.min_bads
            )));
        }
        if self.max_bins == Some(0) {
            return Err(BinningError::InvalidConfig(
                "max_bins must be at least 1".to_string(),
            ));
        }
        if !self.missing_rate_tolerance.is_finite() || self.missing_rate_tolerance < 0.0 {
            return Err(BinningError::InvalidConfig(format!(
                "missing_rate_tolerance must be a non-negative number, got {}",
                self.missing_rate_tolerance
            )));
        }
        Ok(())
    }

    /// Size thresholds resolved against the non-missing sample size
    pub fn thresholds(&self, non_missing: usize) -> Thresholds {
        Thresholds {
            min_size: self.min_bin_size.resolve(non_missing),
            min_bads: self.min_bads,
        }
    }
}

/// Resolved size minimums shared by the merge and attachment steps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub min_size: usize,
    pub min_bads: f64,
}

impl Thresholds {
    pub fn is_undersized(&self, counts: &BinCounts) -> bool {
        counts.freq < self.min_size || counts.bads < self.min_bads
    }
}

/// An interval bin `(lower, upper]` of the working partition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergedBin {
    pub lower: f64,
    pub upper: f64,
    pub counts: BinCounts,
}

impl MergedBin {
    fn absorb(&mut self, right: &MergedBin) {
        self.upper = right.upper;
        self.counts = self.counts.merged(&right.counts);
    }
}

/// Converged partition of the non-missing sample
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub bins: Vec<MergedBin>,
    /// Direction the bad rates follow, never `Auto`
    pub direction: Direction,
    /// True when only a single bin is left
    pub collapsed: bool,
}

impl MergeOutcome {
    /// Inner bin boundaries in ascending order
    pub fn cuts(&self) -> Vec<f64> {
        self.bins[..self.bins.len() - 1]
            .iter()
            .map(|b| b.upper)
            .collect()
    }
}

fn needs_merge(
    left: &MergedBin,
    right: &MergedBin,
    direction: Direction,
    thresholds: &Thresholds,
) -> bool {
    !direction.is_consistent(left.counts.rate(), right.counts.rate())
        || left.counts.is_degenerate()
        || right.counts.is_degenerate()
        || thresholds.is_undersized(&left.counts)
        || thresholds.is_undersized(&right.counts)
}

fn iv_of(counts: &BinCounts, totals: &Totals) -> f64 {
    calculate_woe_iv(counts, totals).map_or(0.0, |(_, iv)| iv)
}

/// Merge bin `idx` with its right neighbour
fn merge_at(bins: &mut Vec<MergedBin>, idx: usize) {
    let right = bins.remove(idx + 1);
    bins[idx].absorb(&right);
}

/// Run the merge engine over the initial partition of `sample`.
///
/// The scan merges the first offending adjacent pair, left to right, and
/// starts over, so the result depends only on bin positions and never on the
/// size of a violation. `totals` are the dataset totals (missing group
/// included) used to score IV for the bin cap. Always returns at least one
/// bin.
pub fn merge_monotonic(
    sample: &SplitSample,
    initial: &[InitialBin],
    totals: &Totals,
    config: &MergeConfig,
) -> MergeOutcome {
    debug_assert!(!initial.is_empty(), "initial partition must not be empty");
    debug_assert!(
        initial.windows(2).all(|w| w[0].upper == w[1].lower),
        "initial bins must be contiguous"
    );

    let thresholds = config.thresholds(sample.len());

    let mut bins: Vec<MergedBin> = initial
        .iter()
        .map(|b| MergedBin {
            lower: b.lower,
            upper: b.upper,
            counts: sample.counts_for(&b.members),
        })
        .collect();

    let rates: Vec<f64> = bins.iter().map(|b| b.counts.rate()).collect();
    let direction = config.direction.resolve(&rates);
    debug!(
        initial_bins = bins.len(),
        requested = %config.direction,
        resolved = %direction,
        "Resolved monotonic direction"
    );

    while bins.len() > 1 {
        let candidate =
            (0..bins.len() - 1).find(|&i| needs_merge(&bins[i], &bins[i + 1], direction, &thresholds));

        match candidate {
            Some(i) => {
                debug!(
                    left_upper = bins[i].upper,
                    left_rate = bins[i].counts.rate(),
                    right_rate = bins[i + 1].counts.rate(),
                    remaining = bins.len() - 1,
                    "Merging offending pair"
                );
                merge_at(&mut bins, i);
            }
            None => break,
        }
    }

    if let Some(cap) = config.max_bins {
        while bins.len() > cap && bins.len() > 1 {
            let mut min_loss = f64::MAX;
            let mut merge_idx = 0;

            for i in 0..bins.len() - 1 {
                let merged = bins[i].counts.merged(&bins[i + 1].counts);
                let current = iv_of(&bins[i].counts, totals) + iv_of(&bins[i + 1].counts, totals);
                let loss = current - iv_of(&merged, totals);

                if loss < min_loss {
                    min_loss = loss;
                    merge_idx = i;
                }
            }

            debug!(
                left_upper = bins[merge_idx].upper,
                iv_loss = min_loss,
                cap,
                "Merging to honour bin cap"
            );
            merge_at(&mut bins, merge_idx);
        }
    }

    let collapsed = bins.len() == 1;
    MergeOutcome {
        bins,
        direction,
        collapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::generators::partition_by_cuts;
    use crate::pipeline::missing::split_missing;

    fn sample(values: &[f64], outcomes: &[i32]) -> SplitSample {
        let values: Vec<Option<f64>> = values.iter().map(|&v| Some(v)).collect();
        split_missing(&values, outcomes).unwrap()
    }

    fn run(values: &[f64], outcomes: &[i32], cuts: &[f64], config: &MergeConfig) -> MergeOutcome {
        let s = sample(values, outcomes);
        let initial = partition_by_cuts(&s, cuts);
        merge_monotonic(&s, &initial, &s.totals(), config)
    }

    #[test]
    fn test_min_bin_size_resolve() {
        assert_eq!(MinBinSize::Fraction(0.05).resolve(100), 5);
        assert_eq!(MinBinSize::Fraction(0.05).resolve(101), 6);
        assert_eq!(MinBinSize::Count(7).resolve(100), 7);
    }

    #[test]
    fn test_min_bin_size_from_str() {
        assert_eq!("0.05".parse::<MinBinSize>().unwrap(), MinBinSize::Fraction(0.05));
        assert_eq!("30".parse::<MinBinSize>().unwrap(), MinBinSize::Count(30));
        assert!("2.5".parse::<MinBinSize>().is_err());
        assert!("0".parse::<MinBinSize>().is_err());
        assert!("abc".parse::<MinBinSize>().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        assert!(MergeConfig::default().validate().is_ok());

        let zero_cap = MergeConfig {
            max_bins: Some(0),
            ..Default::default()
        };
        assert!(matches!(zero_cap.validate(), Err(BinningError::InvalidConfig(_))));

        let fraction = MergeConfig {
            min_bin_size: MinBinSize::Fraction(1.5),
            ..Default::default()
        };
        assert!(fraction.validate().is_err());

        let tolerance = MergeConfig {
            missing_rate_tolerance: -0.1,
            ..Default::default()
        };
        assert!(tolerance.validate().is_err());
    }

    #[test]
    fn test_equal_rates_are_merged() {
        let values = [10.0, 20.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0];
        let outcomes = [0, 0, 1, 0, 1, 0, 1, 1, 0, 1];
        let outcome = run(&values, &outcomes, &[30.0, 60.0], &MergeConfig::default());

        assert_eq!(outcome.direction, Direction::Increasing);
        assert_eq!(outcome.bins.len(), 2);
        assert_eq!(outcome.cuts(), vec![30.0]);
        assert_eq!(outcome.bins[0].counts, BinCounts::new(4, 1.0));
        assert_eq!(outcome.bins[1].counts, BinCounts::new(6, 4.0));
        assert!(!outcome.collapsed);
    }

    #[test]
    fn test_first_violation_is_merged_first() {
        // Rates: 0.5, 0.25, 0.75, 0.5 with forced increasing direction
        let values: Vec<f64> = (1..=16).map(|v| v as f64).collect();
        let outcomes = [1, 0, 1, 0, 1, 0, 0, 0, 1, 1, 1, 0, 1, 0, 1, 0];
        let config = MergeConfig {
            direction: Direction::Increasing,
            ..Default::default()
        };
        let outcome = run(&values, &outcomes, &[4.0, 8.0, 12.0], &config);

        // x <= 8 has rate 0.375, x > 8 has rate 0.625
        assert_eq!(outcome.cuts(), vec![8.0]);
        assert!(outcome
            .bins
            .windows(2)
            .all(|w| w[0].counts.rate() < w[1].counts.rate()));
    }

    #[test]
    fn test_auto_direction_decreasing() {
        let values: Vec<f64> = (1..=8).map(|v| v as f64).collect();
        let outcomes = [1, 1, 1, 0, 1, 0, 0, 0];
        let outcome = run(&values, &outcomes, &[4.0], &MergeConfig::default());

        assert_eq!(outcome.direction, Direction::Decreasing);
        assert_eq!(outcome.bins.len(), 2);
    }

    #[test]
    fn test_all_goods_collapse() {
        let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let outcomes = [0; 10];
        let outcome = run(&values, &outcomes, &[3.0, 6.0, 8.0], &MergeConfig::default());

        assert!(outcome.collapsed);
        assert_eq!(outcome.bins.len(), 1);
        assert_eq!(outcome.bins[0].lower, f64::NEG_INFINITY);
        assert_eq!(outcome.bins[0].upper, f64::INFINITY);
        assert!(outcome.cuts().is_empty());
    }

    #[test]
    fn test_undersized_bins_are_merged() {
        let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let outcomes = [0, 1, 0, 0, 1, 1, 0, 1, 1, 1];
        let config = MergeConfig {
            direction: Direction::Increasing,
            min_bin_size: MinBinSize::Fraction(0.4),
            ..Default::default()
        };
        let outcome = run(&values, &outcomes, &[2.0, 5.0, 8.0], &config);

        assert!(outcome.bins.iter().all(|b| b.counts.freq >= 4));
    }

    #[test]
    fn test_max_bins_cap() {
        let values: Vec<f64> = (1..=12).map(|v| v as f64).collect();
        let outcomes = [0, 0, 0, 1, 0, 0, 1, 1, 0, 1, 1, 1];
        let config = MergeConfig {
            direction: Direction::Increasing,
            max_bins: Some(2),
            ..Default::default()
        };
        let outcome = run(&values, &outcomes, &[3.0, 6.0, 9.0], &config);

        // Before the cap: rates 0.0, 0.33, 0.67, 1.0 are degenerate at both ends
        assert!(outcome.bins.len() <= 2);
        assert!(outcome
            .bins
            .windows(2)
            .all(|w| w[0].counts.rate() < w[1].counts.rate()));
        let freq: usize = outcome.bins.iter().map(|b| b.counts.freq).sum();
        assert_eq!(freq, 12);
    }
}
