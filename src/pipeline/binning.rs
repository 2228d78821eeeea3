//! Fitting a monotonic binning and applying its WoE transform
//!
//! [`fit`] chains the pipeline stages: validation and missing split, initial
//! partition from a [`CutGenerator`], monotonic merging, then missing-bin
//! attachment. The resulting [`FittedBinning`] is immutable, holds no
//! training observations, and can be serialized for later scoring.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::attach::{attach_missing, MissingPlacement};
use super::error::BinningError;
use super::generators::CutGenerator;
use super::merge::{merge_monotonic, MergeConfig, MergedBin};
use super::missing::split_missing;
use super::monotonicity::Direction;
use super::stats::{compute_stats, BinCounts, BinStats};

/// Whether the fit found a usable discretization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinningStatus {
    /// Two or more monotonic interval bins
    Monotonic,
    /// Everything merged into a single interval bin
    Collapsed,
}

impl std::fmt::Display for BinningStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinningStatus::Monotonic => write!(f, "monotonic"),
            BinningStatus::Collapsed => write!(f, "collapsed"),
        }
    }
}

/// Bin id and WoE assigned to a single value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WoeAssignment {
    pub bin: usize,
    pub woe: Option<f64>,
}

/// Dataset-level view of a fitted binning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinSummary {
    pub sample_size: usize,
    pub bad_rate: f64,
    pub iv: f64,
    pub ks: f64,
    pub missing_rate: f64,
}

/// A fitted monotonic binning of one feature.
///
/// `bins` lists the interval bins in ascending value order (ids `1..=n`),
/// followed by the standalone missing bin (id 0) when there is one. `cuts`
/// are the `n - 1` inner boundaries; bin `i` covers `(cuts[i-1], cuts[i]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFittedBinning")]
pub struct FittedBinning {
    cuts: Vec<f64>,
    bins: Vec<BinStats>,
    direction: Direction,
    status: BinningStatus,
}

/// Unchecked form of [`FittedBinning`] as read from JSON
#[derive(Deserialize)]
struct RawFittedBinning {
    cuts: Vec<f64>,
    bins: Vec<BinStats>,
    direction: Direction,
    status: BinningStatus,
}

impl TryFrom<RawFittedBinning> for FittedBinning {
    type Error = BinningError;

    fn try_from(raw: RawFittedBinning) -> Result<Self, Self::Error> {
        let invalid = BinningError::InvalidBinning;

        if let Some(cut) = raw.cuts.iter().find(|c| !c.is_finite()) {
            return Err(invalid(format!("cut {} is not finite", cut)));
        }
        if let Some(pair) = raw.cuts.windows(2).find(|w| w[0] >= w[1]) {
            return Err(invalid(format!(
                "cuts must be strictly increasing, found {} before {}",
                pair[0], pair[1]
            )));
        }

        let n_intervals = raw.cuts.len() + 1;
        if raw.bins.len() != n_intervals && raw.bins.len() != n_intervals + 1 {
            return Err(invalid(format!(
                "{} cuts need {} or {} bins, found {}",
                raw.cuts.len(),
                n_intervals,
                n_intervals + 1,
                raw.bins.len()
            )));
        }
        for (i, bin) in raw.bins[..n_intervals].iter().enumerate() {
            if bin.bin != i + 1 {
                return Err(invalid(format!("interval bin {} has id {}", i + 1, bin.bin)));
            }
        }
        if let Some(extra) = raw.bins.get(n_intervals) {
            if extra.bin != 0 {
                return Err(invalid(format!("missing bin must have id 0, found {}", extra.bin)));
            }
        }

        Ok(FittedBinning {
            cuts: raw.cuts,
            bins: raw.bins,
            direction: raw.direction,
            status: raw.status,
        })
    }
}

/// Fit a monotonic binning of `values` against binary `outcomes`.
///
/// `None` and NaN values are treated as missing. Input and configuration
/// errors, and generator failures, are returned before any merging; a
/// collapsed result is reported through [`FittedBinning::status`].
pub fn fit<G>(
    values: &[Option<f64>],
    outcomes: &[i32],
    generator: &G,
    config: &MergeConfig,
) -> Result<FittedBinning, BinningError>
where
    G: CutGenerator + ?Sized,
{
    config.validate()?;

    let sample = split_missing(values, outcomes)?;
    let initial = generator.generate(&sample)?;
    if initial.is_empty() {
        return Err(BinningError::Generator(
            "generator returned an empty partition".to_string(),
        ));
    }

    let totals = sample.totals();
    let merged = merge_monotonic(&sample, &initial, &totals, config);
    let thresholds = config.thresholds(sample.len());
    let cuts = merged.cuts();
    let attachment = attach_missing(merged.bins, sample.missing(), config, &thresholds);

    let folded = match attachment.placement {
        MissingPlacement::Folded { index } => Some(index),
        _ => None,
    };

    let mut counts: Vec<BinCounts> = attachment.bins.iter().map(|b| b.counts).collect();
    if let Some(standalone) = attachment.standalone {
        counts.push(standalone);
    }
    let scores = compute_stats(&counts, &totals);

    let n_intervals = attachment.bins.len();
    let bins: Vec<BinStats> = counts
        .iter()
        .zip(&scores.bins)
        .enumerate()
        .map(|(i, (c, score))| {
            if i < n_intervals {
                let rule = interval_rule(&attachment.bins[i], n_intervals, folded == Some(i));
                BinStats::new(i + 1, c, score, rule)
            } else {
                BinStats::new(0, c, score, "x is missing".to_string())
            }
        })
        .collect();

    let status = if merged.collapsed {
        BinningStatus::Collapsed
    } else {
        BinningStatus::Monotonic
    };

    debug!(
        bins = n_intervals,
        missing = ?attachment.placement,
        iv = scores.iv,
        ks = scores.ks,
        %status,
        "Fitted binning"
    );

    Ok(FittedBinning {
        cuts,
        bins,
        direction: merged.direction,
        status,
    })
}

fn interval_rule(bin: &MergedBin, n_intervals: usize, with_missing: bool) -> String {
    let base = if n_intervals == 1 {
        "x is not missing".to_string()
    } else if bin.lower == f64::NEG_INFINITY {
        format!("x <= {}", bin.upper)
    } else if bin.upper == f64::INFINITY {
        format!("x > {}", bin.lower)
    } else {
        format!("{} < x <= {}", bin.lower, bin.upper)
    };

    match (n_intervals, with_missing) {
        (1, true) => "any x".to_string(),
        (_, true) => format!("{} or missing", base),
        _ => base,
    }
}

impl FittedBinning {
    pub fn cuts(&self) -> &[f64] {
        &self.cuts
    }

    /// All bins, interval bins first and a standalone missing bin last
    pub fn bins(&self) -> &[BinStats] {
        &self.bins
    }

    /// The interval bins in ascending value order
    pub fn interval_bins(&self) -> &[BinStats] {
        &self.bins[..self.cuts.len() + 1]
    }

    /// The bin that received missing values at fit time, standalone or folded
    pub fn missing_bin(&self) -> Option<&BinStats> {
        self.bins.iter().find(|b| b.miss > 0)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn status(&self) -> BinningStatus {
        self.status
    }

    pub fn is_collapsed(&self) -> bool {
        self.status == BinningStatus::Collapsed
    }

    pub fn total_iv(&self) -> f64 {
        self.bins.iter().map(|b| b.iv).sum()
    }

    /// The bin a value falls into.
    ///
    /// Present values use `(lower, upper]` intervals; values beyond the outer
    /// cuts land in the first or last bin.
    pub fn bin_for(&self, value: Option<f64>) -> Result<&BinStats, BinningError> {
        match value.filter(|v| !v.is_nan()) {
            None => self.missing_bin().ok_or(BinningError::NoMissingBin),
            Some(v) => {
                let idx = self.cuts.partition_point(|&c| c < v);
                Ok(&self.bins[idx])
            }
        }
    }

    /// Bin id and WoE for a single value
    pub fn apply(&self, value: Option<f64>) -> Result<WoeAssignment, BinningError> {
        let bin = self.bin_for(value)?;
        Ok(WoeAssignment {
            bin: bin.bin,
            woe: bin.woe,
        })
    }

    /// Apply to many values, keeping their order
    pub fn apply_batch(&self, values: &[Option<f64>]) -> Result<Vec<WoeAssignment>, BinningError> {
        values.iter().map(|&v| self.apply(v)).collect()
    }

    /// Re-aggregate the stored bin statistics
    pub fn summarize(&self) -> BinSummary {
        let sample_size: usize = self.bins.iter().map(|b| b.freq).sum();
        let bads: f64 = self.bins.iter().map(|b| b.bads).sum();
        let missing: usize = self.bins.iter().map(|b| b.miss).sum();

        let (bad_rate, missing_rate) = if sample_size > 0 {
            (bads / sample_size as f64, missing as f64 / sample_size as f64)
        } else {
            (0.0, 0.0)
        };

        BinSummary {
            sample_size,
            bad_rate,
            iv: self.total_iv(),
            ks: self.bins.iter().map(|b| b.ks).fold(0.0, f64::max),
            missing_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::generators::{CutStrategy, InitialBin};
    use crate::pipeline::missing::SplitSample;

    fn present(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().map(|&v| Some(v)).collect()
    }

    #[test]
    fn test_interval_rules() {
        let first = MergedBin {
            lower: f64::NEG_INFINITY,
            upper: 30.0,
            counts: BinCounts::default(),
        };
        let middle = MergedBin {
            lower: 30.0,
            upper: 60.5,
            counts: BinCounts::default(),
        };
        let last = MergedBin {
            lower: 60.5,
            upper: f64::INFINITY,
            counts: BinCounts::default(),
        };
        assert_eq!(interval_rule(&first, 3, false), "x <= 30");
        assert_eq!(interval_rule(&middle, 3, false), "30 < x <= 60.5");
        assert_eq!(interval_rule(&last, 3, true), "x > 60.5 or missing");
    }

    #[test]
    fn test_fit_two_bin_scenario() {
        let values = present(&[10.0, 20.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0]);
        let outcomes = [0, 0, 1, 0, 1, 0, 1, 1, 0, 1];
        let binning = fit(
            &values,
            &outcomes,
            &CutStrategy::Quantile { pieces: 3 },
            &MergeConfig::default(),
        )
        .unwrap();

        assert_eq!(binning.status(), BinningStatus::Monotonic);
        assert_eq!(binning.cuts(), &[30.0]);
        assert_eq!(binning.bins().len(), 2);
        assert_eq!(binning.bins()[0].rule, "x <= 30");
        assert_eq!(binning.bins()[1].rule, "x > 30");
        assert!(binning.missing_bin().is_none());

        assert_eq!(binning.apply(Some(30.0)).unwrap().bin, 1);
        assert_eq!(binning.apply(Some(30.5)).unwrap().bin, 2);
        assert_eq!(binning.apply(Some(-1e9)).unwrap().bin, 1);
        assert_eq!(binning.apply(Some(1e9)).unwrap().bin, 2);
        assert_eq!(binning.apply(None), Err(BinningError::NoMissingBin));
        assert_eq!(binning.apply(Some(f64::NAN)), Err(BinningError::NoMissingBin));
    }

    #[test]
    fn test_fit_folds_missing_with_equal_rate() {
        let mut values = present(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let mut outcomes = vec![0, 0, 1, 0, 1, 1, 0, 1];
        values.extend([None, None, None, None]);
        outcomes.extend([1, 0, 0, 0]);

        let config = MergeConfig {
            direction: Direction::Increasing,
            ..Default::default()
        };
        let binning = fit(&values, &outcomes, &CutStrategy::Manual { cuts: vec![4.0] }, &config).unwrap();

        // Rates 0.25 and 0.75; missing rate 0.25 folds into the first bin
        let missing = binning.missing_bin().unwrap();
        assert_eq!(missing.bin, 1);
        assert_eq!(missing.miss, 4);
        assert_eq!(missing.freq, 8);
        assert_eq!(missing.rule, "x <= 4 or missing");
        assert_eq!(binning.apply(None).unwrap().bin, 1);
    }

    #[test]
    fn test_fit_standalone_missing_bin() {
        let mut values = present(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let mut outcomes = vec![0, 0, 1, 0, 1, 1, 0, 1];
        values.extend([None, None, None, None]);
        outcomes.extend([1, 0, 1, 0]);

        let binning = fit(
            &values,
            &outcomes,
            &CutStrategy::Manual { cuts: vec![4.0] },
            &MergeConfig::default(),
        )
        .unwrap();

        assert_eq!(binning.bins().len(), 3);
        assert_eq!(binning.interval_bins().len(), 2);
        let missing = binning.missing_bin().unwrap();
        assert_eq!(missing.bin, 0);
        assert_eq!(missing.freq, 4);
        assert_eq!(missing.rule, "x is missing");
        assert_eq!(binning.bins().last(), Some(missing));
        assert_eq!(binning.apply(None).unwrap().bin, 0);
        assert_eq!(binning.apply(Some(2.0)).unwrap().bin, 1);
    }

    #[test]
    fn test_summarize() {
        let mut values = present(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let mut outcomes = vec![0, 0, 0, 1, 0, 1, 1, 1];
        values.extend([None, None]);
        outcomes.extend([1, 0]);

        let binning = fit(
            &values,
            &outcomes,
            &CutStrategy::Manual { cuts: vec![4.0] },
            &MergeConfig::default(),
        )
        .unwrap();
        let summary = binning.summarize();

        assert_eq!(summary.sample_size, 10);
        assert!((summary.bad_rate - 0.5).abs() < 1e-12);
        assert!((summary.missing_rate - 0.2).abs() < 1e-12);
        assert!((summary.iv - binning.total_iv()).abs() < 1e-12);
        assert!(summary.ks >= 0.0 && summary.ks <= 100.0);
    }

    #[test]
    fn test_empty_partition_is_generator_error() {
        let values = present(&[1.0, 2.0]);
        let empty = |_: &SplitSample| -> Result<Vec<InitialBin>, BinningError> { Ok(Vec::new()) };
        assert!(matches!(
            fit(&values, &[0, 1], &empty, &MergeConfig::default()),
            Err(BinningError::Generator(_))
        ));
    }

    #[test]
    fn test_json_reload_keeps_every_training_assignment() {
        use rand::{Rng, SeedableRng};

        for seed in 0..20 {
            let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
            let values: Vec<Option<f64>> = (0..200).map(|_| Some(rng.gen::<f64>() * 143.0)).collect();
            let outcomes: Vec<i32> = values
                .iter()
                .map(|v| i32::from(rng.gen::<f64>() * 143.0 < v.unwrap_or(0.0)))
                .collect();

            for strategy in [CutStrategy::Quantile { pieces: 10 }, CutStrategy::Isotonic] {
                let binning = fit(&values, &outcomes, &strategy, &MergeConfig::default()).unwrap();
                let json = serde_json::to_string(&binning).unwrap();
                let restored: FittedBinning = serde_json::from_str(&json).unwrap();

                assert_eq!(restored, binning, "seed {} {}", seed, strategy);
                assert_eq!(
                    restored.apply_batch(&values).unwrap(),
                    binning.apply_batch(&values).unwrap()
                );
            }
        }
    }

    fn binning_json(cuts: &str, ids: &[usize]) -> String {
        let bins: Vec<String> = ids
            .iter()
            .map(|id| {
                format!(
                    r#"{{"bin":{},"freq":10,"miss":0,"bads":5.0,"rate":0.5,"woe":0.0,"iv":0.0,"ks":0.0,"rule":"x"}}"#,
                    id
                )
            })
            .collect();
        format!(
            r#"{{"cuts":{},"bins":[{}],"direction":"increasing","status":"monotonic"}}"#,
            cuts,
            bins.join(",")
        )
    }

    #[test]
    fn test_inconsistent_json_is_rejected() {
        let ok: FittedBinning = serde_json::from_str(&binning_json("[1.0,2.0]", &[1, 2, 3, 0])).unwrap();
        assert_eq!(ok.apply(Some(5.0)).unwrap().bin, 3);

        for (cuts, ids) in [
            ("[1.0,2.0]", vec![1]),
            ("[1.0,2.0]", vec![1, 2, 3, 0, 0]),
            ("[2.0,1.0]", vec![1, 2, 3]),
            ("[1.0,1.0]", vec![1, 2, 3]),
            ("[1.0]", vec![1, 0]),
            ("[1.0]", vec![1, 2, 3]),
            ("[1.0]", vec![2, 1]),
        ] {
            let err = serde_json::from_str::<FittedBinning>(&binning_json(cuts, &ids)).unwrap_err();
            assert!(err.to_string().contains("invalid binning"), "{} {:?}: {}", cuts, ids, err);
        }
    }
}
