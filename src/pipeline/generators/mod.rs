//! Candidate cut generators
//!
//! A generator proposes the initial, not-yet-monotonic partition of the
//! non-missing values. The merge engine only ever sees the resulting
//! [`InitialBin`]s, so any strategy can be plugged in: the built-in
//! [`CutStrategy`] variants, or a closure with the [`CutGenerator`] signature.

mod isotonic;
mod kmeans;
mod quantile;
mod range;
mod tree;

use serde::{Deserialize, Serialize};

use super::error::BinningError;
use super::missing::SplitSample;

pub use isotonic::isotonic_cuts;
pub use kmeans::kmeans_cuts;
pub use quantile::quantile_cuts;
pub use range::range_cuts;
pub use tree::tree_cuts;

/// Default number of quantile / equal-width pieces
pub const DEFAULT_PIECES: usize = 20;

/// Default number of k-means clusters
pub const DEFAULT_CLUSTERS: usize = 10;

/// Default Lloyd iteration cap for k-means
pub const DEFAULT_MAX_ITER: usize = 100;

/// Default maximum leaves of the split tree
pub const DEFAULT_MAX_LEAVES: usize = 20;

/// Default minimum samples per tree leaf
pub const DEFAULT_MIN_LEAF_SAMPLES: usize = 5;

/// An initial bin over the non-missing domain: the interval `(lower, upper]`
/// and the indices of its members in the [`SplitSample`].
#[derive(Debug, Clone, PartialEq)]
pub struct InitialBin {
    pub lower: f64,
    pub upper: f64,
    pub members: Vec<usize>,
}

/// Produces the initial ordered partition for the merge engine.
///
/// Bins must be ordered, non-overlapping and cover the whole non-missing
/// domain: the first bin starts at `-inf` and the last ends at `+inf`.
pub trait CutGenerator {
    fn generate(&self, sample: &SplitSample) -> Result<Vec<InitialBin>, BinningError>;
}

impl<F> CutGenerator for F
where
    F: Fn(&SplitSample) -> Result<Vec<InitialBin>, BinningError>,
{
    fn generate(&self, sample: &SplitSample) -> Result<Vec<InitialBin>, BinningError> {
        self(sample)
    }
}

/// Built-in cut generation strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CutStrategy {
    /// Equal-frequency cuts at "lower" percentiles of the values
    Quantile { pieces: usize },
    /// Equal-frequency cuts over the values of bad observations only
    BadQuantile { pieces: usize },
    /// Block boundaries of an isotonic fit of the outcome on the value
    Isotonic,
    /// Equal-width cuts between the minimum and the maximum
    Range { pieces: usize },
    /// Boundaries of a one-dimensional k-means clustering
    KMeans { clusters: usize, max_iter: usize },
    /// Leaves of a single Gini-impurity split tree
    Tree { max_leaves: usize, min_leaf_samples: usize },
    /// Caller-supplied cut points
    Manual { cuts: Vec<f64> },
}

impl Default for CutStrategy {
    fn default() -> Self {
        CutStrategy::Quantile {
            pieces: DEFAULT_PIECES,
        }
    }
}

impl CutStrategy {
    /// Cut points proposed for the sample, before empty bins are pruned
    pub fn cut_points(&self, sample: &SplitSample) -> Result<Vec<f64>, BinningError> {
        let order = sample.sorted_order();
        let sorted_values: Vec<f64> = order.iter().map(|&i| sample.values()[i]).collect();

        match self {
            CutStrategy::Quantile { pieces } => {
                check_at_least("pieces", *pieces, 2)?;
                Ok(quantile_cuts(&sorted_values, *pieces))
            }
            CutStrategy::BadQuantile { pieces } => {
                check_at_least("pieces", *pieces, 2)?;
                let bad_values: Vec<f64> = order
                    .iter()
                    .filter(|&&i| sample.outcomes()[i] == 1)
                    .map(|&i| sample.values()[i])
                    .collect();
                Ok(quantile_cuts(&bad_values, *pieces))
            }
            CutStrategy::Isotonic => {
                let sorted_outcomes: Vec<i32> = order.iter().map(|&i| sample.outcomes()[i]).collect();
                Ok(isotonic_cuts(&sorted_values, &sorted_outcomes))
            }
            CutStrategy::Range { pieces } => {
                check_at_least("pieces", *pieces, 2)?;
                Ok(range_cuts(&sorted_values, *pieces))
            }
            CutStrategy::KMeans { clusters, max_iter } => {
                check_at_least("clusters", *clusters, 2)?;
                check_at_least("max_iter", *max_iter, 1)?;
                Ok(kmeans_cuts(&sorted_values, *clusters, *max_iter))
            }
            CutStrategy::Tree {
                max_leaves,
                min_leaf_samples,
            } => {
                check_at_least("max_leaves", *max_leaves, 2)?;
                check_at_least("min_leaf_samples", *min_leaf_samples, 1)?;
                let sorted_pairs: Vec<(f64, i32)> = order
                    .iter()
                    .map(|&i| (sample.values()[i], sample.outcomes()[i]))
                    .collect();
                Ok(tree_cuts(&sorted_pairs, *max_leaves, *min_leaf_samples))
            }
            CutStrategy::Manual { cuts } => {
                if cuts.iter().any(|c| !c.is_finite()) {
                    return Err(BinningError::Generator(
                        "manual cut points must be finite numbers".to_string(),
                    ));
                }
                Ok(cuts.clone())
            }
        }
    }
}

impl CutGenerator for CutStrategy {
    fn generate(&self, sample: &SplitSample) -> Result<Vec<InitialBin>, BinningError> {
        let cuts = self.cut_points(sample)?;
        Ok(partition_by_cuts(sample, &cuts))
    }
}

impl std::fmt::Display for CutStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CutStrategy::Quantile { .. } => write!(f, "quantile"),
            CutStrategy::BadQuantile { .. } => write!(f, "bad-quantile"),
            CutStrategy::Isotonic => write!(f, "isotonic"),
            CutStrategy::Range { .. } => write!(f, "range"),
            CutStrategy::KMeans { .. } => write!(f, "kmeans"),
            CutStrategy::Tree { .. } => write!(f, "tree"),
            CutStrategy::Manual { .. } => write!(f, "manual"),
        }
    }
}

impl std::str::FromStr for CutStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quantile" | "qtl" => Ok(CutStrategy::Quantile {
                pieces: DEFAULT_PIECES,
            }),
            "bad-quantile" | "bad" => Ok(CutStrategy::BadQuantile {
                pieces: DEFAULT_PIECES,
            }),
            "isotonic" | "iso" => Ok(CutStrategy::Isotonic),
            "range" | "rng" => Ok(CutStrategy::Range {
                pieces: DEFAULT_PIECES,
            }),
            "kmeans" | "kmn" => Ok(CutStrategy::KMeans {
                clusters: DEFAULT_CLUSTERS,
                max_iter: DEFAULT_MAX_ITER,
            }),
            "tree" | "gbm" => Ok(CutStrategy::Tree {
                max_leaves: DEFAULT_MAX_LEAVES,
                min_leaf_samples: DEFAULT_MIN_LEAF_SAMPLES,
            }),
            _ => Err(format!(
                "Unknown cut strategy: '{}'. Use 'quantile', 'bad-quantile', 'isotonic', 'range', 'kmeans', or 'tree'.",
                s
            )),
        }
    }
}

fn check_at_least(name: &str, value: usize, min: usize) -> Result<(), BinningError> {
    if value < min {
        return Err(BinningError::InvalidConfig(format!(
            "{} must be at least {}, got {}",
            name, min, value
        )));
    }
    Ok(())
}

/// Partition the non-missing sample into `(lower, upper]` bins at the given
/// cut points.
///
/// Cuts are sorted and deduplicated; non-finite cuts are ignored. A cut that
/// would leave a bin without members is dropped, so every returned bin is
/// non-empty. The first bin is unbounded below, the last unbounded above.
pub fn partition_by_cuts(sample: &SplitSample, cuts: &[f64]) -> Vec<InitialBin> {
    let order = sample.sorted_order();
    let values = sample.values();
    let n = order.len();

    let mut sorted_cuts: Vec<f64> = cuts.iter().copied().filter(|c| c.is_finite()).collect();
    sorted_cuts.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted_cuts.dedup();

    let mut bins = Vec::with_capacity(sorted_cuts.len() + 1);
    let mut lower = f64::NEG_INFINITY;
    let mut start = 0;

    for cut in sorted_cuts {
        let end = start + order[start..].partition_point(|&i| values[i] <= cut);
        if end == start || end == n {
            continue;
        }
        bins.push(InitialBin {
            lower,
            upper: cut,
            members: order[start..end].to_vec(),
        });
        lower = cut;
        start = end;
    }

    bins.push(InitialBin {
        lower,
        upper: f64::INFINITY,
        members: order[start..].to_vec(),
    });

    bins
}
