//! Weight of Evidence (WoE), Information Value (IV) and KS statistics
//!
//! Pure functions scoring any ordered partition of the data. Degenerate bins
//! (no bads or no goods) are scored with an undefined WoE instead of failing:
//! the merge engine reads degeneracy as a merge signal.
//!
//! Uses the ln(%bad/%good) convention:
//! - WoE > 0 indicates higher risk than the population
//! - WoE < 0 indicates lower risk than the population

use serde::{Deserialize, Serialize};

/// Raw counts of a bin
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BinCounts {
    /// Number of observations in the bin
    pub freq: usize,
    /// Number of those observations whose value was missing
    pub miss: usize,
    /// Number of observations with outcome = 1
    pub bads: f64,
}

impl BinCounts {
    pub fn new(freq: usize, bads: f64) -> Self {
        Self { freq, miss: 0, bads }
    }

    pub fn goods(&self) -> f64 {
        self.freq as f64 - self.bads
    }

    /// Bad rate (bads / freq), 0 for an empty bin
    pub fn rate(&self) -> f64 {
        if self.freq == 0 {
            0.0
        } else {
            self.bads / self.freq as f64
        }
    }

    /// A bin with no bads or no goods has no defined WoE
    pub fn is_degenerate(&self) -> bool {
        self.bads <= 0.0 || self.goods() <= 0.0
    }

    /// Counts of the union of two bins
    pub fn merged(&self, other: &BinCounts) -> BinCounts {
        BinCounts {
            freq: self.freq + other.freq,
            miss: self.miss + other.miss,
            bads: self.bads + other.bads,
        }
    }
}

/// Dataset-level totals that every bin's WoE is measured against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub freq: usize,
    pub bads: f64,
}

impl Totals {
    pub fn from_bins(bins: &[BinCounts]) -> Self {
        Self {
            freq: bins.iter().map(|b| b.freq).sum(),
            bads: bins.iter().map(|b| b.bads).sum(),
        }
    }

    pub fn goods(&self) -> f64 {
        self.freq as f64 - self.bads
    }

    /// WoE is only defined when the dataset has both bads and goods
    pub fn is_informative(&self) -> bool {
        self.bads > 0.0 && self.goods() > 0.0
    }
}

/// Calculate WoE and IV contribution for a bin.
///
/// Returns `None` when the bin is degenerate or the totals carry no bads or no
/// goods.
pub fn calculate_woe_iv(counts: &BinCounts, totals: &Totals) -> Option<(f64, f64)> {
    if counts.is_degenerate() || !totals.is_informative() {
        return None;
    }

    let dist_bads = counts.bads / totals.bads;
    let dist_goods = counts.goods() / totals.goods();

    let woe = (dist_bads / dist_goods).ln();
    let iv = (dist_bads - dist_goods) * woe;

    Some((woe, iv))
}

/// Scores of one bin within a partition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinScore {
    pub woe: Option<f64>,
    /// IV contribution, 0 when the WoE is undefined
    pub iv: f64,
    /// Cumulative bad/good distribution gap at this bin, in percent
    pub ks: f64,
}

/// Scores of an ordered partition
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionStats {
    pub bins: Vec<BinScore>,
    /// Total Information Value
    pub iv: f64,
    /// Kolmogorov-Smirnov statistic in percent
    pub ks: f64,
}

impl PartitionStats {
    pub fn degenerate_count(&self) -> usize {
        self.bins.iter().filter(|b| b.woe.is_none()).count()
    }
}

/// Score an ordered partition against the given totals.
///
/// Bins are cumulated in the order given, which must be ascending value order
/// with a standalone missing bin (if any) last.
pub fn compute_stats(bins: &[BinCounts], totals: &Totals) -> PartitionStats {
    let informative = totals.is_informative();

    let mut cum_bads = 0.0f64;
    let mut cum_goods = 0.0f64;
    let mut scores = Vec::with_capacity(bins.len());

    for counts in bins {
        let (woe, iv) = match calculate_woe_iv(counts, totals) {
            Some((woe, iv)) => (Some(woe), iv),
            None => (None, 0.0),
        };

        cum_bads += counts.bads;
        cum_goods += counts.goods();

        let ks = if informative {
            (cum_bads / totals.bads - cum_goods / totals.goods()).abs() * 100.0
        } else {
            0.0
        };

        scores.push(BinScore { woe, iv, ks });
    }

    let iv = scores.iter().map(|s| s.iv).sum();
    let ks = scores.iter().map(|s| s.ks).fold(0.0, f64::max);

    PartitionStats { bins: scores, iv, ks }
}

/// Fully described bin of a fitted binning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinStats {
    /// 1-based position for interval bins, 0 for the standalone missing bin
    pub bin: usize,
    pub freq: usize,
    /// Missing values captured by this bin
    pub miss: usize,
    pub bads: f64,
    pub rate: f64,
    /// `None` when the bin is degenerate
    pub woe: Option<f64>,
    pub iv: f64,
    pub ks: f64,
    /// Human-readable interval description
    pub rule: String,
}

impl BinStats {
    pub fn new(bin: usize, counts: &BinCounts, score: &BinScore, rule: String) -> Self {
        Self {
            bin,
            freq: counts.freq,
            miss: counts.miss,
            bads: counts.bads,
            rate: counts.rate(),
            woe: score.woe,
            iv: score.iv,
            ks: score.ks,
            rule,
        }
    }

    pub fn counts(&self) -> BinCounts {
        BinCounts {
            freq: self.freq,
            miss: self.miss,
            bads: self.bads,
        }
    }

    pub fn goods(&self) -> f64 {
        self.freq as f64 - self.bads
    }

    pub fn is_degenerate(&self) -> bool {
        self.woe.is_none()
    }
}

/// Average ranks (1-based), ties share the mean of their positions
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }

    ranks
}

/// Spearman rank correlation.
///
/// Returns `None` for fewer than two points or when either side is constant.
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }

    let rx = average_ranks(&x[..n]);
    let ry = average_ranks(&y[..n]);

    let mean_x = rx.iter().sum::<f64>() / n as f64;
    let mean_y = ry.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in rx.iter().zip(ry.iter()) {
        cov += (a - mean_x) * (b - mean_y);
        var_x += (a - mean_x).powi(2);
        var_y += (b - mean_y).powi(2);
    }

    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }

    Some(cov / (var_x * var_y).sqrt())
}
