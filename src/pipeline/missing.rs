//! Input validation and missing value separation
//!
//! Records with an undefined feature value (`None` or NaN) are set aside in a
//! dedicated group before any cut logic runs. The group keeps its own counts
//! so it can be scored as a standalone bin candidate later on.

use super::error::BinningError;
use super::stats::{BinCounts, Totals};

/// Observations whose feature value is missing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissingGroup {
    /// Original input positions of the missing observations
    pub positions: Vec<usize>,
    /// Number of missing observations with outcome = 1
    pub bads: f64,
}

impl MissingGroup {
    pub fn freq(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Counts of the group as a standalone bin (every member is a miss)
    pub fn counts(&self) -> BinCounts {
        BinCounts {
            freq: self.freq(),
            miss: self.freq(),
            bads: self.bads,
        }
    }
}

/// Input split into non-missing observations and the missing group.
///
/// Non-missing observations keep their input order; `positions[i]` is the
/// original index of `values[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitSample {
    values: Vec<f64>,
    outcomes: Vec<i32>,
    positions: Vec<usize>,
    missing: MissingGroup,
}

impl SplitSample {
    /// Number of non-missing observations
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn outcomes(&self) -> &[i32] {
        &self.outcomes
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub fn missing(&self) -> &MissingGroup {
        &self.missing
    }

    /// Totals over every observation, missing ones included
    pub fn totals(&self) -> Totals {
        let non_missing_bads: f64 = self.outcomes.iter().map(|&y| y as f64).sum();
        Totals {
            freq: self.values.len() + self.missing.freq(),
            bads: non_missing_bads + self.missing.bads,
        }
    }

    /// Indices of the non-missing observations sorted by value.
    ///
    /// The sort is stable, so equal values keep their input order.
    pub fn sorted_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.values.len()).collect();
        order.sort_by(|&a, &b| {
            self.values[a]
                .partial_cmp(&self.values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        order
    }

    /// Counts over a set of non-missing member indices
    pub fn counts_for(&self, members: &[usize]) -> BinCounts {
        let bads: f64 = members.iter().map(|&i| self.outcomes[i] as f64).sum();
        BinCounts::new(members.len(), bads)
    }
}

/// Validate the fitting input and separate missing values.
///
/// Fails on mismatched lengths, fewer than two observations, non-binary
/// outcomes, or when no value is present at all.
pub fn split_missing(values: &[Option<f64>], outcomes: &[i32]) -> Result<SplitSample, BinningError> {
    if values.len() != outcomes.len() {
        return Err(BinningError::LengthMismatch {
            values: values.len(),
            outcomes: outcomes.len(),
        });
    }

    if values.len() < 2 {
        return Err(BinningError::InsufficientObservations(values.len()));
    }

    if let Some((position, &found)) = outcomes
        .iter()
        .enumerate()
        .find(|(_, &y)| y != 0 && y != 1)
    {
        return Err(BinningError::NonBinaryOutcome { position, found });
    }

    let mut sample = SplitSample {
        values: Vec::with_capacity(values.len()),
        outcomes: Vec::with_capacity(values.len()),
        positions: Vec::with_capacity(values.len()),
        missing: MissingGroup::default(),
    };

    for (position, (value, &outcome)) in values.iter().zip(outcomes.iter()).enumerate() {
        match value {
            Some(v) if !v.is_nan() => {
                sample.values.push(*v);
                sample.outcomes.push(outcome);
                sample.positions.push(position);
            }
            _ => {
                sample.missing.positions.push(position);
                sample.missing.bads += outcome as f64;
            }
        }
    }

    if sample.values.is_empty() {
        return Err(BinningError::AllMissing(values.len()));
    }

    Ok(sample)
}

/// Share of missing values in a column
pub fn missing_ratio(values: &[Option<f64>]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let missing = values
        .iter()
        .filter(|v| v.map_or(true, |x| x.is_nan()))
        .count();
    missing as f64 / values.len() as f64
}
