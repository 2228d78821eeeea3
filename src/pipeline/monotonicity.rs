//! Monotonic trend direction of bad rates across bins
//!
//! A fitted binning must show bad rates that strictly move in one direction
//! when bins are read in ascending value order, which is what keeps the WoE
//! transform usable in a scorecard.

use serde::{Deserialize, Serialize};

use super::stats::spearman;

/// Direction the bin bad rates must follow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Infer the dominant trend from the initial partition
    #[default]
    Auto,
    /// Bad rate rises with the feature value
    Increasing,
    /// Bad rate falls with the feature value
    Decreasing,
}

impl Direction {
    /// Whether a left/right pair of bad rates follows this direction.
    ///
    /// Equal rates never satisfy a direction. `Auto` must be resolved first
    /// and accepts any pair.
    pub fn is_consistent(&self, left_rate: f64, right_rate: f64) -> bool {
        match self {
            Direction::Increasing => left_rate < right_rate,
            Direction::Decreasing => left_rate > right_rate,
            Direction::Auto => true,
        }
    }

    /// Resolve `Auto` against the bad rates of the initial bins.
    ///
    /// Uses the sign of the Spearman correlation between bin position and bad
    /// rate; an undefined or zero correlation resolves to `Increasing`.
    pub fn resolve(self, rates: &[f64]) -> Direction {
        match self {
            Direction::Auto => {
                let positions: Vec<f64> = (0..rates.len()).map(|i| i as f64).collect();
                match spearman(&positions, rates) {
                    Some(rho) if rho < 0.0 => Direction::Decreasing,
                    _ => Direction::Increasing,
                }
            }
            resolved => resolved,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Auto => write!(f, "auto"),
            Direction::Increasing => write!(f, "increasing"),
            Direction::Decreasing => write!(f, "decreasing"),
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Direction::Auto),
            "increasing" | "inc" | "ascending" | "asc" => Ok(Direction::Increasing),
            "decreasing" | "dec" | "descending" | "desc" => Ok(Direction::Decreasing),
            _ => Err(format!(
                "Unknown direction: '{}'. Use 'auto', 'increasing', or 'decreasing'.",
                s
            )),
        }
    }
}
