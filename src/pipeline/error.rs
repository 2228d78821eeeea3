//! Error types for fitting and applying binnings.

use thiserror::Error;

/// Errors raised by the binning pipeline.
///
/// A collapsed (single-bin) fit is not an error; it is reported through
/// [`BinningStatus`](super::binning::BinningStatus) on the fitted binning.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BinningError {
    /// `values` and `outcomes` have different lengths.
    #[error("values and outcomes must have the same length (got {values} values, {outcomes} outcomes)")]
    LengthMismatch { values: usize, outcomes: usize },

    /// An outcome other than 0 or 1 was supplied.
    #[error("outcome at position {position} must be binary (0/1), found {found}")]
    NonBinaryOutcome { position: usize, found: i32 },

    /// Fewer than two observations were supplied.
    #[error("at least 2 observations are required, got {0}")]
    InsufficientObservations(usize),

    /// Every observation has a missing value.
    #[error("all {0} observations have a missing value; nothing to bin")]
    AllMissing(usize),

    /// The merge configuration or a generator parameter is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A candidate cut generator failed.
    #[error("cut generator failed: {0}")]
    Generator(String),

    /// A missing value was applied to a binning fitted without missing values.
    #[error("no missing bin fitted: the binning was trained without missing values")]
    NoMissingBin,

    /// A deserialized binning has inconsistent cuts and bins.
    #[error("invalid binning: {0}")]
    InvalidBinning(String),
}
