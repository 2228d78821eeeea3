//! Pipeline module - fitting monotonic binnings and applying WoE

pub mod attach;
pub mod binning;
pub mod columns;
pub mod error;
pub mod generators;
pub mod loader;
pub mod merge;
pub mod missing;
pub mod monotonicity;
pub mod stats;
pub mod target;

pub use attach::{attach_missing, MissingPlacement};
pub use binning::{fit, BinSummary, BinningStatus, FittedBinning, WoeAssignment};
pub use columns::{apply_columns, fit_columns, ColumnFit, WOE_SUFFIX};
pub use error::BinningError;
pub use generators::{partition_by_cuts, CutGenerator, CutStrategy, InitialBin};
pub use loader::{feature_values, load_dataset, numeric_feature_columns, save_dataset};
pub use merge::{merge_monotonic, MergeConfig, MinBinSize};
pub use missing::{missing_ratio, split_missing, MissingGroup, SplitSample};
pub use monotonicity::Direction;
pub use stats::{calculate_woe_iv, compute_stats, BinCounts, BinStats, Totals};
pub use target::{
    analyze_target_column, count_outcomes, outcomes_from_column, TargetAnalysis, TargetMapping,
};
