//! Command-line argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::pipeline::generators::{DEFAULT_MAX_ITER, DEFAULT_MIN_LEAF_SAMPLES};
use crate::pipeline::{CutStrategy, Direction, MergeConfig, MinBinSize, TargetMapping};

/// Monobin - Monotonic WoE binning of numeric features against a binary target
#[derive(Parser, Debug)]
#[command(name = "monobin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan (very slow for large files).
    #[arg(long, default_value = "10000", global = true)]
    pub infer_schema_length: usize,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fit monotonic binnings and export them as JSON
    Fit(FitArgs),
    /// Add WoE columns to a dataset using exported binnings
    Apply(ApplyArgs),
}

#[derive(Args, Debug)]
pub struct FitArgs {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Binary target column name
    #[arg(short, long)]
    pub target: String,

    /// Feature columns to bin (comma-separated). Defaults to every numeric
    /// column except the target.
    #[arg(short, long, value_delimiter = ',')]
    pub features: Vec<String>,

    /// Initial cut strategy: quantile, bad-quantile, isotonic, range, kmeans, tree
    #[arg(long, default_value = "quantile")]
    pub strategy: CutStrategy,

    /// Number of initial pieces (quantiles, ranges, clusters or tree leaves)
    #[arg(long, default_value = "20", value_parser = validate_pieces)]
    pub pieces: usize,

    /// Explicit cut points (comma-separated); overrides --strategy
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cuts: Vec<f64>,

    /// Bad rate trend across bins: auto, increasing or decreasing
    #[arg(long, default_value = "auto")]
    pub direction: Direction,

    /// Minimum bin size: a fraction of rows below 1, or a row count
    #[arg(long, default_value = "0.05")]
    pub min_bin_size: MinBinSize,

    /// Minimum number of bads per bin
    #[arg(long, default_value = "1", value_parser = validate_min_bads)]
    pub min_bads: f64,

    /// Maximum number of interval bins
    #[arg(long, value_parser = validate_max_bins)]
    pub max_bins: Option<usize>,

    /// Largest bad-rate gap (0.0 to 1.0) at which missing values are folded
    /// into the closest bin instead of getting their own
    #[arg(long, default_value = "0.0", value_parser = validate_missing_tolerance)]
    pub missing_tolerance: f64,

    /// Value in target column that represents EVENT (maps to 1).
    /// Required with --non-event-value when target is not binary 0/1.
    #[arg(long, requires = "non_event_value")]
    pub event_value: Option<String>,

    /// Value in target column that represents NON-EVENT (maps to 0).
    /// Required with --event-value when target is not binary 0/1.
    #[arg(long, requires = "event_value")]
    pub non_event_value: Option<String>,

    /// Output JSON path. Defaults to the input directory with a
    /// '_binning.json' suffix (e.g., data.csv -> data_binning.json).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip printing a bin table per feature
    #[arg(long, default_value = "false")]
    pub no_table: bool,
}

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Binning JSON written by `monobin fit`
    #[arg(short, long)]
    pub binning: PathBuf,

    /// Output file path (CSV or Parquet, determined by extension).
    /// Defaults to the input directory with a '_woe' suffix.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

fn sibling_path(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    parent.join(format!("{}{}.{}", stem, suffix, extension))
}

impl FitArgs {
    /// Cut strategy with `--pieces` and `--cuts` applied
    pub fn cut_strategy(&self) -> CutStrategy {
        if !self.cuts.is_empty() {
            return CutStrategy::Manual {
                cuts: self.cuts.clone(),
            };
        }

        match &self.strategy {
            CutStrategy::Quantile { .. } => CutStrategy::Quantile { pieces: self.pieces },
            CutStrategy::BadQuantile { .. } => CutStrategy::BadQuantile { pieces: self.pieces },
            CutStrategy::Range { .. } => CutStrategy::Range { pieces: self.pieces },
            CutStrategy::KMeans { .. } => CutStrategy::KMeans {
                clusters: self.pieces,
                max_iter: DEFAULT_MAX_ITER,
            },
            CutStrategy::Tree { .. } => CutStrategy::Tree {
                max_leaves: self.pieces,
                min_leaf_samples: DEFAULT_MIN_LEAF_SAMPLES,
            },
            other => other.clone(),
        }
    }

    pub fn merge_config(&self) -> MergeConfig {
        MergeConfig {
            direction: self.direction,
            min_bin_size: self.min_bin_size,
            min_bads: self.min_bads,
            max_bins: self.max_bins,
            missing_rate_tolerance: self.missing_tolerance,
        }
    }

    pub fn target_mapping(&self) -> Option<TargetMapping> {
        match (&self.event_value, &self.non_event_value) {
            (Some(event), Some(non_event)) => Some(TargetMapping::new(event.clone(), non_event.clone())),
            _ => None,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| sibling_path(&self.input, "_binning", "json"))
    }
}

impl ApplyArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let extension = self
                .input
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("parquet");
            sibling_path(&self.input, "_woe", extension)
        })
    }
}

fn parse_number<T: std::str::FromStr>(s: &str) -> Result<T, String> {
    s.parse()
        .map_err(|_| format!("'{}' is not a valid number", s))
}

/// Validator for pieces parameter
fn validate_pieces(s: &str) -> Result<usize, String> {
    let value: usize = parse_number(s)?;
    if value < 2 {
        Err(format!("pieces must be at least 2, got {}", value))
    } else {
        Ok(value)
    }
}

/// Validator for min_bads parameter
fn validate_min_bads(s: &str) -> Result<f64, String> {
    let value: f64 = parse_number(s)?;
    if !value.is_finite() || value < 0.0 {
        Err(format!("min_bads must be a non-negative number, got {}", value))
    } else {
        Ok(value)
    }
}

/// Validator for max_bins parameter
fn validate_max_bins(s: &str) -> Result<usize, String> {
    let value: usize = parse_number(s)?;
    if value == 0 {
        Err("max_bins must be at least 1".to_string())
    } else {
        Ok(value)
    }
}

/// Validator for missing_tolerance parameter
fn validate_missing_tolerance(s: &str) -> Result<f64, String> {
    let value: f64 = parse_number(s)?;
    if !(0.0..=1.0).contains(&value) {
        Err(format!(
            "missing_tolerance must be between 0.0 and 1.0, got {}",
            value
        ))
    } else {
        Ok(value)
    }
}
