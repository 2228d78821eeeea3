//! Monobin: Monotonic WoE Binning Library
//!
//! Discretizes numeric features into contiguous bins whose bad rates move
//! strictly in one direction, then derives Weight of Evidence, Information
//! Value and KS from the binning. Fitted binnings are plain values that can
//! be serialized and applied to new data.
//!
//! ```no_run
//! use monobin::pipeline::{fit, CutStrategy, MergeConfig};
//!
//! let values = vec![Some(1.0), Some(2.0), None, Some(4.0)];
//! let outcomes = vec![0, 1, 0, 1];
//! let binning = fit(&values, &outcomes, &CutStrategy::default(), &MergeConfig::default())?;
//! let woe = binning.apply(Some(3.0))?.woe;
//! # Ok::<(), monobin::pipeline::BinningError>(())
//! ```

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
