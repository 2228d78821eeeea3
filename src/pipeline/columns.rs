//! Per-column fitting and WoE application over a dataset
//!
//! Every feature column is an independent fit, so columns are processed in
//! parallel with rayon. A failed column is reported, never fatal for the
//! others.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::*;
use rayon::prelude::*;
use tracing::warn;

use super::binning::{fit, FittedBinning};
use super::error::BinningError;
use super::generators::CutStrategy;
use super::loader::feature_values;
use super::merge::MergeConfig;
use super::target::{outcomes_from_column, TargetMapping};

/// Outcome of fitting one feature column
#[derive(Debug, Clone)]
pub struct ColumnFit {
    pub feature: String,
    pub result: std::result::Result<FittedBinning, BinningError>,
}

/// Suffix of the columns written by [`apply_columns`]
pub const WOE_SUFFIX: &str = "_woe";

fn fit_progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("   Fitting bins [{bar:40.cyan/blue}] {pos}/{len} features ({percent}%) [{eta}]")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    pb
}

/// Fit one binning per feature column.
///
/// Rows whose outcome is undefined (null, or unmatched by the mapping) are
/// left out of every fit. Results come back in the order of `features`.
pub fn fit_columns(
    df: &DataFrame,
    target: &str,
    features: &[String],
    mapping: Option<&TargetMapping>,
    strategy: &CutStrategy,
    config: &MergeConfig,
) -> Result<Vec<ColumnFit>> {
    let outcomes = outcomes_from_column(df, target, mapping)?;
    let rows: Vec<usize> = outcomes
        .iter()
        .enumerate()
        .filter_map(|(i, o)| o.map(|_| i))
        .collect();
    let kept_outcomes: Vec<i32> = outcomes.iter().flatten().copied().collect();

    let columns: Vec<(String, Vec<Option<f64>>)> = features
        .iter()
        .map(|f| {
            let values = feature_values(df, f)?;
            Ok((f.clone(), rows.iter().map(|&i| values[i]).collect()))
        })
        .collect::<Result<_>>()?;

    let pb = fit_progress_bar(columns.len());
    let progress = AtomicU64::new(0);

    let fits: Vec<ColumnFit> = columns
        .par_iter()
        .map(|(feature, values)| {
            let result = fit(values, &kept_outcomes, strategy, config);
            if let Err(e) = &result {
                warn!(feature = %feature, error = %e, "Binning failed");
            }

            let done = progress.fetch_add(1, Ordering::Relaxed) + 1;
            pb.set_position(done);

            ColumnFit {
                feature: feature.clone(),
                result,
            }
        })
        .collect();

    pb.finish_and_clear();
    Ok(fits)
}

/// Append a `<feature>_woe` column for every stored binning.
///
/// Missing values of a feature fitted without missing values get a null WoE,
/// as do values falling in a bin with an undefined WoE. Returns the names of
/// the new columns.
pub fn apply_columns(
    df: &mut DataFrame,
    binnings: &BTreeMap<String, FittedBinning>,
) -> Result<Vec<String>> {
    let mut added = Vec::with_capacity(binnings.len());

    for (feature, binning) in binnings {
        let values = feature_values(df, feature)?;

        let mut unassigned = 0usize;
        let woes: Vec<Option<f64>> = values
            .iter()
            .map(|&v| match binning.apply(v) {
                Ok(assignment) => assignment.woe,
                Err(_) => {
                    unassigned += 1;
                    None
                }
            })
            .collect();

        if unassigned > 0 {
            warn!(
                feature = %feature,
                rows = unassigned,
                "Missing values without a fitted missing bin were left null"
            );
        }

        let name = format!("{}{}", feature, WOE_SUFFIX);
        df.with_column(Series::new(name.as_str().into(), woes))
            .with_context(|| format!("Failed to add column '{}'", name))?;
        added.push(name);
    }

    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df! {
            "bad" => [0i32, 0, 1, 0, 1, 1, 0, 1, 1, 1, 0, 0],
            "score" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0],
            "flat" => [5.0f64; 12],
        }
        .unwrap()
    }

    #[test]
    fn test_fit_columns_keeps_feature_order() {
        let df = frame();
        let features = vec!["score".to_string(), "flat".to_string()];
        let fits = fit_columns(
            &df,
            "bad",
            &features,
            None,
            &CutStrategy::Quantile { pieces: 4 },
            &MergeConfig::default(),
        )
        .unwrap();

        assert_eq!(fits.len(), 2);
        assert_eq!(fits[0].feature, "score");
        assert_eq!(fits[1].feature, "flat");
        let flat = fits[1].result.as_ref().unwrap();
        assert!(flat.is_collapsed());
    }

    #[test]
    fn test_fit_columns_skips_unmapped_rows() {
        let df = df! {
            "label" => ["b", "g", "x", "b", "g", "x"],
            "score" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0],
        }
        .unwrap();
        let mapping = TargetMapping::new("b".to_string(), "g".to_string());
        let fits = fit_columns(
            &df,
            "label",
            &["score".to_string()],
            Some(&mapping),
            &CutStrategy::default(),
            &MergeConfig::default(),
        )
        .unwrap();

        let binning = fits[0].result.as_ref().unwrap();
        assert_eq!(binning.summarize().sample_size, 4);
    }

    #[test]
    fn test_apply_columns_adds_woe() {
        let mut df = frame();
        let features = vec!["score".to_string()];
        let fits = fit_columns(
            &df,
            "bad",
            &features,
            None,
            &CutStrategy::Manual { cuts: vec![4.0] },
            &MergeConfig::default(),
        )
        .unwrap();

        let binnings: BTreeMap<String, FittedBinning> = fits
            .into_iter()
            .map(|f| (f.feature, f.result.unwrap()))
            .collect();
        let added = apply_columns(&mut df, &binnings).unwrap();

        assert_eq!(added, vec!["score_woe"]);
        let woe = df.column("score_woe").unwrap().f64().unwrap();
        assert_eq!(woe.len(), 12);
        assert_eq!(woe.get(0), binnings["score"].bins()[0].woe);
        assert_eq!(woe.get(11), binnings["score"].bins()[1].woe);
    }

    #[test]
    fn test_apply_columns_nulls_unfitted_missing() {
        let train = frame();
        let fits = fit_columns(
            &train,
            "bad",
            &["score".to_string()],
            None,
            &CutStrategy::Manual { cuts: vec![4.0] },
            &MergeConfig::default(),
        )
        .unwrap();
        let binnings: BTreeMap<String, FittedBinning> = fits
            .into_iter()
            .map(|f| (f.feature, f.result.unwrap()))
            .collect();

        let mut scoring = df! {
            "score" => [Some(2.0f64), None],
        }
        .unwrap();
        apply_columns(&mut scoring, &binnings).unwrap();
        let woe = scoring.column("score_woe").unwrap().f64().unwrap();
        assert!(woe.get(0).is_some());
        assert!(woe.get(1).is_none());
    }
}
