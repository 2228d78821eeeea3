//! Binning export and import
//!
//! Fitted binnings are written as pretty JSON together with the settings of
//! the run, so that `monobin apply` can score new data with them later.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::pipeline::{BinSummary, ColumnFit, CutStrategy, FittedBinning, MergeConfig, TargetMapping};

/// Metadata about the fitting run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// Timestamp of the run (RFC 3339)
    pub timestamp: String,
    pub monobin_version: String,
    pub input_file: String,
    pub target_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_mapping: Option<TargetMapping>,
    pub strategy: CutStrategy,
    pub merge: MergeConfig,
}

/// One successfully fitted feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEntry {
    pub feature: String,
    pub summary: BinSummary,
    pub binning: FittedBinning,
}

/// A feature that could not be binned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedFeature {
    pub feature: String,
    pub error: String,
}

/// Complete export of a fitting run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinningExport {
    pub metadata: ExportMetadata,
    pub features: Vec<FeatureEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<FailedFeature>,
}

/// Run settings recorded in the export
pub struct ExportParams<'a> {
    pub input_file: &'a str,
    pub target_column: &'a str,
    pub target_mapping: Option<&'a TargetMapping>,
    pub strategy: &'a CutStrategy,
    pub merge: &'a MergeConfig,
}

impl BinningExport {
    pub fn from_fits(fits: &[ColumnFit], params: &ExportParams) -> Self {
        let mut features = Vec::new();
        let mut failed = Vec::new();

        for fit in fits {
            match &fit.result {
                Ok(binning) => features.push(FeatureEntry {
                    feature: fit.feature.clone(),
                    summary: binning.summarize(),
                    binning: binning.clone(),
                }),
                Err(e) => failed.push(FailedFeature {
                    feature: fit.feature.clone(),
                    error: e.to_string(),
                }),
            }
        }

        Self {
            metadata: ExportMetadata {
                timestamp: Utc::now().to_rfc3339(),
                monobin_version: env!("CARGO_PKG_VERSION").to_string(),
                input_file: params.input_file.to_string(),
                target_column: params.target_column.to_string(),
                target_mapping: params.target_mapping.cloned(),
                strategy: params.strategy.clone(),
                merge: params.merge.clone(),
            },
            features,
            failed,
        }
    }

    /// Binnings keyed by feature name
    pub fn binnings(&self) -> BTreeMap<String, FittedBinning> {
        self.features
            .iter()
            .map(|entry| (entry.feature.clone(), entry.binning.clone()))
            .collect()
    }
}

pub fn write_export(export: &BinningExport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(export).context("Failed to serialize binnings to JSON")?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write binnings to {}", output_path.display()))?;

    Ok(())
}

pub fn read_export(path: &Path) -> Result<BinningExport> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read binnings from {}", path.display()))?;

    serde_json::from_str(&json)
        .with_context(|| format!("Invalid binning file: {}", path.display()))
}
