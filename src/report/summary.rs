//! Fit summary report

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::{BinningStatus, ColumnFit};

/// How a single feature fared
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureOutcome {
    Fitted {
        bins: usize,
        iv: f64,
        ks: f64,
        missing_rate: f64,
    },
    Collapsed,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub feature: String,
    pub outcome: FeatureOutcome,
}

impl FeatureRow {
    fn iv(&self) -> f64 {
        match self.outcome {
            FeatureOutcome::Fitted { iv, .. } => iv,
            _ => f64::NEG_INFINITY,
        }
    }
}

/// Summary of a fitting run across features
#[derive(Debug, Default)]
pub struct FitReport {
    pub rows: Vec<FeatureRow>,
    pub load_time: Option<Duration>,
    pub fit_time: Option<Duration>,
}

impl FitReport {
    /// Collect the outcome of every column, best IV first
    pub fn from_fits(fits: &[ColumnFit]) -> Self {
        let mut rows: Vec<FeatureRow> = fits
            .iter()
            .map(|fit| {
                let outcome = match &fit.result {
                    Ok(binning) if binning.status() == BinningStatus::Collapsed => {
                        FeatureOutcome::Collapsed
                    }
                    Ok(binning) => {
                        let summary = binning.summarize();
                        FeatureOutcome::Fitted {
                            bins: binning.interval_bins().len(),
                            iv: summary.iv,
                            ks: summary.ks,
                            missing_rate: summary.missing_rate,
                        }
                    }
                    Err(e) => FeatureOutcome::Failed(e.to_string()),
                };
                FeatureRow {
                    feature: fit.feature.clone(),
                    outcome,
                }
            })
            .collect();

        rows.sort_by(|a, b| b.iv().partial_cmp(&a.iv()).unwrap_or(std::cmp::Ordering::Equal));

        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn set_load_time(&mut self, elapsed: Duration) {
        self.load_time = Some(elapsed);
    }

    pub fn set_fit_time(&mut self, elapsed: Duration) {
        self.fit_time = Some(elapsed);
    }

    pub fn fitted_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r.outcome, FeatureOutcome::Fitted { .. }))
            .count()
    }

    pub fn collapsed_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.outcome == FeatureOutcome::Collapsed)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r.outcome, FeatureOutcome::Failed(_)))
            .count()
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Feature").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Bins").add_attribute(Attribute::Bold),
            Cell::new("IV").add_attribute(Attribute::Bold),
            Cell::new("KS").add_attribute(Attribute::Bold),
            Cell::new("Missing").add_attribute(Attribute::Bold),
        ]);

        for row in &self.rows {
            let cells = match &row.outcome {
                FeatureOutcome::Fitted {
                    bins,
                    iv,
                    ks,
                    missing_rate,
                } => vec![
                    Cell::new(&row.feature),
                    Cell::new("monotonic").fg(Color::Green),
                    Cell::new(bins).set_alignment(CellAlignment::Right),
                    Cell::new(format!("{:.4}", iv)).set_alignment(CellAlignment::Right),
                    Cell::new(format!("{:.2}", ks)).set_alignment(CellAlignment::Right),
                    Cell::new(format!("{:.1}%", missing_rate * 100.0))
                        .set_alignment(CellAlignment::Right),
                ],
                FeatureOutcome::Collapsed => vec![
                    Cell::new(&row.feature),
                    Cell::new("collapsed").fg(Color::Yellow),
                    Cell::new(1).set_alignment(CellAlignment::Right),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                ],
                FeatureOutcome::Failed(reason) => vec![
                    Cell::new(&row.feature),
                    Cell::new(format!("failed: {}", reason)).fg(Color::Red),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                ],
            };
            table.add_row(cells);
        }

        table
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("BINNING SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        for line in self.to_table().to_string().lines() {
            println!("    {}", line);
        }

        println!();
        println!(
            "      {} fitted, {} collapsed, {} failed",
            style(self.fitted_count()).green().bold(),
            style(self.collapsed_count()).yellow().bold(),
            style(self.failed_count()).red().bold()
        );

        if let (Some(load), Some(fit)) = (self.load_time, self.fit_time) {
            println!(
                "      {}",
                style(format!(
                    "load {:.2}s, fit {:.2}s",
                    load.as_secs_f64(),
                    fit.as_secs_f64()
                ))
                .dim()
            );
        }
    }
}
