//! Target column analysis and mapping
//!
//! Turns the outcome column of a dataset into the 0/1 outcomes the binning
//! pipeline expects. Columns that are already binary are read directly;
//! anything else needs an event/non-event [`TargetMapping`].

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Tolerance for floating point comparison when checking binary 0/1 values
const TOLERANCE: f64 = 1e-9;

/// Labels of the target column that map to outcome 1 (event) and 0
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetMapping {
    pub event_value: String,
    pub non_event_value: String,
}

impl TargetMapping {
    pub fn new(event_value: String, non_event_value: String) -> Self {
        Self {
            event_value,
            non_event_value,
        }
    }

    fn outcome_of(&self, label: &str) -> Option<i32> {
        if label == self.event_value {
            Some(1)
        } else if label == self.non_event_value {
            Some(0)
        } else {
            None
        }
    }
}

/// What the target column looks like
#[derive(Debug, Clone, PartialEq)]
pub enum TargetAnalysis {
    /// Only 0 and 1 (and nulls)
    AlreadyBinary,
    /// Any other labels, sorted
    NeedsMapping { unique_values: Vec<String> },
}

fn target_column<'a>(df: &'a DataFrame, target: &str) -> Result<&'a Column> {
    df.column(target)
        .with_context(|| format!("Target column '{}' not found", target))
}

/// Row labels of a column as text, integers without a decimal point
fn column_labels(col: &Column) -> Result<Vec<Option<String>>> {
    let labels: Vec<Option<String>> = match col.dtype() {
        DataType::String => col
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect(),
        dt if dt.is_integer() => col
            .cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .map(|v| v.map(|n| n.to_string()))
            .collect(),
        dt if dt.is_float() => col
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.map(|x| x.to_string()))
            .collect(),
        DataType::Boolean => col
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| b.to_string()))
            .collect(),
        _ => col
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect(),
    };

    Ok(labels)
}

/// Decide whether the target column can be used as-is
pub fn analyze_target_column(df: &DataFrame, target: &str) -> Result<TargetAnalysis> {
    let col = target_column(df, target)?;

    if col.len() == 0 {
        anyhow::bail!("Target column '{}' is empty", target);
    }
    if col.null_count() == col.len() {
        anyhow::bail!("Target column '{}' contains only null values", target);
    }

    if col.dtype().is_primitive_numeric() {
        let all_binary = col
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .flatten()
            .all(|v| v.abs() < TOLERANCE || (v - 1.0).abs() < TOLERANCE);

        if all_binary {
            return Ok(TargetAnalysis::AlreadyBinary);
        }
    }

    let mut unique_values: Vec<String> = column_labels(col)?.into_iter().flatten().collect();
    unique_values.sort();
    unique_values.dedup();

    Ok(TargetAnalysis::NeedsMapping { unique_values })
}

/// Fail unless the target column only holds 0 and 1 (nulls allowed)
pub fn validate_binary_target(df: &DataFrame, target: &str) -> Result<()> {
    match analyze_target_column(df, target)? {
        TargetAnalysis::AlreadyBinary => Ok(()),
        TargetAnalysis::NeedsMapping { unique_values } => anyhow::bail!(
            "Target column '{}' must be binary (0/1). Found {} unique values: {:?}. \
             Use --event-value and --non-event-value to map it.",
            target,
            unique_values.len(),
            unique_values
        ),
    }
}

/// Outcomes of every row of the target column.
///
/// With a mapping, rows matching neither label are `None`. Without one the
/// column must already be binary and null rows are `None`. Rows with a `None`
/// outcome take no part in fitting.
pub fn outcomes_from_column(
    df: &DataFrame,
    target: &str,
    mapping: Option<&TargetMapping>,
) -> Result<Vec<Option<i32>>> {
    let col = target_column(df, target)?;

    if let Some(mapping) = mapping {
        let outcomes = column_labels(col)?
            .iter()
            .map(|label| label.as_deref().and_then(|l| mapping.outcome_of(l)))
            .collect();
        return Ok(outcomes);
    }

    validate_binary_target(df, target)?;
    let outcomes: Vec<Option<i32>> = col
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .map(|v| v.map(|x| if (x - 1.0).abs() < TOLERANCE { 1 } else { 0 }))
        .collect();

    Ok(outcomes)
}

/// Events, non-events and ignored rows under an outcome vector
pub fn count_outcomes(outcomes: &[Option<i32>]) -> (usize, usize, usize) {
    let events = outcomes.iter().filter(|v| **v == Some(1)).count();
    let non_events = outcomes.iter().filter(|v| **v == Some(0)).count();
    (events, non_events, outcomes.len() - events - non_events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_binary_int_target() {
        let df = df! {
            "target" => [0i32, 1, 0, 1, 0, 1],
        }
        .unwrap();

        let result = analyze_target_column(&df, "target").unwrap();
        assert_eq!(result, TargetAnalysis::AlreadyBinary);
    }

    #[test]
    fn test_analyze_binary_float_target() {
        let df = df! {
            "target" => [0.0f64, 1.0, 0.0, 1.0],
        }
        .unwrap();

        assert_eq!(
            analyze_target_column(&df, "target").unwrap(),
            TargetAnalysis::AlreadyBinary
        );
    }

    #[test]
    fn test_analyze_label_target() {
        let df = df! {
            "target" => ["good", "bad", "unknown", "good", "bad"],
        }
        .unwrap();

        match analyze_target_column(&df, "target").unwrap() {
            TargetAnalysis::NeedsMapping { unique_values } => {
                assert_eq!(unique_values, vec!["bad", "good", "unknown"]);
            }
            other => panic!("Expected NeedsMapping, got {:?}", other),
        }
    }

    #[test]
    fn test_analyze_non_binary_numeric_target() {
        let df = df! {
            "target" => [1i32, 2, 3, 1, 2, 3],
        }
        .unwrap();

        match analyze_target_column(&df, "target").unwrap() {
            TargetAnalysis::NeedsMapping { unique_values } => {
                assert_eq!(unique_values, vec!["1", "2", "3"]);
            }
            other => panic!("Expected NeedsMapping, got {:?}", other),
        }
    }

    #[test]
    fn test_analyze_empty_and_null_targets() {
        let empty = df! {
            "target" => Vec::<i32>::new(),
        }
        .unwrap();
        let err = analyze_target_column(&empty, "target").unwrap_err();
        assert!(err.to_string().contains("empty"));

        let nulls = df! {
            "target" => [None::<String>, None, None],
        }
        .unwrap();
        let err = analyze_target_column(&nulls, "target").unwrap_err();
        assert!(err.to_string().contains("null"));
    }

    #[test]
    fn test_outcomes_from_binary_column() {
        let df = df! {
            "target" => [Some(0i32), Some(1), None, Some(1)],
        }
        .unwrap();

        let outcomes = outcomes_from_column(&df, "target", None).unwrap();
        assert_eq!(outcomes, vec![Some(0), Some(1), None, Some(1)]);
    }

    #[test]
    fn test_outcomes_from_mapped_column() {
        let df = df! {
            "target" => ["B", "G", "X", "B"],
        }
        .unwrap();

        let mapping = TargetMapping::new("B".to_string(), "G".to_string());
        let outcomes = outcomes_from_column(&df, "target", Some(&mapping)).unwrap();
        assert_eq!(outcomes, vec![Some(1), Some(0), None, Some(1)]);
        assert_eq!(count_outcomes(&outcomes), (2, 1, 1));
    }

    #[test]
    fn test_outcomes_from_mapped_integer_column() {
        let df = df! {
            "target" => [2i64, 1, 2, 3],
        }
        .unwrap();

        let mapping = TargetMapping::new("2".to_string(), "1".to_string());
        let outcomes = outcomes_from_column(&df, "target", Some(&mapping)).unwrap();
        assert_eq!(outcomes, vec![Some(1), Some(0), Some(1), None]);
    }

    #[test]
    fn test_outcomes_require_mapping_for_labels() {
        let df = df! {
            "target" => ["bad", "good"],
        }
        .unwrap();

        let err = outcomes_from_column(&df, "target", None).unwrap_err();
        assert!(err.to_string().contains("--event-value"));
    }

    #[test]
    fn test_missing_target_column() {
        let df = df! {
            "feature" => [1.0f64, 2.0],
        }
        .unwrap();

        assert!(outcomes_from_column(&df, "target", None).is_err());
    }
}
