//! Separation of the feature table from the label vector

use polars::prelude::*;
use tracing::debug;

use super::frame::{column_names, f64_values, has_column};
use crate::error::{AttritionError, Result};

/// Identifier and constant-by-construction columns of the HR dataset
pub const DEFAULT_DROP_COLUMNS: [&str; 4] = ["EmployeeID", "EmployeeCount", "Over18", "StandardHours"];

/// Final feature table and labels
#[derive(Debug, Clone)]
pub struct FeatureSplit {
    pub features: DataFrame,
    /// Binary labels (1 = attrited); `None` when the target column is absent
    pub labels: Option<Vec<f64>>,
    /// Columns removed besides the target
    pub dropped: Vec<String>,
}

/// Drop identifier and constant columns and extract the target.
///
/// Besides `drop_columns`, any column holding a single value on every row is
/// dropped.
pub fn split_features_target(df: &DataFrame, target: &str, drop_columns: &[String]) -> Result<FeatureSplit> {
    let mut dropped: Vec<String> = Vec::new();

    for name in column_names(df) {
        if name == target {
            continue;
        }
        let listed = drop_columns.iter().any(|c| c == &name);
        let constant = df.height() > 0 && df.column(&name)?.as_materialized_series().n_unique()? <= 1;
        if listed || constant {
            debug!(column = %name, listed, constant, "dropping non-informative column");
            dropped.push(name);
        }
    }

    let labels = if has_column(df, target) {
        Some(binary_labels(df, target)?)
    } else {
        None
    };

    let mut removed: Vec<&str> = dropped.iter().map(String::as_str).collect();
    if labels.is_some() {
        removed.push(target);
    }
    let features = df.drop_many(removed);

    Ok(FeatureSplit {
        features,
        labels,
        dropped,
    })
}

fn binary_labels(df: &DataFrame, target: &str) -> Result<Vec<f64>> {
    let values = f64_values(df, target)?;
    values
        .into_iter()
        .enumerate()
        .map(|(row, v)| match v {
            Some(label) if label == 0.0 || label == 1.0 => Ok(label),
            other => Err(AttritionError::MalformedSource {
                source_name: target.to_string(),
                message: format!("row {} has non-binary label {:?}", row, other),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drops() -> Vec<String> {
        DEFAULT_DROP_COLUMNS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_constant_column_is_dropped() {
        let df = df! {
            "EmployeeID" => [1i64, 2, 3],
            "Age" => [30.0f64, 40.0, 50.0],
            "Flat" => [7.0f64, 7.0, 7.0],
            "Attrition" => [0i32, 1, 0],
        }
        .unwrap();

        let split = split_features_target(&df, "Attrition", &drops()).unwrap();
        assert_eq!(split.features.get_column_names(), &["Age"]);
        assert_eq!(split.labels, Some(vec![0.0, 1.0, 0.0]));
        assert!(split.dropped.contains(&"Flat".to_string()));
    }

    #[test]
    fn test_missing_target_degrades_to_no_labels() {
        let df = df! {
            "Age" => [30.0f64, 40.0],
        }
        .unwrap();

        let split = split_features_target(&df, "Attrition", &drops()).unwrap();
        assert!(split.labels.is_none());
        assert_eq!(split.features.width(), 1);
    }

    #[test]
    fn test_non_binary_target_is_rejected() {
        let df = df! {
            "Age" => [30.0f64, 40.0],
            "Attrition" => [0i32, 2],
        }
        .unwrap();

        assert!(split_features_target(&df, "Attrition", &drops()).is_err());
    }
}
