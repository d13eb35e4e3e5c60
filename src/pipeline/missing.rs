//! Missing value analysis and imputation

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use polars::prelude::*;
use serde::Serialize;

use super::frame::{is_text, ID_COLUMN};
use crate::error::Result;

/// Survey columns that encode "not answered" as text
pub const SURVEY_SENTINEL_COLUMNS: [&str; 3] = [
    "EnvironmentSatisfaction",
    "JobSatisfaction",
    "WorkLifeBalance",
];

/// Text marker for an unanswered survey question
pub const NOT_ANSWERED: &str = "NA";

/// Fill strategy for numeric columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub enum ImputeStrategy {
    Mean,
    #[default]
    Median,
    MostFrequent,
    Constant(f64),
}

impl fmt::Display for ImputeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImputeStrategy::Mean => write!(f, "mean"),
            ImputeStrategy::Median => write!(f, "median"),
            ImputeStrategy::MostFrequent => write!(f, "most_frequent"),
            ImputeStrategy::Constant(value) => write!(f, "constant({})", value),
        }
    }
}

impl FromStr for ImputeStrategy {
    type Err = String;

    /// `constant` parses to `Constant(0.0)`; the fill value is set separately.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "mean" => Ok(ImputeStrategy::Mean),
            "median" => Ok(ImputeStrategy::Median),
            "most_frequent" | "mode" => Ok(ImputeStrategy::MostFrequent),
            "constant" => Ok(ImputeStrategy::Constant(0.0)),
            _ => Err(format!(
                "Unknown impute strategy: '{}'. Use 'mean', 'median', 'most_frequent' or 'constant'.",
                s
            )),
        }
    }
}

/// A column touched by imputation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImputedColumn {
    pub column: String,
    /// Number of nulls replaced
    pub filled: usize,
    /// Fill value, `None` when the column had nothing to learn from
    pub value: Option<String>,
}

/// What `handle_missing_values` changed
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImputationReport {
    /// Survey answers converted from the `NA` sentinel to null
    pub sentinels_cleared: usize,
    pub columns: Vec<ImputedColumn>,
}

impl ImputationReport {
    pub fn total_filled(&self) -> usize {
        self.columns.iter().map(|c| c.filled).sum()
    }
}

/// Fraction of nulls per column, sorted descending
pub fn analyze_missing_values(df: &DataFrame) -> Vec<(String, f64)> {
    if df.height() == 0 {
        return Vec::new();
    }

    let rows = df.height() as f64;
    let mut missing_ratios: Vec<(String, f64)> = df
        .get_columns()
        .iter()
        .map(|col| (col.name().to_string(), col.null_count() as f64 / rows))
        .collect();

    missing_ratios.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    missing_ratios
}

/// Convert the `NA` sentinel in the survey columns to null and make them numeric.
///
/// Any other non-numeric text in those columns also becomes null.
pub fn replace_survey_sentinels(df: &DataFrame) -> Result<(DataFrame, usize)> {
    let mut out = df.clone();
    let mut cleared = 0;

    for name in SURVEY_SENTINEL_COLUMNS {
        let Ok(column) = df.column(name) else { continue };
        if !is_text(column) {
            continue;
        }

        let values: Vec<Option<f64>> = column
            .str()?
            .into_iter()
            .map(|v| match v.map(str::trim) {
                Some(NOT_ANSWERED) => {
                    cleared += 1;
                    None
                }
                Some(text) => text.parse::<f64>().ok(),
                None => None,
            })
            .collect();

        out.with_column(Column::new(name.into(), values))?;
    }

    Ok((out, cleared))
}

/// Impute every column of the frame.
///
/// Numeric columns (except `EmployeeID`) use `strategy` and come back as
/// Float64; text columns use their most frequent value. Parameters are
/// learned from `df` itself.
pub fn handle_missing_values(
    df: &DataFrame,
    strategy: ImputeStrategy,
) -> Result<(DataFrame, ImputationReport)> {
    let (mut out, sentinels_cleared) = replace_survey_sentinels(df)?;
    let mut report = ImputationReport {
        sentinels_cleared,
        columns: Vec::new(),
    };

    let columns: Vec<Column> = out.get_columns().to_vec();
    for column in columns {
        let name = column.name().to_string();
        if name == ID_COLUMN {
            continue;
        }

        if column.dtype().is_primitive_numeric() {
            let cast = column.cast(&DataType::Float64)?;
            let values: Vec<Option<f64>> = cast.f64()?.into_iter().collect();
            let observed: Vec<f64> = values.iter().flatten().copied().collect();
            let nulls = values.len() - observed.len();
            let fill = numeric_fill_value(&observed, strategy);

            let filled: Vec<Option<f64>> = values.into_iter().map(|v| v.or(fill)).collect();
            out.with_column(Column::new(name.as_str().into(), filled))?;

            if nulls > 0 {
                report.columns.push(ImputedColumn {
                    column: name,
                    filled: if fill.is_some() { nulls } else { 0 },
                    value: fill.map(|v| v.to_string()),
                });
            }
        } else if is_text(&column) {
            let nulls = column.null_count();
            if nulls == 0 {
                continue;
            }
            let values: Vec<Option<&str>> = column.str()?.into_iter().collect();
            let fill = most_frequent_text(values.iter().flatten().copied()).map(str::to_string);

            let filled: Vec<Option<&str>> = values
                .iter()
                .map(|v| v.or(fill.as_deref()))
                .collect();
            out.with_column(Column::new(name.as_str().into(), filled))?;

            report.columns.push(ImputedColumn {
                column: name,
                filled: if fill.is_some() { nulls } else { 0 },
                value: fill,
            });
        }
    }

    Ok((out, report))
}

/// Fill value for a numeric column, `None` when nothing can be learned
pub fn numeric_fill_value(observed: &[f64], strategy: ImputeStrategy) -> Option<f64> {
    if let ImputeStrategy::Constant(value) = strategy {
        return Some(value);
    }
    let observed: Vec<f64> = observed.iter().copied().filter(|v| !v.is_nan()).collect();
    if observed.is_empty() {
        return None;
    }

    match strategy {
        ImputeStrategy::Mean => Some(observed.iter().sum::<f64>() / observed.len() as f64),
        ImputeStrategy::Median => Some(median(observed)),
        ImputeStrategy::MostFrequent => most_frequent_number(observed),
        ImputeStrategy::Constant(value) => Some(value),
    }
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Longest run in sorted order; ties resolve to the smallest value
fn most_frequent_number(mut values: Vec<f64>) -> Option<f64> {
    values.sort_by(|a, b| a.total_cmp(b));

    let mut best: Option<(f64, usize)> = None;
    let mut i = 0;
    while i < values.len() {
        let mut j = i;
        while j < values.len() && values[j] == values[i] {
            j += 1;
        }
        let run = j - i;
        if best.map_or(true, |(_, count)| run > count) {
            best = Some((values[i], run));
        }
        i = j;
    }
    best.map(|(value, _)| value)
}

/// Most frequent text value; ties resolve to the lexicographically smallest
pub fn most_frequent_text<'a>(values: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("median".parse::<ImputeStrategy>().unwrap(), ImputeStrategy::Median);
        assert_eq!("Most-Frequent".parse::<ImputeStrategy>().unwrap(), ImputeStrategy::MostFrequent);
        assert_eq!("constant".parse::<ImputeStrategy>().unwrap(), ImputeStrategy::Constant(0.0));
        assert!("knn".parse::<ImputeStrategy>().is_err());
    }

    #[test]
    fn test_fill_values() {
        let values = [1.0, 2.0, 2.0, 10.0];
        assert_eq!(numeric_fill_value(&values, ImputeStrategy::Mean), Some(3.75));
        assert_eq!(numeric_fill_value(&values, ImputeStrategy::Median), Some(2.0));
        assert_eq!(numeric_fill_value(&values, ImputeStrategy::MostFrequent), Some(2.0));
        assert_eq!(numeric_fill_value(&values, ImputeStrategy::Constant(-1.0)), Some(-1.0));
    }

    #[test]
    fn test_most_frequent_ties_pick_smallest() {
        assert_eq!(most_frequent_number(vec![3.0, 1.0, 3.0, 1.0]), Some(1.0));
        assert_eq!(most_frequent_text(["b", "a", "b", "a"].into_iter()), Some("a"));
    }

    #[test]
    fn test_degenerate_column_has_no_fill() {
        assert_eq!(numeric_fill_value(&[], ImputeStrategy::Median), None);
        assert_eq!(numeric_fill_value(&[], ImputeStrategy::Constant(0.0)), Some(0.0));
    }
}
