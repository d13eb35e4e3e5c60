//! Tests for missing value analysis and imputation

#[path = "common/mod.rs"]
mod common;

use attrition::pipeline::{analyze_missing_values, handle_missing_values, ImputeStrategy};
use polars::prelude::*;

fn column_f64(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name).unwrap().f64().unwrap().into_iter().collect()
}

#[test]
fn test_analyze_missing_values_sorted() {
    let df = common::create_merged_dataframe();
    let ratios = analyze_missing_values(&df);

    assert_eq!(ratios[0].0, "TotalWorkingYears");
    assert!((ratios[0].1 - 1.0 / 6.0).abs() < 1e-12);
    assert!(ratios[1..].iter().all(|(_, ratio)| *ratio == 0.0));
}

#[test]
fn test_survey_sentinel_becomes_numeric() {
    let df = common::create_merged_dataframe();
    let (out, report) = handle_missing_values(&df, ImputeStrategy::Median).unwrap();

    assert_eq!(report.sentinels_cleared, 1);
    let environment = out.column("EnvironmentSatisfaction").unwrap();
    assert_eq!(environment.dtype(), &DataType::Float64);
    assert_eq!(environment.null_count(), 0);
    // Median of 1, 2, 3, 3, 4
    assert_eq!(column_f64(&out, "EnvironmentSatisfaction")[2], Some(3.0));
}

#[test]
fn test_median_fill() {
    let df = common::create_merged_dataframe();
    let (out, report) = handle_missing_values(&df, ImputeStrategy::Median).unwrap();

    assert_eq!(column_f64(&out, "TotalWorkingYears")[2], Some(12.0));
    assert_eq!(report.total_filled(), 2);
    assert!(out.get_columns().iter().all(|c| c.null_count() == 0));
}

#[test]
fn test_mean_and_constant_fill() {
    let df = common::create_merged_dataframe();

    let (mean, _) = handle_missing_values(&df, ImputeStrategy::Mean).unwrap();
    assert_eq!(column_f64(&mean, "TotalWorkingYears")[2], Some(69.0 / 5.0));

    let (constant, _) = handle_missing_values(&df, ImputeStrategy::Constant(-1.0)).unwrap();
    assert_eq!(column_f64(&constant, "TotalWorkingYears")[2], Some(-1.0));
}

#[test]
fn test_most_frequent_text_fill() {
    let df = df! {
        "EmployeeID" => [1i64, 2, 3, 4],
        "MaritalStatus" => [Some("Single"), Some("Married"), None, Some("Divorced")],
    }
    .unwrap();

    let (out, report) = handle_missing_values(&df, ImputeStrategy::Median).unwrap();
    let values: Vec<Option<&str>> = out.column("MaritalStatus").unwrap().str().unwrap().into_iter().collect();
    // Three-way tie resolves to the smallest value
    assert_eq!(values[2], Some("Divorced"));
    assert_eq!(report.columns[0].filled, 1);
}

#[test]
fn test_all_null_column_is_left_alone() {
    let df = df! {
        "EmployeeID" => [1i64, 2],
        "Empty" => [None::<f64>, None],
    }
    .unwrap();

    let (out, report) = handle_missing_values(&df, ImputeStrategy::Median).unwrap();
    assert_eq!(out.column("Empty").unwrap().null_count(), 2);
    assert_eq!(report.total_filled(), 0);

    let (filled, _) = handle_missing_values(&df, ImputeStrategy::Constant(0.0)).unwrap();
    assert_eq!(filled.column("Empty").unwrap().null_count(), 0);
}

#[test]
fn test_employee_id_is_not_imputed() {
    let df = df! {
        "EmployeeID" => [Some(1i64), None, Some(3)],
        "Age" => [30.0f64, 40.0, 50.0],
    }
    .unwrap();

    let (out, _) = handle_missing_values(&df, ImputeStrategy::Mean).unwrap();
    assert_eq!(out.column("EmployeeID").unwrap().null_count(), 1);
}
