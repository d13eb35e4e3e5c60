//! Derived HR features
//!
//! Every derived feature declares the input columns it needs. A feature is
//! only created when all of them are present in the frame (including features
//! derived earlier in the table), otherwise it is recorded as skipped.

use polars::prelude::*;
use serde::Serialize;

use super::frame::{f64_values, has_column};
use crate::error::Result;

/// Numeric shape of a derived column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeatureKind {
    /// Float64 value
    Ratio,
    /// Int32 0/1 indicator
    Flag,
}

/// A derived column and the inputs it requires.
///
/// Each entry of `inputs` lists accepted names for one input; the first name
/// found in the frame is used.
#[derive(Debug, Clone, Copy)]
pub struct DerivedFeature {
    pub name: &'static str,
    pub inputs: &'static [&'static [&'static str]],
    pub kind: FeatureKind,
    compute: fn(&[f64]) -> f64,
}

impl DerivedFeature {
    /// Resolve each input to a column name present in `df`
    pub fn resolve_inputs(&self, df: &DataFrame) -> std::result::Result<Vec<&'static str>, Vec<&'static str>> {
        let mut resolved = Vec::with_capacity(self.inputs.len());
        let mut missing = Vec::new();
        for aliases in self.inputs {
            match aliases.iter().find(|name| has_column(df, name)) {
                Some(name) => resolved.push(*name),
                None => missing.push(aliases[0]),
            }
        }
        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(missing)
        }
    }

    pub fn evaluate(&self, inputs: &[f64]) -> f64 {
        (self.compute)(inputs)
    }
}

fn flag(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

const INCOME: &[&str] = &["MonthlyIncome"];
const HIKE: &[&str] = &["PercentSalaryHike"];
const TOTAL_YEARS: &[&str] = &["TotalWorkingYears"];
const YEARS_AT_COMPANY: &[&str] = &["YearsAtCompany"];
const SINCE_PROMOTION: &[&str] = &["YearsSinceLastPromotion"];
const WITH_MANAGER: &[&str] = &["YearsWithCurrManager", "YearsWithCurrentManager"];
const JOB_LEVEL: &[&str] = &["JobLevel"];
const AGE: &[&str] = &["Age"];
const AVG_HOURS: &[&str] = &["AvgWorkingHours"];
const STANDARD_HOURS: &[&str] = &["StandardHours"];
const OVERTIME: &[&str] = &["OvertimeHours"];

/// Derived features in evaluation order
pub const DERIVED_FEATURES: [DerivedFeature; 11] = [
    DerivedFeature {
        name: "SalaryHikeAmount",
        inputs: &[INCOME, HIKE],
        kind: FeatureKind::Ratio,
        compute: |v| v[0] * v[1] / 100.0,
    },
    DerivedFeature {
        name: "SalaryHikeRatio",
        inputs: &[HIKE],
        kind: FeatureKind::Ratio,
        compute: |v| v[0] / 100.0,
    },
    DerivedFeature {
        name: "YearsBeforeCompany",
        inputs: &[TOTAL_YEARS, YEARS_AT_COMPANY],
        kind: FeatureKind::Ratio,
        compute: |v| v[0] - v[1],
    },
    DerivedFeature {
        name: "CompanyTenureRatio",
        inputs: &[YEARS_AT_COMPANY, TOTAL_YEARS],
        kind: FeatureKind::Ratio,
        compute: |v| v[0] / (v[1] + 1.0),
    },
    DerivedFeature {
        name: "PromotionFrequency",
        inputs: &[YEARS_AT_COMPANY, SINCE_PROMOTION],
        kind: FeatureKind::Ratio,
        compute: |v| v[0] / (v[1] + 1.0),
    },
    DerivedFeature {
        name: "RecentlyPromoted",
        inputs: &[SINCE_PROMOTION],
        kind: FeatureKind::Flag,
        compute: |v| flag(v[0] <= 2.0),
    },
    DerivedFeature {
        name: "ManagerStability",
        inputs: &[WITH_MANAGER, YEARS_AT_COMPANY],
        kind: FeatureKind::Ratio,
        compute: |v| v[0] / (v[1] + 1.0),
    },
    DerivedFeature {
        name: "IncomePerLevel",
        inputs: &[INCOME, JOB_LEVEL],
        kind: FeatureKind::Ratio,
        compute: |v| v[0] / v[1],
    },
    DerivedFeature {
        name: "CareerStartAge",
        inputs: &[AGE, TOTAL_YEARS],
        kind: FeatureKind::Ratio,
        compute: |v| v[0] - v[1],
    },
    DerivedFeature {
        name: "OvertimeHours",
        inputs: &[AVG_HOURS, STANDARD_HOURS],
        kind: FeatureKind::Ratio,
        compute: |v| v[0] - v[1],
    },
    DerivedFeature {
        name: "HasOvertime",
        inputs: &[OVERTIME],
        kind: FeatureKind::Flag,
        compute: |v| flag(v[0] > 0.0),
    },
];

/// A feature left out because its inputs are absent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingPrerequisite {
    pub feature: &'static str,
    pub missing: Vec<&'static str>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FeatureReport {
    pub created: Vec<&'static str>,
    pub skipped: Vec<MissingPrerequisite>,
}

/// Add every derived feature whose inputs are available.
///
/// Rows with a null input get a null derived value. The input frame is not modified.
pub fn create_features(df: &DataFrame) -> Result<(DataFrame, FeatureReport)> {
    let mut out = df.clone();
    let mut report = FeatureReport::default();

    for feature in &DERIVED_FEATURES {
        let inputs = match feature.resolve_inputs(&out) {
            Ok(inputs) => inputs,
            Err(missing) => {
                report.skipped.push(MissingPrerequisite {
                    feature: feature.name,
                    missing,
                });
                continue;
            }
        };

        let columns: Vec<Vec<Option<f64>>> = inputs
            .iter()
            .map(|name| f64_values(&out, name))
            .collect::<Result<_>>()?;

        let mut row = vec![0.0; columns.len()];
        let values: Vec<Option<f64>> = (0..out.height())
            .map(|i| {
                for (slot, column) in row.iter_mut().zip(&columns) {
                    *slot = column[i]?;
                }
                Some(feature.evaluate(&row))
            })
            .collect();

        let column = match feature.kind {
            FeatureKind::Ratio => Column::new(feature.name.into(), values),
            FeatureKind::Flag => Column::new(
                feature.name.into(),
                values.into_iter().map(|v| v.map(|f| f as i32)).collect::<Vec<_>>(),
            ),
        };
        out.with_column(column)?;
        report.created.push(feature.name);
    }

    Ok((out, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_table_names_are_unique() {
        let mut names: Vec<&str> = DERIVED_FEATURES.iter().map(|f| f.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), DERIVED_FEATURES.len());
    }

    #[test]
    fn test_manager_alias_is_accepted() {
        let df = df! {
            "YearsWithCurrentManager" => [2.0f64],
            "YearsAtCompany" => [3.0f64],
        }
        .unwrap();

        let (out, report) = create_features(&df).unwrap();
        assert!(report.created.contains(&"ManagerStability"));
        let value = out.column("ManagerStability").unwrap().f64().unwrap().get(0).unwrap();
        assert!((value - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_null_input_gives_null_output() {
        let df = df! {
            "PercentSalaryHike" => [Some(10.0f64), None],
        }
        .unwrap();

        let (out, _) = create_features(&df).unwrap();
        let ratio: Vec<Option<f64>> = out.column("SalaryHikeRatio").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(ratio, vec![Some(0.1), None]);
    }
}
