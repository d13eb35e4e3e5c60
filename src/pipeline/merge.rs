//! Employee-keyed left joins of the HR sources

use std::collections::{BTreeMap, HashMap};

use polars::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use super::frame::{has_column, id_values, ID_COLUMN};
use crate::error::{AttritionError, Result};

/// Suffix applied to right-side columns whose names already exist on the left.
/// A second collision on the same name is numbered (`_right_2`, ...).
pub const RIGHT_SUFFIX: &str = "_right";

/// How a joined source with repeated employee ids is handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum DuplicatePolicy {
    /// Use the first row for each id and log a warning
    #[default]
    KeepFirst,
    /// Abort with `JoinKeyConflict`
    Fail,
}

/// Left-join `right` onto `left` by `EmployeeID`.
///
/// The result has exactly `left.height()` rows in `left`'s order. Employees
/// missing from `right` get nulls in the joined columns.
pub fn left_join_on_id(
    left: &DataFrame,
    right: &DataFrame,
    source_name: &str,
    policy: DuplicatePolicy,
) -> Result<DataFrame> {
    let right_ids = id_values(right)?;

    let mut first_row: HashMap<i64, usize> = HashMap::with_capacity(right_ids.len());
    let mut repeats: BTreeMap<i64, usize> = BTreeMap::new();
    for (row, id) in right_ids.iter().enumerate() {
        let Some(id) = id else { continue };
        if first_row.contains_key(id) {
            *repeats.entry(*id).or_insert(1) += 1;
        } else {
            first_row.insert(*id, row);
        }
    }

    if let Some((&id, &count)) = repeats.iter().next() {
        match policy {
            DuplicatePolicy::Fail => {
                return Err(AttritionError::JoinKeyConflict {
                    source_name: source_name.to_string(),
                    id,
                    count,
                });
            }
            DuplicatePolicy::KeepFirst => warn!(
                "{} duplicate EmployeeID(s) in '{}', keeping first match (e.g. id {} appears {} times)",
                repeats.len(),
                source_name,
                id,
                count
            ),
        }
    }

    let left_ids = id_values(left)?;
    let take: IdxCa = left_ids
        .iter()
        .map(|id| id.and_then(|id| first_row.get(&id)).map(|&row| row as IdxSize))
        .collect();
    let unmatched = take.null_count();
    if unmatched > 0 {
        info!(
            source = source_name,
            unmatched, "employees without a row in joined source"
        );
    }

    let mut merged = left.clone();
    for column in right.get_columns() {
        let name = column.name().as_str();
        if name == ID_COLUMN {
            continue;
        }
        let mut joined = column.as_materialized_series().take(&take)?;
        if has_column(&merged, name) {
            let renamed = free_column_name(&merged, name);
            warn!(
                source = source_name,
                "column '{}' already present, joined as '{}'", name, renamed
            );
            joined.rename(renamed.into());
        }
        merged.with_column(joined)?;
    }

    Ok(merged)
}

/// `name` plus `_right`, numbered when earlier joins already took that name
fn free_column_name(df: &DataFrame, name: &str) -> String {
    let base = format!("{}{}", name, RIGHT_SUFFIX);
    let mut candidate = base.clone();
    let mut n = 2;
    while has_column(df, &candidate) {
        candidate = format!("{}_{}", base, n);
        n += 1;
    }
    candidate
}

/// Keep the first row per `EmployeeID` of the general table, in order.
///
/// Rows without an id are kept. Under `Fail` a repeated id is a `JoinKeyConflict`.
fn dedupe_general(general: &DataFrame, policy: DuplicatePolicy) -> Result<DataFrame> {
    let ids = id_values(general)?;
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    let mut keep: Vec<IdxSize> = Vec::with_capacity(ids.len());
    for (row, id) in ids.iter().enumerate() {
        match id {
            Some(id) => {
                let count = counts.entry(*id).or_insert(0);
                *count += 1;
                if *count == 1 {
                    keep.push(row as IdxSize);
                }
            }
            None => keep.push(row as IdxSize),
        }
    }

    let Some((&id, &count)) = counts.iter().find(|(_, count)| **count > 1) else {
        return Ok(general.clone());
    };
    if policy == DuplicatePolicy::Fail {
        return Err(AttritionError::JoinKeyConflict {
            source_name: "general".to_string(),
            id,
            count,
        });
    }
    warn!(
        "{} row(s) of the general table repeat an EmployeeID, keeping first match (e.g. id {} appears {} times)",
        ids.len() - keep.len(),
        id,
        count
    );
    Ok(general.take(&IdxCa::from_vec("rows".into(), keep))?)
}

/// Join surveys and the optional working-hours summary onto the general table
pub fn merge_sources(
    general: &DataFrame,
    manager_survey: &DataFrame,
    employee_survey: &DataFrame,
    working_hours: Option<&DataFrame>,
    policy: DuplicatePolicy,
) -> Result<DataFrame> {
    let general = dedupe_general(general, policy)?;

    let mut merged = left_join_on_id(&general, manager_survey, "manager_survey", policy)?;
    merged = left_join_on_id(&merged, employee_survey, "employee_survey", policy)?;
    if let Some(hours) = working_hours {
        merged = left_join_on_id(&merged, hours, "working_hours", policy)?;
    }

    info!(
        rows = merged.height(),
        columns = merged.width(),
        "merged dataset"
    );
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_first_on_duplicate() {
        let left = df! { "EmployeeID" => [1i64, 2], "Age" => [30i64, 40] }.unwrap();
        let right = df! { "EmployeeID" => [1i64, 1, 2], "JobInvolvement" => [3i64, 1, 2] }.unwrap();

        let merged = left_join_on_id(&left, &right, "manager_survey", DuplicatePolicy::KeepFirst).unwrap();
        assert_eq!(merged.height(), 2);
        let values: Vec<Option<i64>> = merged
            .column("JobInvolvement")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(values, vec![Some(3), Some(2)]);
    }

    #[test]
    fn test_fail_on_duplicate() {
        let left = df! { "EmployeeID" => [1i64, 2] }.unwrap();
        let right = df! { "EmployeeID" => [2i64, 2], "JobInvolvement" => [3i64, 1] }.unwrap();

        let result = left_join_on_id(&left, &right, "manager_survey", DuplicatePolicy::Fail);
        match result {
            Err(AttritionError::JoinKeyConflict { id, count, .. }) => {
                assert_eq!(id, 2);
                assert_eq!(count, 2);
            }
            other => panic!("Expected JoinKeyConflict, got {:?}", other.map(|df| df.shape())),
        }
    }

    #[test]
    fn test_overlapping_names_get_suffix() {
        let left = df! { "EmployeeID" => [1i64], "Score" => [1i64] }.unwrap();
        let right = df! { "EmployeeID" => [1i64], "Score" => [9i64] }.unwrap();

        let merged = left_join_on_id(&left, &right, "survey", DuplicatePolicy::KeepFirst).unwrap();
        assert!(merged.column("Score").is_ok());
        assert!(merged.column("Score_right").is_ok());
    }

    #[test]
    fn test_repeated_collision_gets_numbered_suffix() {
        let left = df! { "EmployeeID" => [1i64], "Score" => [1i64], "Score_right" => [2i64] }.unwrap();
        let right = df! { "EmployeeID" => [1i64], "Score" => [3i64] }.unwrap();

        let merged = left_join_on_id(&left, &right, "survey", DuplicatePolicy::KeepFirst).unwrap();
        let values: Vec<Option<i64>> = merged.column("Score_right_2").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(3)]);
    }
}
