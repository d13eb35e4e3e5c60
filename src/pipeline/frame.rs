//! Column access helpers shared by the pipeline stages

use polars::prelude::*;

use crate::error::{AttritionError, Result};

/// Join key present in every HR source
pub const ID_COLUMN: &str = "EmployeeID";

/// Check whether a column exists in the DataFrame
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_index(name).is_some()
}

/// Owned list of column names, in frame order
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

/// Look up a column, mapping absence to `MissingColumn`
pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| AttritionError::MissingColumn(name.to_string()))
}

/// Values of a column cast to f64. Unparsable entries become `None`.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let cast = require_column(df, name)?.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().collect())
}

/// Values of a column rendered as strings
pub fn string_values(column: &Column) -> Result<Vec<Option<String>>> {
    let cast = column.cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

/// Employee identifiers as i64
pub fn id_values(df: &DataFrame) -> Result<Vec<Option<i64>>> {
    let cast = require_column(df, ID_COLUMN)?.cast(&DataType::Int64)?;
    Ok(cast.i64()?.into_iter().collect())
}

/// Whether a column holds text values
pub fn is_text(column: &Column) -> bool {
    matches!(column.dtype(), DataType::String)
}
