//! Label encoding of categorical text columns

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::Serialize;

use super::frame::{is_text, string_values};
use crate::error::Result;

/// Bijection between the distinct values of one column and integer codes.
///
/// Codes are positions in the sorted list of distinct values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryEncoding {
    column: String,
    categories: Vec<String>,
}

impl CategoryEncoding {
    /// Learn the encoding from observed values; nulls are ignored
    pub fn fit<I, S>(column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let mut categories: Vec<String> = values
            .into_iter()
            .flatten()
            .map(|v| v.as_ref().to_string())
            .collect();
        categories.sort();
        categories.dedup();

        Self {
            column: column.to_string(),
            categories,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn encode(&self, value: &str) -> Option<i32> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
            .map(|i| i as i32)
    }

    pub fn decode(&self, code: i32) -> Option<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|i| self.categories.get(i))
            .map(String::as_str)
    }

    /// Encode a whole column, keeping nulls
    pub fn transform(&self, column: &Column) -> Result<Column> {
        let codes: Vec<Option<i32>> = string_values(column)?
            .iter()
            .map(|v| v.as_deref().and_then(|s| self.encode(s)))
            .collect();
        Ok(Column::new(column.name().clone(), codes))
    }
}

/// Encoded table plus the encodings needed to decode it
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub frame: DataFrame,
    /// Per feature column, keyed by column name
    pub encodings: BTreeMap<String, CategoryEncoding>,
    /// Encoding of the target column, if it was textual
    pub target: Option<CategoryEncoding>,
}

/// Label-encode every text column; the target is encoded on its own.
///
/// A frame without text columns is returned unchanged.
pub fn encode_categorical(df: &DataFrame, target: &str) -> Result<EncodedFrame> {
    let mut frame = df.clone();
    let mut encodings = BTreeMap::new();
    let mut target_encoding = None;

    for column in df.get_columns() {
        if !is_text(column) {
            continue;
        }
        let name = column.name().as_str();
        let encoding = CategoryEncoding::fit(name, string_values(column)?);
        frame.with_column(encoding.transform(column)?)?;

        if name == target {
            target_encoding = Some(encoding);
        } else {
            encodings.insert(name.to_string(), encoding);
        }
    }

    Ok(EncodedFrame {
        frame,
        encodings,
        target: target_encoding,
    })
}
