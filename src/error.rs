//! Error types for the attrition pipeline

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the loading, merging and modelling stages.
///
/// Loader and merger errors abort a run. `ModelTrainingFailure` is caught by
/// the model runner and only excludes the failing model from the comparison.
#[derive(Debug, Error)]
pub enum AttritionError {
    /// A source file or archive does not exist.
    #[error("Source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// A source exists but its header or body could not be parsed.
    #[error("Malformed source '{source_name}': {message}")]
    MalformedSource {
        source_name: String,
        message: String,
    },

    /// An identifier occurs more than once in a source that is joined on it.
    #[error("Duplicate EmployeeID {id} in '{source_name}' ({count} rows)")]
    JoinKeyConflict {
        source_name: String,
        id: i64,
        count: usize,
    },

    /// Arrival and departure tables do not cover the same employees.
    #[error("Clock-in/out tables disagree on {} employee id(s), e.g. {:?}", ids.len(), ids.iter().take(5).collect::<Vec<_>>())]
    ClockTableMismatch { ids: Vec<i64> },

    /// A column required by a stage is absent.
    #[error("Column '{0}' not found")]
    MissingColumn(String),

    /// A classifier failed to fit or predict.
    #[error("Model '{model}' failed: {message}")]
    ModelTrainingFailure { model: String, message: String },

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, AttritionError>;
