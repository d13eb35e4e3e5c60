//! Dense feature matrix handed to the classifiers

use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use tracing::warn;

use super::frame::{column_names, f64_values};
use crate::error::{AttritionError, Result};

/// Feature matrix, binary labels and column names
#[derive(Debug, Clone)]
pub struct Dataset {
    pub features: Array2<f64>,
    pub labels: Array1<f64>,
    pub feature_names: Vec<String>,
}

impl Dataset {
    pub fn new(features: Array2<f64>, labels: Array1<f64>, feature_names: Vec<String>) -> Self {
        Self {
            features,
            labels,
            feature_names,
        }
    }

    /// Build from an all-numeric feature table.
    ///
    /// Null and non-finite cells become 0.0 with a warning.
    pub fn from_frame(features: &DataFrame, labels: &[f64]) -> Result<Self> {
        if features.height() != labels.len() {
            return Err(AttritionError::MalformedSource {
                source_name: "feature table".to_string(),
                message: format!("{} rows but {} labels", features.height(), labels.len()),
            });
        }

        let names = column_names(features);
        let mut matrix = Array2::<f64>::zeros((features.height(), names.len()));
        let mut replaced = 0usize;

        for (j, name) in names.iter().enumerate() {
            for (i, value) in f64_values(features, name)?.into_iter().enumerate() {
                match value {
                    Some(v) if v.is_finite() => matrix[[i, j]] = v,
                    _ => replaced += 1,
                }
            }
        }
        if replaced > 0 {
            warn!("{} null or non-finite feature value(s) replaced with 0", replaced);
        }

        Ok(Self::new(matrix, Array1::from(labels.to_vec()), names))
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// (negatives, positives)
    pub fn class_counts(&self) -> (usize, usize) {
        let positives = self.labels.iter().filter(|&&y| y >= 0.5).count();
        (self.n_samples() - positives, positives)
    }

    /// Rows at `indices`, in that order
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self::new(
            self.features.select(Axis(0), indices),
            self.labels.select(Axis(0), indices),
            self.feature_names.clone(),
        )
    }

    /// Same labels and names with a replacement matrix (e.g. scaled features)
    pub fn with_features(&self, features: Array2<f64>) -> Self {
        Self::new(features, self.labels.clone(), self.feature_names.clone())
    }
}
