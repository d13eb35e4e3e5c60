//! Zero-mean, unit-variance feature scaling

use ndarray::Array2;
use polars::prelude::*;
use serde::Serialize;

use super::frame::{column_names, f64_values};
use crate::error::{AttritionError, Result};

/// Per-column standardization learned from a training table.
///
/// Parameters are fixed at `fit` time; `transform` only reads them, so a
/// held-out table can never influence the fitted statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandardScaler {
    columns: Vec<String>,
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Fit on every column of a numeric training table. Nulls are ignored.
    pub fn fit(train: &DataFrame) -> Result<Self> {
        let columns = column_names(train);
        let mut means = Vec::with_capacity(columns.len());
        let mut scales = Vec::with_capacity(columns.len());

        for name in &columns {
            let observed: Vec<f64> = f64_values(train, name)?.into_iter().flatten().collect();
            let (mean, scale) = mean_and_scale(&observed);
            means.push(mean);
            scales.push(scale);
        }

        Ok(Self {
            columns,
            means,
            scales,
        })
    }

    /// Fit on a dense matrix whose columns are `columns`
    pub fn fit_array(columns: &[String], train: &Array2<f64>) -> Result<Self> {
        if columns.len() != train.ncols() {
            return Err(shape_mismatch(columns.len(), train.ncols()));
        }
        let (means, scales) = train
            .columns()
            .into_iter()
            .map(|col| mean_and_scale(&col.to_vec()))
            .unzip();

        Ok(Self {
            columns: columns.to_vec(),
            means,
            scales,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Standardize a table with the fitted parameters
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.map_frame(df, |v, mean, scale| (v - mean) / scale)
    }

    /// Undo `transform`
    pub fn inverse_transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.map_frame(df, |v, mean, scale| v * scale + mean)
    }

    pub fn transform_array(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.map_array(x, |v, mean, scale| (v - mean) / scale)
    }

    pub fn inverse_transform_array(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.map_array(x, |v, mean, scale| v * scale + mean)
    }

    fn map_frame(&self, df: &DataFrame, op: impl Fn(f64, f64, f64) -> f64) -> Result<DataFrame> {
        let names = column_names(df);
        if names != self.columns {
            return Err(AttritionError::MalformedSource {
                source_name: "scaler input".to_string(),
                message: format!("expected columns {:?}, got {:?}", self.columns, names),
            });
        }

        let mut out = Vec::with_capacity(self.columns.len());
        for (i, name) in self.columns.iter().enumerate() {
            let (mean, scale) = (self.means[i], self.scales[i]);
            let values: Vec<Option<f64>> = f64_values(df, name)?
                .into_iter()
                .map(|v| v.map(|v| op(v, mean, scale)))
                .collect();
            out.push(Column::new(name.as_str().into(), values));
        }
        Ok(DataFrame::new(out)?)
    }

    fn map_array(&self, x: &Array2<f64>, op: impl Fn(f64, f64, f64) -> f64) -> Result<Array2<f64>> {
        if x.ncols() != self.columns.len() {
            return Err(shape_mismatch(self.columns.len(), x.ncols()));
        }
        let mut out = x.clone();
        for (j, mut col) in out.columns_mut().into_iter().enumerate() {
            let (mean, scale) = (self.means[j], self.scales[j]);
            col.mapv_inplace(|v| op(v, mean, scale));
        }
        Ok(out)
    }
}

/// Mean and population standard deviation; a zero deviation scales by 1
fn mean_and_scale(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (0.0, 1.0);
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    let std = variance.sqrt();
    let scale = if std > f64::EPSILON { std } else { 1.0 };
    (mean, scale)
}

fn shape_mismatch(expected: usize, got: usize) -> AttritionError {
    AttritionError::MalformedSource {
        source_name: "scaler input".to_string(),
        message: format!("expected {} columns, got {}", expected, got),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_learns_population_statistics() {
        let df = df! { "a" => [1.0f64, 3.0], "b" => [5.0f64, 5.0] }.unwrap();
        let scaler = StandardScaler::fit(&df).unwrap();

        assert_eq!(scaler.means(), &[2.0, 5.0]);
        assert_eq!(scaler.scales(), &[1.0, 1.0]);
    }

    #[test]
    fn test_array_round_trip() {
        let columns = vec!["a".to_string(), "b".to_string()];
        let x = array![[1.0, 10.0], [2.0, 20.0], [4.0, 40.0]];
        let scaler = StandardScaler::fit_array(&columns, &x).unwrap();

        let scaled = scaler.transform_array(&x).unwrap();
        let restored = scaler.inverse_transform_array(&scaled).unwrap();
        for (a, b) in x.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_wrong_width() {
        let columns = vec!["a".to_string()];
        let scaler = StandardScaler::fit_array(&columns, &array![[1.0], [2.0]]).unwrap();
        assert!(scaler.transform_array(&array![[1.0, 2.0]]).is_err());
    }
}
