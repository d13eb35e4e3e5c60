//! K-nearest-neighbours classifier (Euclidean, uniform vote)

use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;

use super::{check_training_set, check_width, Classifier, ModelError};

#[derive(Debug, Clone)]
pub struct KNearestNeighbors {
    k: usize,
    train_x: Option<Array2<f64>>,
    train_y: Array1<f64>,
}

impl KNearestNeighbors {
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            train_x: None,
            train_y: Array1::zeros(0),
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Share of positive labels among the `k` closest training rows.
    /// Distance ties resolve to the earlier training row.
    fn vote(&self, train_x: &Array2<f64>, row: ArrayView1<'_, f64>) -> f64 {
        let mut distances: Vec<(f64, usize)> = train_x
            .rows()
            .into_iter()
            .enumerate()
            .map(|(i, other)| {
                let d: f64 = row.iter().zip(other.iter()).map(|(a, b)| (a - b).powi(2)).sum();
                (d, i)
            })
            .collect();

        let k = self.k.min(distances.len());
        distances.select_nth_unstable_by(k - 1, |a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let positives: f64 = distances[..k].iter().map(|&(_, i)| self.train_y[i]).sum();
        positives / k as f64
    }
}

impl Default for KNearestNeighbors {
    fn default() -> Self {
        Self::new(5)
    }
}

impl Classifier for KNearestNeighbors {
    fn name(&self) -> &str {
        "KNN"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        check_training_set(x, y)?;
        self.train_x = Some(x.clone());
        self.train_y = y.clone();
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        let train_x = self.train_x.as_ref().ok_or(ModelError::NotFitted)?;
        check_width(train_x.ncols(), x)?;

        let rows: Vec<ArrayView1<'_, f64>> = x.rows().into_iter().collect();
        let proba: Vec<f64> = rows.par_iter().map(|row| self.vote(train_x, row.view())).collect();
        Ok(Array1::from(proba))
    }

    fn wants_scaled(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_majority_of_neighbours() {
        let x = array![[0.0], [0.1], [0.2], [5.0], [5.1], [5.2]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mut model = KNearestNeighbors::new(3);
        model.fit(&x, &y).unwrap();

        let proba = model.predict_proba(&array![[0.05], [5.05]]).unwrap();
        assert_eq!(proba, array![0.0, 1.0]);
    }

    #[test]
    fn test_k_larger_than_training_set() {
        let x = array![[0.0], [1.0]];
        let y = array![0.0, 1.0];
        let mut model = KNearestNeighbors::new(5);
        model.fit(&x, &y).unwrap();

        assert_eq!(model.predict_proba(&array![[0.0]]).unwrap(), array![0.5]);
    }

    #[test]
    fn test_width_mismatch() {
        let mut model = KNearestNeighbors::default();
        model.fit(&array![[0.0], [1.0]], &array![0.0, 1.0]).unwrap();
        assert!(matches!(
            model.predict_proba(&array![[0.0, 1.0]]),
            Err(ModelError::DimensionMismatch { expected: 1, got: 2 })
        ));
    }
}
