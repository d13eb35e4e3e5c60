//! Stratified train/test split and SMOTE oversampling

use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use super::dataset::Dataset;
use crate::error::{AttritionError, Result};

pub const DEFAULT_TEST_SIZE: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_SMOTE_NEIGHBORS: usize = 5;

/// Split into (train, test), preserving the class ratio in both parts.
///
/// Each class is shuffled on its own and a `test_size` share of it goes to
/// the test partition. A class with at least two rows contributes at least one
/// row to each side.
pub fn stratified_split(dataset: &Dataset, test_size: f64, seed: u64) -> Result<(Dataset, Dataset)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(AttritionError::MalformedSource {
            source_name: "split".to_string(),
            message: format!("test size must be in (0, 1), got {}", test_size),
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(dataset.n_samples());
    let mut test = Vec::new();

    for class in [0.0, 1.0] {
        let mut indices: Vec<usize> = dataset
            .labels
            .iter()
            .enumerate()
            .filter(|(_, &y)| y == class)
            .map(|(i, _)| i)
            .collect();
        if indices.is_empty() {
            return Err(AttritionError::MalformedSource {
                source_name: "split".to_string(),
                message: format!("no rows with label {}", class),
            });
        }
        indices.shuffle(&mut rng);

        let n = indices.len();
        let mut n_test = (n as f64 * test_size).round() as usize;
        if n >= 2 {
            n_test = n_test.clamp(1, n - 1);
        }
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);
    debug!(train = train.len(), test = test.len(), "stratified split");

    Ok((dataset.subset(&train), dataset.subset(&test)))
}

/// Oversample the minority class until both classes have the same count.
///
/// Each synthetic row lies on the segment between a minority row and one of
/// its `k` nearest minority neighbours (Euclidean). With fewer than two
/// minority rows the dataset is returned unchanged.
pub fn smote(dataset: &Dataset, k: usize, seed: u64) -> Dataset {
    let (negatives, positives) = dataset.class_counts();
    let (minority_label, n_minority, n_majority) = if positives <= negatives {
        (1.0, positives, negatives)
    } else {
        (0.0, negatives, positives)
    };

    if n_minority == n_majority {
        return dataset.clone();
    }
    if n_minority < 2 || k == 0 {
        warn!("SMOTE skipped: only {} minority row(s)", n_minority);
        return dataset.clone();
    }

    let minority: Vec<usize> = dataset
        .labels
        .iter()
        .enumerate()
        .filter(|(_, &y)| y == minority_label)
        .map(|(i, _)| i)
        .collect();
    let points = dataset.features.select(Axis(0), &minority);
    let neighbors = nearest_neighbors(&points, k.min(n_minority - 1));

    let n_synthetic = n_majority - n_minority;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut synthetic = Array2::<f64>::zeros((n_synthetic, dataset.n_features()));

    for mut row in synthetic.rows_mut() {
        let i = rng.gen_range(0..n_minority);
        let j = neighbors[i][rng.gen_range(0..neighbors[i].len())];
        let gap: f64 = rng.gen();
        let base = points.row(i);
        let other = points.row(j);
        for (c, value) in row.iter_mut().enumerate() {
            *value = base[c] + gap * (other[c] - base[c]);
        }
    }
    debug!(added = n_synthetic, "SMOTE synthesized minority rows");

    let mut features = dataset.features.clone();
    let mut labels = dataset.labels.to_vec();
    // Shapes match by construction.
    if features.append(Axis(0), synthetic.view()).is_err() {
        return dataset.clone();
    }
    labels.extend(std::iter::repeat(minority_label).take(n_synthetic));

    Dataset::new(features, Array1::from(labels), dataset.feature_names.clone())
}

/// Indices of the `k` closest other rows, per row
fn nearest_neighbors(points: &Array2<f64>, k: usize) -> Vec<Vec<usize>> {
    (0..points.nrows())
        .map(|i| {
            let mut distances: Vec<(usize, f64)> = (0..points.nrows())
                .filter(|&j| j != i)
                .map(|j| {
                    let d = (&points.row(i) - &points.row(j)).mapv(|v| v * v).sum();
                    (j, d)
                })
                .collect();
            distances.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
            distances.into_iter().take(k).map(|(j, _)| j).collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn imbalanced() -> Dataset {
        let features = Array2::from_shape_fn((20, 2), |(i, j)| (i * (j + 1)) as f64);
        let labels: Vec<f64> = (0..20).map(|i| if i < 5 { 1.0 } else { 0.0 }).collect();
        Dataset::new(features, Array1::from(labels), vec!["a".into(), "b".into()])
    }

    #[test]
    fn test_split_is_stratified_and_deterministic() {
        let data = imbalanced();
        let (train, test) = stratified_split(&data, 0.2, 42).unwrap();

        assert_eq!(train.n_samples() + test.n_samples(), 20);
        assert_eq!(test.class_counts(), (3, 1));
        assert_eq!(train.class_counts(), (12, 4));

        let (train2, _) = stratified_split(&data, 0.2, 42).unwrap();
        assert_eq!(train.features, train2.features);
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        assert!(stratified_split(&imbalanced(), 1.0, 42).is_err());
        assert!(stratified_split(&imbalanced(), 0.0, 42).is_err());
    }

    #[test]
    fn test_smote_balances_classes() {
        let balanced = smote(&imbalanced(), 5, 42);
        assert_eq!(balanced.class_counts(), (15, 15));

        // Synthetic rows stay inside the minority bounding box
        for row in balanced.features.rows().into_iter().skip(20) {
            assert!(row[0] >= 0.0 && row[0] <= 4.0);
        }
    }

    #[test]
    fn test_smote_single_minority_is_noop() {
        let data = Dataset::new(
            array![[0.0], [1.0], [2.0]],
            Array1::from(vec![1.0, 0.0, 0.0]),
            vec!["a".into()],
        );
        let out = smote(&data, 5, 42);
        assert_eq!(out.n_samples(), 3);
    }
}
