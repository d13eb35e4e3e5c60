//! Random forest of bootstrap CART trees

use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, TreeConfig, TreeTask};
use super::{check_training_set, check_width, normalize, Classifier, ModelError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn per split (sqrt of total if None)
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 12,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    n_features: usize,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
            feature_importances: Vec::new(),
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &str {
        "Random Forest"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        check_training_set(x, y)?;
        let n_samples = x.nrows();
        let n_features = x.ncols();
        let max_features = self
            .config
            .max_features
            .unwrap_or_else(|| ((n_features as f64).sqrt().ceil() as usize).max(1));

        let config = &self.config;
        let trees: Vec<DecisionTree> = (0..config.n_trees)
            .into_par_iter()
            .map(|i| {
                let seed = config.seed.wrapping_add(i as u64);
                let rows: Vec<usize> = if config.bootstrap {
                    let mut rng = ChaCha8Rng::seed_from_u64(seed);
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                let mut tree = DecisionTree::new(TreeConfig {
                    max_depth: config.max_depth,
                    min_samples_split: config.min_samples_split,
                    min_samples_leaf: config.min_samples_leaf,
                    max_features: Some(max_features),
                    seed,
                    task: TreeTask::Classification,
                });
                tree.fit_rows(x, y, rows, None)?;
                Ok::<_, ModelError>(tree)
            })
            .collect::<Result<_, ModelError>>()?;

        let mut importances = vec![0.0; n_features];
        for tree in &trees {
            for (total, imp) in importances.iter_mut().zip(normalize(tree.raw_importances().to_vec())) {
                *total += imp;
            }
        }

        self.trees = trees;
        self.n_features = n_features;
        self.feature_importances = normalize(importances);
        Ok(())
    }

    /// Mean of the per-tree positive-class shares
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        check_width(self.n_features, x)?;

        let per_tree: Vec<Array1<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<_, _>>()?;

        let mut sum = Array1::<f64>::zeros(x.nrows());
        for proba in &per_tree {
            sum += proba;
        }
        Ok(sum / self.trees.len() as f64)
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        if self.trees.is_empty() {
            None
        } else {
            Some(self.feature_importances.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal_and_noise() -> (Array2<f64>, Array1<f64>) {
        // Column 0 decides the label; column 1 cycles independently
        let x = Array2::from_shape_fn((60, 2), |(i, j)| if j == 0 { i as f64 } else { (i % 7) as f64 });
        let y = Array1::from_shape_fn(60, |i| if i >= 30 { 1.0 } else { 0.0 });
        (x, y)
    }

    #[test]
    fn test_forest_separates_and_ranks_signal() {
        let (x, y) = signal_and_noise();
        let mut forest = RandomForest::new(ForestConfig {
            n_trees: 20,
            ..ForestConfig::default()
        });
        forest.fit(&x, &y).unwrap();

        assert_eq!(forest.n_trees(), 20);
        let proba = forest.predict_proba(&x).unwrap();
        assert!(proba[0] < 0.5);
        assert!(proba[59] > 0.5);

        let importances = forest.feature_importances().unwrap();
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(importances[0] > importances[1]);
    }

    #[test]
    fn test_forest_is_deterministic_for_a_seed() {
        let (x, y) = signal_and_noise();
        let config = ForestConfig {
            n_trees: 10,
            ..ForestConfig::default()
        };
        let mut a = RandomForest::new(config.clone());
        let mut b = RandomForest::new(config);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }
}
