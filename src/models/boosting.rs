//! Gradient boosting with log-loss over shallow regression trees

use ndarray::{Array1, Array2};
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, TreeConfig, TreeTask};
use super::{check_training_set, check_width, normalize, sigmoid, Classifier, ModelError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostingConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Share of rows drawn (without replacement) per stage
    pub subsample: f64,
    pub seed: u64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            subsample: 1.0,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GradientBoosting {
    config: BoostingConfig,
    /// Log-odds of the training prior
    initial: f64,
    stages: Vec<DecisionTree>,
    n_features: usize,
    feature_importances: Vec<f64>,
}

impl GradientBoosting {
    pub fn new(config: BoostingConfig) -> Self {
        Self {
            config,
            initial: 0.0,
            stages: Vec::new(),
            n_features: 0,
            feature_importances: Vec::new(),
        }
    }

    pub fn n_stages(&self) -> usize {
        self.stages.len()
    }

    fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        let mut raw = Array1::from_elem(x.nrows(), self.initial);
        for tree in &self.stages {
            raw = raw + tree.predict(x)? * self.config.learning_rate;
        }
        Ok(raw)
    }
}

impl Classifier for GradientBoosting {
    fn name(&self) -> &str {
        "Gradient Boosting"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        check_training_set(x, y)?;
        let n = x.nrows();
        let prior = (y.sum() / n as f64).clamp(1e-6, 1.0 - 1e-6);
        self.initial = (prior / (1.0 - prior)).ln();
        self.stages.clear();
        self.n_features = x.ncols();

        let n_rows = ((n as f64 * self.config.subsample).round() as usize).clamp(1, n);
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut raw = Array1::from_elem(n, self.initial);
        let mut importances = vec![0.0; x.ncols()];

        for stage in 0..self.config.n_estimators {
            let p = raw.mapv(sigmoid);
            let residual = y - &p;

            let rows: Vec<usize> = if n_rows < n {
                sample(&mut rng, n, n_rows).into_vec()
            } else {
                (0..n).collect()
            };

            // One Newton step per leaf: sum(residual) / sum(p(1-p))
            let newton = |leaf: &[usize]| {
                let numerator: f64 = leaf.iter().map(|&i| residual[i]).sum();
                let denominator: f64 = leaf.iter().map(|&i| p[i] * (1.0 - p[i])).sum();
                if denominator.abs() < 1e-12 {
                    0.0
                } else {
                    numerator / denominator
                }
            };

            let mut tree = DecisionTree::new(TreeConfig {
                max_depth: self.config.max_depth,
                min_samples_split: 2,
                min_samples_leaf: self.config.min_samples_leaf,
                max_features: None,
                seed: self.config.seed.wrapping_add(stage as u64),
                task: TreeTask::Regression,
            });
            tree.fit_rows(x, &residual, rows, Some(&newton))?;

            raw = raw + tree.predict(x)? * self.config.learning_rate;
            if raw.iter().any(|v| !v.is_finite()) {
                return Err(ModelError::NonFinite("boosting scores"));
            }
            for (total, imp) in importances.iter_mut().zip(tree.raw_importances()) {
                *total += imp;
            }
            self.stages.push(tree);
        }

        self.feature_importances = normalize(importances);
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        if self.n_features == 0 {
            return Err(ModelError::NotFitted);
        }
        check_width(self.n_features, x)?;
        Ok(self.decision_function(x)?.mapv(sigmoid))
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        if self.stages.is_empty() {
            None
        } else {
            Some(self.feature_importances.clone())
        }
    }
}
