//! Attrition classifiers and their comparison
//!
//! Every model implements [`Classifier`]. The runner fits each one on the
//! balanced training partition and scores it on the held-out partition.

pub mod boosting;
pub mod forest;
pub mod knn;
pub mod logistic;
pub mod metrics;
pub mod runner;
pub mod tree;

pub use boosting::{BoostingConfig, GradientBoosting};
pub use forest::{ForestConfig, RandomForest};
pub use knn::KNearestNeighbors;
pub use logistic::LogisticRegression;
pub use metrics::{roc_auc, ClassificationMetrics, ConfusionMatrix};
pub use runner::{
    compare_models, evaluate_model, rank_importances, FeatureImportance, ModelComparison, ModelFailure, ModelScore, Partitions,
};
pub use tree::{DecisionTree, TreeConfig, TreeTask};

use ndarray::{Array1, Array2};
use thiserror::Error;

/// Errors raised while fitting or applying a classifier
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("model has not been fitted yet")]
    NotFitted,

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("training labels contain a single class")]
    SingleClass,

    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
}

/// A probabilistic binary classifier
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError>;

    /// Probability of the positive class, per row
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError>;

    /// Hard labels at the 0.5 threshold
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        Ok(self.predict_proba(x)?.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    /// Normalized per-feature importances, for models that have them
    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }

    /// Whether the model expects standardized input
    fn wants_scaled(&self) -> bool {
        false
    }
}

/// The classifier line-up compared on every run
pub fn default_classifiers(seed: u64) -> Vec<Box<dyn Classifier>> {
    vec![
        Box::new(LogisticRegression::default()),
        Box::new(RandomForest::new(ForestConfig {
            seed,
            ..ForestConfig::default()
        })),
        Box::new(GradientBoosting::new(BoostingConfig {
            seed,
            ..BoostingConfig::default()
        })),
        Box::new(KNearestNeighbors::new(5)),
    ]
}

/// Shape and content checks shared by every `fit`
pub(crate) fn check_training_set(x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
    if x.nrows() == 0 {
        return Err(ModelError::EmptyTrainingSet);
    }
    if x.nrows() != y.len() {
        return Err(ModelError::DimensionMismatch {
            expected: x.nrows(),
            got: y.len(),
        });
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::NonFinite("features"));
    }
    let positives = y.iter().filter(|&&v| v >= 0.5).count();
    if positives == 0 || positives == y.len() {
        return Err(ModelError::SingleClass);
    }
    Ok(())
}

pub(crate) fn check_width(expected: usize, x: &Array2<f64>) -> Result<(), ModelError> {
    if x.ncols() != expected {
        return Err(ModelError::DimensionMismatch {
            expected,
            got: x.ncols(),
        });
    }
    Ok(())
}

/// Scale non-negative weights to sum to 1; all-zero stays all-zero
pub(crate) fn normalize(mut weights: Vec<f64>) -> Vec<f64> {
    let sum: f64 = weights.iter().sum();
    if sum > 0.0 {
        for w in &mut weights {
            *w /= sum;
        }
    }
    weights
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let exp_z = z.exp();
        exp_z / (1.0 + exp_z)
    }
}
