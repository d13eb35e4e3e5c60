//! Fits every classifier, scores it on the held-out rows and ranks the results

use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use super::metrics::ClassificationMetrics;
use super::{Classifier, ModelError};
use crate::error::{AttritionError, Result};
use crate::pipeline::{Dataset, StandardScaler};

/// Train/test partitions in raw and standardized form.
///
/// The scaler is fitted on the training rows only.
#[derive(Debug, Clone)]
pub struct Partitions {
    pub train: Dataset,
    pub test: Dataset,
    pub train_scaled: Dataset,
    pub test_scaled: Dataset,
    pub scaler: StandardScaler,
}

impl Partitions {
    pub fn new(train: Dataset, test: Dataset) -> Result<Self> {
        let scaler = StandardScaler::fit_array(&train.feature_names, &train.features)?;
        let train_scaled = train.with_features(scaler.transform_array(&train.features)?);
        let test_scaled = test.with_features(scaler.transform_array(&test.features)?);
        Ok(Self {
            train,
            test,
            train_scaled,
            test_scaled,
            scaler,
        })
    }

    fn for_model(&self, scaled: bool) -> (&Dataset, &Dataset) {
        if scaled {
            (&self.train_scaled, &self.test_scaled)
        } else {
            (&self.train, &self.test)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelScore {
    pub model: String,
    pub scaled_input: bool,
    pub fit_seconds: f64,
    #[serde(flatten)]
    pub metrics: ClassificationMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelFailure {
    pub model: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Ranked scores, isolated failures and the best model's importances
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModelComparison {
    /// Sorted by ROC-AUC, best first
    pub scores: Vec<ModelScore>,
    pub failures: Vec<ModelFailure>,
    /// Importances of the best model, largest first; empty when it has none
    pub importances: Vec<FeatureImportance>,
}

impl ModelComparison {
    pub fn best(&self) -> Option<&ModelScore> {
        self.scores.first()
    }
}

/// Fit one model and score it on the test partition
pub fn evaluate_model(
    model: &mut dyn Classifier,
    partitions: &Partitions,
) -> Result<(ModelScore, Option<Vec<f64>>)> {
    let name = model.name().to_string();
    let scaled = model.wants_scaled();
    let (train, test) = partitions.for_model(scaled);
    let failure = |e: ModelError| AttritionError::ModelTrainingFailure {
        model: name.clone(),
        message: e.to_string(),
    };

    let start = Instant::now();
    model.fit(&train.features, &train.labels).map_err(failure)?;
    let fit_seconds = start.elapsed().as_secs_f64();

    let proba = model.predict_proba(&test.features).map_err(failure)?;
    if proba.iter().any(|p| !p.is_finite()) {
        return Err(failure(ModelError::NonFinite("predicted probabilities")));
    }
    let predicted = proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 });
    let metrics = ClassificationMetrics::calculate(&test.labels, &predicted, &proba);

    let score = ModelScore {
        model: name,
        scaled_input: scaled,
        fit_seconds,
        metrics,
    };
    Ok((score, model.feature_importances()))
}

/// Evaluate every model; a failing model is logged and excluded
pub fn compare_models(models: Vec<Box<dyn Classifier>>, partitions: &Partitions) -> ModelComparison {
    let mut comparison = ModelComparison::default();
    let mut evaluated: Vec<(ModelScore, Option<Vec<f64>>)> = Vec::new();

    for mut model in models {
        match evaluate_model(model.as_mut(), partitions) {
            Ok((score, importances)) => {
                info!(
                    model = %score.model,
                    auc = score.metrics.roc_auc,
                    seconds = score.fit_seconds,
                    "model evaluated"
                );
                evaluated.push((score, importances));
            }
            Err(AttritionError::ModelTrainingFailure { model: failed, message }) => {
                warn!(model = %failed, "model failed: {}", message);
                comparison.failures.push(ModelFailure { model: failed, message });
            }
            Err(other) => {
                let failed = model.name().to_string();
                warn!(model = %failed, "model failed: {}", other);
                comparison.failures.push(ModelFailure {
                    model: failed,
                    message: other.to_string(),
                });
            }
        }
    }

    // Stable: equal AUCs keep line-up order
    evaluated.sort_by(|a, b| b.0.metrics.roc_auc.total_cmp(&a.0.metrics.roc_auc));

    if let Some((_, Some(importances))) = evaluated.first() {
        comparison.importances = rank_importances(&partitions.train.feature_names, importances);
    }
    comparison.scores = evaluated.into_iter().map(|(score, _)| score).collect();
    comparison
}

/// Pair importances with feature names, largest first
pub fn rank_importances(feature_names: &[String], importances: &[f64]) -> Vec<FeatureImportance> {
    let mut ranked: Vec<FeatureImportance> = feature_names
        .iter()
        .zip(importances)
        .map(|(feature, &importance)| FeatureImportance {
            feature: feature.clone(),
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    struct Broken;

    impl Classifier for Broken {
        fn name(&self) -> &str {
            "Broken"
        }

        fn fit(&mut self, _: &Array2<f64>, _: &Array1<f64>) -> std::result::Result<(), ModelError> {
            Err(ModelError::SingleClass)
        }

        fn predict_proba(&self, _: &Array2<f64>) -> std::result::Result<Array1<f64>, ModelError> {
            Err(ModelError::NotFitted)
        }
    }

    /// Scores each row by its first feature
    struct FirstFeature {
        name: &'static str,
        flip: bool,
    }

    impl Classifier for FirstFeature {
        fn name(&self) -> &str {
            self.name
        }

        fn fit(&mut self, _: &Array2<f64>, _: &Array1<f64>) -> std::result::Result<(), ModelError> {
            Ok(())
        }

        fn predict_proba(&self, x: &Array2<f64>) -> std::result::Result<Array1<f64>, ModelError> {
            let max = x.column(0).fold(f64::MIN, |a, &b| a.max(b)).max(1.0);
            Ok(x.column(0).mapv(|v| if self.flip { 1.0 - v / max } else { v / max }))
        }

        fn feature_importances(&self) -> Option<Vec<f64>> {
            Some(vec![0.25, 0.75])
        }
    }

    fn partitions() -> Partitions {
        let x = Array2::from_shape_fn((10, 2), |(i, j)| (i + j) as f64);
        let y = Array1::from_shape_fn(10, |i| if i >= 5 { 1.0 } else { 0.0 });
        let data = Dataset::new(x, y, vec!["Age".into(), "Income".into()]);
        Partitions::new(data.clone(), data).unwrap()
    }

    #[test]
    fn test_failure_is_isolated_and_ranking_by_auc() {
        let models: Vec<Box<dyn Classifier>> = vec![
            Box::new(FirstFeature { name: "Backwards", flip: true }),
            Box::new(Broken),
            Box::new(FirstFeature { name: "Forwards", flip: false }),
        ];

        let comparison = compare_models(models, &partitions());

        assert_eq!(comparison.failures.len(), 1);
        assert_eq!(comparison.failures[0].model, "Broken");
        assert_eq!(comparison.scores.len(), 2);
        assert_eq!(comparison.best().unwrap().model, "Forwards");
        assert_eq!(comparison.best().unwrap().metrics.roc_auc, 1.0);
        assert_eq!(comparison.importances[0].feature, "Income");
    }

    #[test]
    fn test_scaler_is_fit_on_training_rows() {
        let parts = partitions();
        let mean_age = parts.train_scaled.features.column(0).sum() / 10.0;
        assert!(mean_age.abs() < 1e-9);
    }
}
