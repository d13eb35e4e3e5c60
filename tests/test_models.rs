//! Tests for the classifiers and the model comparison

use attrition::models::{
    compare_models, default_classifiers, BoostingConfig, Classifier, ForestConfig, GradientBoosting,
    KNearestNeighbors, LogisticRegression, Partitions, RandomForest,
};
use attrition::pipeline::{smote, stratified_split, Dataset};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Two noisy clusters; the third feature is pure noise
fn clusters(n: usize, seed: u64) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut x = Array2::<f64>::zeros((n, 3));
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        // Roughly one leaver in four
        let positive = i % 4 == 0;
        let center = if positive { 2.0 } else { -1.0 };
        x[[i, 0]] = center + rng.gen_range(-1.0..1.0);
        x[[i, 1]] = 10.0 * center + rng.gen_range(-5.0..5.0);
        x[[i, 2]] = rng.gen_range(-3.0..3.0);
        y[i] = if positive { 1.0 } else { 0.0 };
    }
    Dataset::new(x, y, vec!["Tenure".into(), "Hours".into(), "Noise".into()])
}

fn partitions() -> Partitions {
    let data = clusters(160, 7);
    let (train, test) = stratified_split(&data, 0.25, 42).unwrap();
    Partitions::new(smote(&train, 5, 42), test).unwrap()
}

fn held_out_auc(model: &mut dyn Classifier, parts: &Partitions) -> f64 {
    let (train, test) = if model.wants_scaled() {
        (&parts.train_scaled, &parts.test_scaled)
    } else {
        (&parts.train, &parts.test)
    };
    model.fit(&train.features, &train.labels).unwrap();
    let proba = model.predict_proba(&test.features).unwrap();
    assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
    attrition::models::roc_auc(&test.labels, &proba)
}

#[test]
fn test_each_classifier_separates_clusters() {
    let parts = partitions();
    let mut models: Vec<Box<dyn Classifier>> = vec![
        Box::new(LogisticRegression::default()),
        Box::new(RandomForest::new(ForestConfig {
            n_trees: 25,
            ..ForestConfig::default()
        })),
        Box::new(GradientBoosting::new(BoostingConfig {
            n_estimators: 30,
            ..BoostingConfig::default()
        })),
        Box::new(KNearestNeighbors::new(5)),
    ];

    for model in models.iter_mut() {
        let auc = held_out_auc(model.as_mut(), &parts);
        assert!(auc > 0.9, "{} AUC too low: {}", model.name(), auc);
    }
}

#[test]
fn test_tree_models_rank_signal_above_noise() {
    let parts = partitions();
    let mut forest = RandomForest::new(ForestConfig {
        n_trees: 25,
        ..ForestConfig::default()
    });
    forest.fit(&parts.train.features, &parts.train.labels).unwrap();

    let importances = forest.feature_importances().unwrap();
    assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    assert!(importances[2] < importances[0].max(importances[1]));
}

#[test]
fn test_comparison_is_deterministic() {
    let parts = partitions();
    let first = compare_models(default_classifiers(42), &parts);
    let second = compare_models(default_classifiers(42), &parts);

    assert!(first.failures.is_empty());
    assert_eq!(first.scores.len(), 4);
    for (a, b) in first.scores.iter().zip(&second.scores) {
        assert_eq!(a.model, b.model);
        assert_eq!(a.metrics, b.metrics);
    }
    for pair in first.scores.windows(2) {
        assert!(pair[0].metrics.roc_auc >= pair[1].metrics.roc_auc);
    }
}

#[test]
fn test_single_class_training_set_is_a_failure_not_a_panic() {
    let x = Array2::from_shape_fn((6, 2), |(i, j)| (i * 2 + j) as f64);
    let y = Array1::zeros(6);
    let data = Dataset::new(x, y, vec!["a".into(), "b".into()]);
    let parts = Partitions::new(data.clone(), data).unwrap();

    let comparison = compare_models(default_classifiers(1), &parts);
    assert!(comparison.scores.is_empty());
    assert_eq!(comparison.failures.len(), 4);
    assert!(comparison.best().is_none());
}

#[test]
fn test_predict_before_fit_errors() {
    let x = Array2::<f64>::zeros((2, 3));
    assert!(LogisticRegression::default().predict_proba(&x).is_err());
    assert!(RandomForest::new(ForestConfig::default()).predict_proba(&x).is_err());
    assert!(GradientBoosting::new(BoostingConfig::default()).predict_proba(&x).is_err());
    assert!(KNearestNeighbors::new(3).predict_proba(&x).is_err());
}
