//! End-to-end core pipeline: features → labels → forest → store → predict → backtest.

use chrono::NaiveDate;
use signalscope_core::data::SyntheticProvider;
use signalscope_core::labels::label_rows;
use signalscope_core::model::{
    ForestConfig, ModelKind, ModelStore, RandomForest, RuleClassifier, TrainingSet,
};
use signalscope_core::predictor::{validate_feature_schema, Classifier};
use signalscope_core::{
    generate_features, predict_signals, run_backtest_rows, FeatureSet, PipelineError, PriceSeries,
};

fn features_for(symbol: &str) -> FeatureSet {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let end = NaiveDate::from_ymd_opt(2023, 12, 29).unwrap();
    let bars = SyntheticProvider::new(11).generate(symbol, start, end);
    generate_features(&PriceSeries::new(symbol, bars).unwrap()).unwrap()
}

fn training_set() -> TrainingSet {
    let mut set = TrainingSet::from_labeled(&label_rows(&features_for("AAPL").rows));
    set.extend(TrainingSet::from_labeled(&label_rows(&features_for("MSFT").rows)));
    set
}

fn small_forest() -> RandomForest {
    RandomForest::fit(
        &training_set(),
        ForestConfig {
            n_trees: 20,
            ..ForestConfig::default()
        },
    )
    .unwrap()
}

#[test]
fn trained_forest_runs_through_the_whole_pipeline() {
    let forest = small_forest();
    validate_feature_schema(forest.feature_names()).unwrap();

    let set = features_for("GOOG");
    let signals = predict_signals(&set.rows, &forest).unwrap();
    assert_eq!(signals.len(), set.len());

    let result = run_backtest_rows(&signals).unwrap();
    assert_eq!(result.len(), set.len());
    assert_eq!(result.cumulative_strategy[0], 1.0);
    assert!(result.total_return.is_finite());
}

#[test]
fn predictions_are_deterministic() {
    let set = features_for("TSLA");
    let a = predict_signals(&set.rows, &small_forest()).unwrap();
    let b = predict_signals(&set.rows, &small_forest()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn stored_forest_predicts_like_the_original() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("global_model.json");
    let forest = small_forest();
    ModelStore::save(&path, ModelKind::RandomForest(forest.clone())).unwrap();
    let loaded = ModelStore::load(&path).unwrap();

    let set = features_for("AMZN");
    let original = predict_signals(&set.rows, &forest).unwrap();
    let restored = predict_signals(&set.rows, loaded.as_ref()).unwrap();
    assert_eq!(original, restored);
}

#[test]
fn missing_artifact_surfaces_as_model_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let err: PipelineError = ModelStore::load(&dir.path().join("absent.json"))
        .map(|_| ())
        .unwrap_err()
        .into();
    assert!(matches!(err, PipelineError::ModelUnavailable(_)));
}

#[test]
fn unfitted_forest_is_model_unavailable() {
    let set = features_for("AAPL");
    let forest = RandomForest::unfitted(ForestConfig::default());
    assert!(matches!(
        predict_signals(&set.rows, &forest),
        Err(PipelineError::ModelUnavailable(_))
    ));
}

#[test]
fn rule_classifier_needs_no_training() {
    let set = features_for("INFY.NS");
    let signals = predict_signals(&set.rows, &RuleClassifier::default()).unwrap();
    let result = run_backtest_rows(&signals).unwrap();
    assert!(result.trades > 0);
}
