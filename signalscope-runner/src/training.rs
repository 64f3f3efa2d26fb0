//! Training path: per-symbol labelled datasets → one global random forest.
//!
//! Each symbol is loaded and labelled independently on the rayon pool.
//! Symbols that fail (no data, too short) are skipped and reported; the
//! model is fitted on whatever remains.

use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;
use signalscope_core::data::{DataProvider, ParquetCache};
use signalscope_core::model::{ForestConfig, ModelKind, ModelStore, RandomForest, TrainingSet};
use signalscope_core::predictor::standard_feature_names;
use signalscope_core::{generate_features, label_rows, PriceSeries};
use tracing::{info, warn};

use crate::data_loader::{load_series, LoadOptions};
use crate::pipeline::RunError;

/// Outcome of a training run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub processed: Vec<String>,
    /// `(symbol, reason)` for every skipped symbol.
    pub failed: Vec<(String, String)>,
    pub samples: usize,
    /// Sell, Hold, Buy.
    pub class_counts: [usize; 3],
    /// In-sample accuracy of the fitted forest.
    pub accuracy: f64,
    pub n_trees: usize,
}

/// Labelled feature rows for one series.
pub fn prepare_series(series: &PriceSeries) -> Result<TrainingSet, RunError> {
    let features = generate_features(series)?;
    let labelled = label_rows(&features.rows);
    let set = TrainingSet::from_labeled(&labelled);
    if set.is_empty() {
        return Err(RunError::NoTrainingData(format!(
            "'{}' produced no labelled rows",
            series.symbol()
        )));
    }
    Ok(set)
}

/// Merge per-symbol results in input order.
fn merge(
    symbols: &[String],
    results: Vec<Result<TrainingSet, RunError>>,
) -> (TrainingSet, Vec<String>, Vec<(String, String)>) {
    let mut data = TrainingSet::empty(standard_feature_names());
    let mut processed = Vec::new();
    let mut failed = Vec::new();

    for (symbol, result) in symbols.iter().zip(results) {
        match result {
            Ok(set) => {
                let rows = set.n_samples();
                if data.extend(set) {
                    info!(symbol = symbol.as_str(), rows, "prepared");
                    processed.push(symbol.clone());
                } else {
                    failed.push((symbol.clone(), "feature columns differ".to_string()));
                }
            }
            Err(e) => {
                warn!(symbol = symbol.as_str(), error = %e, "skipping symbol");
                failed.push((symbol.clone(), e.to_string()));
            }
        }
    }
    (data, processed, failed)
}

/// Fit a forest on already prepared series.
pub fn train_on_series(
    series: &[PriceSeries],
    config: ForestConfig,
) -> Result<(RandomForest, TrainingReport), RunError> {
    let symbols: Vec<String> = series.iter().map(|s| s.symbol().to_string()).collect();
    let results: Vec<_> = series.par_iter().map(prepare_series).collect();
    fit(&symbols, results, config)
}

/// Load every symbol, build the pooled dataset and fit the forest.
pub fn train_global_model(
    symbols: &[String],
    cache: &ParquetCache,
    provider: Option<&dyn DataProvider>,
    opts: &LoadOptions,
    config: ForestConfig,
) -> Result<(RandomForest, TrainingReport), RunError> {
    info!(symbols = symbols.len(), "preparing training data");
    let results: Vec<_> = symbols
        .par_iter()
        .map(|symbol| {
            let loaded = load_series(symbol, cache, provider, opts)?;
            prepare_series(&loaded.series)
        })
        .collect();
    fit(symbols, results, config)
}

fn fit(
    symbols: &[String],
    results: Vec<Result<TrainingSet, RunError>>,
    config: ForestConfig,
) -> Result<(RandomForest, TrainingReport), RunError> {
    let (data, processed, failed) = merge(symbols, results);
    if data.is_empty() {
        return Err(RunError::NoTrainingData(format!(
            "all {} symbols failed",
            symbols.len()
        )));
    }

    let class_counts = data.class_counts();
    info!(
        samples = data.n_samples(),
        sell = class_counts[0],
        hold = class_counts[1],
        buy = class_counts[2],
        "fitting random forest"
    );
    let forest = RandomForest::fit(&data, config)?;
    let accuracy = forest.accuracy(&data);

    let report = TrainingReport {
        processed,
        failed,
        samples: data.n_samples(),
        class_counts,
        accuracy,
        n_trees: forest.n_trees(),
    };
    Ok((forest, report))
}

/// Save a fitted forest as the global model artifact.
pub fn save_model(forest: RandomForest, path: &Path) -> Result<(), RunError> {
    ModelStore::save(path, ModelKind::RandomForest(forest))?;
    Ok(())
}
