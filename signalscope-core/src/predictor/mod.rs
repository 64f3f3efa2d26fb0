//! Signal predictor: applies a [`Classifier`] to feature rows.
//!
//! The classifier's declared feature names are checked against the engine's
//! output before any prediction is made, and each row's values are bound by
//! name in the classifier's own order.

pub mod classifier;

pub use classifier::{standard_feature_names, Classifier};

use std::collections::HashSet;

use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::domain::{PriceBar, Signal};
use crate::error::PipelineError;
use crate::features::frame::date_series;
use crate::features::{FeatureRow, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};

/// A bar, its features and the predicted signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalRow {
    pub bar: PriceBar,
    pub features: FeatureVector,
    pub signal: Signal,
    pub reason: &'static str,
}

/// Check that `names` is exactly the standard feature set.
pub fn validate_feature_schema(names: &[String]) -> Result<(), PipelineError> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(PipelineError::SchemaMismatch(format!(
                "classifier declares feature '{name}' more than once"
            )));
        }
        if !FEATURE_NAMES.contains(&name.as_str()) {
            return Err(PipelineError::SchemaMismatch(format!(
                "classifier expects unknown feature '{name}'"
            )));
        }
    }
    if names.len() != FEATURE_COUNT {
        let missing: Vec<&str> = FEATURE_NAMES
            .iter()
            .copied()
            .filter(|n| !seen.contains(n))
            .collect();
        return Err(PipelineError::SchemaMismatch(format!(
            "classifier expects {} features, engine produces {FEATURE_COUNT}; missing {missing:?}",
            names.len()
        )));
    }
    Ok(())
}

/// Predict a signal for every feature row.
pub fn predict_signals(
    rows: &[FeatureRow],
    classifier: &dyn Classifier,
) -> Result<Vec<SignalRow>, PipelineError> {
    if !classifier.is_ready() {
        return Err(PipelineError::ModelUnavailable(format!(
            "classifier '{}' is not ready",
            classifier.name()
        )));
    }
    let names = classifier.feature_names();
    validate_feature_schema(names)?;

    let signals = rows
        .iter()
        .map(|row| {
            let input = row.features.values_for(names)?;
            let class = classifier.predict(&input);
            let signal = Signal::from_class(class).ok_or_else(|| {
                PipelineError::ModelUnavailable(format!(
                    "classifier '{}' returned class {class}, expected -1, 0 or 1",
                    classifier.name()
                ))
            })?;
            Ok(SignalRow {
                bar: row.bar,
                features: row.features,
                signal,
                reason: signal.reason(),
            })
        })
        .collect::<Result<Vec<_>, PipelineError>>()?;

    debug!(
        classifier = classifier.name(),
        rows = signals.len(),
        "signals predicted"
    );
    Ok(signals)
}

/// Signal table: `date, close, <features>, signal, reason`.
pub fn signals_to_dataframe(rows: &[SignalRow]) -> Result<DataFrame, PipelineError> {
    let to_err = |e: PolarsError| PipelineError::SchemaMismatch(format!("signal table: {e}"));

    let dates: Vec<_> = rows.iter().map(|r| r.bar.date).collect();
    let mut columns = vec![
        date_series("date", &dates)?,
        Column::new(
            "close".into(),
            rows.iter().map(|r| r.bar.close).collect::<Vec<f64>>(),
        ),
    ];
    for (idx, name) in FEATURE_NAMES.iter().enumerate() {
        let values: Vec<f64> = rows.iter().map(|r| r.features.to_array()[idx]).collect();
        columns.push(Column::new((*name).into(), values));
    }
    columns.push(Column::new(
        "signal".into(),
        rows.iter().map(|r| r.signal.value() as i32).collect::<Vec<i32>>(),
    ));
    columns.push(Column::new(
        "reason".into(),
        rows.iter().map(|r| r.reason).collect::<Vec<&str>>(),
    ));

    DataFrame::new(columns).map_err(to_err)
}
