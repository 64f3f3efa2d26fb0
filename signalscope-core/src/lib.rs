//! SignalScope Core: feature engine, labels, signal predictor, backtest
//! simulator, classifiers and price data.
//!
//! Pipeline stages, leaf first:
//! - Indicators and the feature engine (eleven named features per bar)
//! - Forward-looking labels for supervised training
//! - Signal prediction through an opaque [`predictor::Classifier`]
//! - Long/flat backtest accounting over the signal sequence
//!
//! Every stage borrows its input and returns a fresh output. Nothing here
//! touches the network or the filesystem except the `data` providers, the
//! Parquet cache and the model store.

pub mod backtest;
pub mod data;
pub mod domain;
pub mod error;
pub mod features;
pub mod indicators;
pub mod labels;
pub mod model;
pub mod predictor;
pub mod rng;

pub use backtest::{run_backtest, run_backtest_frame, run_backtest_rows, BacktestResult, Position};
pub use domain::{Label, PriceBar, PriceSeries, Signal};
pub use error::PipelineError;
pub use features::{
    features_from_frame, generate_features, FeatureRow, FeatureSet, FeatureVector, FEATURE_NAMES,
};
pub use labels::{label_rows, LabeledRow};
pub use predictor::{predict_signals, Classifier, SignalRow};
