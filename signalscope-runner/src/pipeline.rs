//! Analysis path: price series → features → signals → backtest.

use chrono::NaiveDate;
use polars::prelude::DataFrame;
use serde::Serialize;
use signalscope_core::backtest::{entry_exit_markers, Marker};
use signalscope_core::data::{DataError, DataProvider, DataSource, ParquetCache};
use signalscope_core::model::ModelStoreError;
use signalscope_core::predictor::signals_to_dataframe;
use signalscope_core::{
    generate_features, predict_signals, run_backtest_rows, BacktestResult, Classifier,
    PipelineError, PriceSeries, SignalRow,
};
use thiserror::Error;
use tracing::info;

use crate::config::ConfigError;
use crate::data_loader::{load_series, LoadError, LoadOptions};

/// Number of most recent signals shown in summaries.
pub const LATEST_SIGNALS: usize = 10;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Load(#[from] LoadError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("{0}")]
    Pipeline(#[from] PipelineError),
    #[error("model error: {0}")]
    Model(#[from] ModelStoreError),
    #[error("no usable training data: {0}")]
    NoTrainingData(String),
}

/// Everything produced by one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub source: DataSource,
    pub classifier: String,
    /// Input bars dropped during feature warm-up.
    pub warmup_bars: usize,
    pub signals: Vec<SignalRow>,
    pub backtest: BacktestResult,
    pub markers: Vec<Marker>,
}

impl AnalysisReport {
    /// The last `n` signal rows, oldest first.
    pub fn latest(&self, n: usize) -> &[SignalRow] {
        let start = self.signals.len().saturating_sub(n);
        &self.signals[start..]
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.signals.first().map(|r| r.bar.date)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.signals.last().map(|r| r.bar.date)
    }

    pub fn signal_table(&self) -> Result<DataFrame, PipelineError> {
        signals_to_dataframe(&self.signals)
    }
}

/// Run features → predict → backtest over an already loaded series.
pub fn run_analysis(
    series: &PriceSeries,
    source: DataSource,
    classifier: &dyn Classifier,
) -> Result<AnalysisReport, RunError> {
    let features = generate_features(series)?;
    let signals = predict_signals(&features.rows, classifier)?;
    let backtest = run_backtest_rows(&signals)?;

    let closes: Vec<f64> = signals.iter().map(|r| r.bar.close).collect();
    let kinds: Vec<_> = signals.iter().map(|r| r.signal).collect();
    let markers = entry_exit_markers(&closes, &kinds)?;

    info!(
        symbol = series.symbol(),
        rows = signals.len(),
        trades = backtest.trades,
        total_return_pct = backtest.total_return,
        "analysis complete"
    );

    Ok(AnalysisReport {
        symbol: series.symbol().to_string(),
        source,
        classifier: classifier.name().to_string(),
        warmup_bars: features.dropped,
        signals,
        backtest,
        markers,
    })
}

/// Resolve `symbol`'s bars and analyze them.
pub fn analyze_symbol(
    symbol: &str,
    cache: &ParquetCache,
    provider: Option<&dyn DataProvider>,
    opts: &LoadOptions,
    classifier: &dyn Classifier,
) -> Result<AnalysisReport, RunError> {
    let loaded = load_series(symbol, cache, provider, opts)?;
    run_analysis(&loaded.series, loaded.source, classifier)
}
