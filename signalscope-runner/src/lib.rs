//! SignalScope Runner: orchestration around `signalscope-core`.
//!
//! This crate provides:
//! - TOML configuration with defaults for every key
//! - `tracing` subscriber setup
//! - Series loading with cache/download/synthetic fallback
//! - The analysis path (features → signals → backtest → markers)
//! - The training path (per-symbol labelled data → global random forest)
//! - Artifact export (signals.csv, equity.csv, summary.json, report.md)

pub mod config;
pub mod data_loader;
pub mod export;
pub mod logging;
pub mod pipeline;
pub mod training;

pub use config::{AppConfig, ConfigError};
pub use data_loader::{load_series, LoadError, LoadOptions, LoadedSeries};
pub use export::{load_summary, save_artifacts, RunSummary};
pub use pipeline::{analyze_symbol, run_analysis, AnalysisReport, RunError, LATEST_SIGNALS};
pub use training::{save_model, train_global_model, train_on_series, TrainingReport};
