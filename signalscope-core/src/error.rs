//! Pipeline error taxonomy.
//!
//! Every stage of the feature → predict → backtest pipeline fails with one of
//! these four variants. Errors are surfaced immediately; nothing in the core
//! retries or falls back to partial results.

use thiserror::Error;

/// Errors raised by the core pipeline stages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Empty or missing price series.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// Expected columns or features are absent, duplicated or malformed.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Classifier artifact missing, not fitted, or incompatible.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// Series shorter than the warm-up window.
    #[error("insufficient history: need at least {required} bars, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },
}

impl PipelineError {
    pub fn missing_column(name: &str) -> Self {
        PipelineError::SchemaMismatch(format!("missing column '{name}'"))
    }
}
