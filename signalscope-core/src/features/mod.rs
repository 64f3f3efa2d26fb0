//! Feature engine: raw OHLCV series → eleven named technical indicators per bar.
//!
//! The feature set and its column names are a contract shared by training and
//! inference. Consumers bind features by name through [`FeatureVector::get`]
//! rather than by position; [`FEATURE_NAMES`] is the canonical order used for
//! tables and exports.

pub mod engine;
pub mod frame;

pub use engine::{generate_features, FeatureEngine, MIN_BARS, RECOMMENDED_MIN_BARS};
pub use frame::features_from_frame;

use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;
use crate::error::PipelineError;

/// Canonical feature column names.
pub const FEATURE_NAMES: [&str; 11] = [
    "rsi",
    "macd",
    "macd_signal",
    "bb_upper",
    "bb_middle",
    "bb_lower",
    "ema_9",
    "ema_21",
    "sma_20",
    "volume_change",
    "returns",
];

/// Number of features per bar.
pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// Derived indicators for one bar. Every field is finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub bb_upper: f64,
    pub bb_middle: f64,
    pub bb_lower: f64,
    pub ema_9: f64,
    pub ema_21: f64,
    pub sma_20: f64,
    pub volume_change: f64,
    pub returns: f64,
}

impl FeatureVector {
    /// Build a vector by looking every feature up by name.
    ///
    /// Returns `None` if any lookup is missing or non-finite.
    pub fn from_lookup(mut lookup: impl FnMut(&str) -> Option<f64>) -> Option<Self> {
        let mut get = |name: &str| lookup(name).filter(|v| v.is_finite());
        Some(Self {
            rsi: get("rsi")?,
            macd: get("macd")?,
            macd_signal: get("macd_signal")?,
            bb_upper: get("bb_upper")?,
            bb_middle: get("bb_middle")?,
            bb_lower: get("bb_lower")?,
            ema_9: get("ema_9")?,
            ema_21: get("ema_21")?,
            sma_20: get("sma_20")?,
            volume_change: get("volume_change")?,
            returns: get("returns")?,
        })
    }

    /// Value of a feature by column name.
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "rsi" => Some(self.rsi),
            "macd" => Some(self.macd),
            "macd_signal" => Some(self.macd_signal),
            "bb_upper" => Some(self.bb_upper),
            "bb_middle" => Some(self.bb_middle),
            "bb_lower" => Some(self.bb_lower),
            "ema_9" => Some(self.ema_9),
            "ema_21" => Some(self.ema_21),
            "sma_20" => Some(self.sma_20),
            "volume_change" => Some(self.volume_change),
            "returns" => Some(self.returns),
            _ => None,
        }
    }

    /// Values in [`FEATURE_NAMES`] order.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.rsi,
            self.macd,
            self.macd_signal,
            self.bb_upper,
            self.bb_middle,
            self.bb_lower,
            self.ema_9,
            self.ema_21,
            self.sma_20,
            self.volume_change,
            self.returns,
        ]
    }

    /// Values in the caller's column order, resolved by name.
    pub fn values_for(&self, names: &[String]) -> Result<Vec<f64>, PipelineError> {
        names
            .iter()
            .map(|name| {
                self.get(name).ok_or_else(|| {
                    PipelineError::SchemaMismatch(format!("unknown feature '{name}'"))
                })
            })
            .collect()
    }
}

/// A bar together with its derived features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub bar: PriceBar,
    pub features: FeatureVector,
}

/// Dense feature table for one symbol, warm-up rows removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSet {
    pub symbol: String,
    pub rows: Vec<FeatureRow>,
    /// Input bars that were dropped because a feature was undefined.
    pub dropped: usize,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.bar.close).collect()
    }
}
