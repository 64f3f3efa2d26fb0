//! Indicator implementations backing the feature engine.
//!
//! Every indicator implements [`Indicator`]: full bar history in, a series of
//! the same length out, with `f64::NAN` during warm-up. Each feature column is
//! one named indicator instance; multi-series indicators (Bollinger, MACD)
//! are exposed as one instance per output line.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod pct_change;
pub mod rsi;
pub mod sma;

pub use bollinger::{Bollinger, BollingerBand};
pub use ema::{ema_of_series, Ema};
pub use macd::{Macd, MacdLine};
pub use pct_change::{pct_change_of_series, PctChange, PriceField};
pub use rsi::{rsi_of_series, Rsi};
pub use sma::{rolling_mean, rolling_std, Sma};

use crate::domain::PriceBar;
use std::collections::HashMap;

/// Trait for per-bar indicators.
///
/// # Look-ahead contamination guard
/// No value at bar t may depend on bars after t. Computing on a truncated
/// series must reproduce the prefix of the full-series output exactly.
pub trait Indicator: Send + Sync {
    /// Column name of the produced series (e.g. "sma_20").
    fn name(&self) -> &str;

    /// Number of leading bars that are NaN on clean input.
    fn lookback(&self) -> usize;

    /// Compute the series. Output length equals `bars.len()`.
    fn compute(&self, bars: &[PriceBar]) -> Vec<f64>;
}

/// Named indicator series computed once over a bar history.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Value of a named series at a bar index.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
    }

    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

pub(crate) fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Create synthetic bars from close prices for testing.
///
/// open = previous close, high/low = ±1 around the body, volume grows by 10
/// per bar so volume change is always defined.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: (open.min(close) - 1.0).max(0.0),
                close,
                volume: 1000.0 + 10.0 * i as f64,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
