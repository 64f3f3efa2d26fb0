//! Backtest simulator: long/flat accounting over a signal sequence.
//!
//! Every function is pure. The signal on bar t−1 sets the exposure for
//! bar t's return, so a signal never trades on the bar that produced it.

pub mod markers;
pub mod position;

pub use markers::{entry_exit_markers, Marker, MarkerKind};
pub use position::Position;

use polars::prelude::*;
use serde::Serialize;

use crate::domain::Signal;
use crate::error::PipelineError;
use crate::features::frame::f64_column;
use crate::predictor::SignalRow;

/// Output of one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    /// `close[t] / close[t-1] - 1`, 0 on the first bar.
    pub market_returns: Vec<f64>,
    /// `market_returns[t] * signal[t-1]`, 0 on the first bar.
    pub strategy_returns: Vec<f64>,
    /// Running product of `1 + strategy_return`, base 1.0.
    pub cumulative_strategy: Vec<f64>,
    /// Running product of `1 + market_return`, base 1.0.
    pub cumulative_market: Vec<f64>,
    /// Long/flat state per bar. A bar after a Sell reads `Flat` even though
    /// its entry in `strategy_returns` carries the inverted market return.
    pub positions: Vec<Position>,
    pub trades: usize,
    /// Mean per-bar strategy return, percent.
    pub avg_return: f64,
    /// Final strategy equity minus one, percent.
    pub total_return: f64,
}

impl BacktestResult {
    pub fn len(&self) -> usize {
        self.market_returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.market_returns.is_empty()
    }

    /// Final market equity minus one, percent.
    pub fn market_total_return(&self) -> f64 {
        self.cumulative_market
            .last()
            .map_or(0.0, |eq| (eq - 1.0) * 100.0)
    }
}

/// Run the simulator over aligned closes and signals.
pub fn run_backtest(closes: &[f64], signals: &[Signal]) -> Result<BacktestResult, PipelineError> {
    if closes.is_empty() {
        return Err(PipelineError::DataUnavailable(
            "backtest needs at least one bar".to_string(),
        ));
    }
    if closes.len() != signals.len() {
        return Err(PipelineError::SchemaMismatch(format!(
            "close and signal lengths differ ({} vs {})",
            closes.len(),
            signals.len()
        )));
    }
    if let Some((row, close)) = closes
        .iter()
        .enumerate()
        .find(|(_, c)| !c.is_finite() || **c <= 0.0)
    {
        return Err(PipelineError::SchemaMismatch(format!(
            "invalid close {close} at row {row}"
        )));
    }

    let market_returns = market_returns(closes);
    let strategy_returns: Vec<f64> = market_returns
        .iter()
        .enumerate()
        .map(|(t, r)| {
            if t == 0 {
                0.0
            } else {
                r * f64::from(signals[t - 1].value())
            }
        })
        .collect();

    let positions = (0..signals.len())
        .map(|t| Position::after(t.checked_sub(1).map(|p| signals[p])))
        .collect();

    let cumulative_strategy = cumulative(&strategy_returns);
    let cumulative_market = cumulative(&market_returns);
    let avg_return = mean(&strategy_returns) * 100.0;
    let total_return = cumulative_strategy.last().map_or(0.0, |eq| (eq - 1.0) * 100.0);

    Ok(BacktestResult {
        trades: count_trades(signals),
        market_returns,
        strategy_returns,
        cumulative_strategy,
        cumulative_market,
        positions,
        avg_return,
        total_return,
    })
}

/// Run the simulator over predicted signal rows.
pub fn run_backtest_rows(rows: &[SignalRow]) -> Result<BacktestResult, PipelineError> {
    let closes: Vec<f64> = rows.iter().map(|r| r.bar.close).collect();
    let signals: Vec<Signal> = rows.iter().map(|r| r.signal).collect();
    run_backtest(&closes, &signals)
}

/// Run the simulator over a table with `close` and `signal` columns.
pub fn run_backtest_frame(df: &DataFrame) -> Result<BacktestResult, PipelineError> {
    let closes = f64_column(df, "close")?;
    let signals = f64_column(df, "signal")?
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            let signal = if v.fract() == 0.0 {
                Signal::from_class(v as i64)
            } else {
                None
            };
            signal.ok_or_else(|| {
                PipelineError::SchemaMismatch(format!("invalid signal {v} at row {i}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    run_backtest(&closes, &signals)
}

// ─── Building blocks ────────────────────────────────────────────────

/// Bar-over-bar close returns with the first bar fixed at 0.
pub fn market_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .iter()
        .enumerate()
        .map(|(t, c)| if t == 0 { 0.0 } else { c / closes[t - 1] - 1.0 })
        .collect()
}

/// Equity curve from per-bar returns, base 1.0.
pub fn cumulative(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0, |equity, r| {
            *equity *= 1.0 + r;
            Some(*equity)
        })
        .collect()
}

/// Half the total absolute signal change, rounded down.
pub fn count_trades(signals: &[Signal]) -> usize {
    let changes: u32 = signals
        .windows(2)
        .map(|w| (i32::from(w[1].value()) - i32::from(w[0].value())).unsigned_abs())
        .sum();
    (changes / 2) as usize
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
