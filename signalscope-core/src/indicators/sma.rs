//! Simple Moving Average (SMA) and rolling sample standard deviation.
//!
//! Windowed over the last `period` values inclusive of the current bar.
//! A window containing NaN yields NaN.
//! Lookback: period - 1 (first valid value at index period-1).

use super::{closes, Indicator};
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        rolling_mean(&closes(bars), self.period)
    }
}

/// Rolling mean over `period` values.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let mut sum: f64 = values[..period].iter().sum();
    result[period - 1] = sum / period as f64;

    for i in period..n {
        let leaving = values[i - period];
        let entering = values[i];
        if leaving.is_nan() || entering.is_nan() || sum.is_nan() {
            // NaN poisons the running sum; rescan the window.
            sum = values[(i + 1 - period)..=i].iter().sum();
        } else {
            sum += entering - leaving;
        }
        result[i] = sum / period as f64;
    }

    result
}

/// Rolling sample standard deviation (n - 1 denominator) over `period` values.
///
/// Each window is computed two-pass around its own mean to avoid the
/// cancellation error of a running sum of squares.
pub fn rolling_std(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period < 2 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &values[(i + 1 - period)..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        let mean = window.iter().sum::<f64>() / period as f64;
        let ss: f64 = window.iter().map(|v| (v - mean) * (v - mean)).sum();
        result[i] = (ss / (period - 1) as f64).sqrt();
    }

    result
}
