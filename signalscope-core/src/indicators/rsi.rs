//! Relative Strength Index (RSI), Wilder smoothing.
//!
//! Seed: simple mean of gains and losses over the first `period` changes.
//! Then avg = (prev * (period - 1) + current) / period.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Lookback: period.
//!
//! Division-by-zero policy: avg_loss == 0 saturates at 100, avg_gain == 0
//! gives 0, and a window with no movement at all gives 50.

use super::{closes, Indicator};
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: "rsi".to_string(),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        rsi_of_series(&closes(bars), self.period)
    }
}

/// RSI over an arbitrary series.
pub fn rsi_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period + 1 {
        return result;
    }

    let changes: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for &ch in &changes[..period] {
        if ch.is_nan() {
            return result;
        }
        avg_gain += ch.max(0.0);
        avg_loss += (-ch).max(0.0);
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    result[period] = rsi_from_averages(avg_gain, avg_loss);

    let p = period as f64;
    for i in (period + 1)..n {
        let ch = changes[i - 1];
        if ch.is_nan() {
            return result;
        }
        avg_gain = (avg_gain * (p - 1.0) + ch.max(0.0)) / p;
        avg_loss = (avg_loss * (p - 1.0) + (-ch).max(0.0)) / p;
        result[i] = rsi_from_averages(avg_gain, avg_loss);
    }

    result
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        (100.0 - 100.0 / (1.0 + avg_gain / avg_loss)).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    #[test]
    fn rsi_all_gains_saturates_at_100() {
        let bars = make_bars(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        let result = Rsi::new(3).compute(&bars);
        assert_approx(result[3], 100.0, 1e-9);
        assert_approx(result[5], 100.0, 1e-9);
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let bars = make_bars(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]);
        let result = Rsi::new(3).compute(&bars);
        assert_approx(result[3], 0.0, 1e-9);
    }

    #[test]
    fn rsi_flat_window_is_50() {
        let result = rsi_of_series(&[10.0; 6], 3);
        assert_approx(result[3], 50.0, 1e-9);
        assert_approx(result[5], 50.0, 1e-9);
    }

    #[test]
    fn rsi_known_seed_value() {
        // Changes: +0.34, -0.25, -0.48
        // avg_gain = 0.34/3, avg_loss = 0.73/3
        // RSI = 100 - 100/(1 + 0.34/0.73)
        let result = rsi_of_series(&[44.0, 44.34, 44.09, 43.61], 3);
        let expected = 100.0 - 100.0 / (1.0 + 0.34 / 0.73);
        assert_approx(result[3], expected, 1e-9);
        assert!(result[2].is_nan());
    }

    #[test]
    fn rsi_wilder_step() {
        // seed avg_gain = 1, avg_loss = 1 (changes +2, -2)
        // next change +4: avg_gain = (1*1 + 4)/2 = 2.5, avg_loss = (1*1 + 0)/2 = 0.5
        let result = rsi_of_series(&[10.0, 12.0, 10.0, 14.0], 2);
        assert_approx(result[2], 50.0, 1e-9);
        assert_approx(result[3], 100.0 - 100.0 / (1.0 + 5.0), 1e-9);
    }

    #[test]
    fn rsi_bounds() {
        let bars = make_bars(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        let result = Rsi::new(3).compute(&bars);
        for (i, &v) in result.iter().enumerate() {
            if !v.is_nan() {
                assert!((0.0..=100.0).contains(&v), "RSI out of bounds at bar {i}: {v}");
            }
        }
    }

    #[test]
    fn rsi_nan_in_seed_is_all_nan() {
        let result = rsi_of_series(&[100.0, 101.0, f64::NAN, 103.0, 104.0], 3);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(Rsi::new(14).lookback(), 14);
    }
}
