//! Moving Average Convergence Divergence (MACD).
//!
//! macd        = EMA(fast) - EMA(slow) of close
//! macd_signal = EMA(signal) of macd
//!
//! Both EMAs are first-value seeded, so both lines are defined from bar 0
//! on clean data. The slow EMA only becomes representative after `slow`
//! bars; callers decide whether that matters.

use super::ema::ema_of_series;
use super::{closes, Indicator};
use crate::domain::PriceBar;

/// Which MACD line to output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Macd,
    Signal,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(line: MacdLine, fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD spans must be >= 1");
        assert!(slow > fast, "MACD slow span must exceed fast span");
        let name = match line {
            MacdLine::Macd => "macd",
            MacdLine::Signal => "macd_signal",
        };
        Self {
            fast,
            slow,
            signal,
            line,
            name: name.to_string(),
        }
    }

    /// The conventional 12/26/9 configuration.
    pub fn standard(line: MacdLine) -> Self {
        Self::new(line, 12, 26, 9)
    }

    /// Bars until the slow EMA has seen a full span.
    pub fn convergence_bars(&self) -> usize {
        self.slow
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let values = closes(bars);
        let fast = ema_of_series(&values, self.fast);
        let slow = ema_of_series(&values, self.slow);
        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        match self.line {
            MacdLine::Macd => macd,
            MacdLine::Signal => ema_of_series(&macd, self.signal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn macd_starts_at_zero() {
        let bars = make_bars(&[10.0, 11.0, 12.0]);
        let macd = Macd::standard(MacdLine::Macd).compute(&bars);
        let signal = Macd::standard(MacdLine::Signal).compute(&bars);
        assert_approx(macd[0], 0.0, DEFAULT_EPSILON);
        assert_approx(signal[0], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn macd_matches_ema_difference() {
        let closes = [10.0, 11.0, 12.5, 12.0, 13.0, 14.5];
        let bars = make_bars(&closes);
        let macd = Macd::new(MacdLine::Macd, 2, 4, 3).compute(&bars);
        let fast = ema_of_series(&closes, 2);
        let slow = ema_of_series(&closes, 4);
        for i in 0..closes.len() {
            assert_approx(macd[i], fast[i] - slow[i], DEFAULT_EPSILON);
        }
    }

    #[test]
    fn rising_prices_give_positive_macd() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let macd = Macd::standard(MacdLine::Macd).compute(&make_bars(&closes));
        assert!(macd[1..].iter().all(|v| *v > 0.0));
    }

    #[test]
    fn names_match_feature_columns() {
        assert_eq!(Macd::standard(MacdLine::Macd).name(), "macd");
        assert_eq!(Macd::standard(MacdLine::Signal).name(), "macd_signal");
        assert_eq!(Macd::standard(MacdLine::Macd).convergence_bars(), 26);
    }
}
