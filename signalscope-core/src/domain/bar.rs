//! PriceBar: one daily OHLCV observation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single symbol on a single day.
///
/// Volume is carried as `f64` so that bar-over-bar percent change is computed
/// in the same domain as prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// Returns true if any OHLCV field is NaN (holiday rows, provider gaps).
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
    }

    /// All fields finite and non-negative, close strictly positive.
    pub fn is_valid(&self) -> bool {
        let fields = [self.open, self.high, self.low, self.close, self.volume];
        fields.iter().all(|v| v.is_finite() && *v >= 0.0) && self.close > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn bar_is_valid() {
        assert!(sample_bar().is_valid());
    }

    #[test]
    fn bar_detects_void() {
        let mut bar = sample_bar();
        bar.volume = f64::NAN;
        assert!(bar.is_void());
        assert!(!bar.is_valid());
    }

    #[test]
    fn zero_close_is_invalid() {
        let mut bar = sample_bar();
        bar.close = 0.0;
        assert!(!bar.is_valid());
    }

    #[test]
    fn negative_volume_is_invalid() {
        let mut bar = sample_bar();
        bar.volume = -1.0;
        assert!(!bar.is_valid());
    }
}
