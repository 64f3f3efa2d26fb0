//! Bollinger Bands: SMA(period) ± multiplier · rolling sample stddev(period).
//!
//! Exposed as three Indicator instances, one per band. With a non-negative
//! multiplier, upper >= middle >= lower wherever defined.
//! Lookback: period - 1.

use super::sma::{rolling_mean, rolling_std};
use super::{closes, Indicator};
use crate::domain::PriceBar;

/// Which band of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    /// Band with an explicit output column name.
    pub fn named(
        name: impl Into<String>,
        band: BollingerBand,
        period: usize,
        multiplier: f64,
    ) -> Self {
        assert!(period >= 2, "Bollinger period must be >= 2");
        assert!(multiplier >= 0.0, "Bollinger multiplier must be non-negative");
        Self {
            period,
            multiplier,
            band,
            name: name.into(),
        }
    }

    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self::named("bb_upper", BollingerBand::Upper, period, multiplier)
    }

    pub fn middle(period: usize, multiplier: f64) -> Self {
        Self::named("bb_middle", BollingerBand::Middle, period, multiplier)
    }

    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self::named("bb_lower", BollingerBand::Lower, period, multiplier)
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let values = closes(bars);
        let mean = rolling_mean(&values, self.period);
        if self.band == BollingerBand::Middle {
            return mean;
        }

        let std = rolling_std(&values, self.period);
        let sign = match self.band {
            BollingerBand::Upper => 1.0,
            BollingerBand::Lower => -1.0,
            BollingerBand::Middle => 0.0,
        };
        mean.iter()
            .zip(&std)
            .map(|(m, s)| m + sign * self.multiplier * s)
            .collect()
    }
}
