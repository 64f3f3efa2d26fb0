//! Feature engine: runs the indicator set over a price series and keeps only
//! the bars where every feature is defined.

use tracing::{debug, warn};

use super::{FeatureRow, FeatureSet, FeatureVector, FEATURE_NAMES};
use crate::domain::PriceSeries;
use crate::error::PipelineError;
use crate::indicators::{
    Bollinger, Ema, Indicator, IndicatorValues, Macd, MacdLine, PctChange, PriceField, Rsi, Sma,
};

/// Shortest series that yields at least one feature row (20-bar SMA/Bollinger).
pub const MIN_BARS: usize = 20;

/// Below this length MACD's 26-bar slow EMA has not seen a full span.
pub const RECOMMENDED_MIN_BARS: usize = 26;

/// Indicator set producing the [`FEATURE_NAMES`] columns.
pub struct FeatureEngine {
    indicators: Vec<Box<dyn Indicator>>,
}

impl FeatureEngine {
    /// RSI(14), MACD(12,26,9), Bollinger(20, 2σ), EMA(9), EMA(21), SMA(20),
    /// volume change and close returns.
    pub fn standard() -> Self {
        let indicators: Vec<Box<dyn Indicator>> = vec![
            Box::new(Rsi::new(14)),
            Box::new(Macd::standard(MacdLine::Macd)),
            Box::new(Macd::standard(MacdLine::Signal)),
            Box::new(Bollinger::upper(20, 2.0)),
            Box::new(Bollinger::middle(20, 2.0)),
            Box::new(Bollinger::lower(20, 2.0)),
            Box::new(Ema::new(9)),
            Box::new(Ema::new(21)),
            Box::new(Sma::new(20)),
            Box::new(PctChange::new("volume_change", PriceField::Volume)),
            Box::new(PctChange::new("returns", PriceField::Close)),
        ];
        Self { indicators }
    }

    /// Leading bars dropped on clean input.
    pub fn warmup(&self) -> usize {
        self.indicators
            .iter()
            .map(|i| i.lookback())
            .max()
            .unwrap_or(0)
    }

    pub fn indicator_names(&self) -> Vec<&str> {
        self.indicators.iter().map(|i| i.name()).collect()
    }

    /// Compute every indicator over the series without dropping anything.
    pub fn precompute(&self, series: &PriceSeries) -> IndicatorValues {
        let mut values = IndicatorValues::new();
        for indicator in &self.indicators {
            values.insert(indicator.name(), indicator.compute(series.bars()));
        }
        values
    }

    /// Produce the dense feature table for a series.
    ///
    /// Fails with `InsufficientHistory` if the series is shorter than the
    /// warm-up window and with `DataUnavailable` if no bar survives.
    pub fn compute(&self, series: &PriceSeries) -> Result<FeatureSet, PipelineError> {
        let required = self.warmup() + 1;
        if series.len() < required {
            return Err(PipelineError::InsufficientHistory {
                required,
                actual: series.len(),
            });
        }
        if series.len() < RECOMMENDED_MIN_BARS {
            warn!(
                symbol = series.symbol(),
                bars = series.len(),
                "series shorter than {RECOMMENDED_MIN_BARS} bars; MACD has not converged"
            );
        }

        let values = self.precompute(series);
        for name in FEATURE_NAMES {
            if values.get_series(name).is_none() {
                return Err(PipelineError::SchemaMismatch(format!(
                    "feature engine does not produce '{name}'"
                )));
            }
        }

        let rows: Vec<FeatureRow> = series
            .bars()
            .iter()
            .enumerate()
            .filter_map(|(i, bar)| {
                FeatureVector::from_lookup(|name| values.get(name, i)).map(|features| {
                    FeatureRow {
                        bar: *bar,
                        features,
                    }
                })
            })
            .collect();

        let dropped = series.len() - rows.len();
        debug!(
            symbol = series.symbol(),
            input = series.len(),
            output = rows.len(),
            dropped,
            "features computed"
        );

        if rows.is_empty() {
            return Err(PipelineError::DataUnavailable(format!(
                "no bar of '{}' has every feature defined",
                series.symbol()
            )));
        }

        Ok(FeatureSet {
            symbol: series.symbol().to_string(),
            rows,
            dropped,
        })
    }
}

impl Default for FeatureEngine {
    fn default() -> Self {
        Self::standard()
    }
}

/// Compute the standard feature set for a series.
pub fn generate_features(series: &PriceSeries) -> Result<FeatureSet, PipelineError> {
    FeatureEngine::standard().compute(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn series_of(closes: &[f64]) -> PriceSeries {
        PriceSeries::new("TEST", make_bars(closes)).unwrap()
    }

    fn wavy(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + (i as f64 * 0.4).sin() * 5.0).collect()
    }

    #[test]
    fn standard_engine_produces_every_feature() {
        let engine = FeatureEngine::standard();
        let mut names = engine.indicator_names();
        names.sort_unstable();
        let mut expected = FEATURE_NAMES.to_vec();
        expected.sort_unstable();
        assert_eq!(names, expected);
    }

    #[test]
    fn warmup_is_sma_window() {
        assert_eq!(FeatureEngine::standard().warmup(), MIN_BARS - 1);
    }

    #[test]
    fn output_length_is_input_minus_warmup() {
        let set = generate_features(&series_of(&wavy(60))).unwrap();
        assert_eq!(set.len(), 60 - 19);
        assert_eq!(set.dropped, 19);
        assert_eq!(set.rows[0].bar.date, make_bars(&wavy(60))[19].date);
    }

    #[test]
    fn short_series_is_insufficient_history() {
        let err = generate_features(&series_of(&wavy(19))).unwrap_err();
        assert_eq!(
            err,
            PipelineError::InsufficientHistory {
                required: 20,
                actual: 19
            }
        );
    }

    #[test]
    fn exactly_twenty_bars_gives_one_row() {
        let set = generate_features(&series_of(&wavy(20))).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn zero_volume_drops_following_row() {
        let mut bars = make_bars(&wavy(40));
        bars[29].volume = 0.0;
        let series = PriceSeries::new("TEST", bars).unwrap();
        let set = generate_features(&series).unwrap();
        assert_eq!(set.len(), 40 - 19 - 1);
        assert!(set.rows.iter().all(|r| r.bar.date != series.bars()[30].date));
    }

    #[test]
    fn every_row_is_finite_and_bands_ordered() {
        let set = generate_features(&series_of(&wavy(120))).unwrap();
        for row in &set.rows {
            let f = row.features;
            assert!(f.to_array().iter().all(|v| v.is_finite()));
            assert!(f.bb_upper >= f.bb_middle && f.bb_middle >= f.bb_lower);
            assert!((0.0..=100.0).contains(&f.rsi));
        }
    }

    #[test]
    fn returns_feature_matches_close_change() {
        let closes = wavy(30);
        let set = generate_features(&series_of(&closes)).unwrap();
        let expected = closes[19] / closes[18] - 1.0;
        assert!((set.rows[0].features.returns - expected).abs() < 1e-12);
    }
}
