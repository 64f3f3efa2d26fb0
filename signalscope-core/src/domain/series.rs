//! PriceSeries: a validated, chronologically ordered run of bars for one symbol.

use serde::Serialize;

use super::bar::PriceBar;
use crate::error::PipelineError;

/// Ordered bars for one symbol.
///
/// Construction enforces: at least one bar, strictly increasing dates, and
/// every bar passing [`PriceBar::is_valid`]. Once built the series is
/// immutable; pipeline stages borrow it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, PipelineError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(PipelineError::DataUnavailable(format!(
                "empty price series for '{symbol}'"
            )));
        }

        for (i, bar) in bars.iter().enumerate() {
            if !bar.is_valid() {
                return Err(PipelineError::SchemaMismatch(format!(
                    "invalid bar for '{symbol}' on {}: {bar:?}",
                    bar.date
                )));
            }
            if i > 0 && bar.date <= bars[i - 1].date {
                return Err(PipelineError::SchemaMismatch(format!(
                    "dates not strictly increasing for '{symbol}' at {} (previous {})",
                    bar.date,
                    bars[i - 1].date
                )));
            }
        }

        Ok(Self { symbol, bars })
    }

    /// Build a series from provider output that may be unsorted, duplicated or
    /// contain void rows.
    ///
    /// Void and invalid rows are dropped, rows are sorted by date, and for a
    /// duplicated date the last occurrence wins.
    pub fn from_unclean(
        symbol: impl Into<String>,
        mut bars: Vec<PriceBar>,
    ) -> Result<Self, PipelineError> {
        bars.retain(|b| b.is_valid());
        bars.sort_by_key(|b| b.date);

        let mut deduped: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }

        Self::new(symbol, deduped)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false for a constructed series; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    pub fn first_date(&self) -> chrono::NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> chrono::NaiveDate {
        self.bars[self.bars.len() - 1].date
    }

    pub fn into_bars(self) -> Vec<PriceBar> {
        self.bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn empty_series_is_data_unavailable() {
        let err = PriceSeries::new("SPY", vec![]).unwrap_err();
        assert!(matches!(err, PipelineError::DataUnavailable(_)));
    }

    #[test]
    fn duplicate_dates_rejected() {
        let err = PriceSeries::new("SPY", vec![bar(2, 10.0), bar(2, 11.0)]).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch(_)));
    }

    #[test]
    fn unsorted_dates_rejected() {
        let err = PriceSeries::new("SPY", vec![bar(3, 10.0), bar(2, 11.0)]).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch(_)));
    }

    #[test]
    fn from_unclean_sorts_dedups_and_drops_void() {
        let mut void = bar(4, 12.0);
        void.close = f64::NAN;
        let series =
            PriceSeries::from_unclean("SPY", vec![bar(3, 11.0), bar(2, 10.0), void, bar(3, 11.5)])
                .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![10.0, 11.5]);
    }

    #[test]
    fn from_unclean_all_void_is_data_unavailable() {
        let mut void = bar(4, 12.0);
        void.close = f64::NAN;
        let err = PriceSeries::from_unclean("SPY", vec![void]).unwrap_err();
        assert!(matches!(err, PipelineError::DataUnavailable(_)));
    }
}
