//! Synthetic price provider: a seeded random walk on weekdays.
//!
//! Bars for a symbol depend only on the provider seed, the symbol and the
//! date range, so offline runs and tests are reproducible.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::Rng;
use tracing::warn;

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::PriceBar;
use crate::rng::RngHierarchy;

pub struct SyntheticProvider {
    seeds: RngHierarchy,
    start_price: f64,
    max_daily_move: f64,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            seeds: RngHierarchy::new(seed),
            start_price: 100.0,
            max_daily_move: 0.03,
        }
    }

    /// Generate bars for every weekday in `[start, end]`.
    pub fn generate(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
        let mut rng = self.seeds.rng_for(symbol, 0);
        let mut bars = Vec::new();
        let mut price = self.start_price;

        for date in start.iter_days().take_while(|d| *d <= end) {
            if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                continue;
            }
            let daily_return: f64 = rng.gen_range(-self.max_daily_move..self.max_daily_move);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64) as f64;

            bars.push(PriceBar {
                date,
                open,
                high,
                low,
                close,
                volume,
            });
            price = close;
        }
        bars
    }
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new(42)
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let bars = self.generate(symbol, start, end);
        if bars.is_empty() {
            return Err(DataError::EmptyRange {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        warn!(symbol, bars = bars.len(), "using synthetic price data");
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::Synthetic,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}
