//! Multi-symbol download into the Parquet cache.

use chrono::NaiveDate;

use super::cache::{CoverageResult, ParquetCache};
use super::provider::{DataError, DataProvider, DownloadProgress};
use crate::domain::PriceSeries;

/// Download each symbol, clean it and cache it. Symbols already covered by
/// the cache are skipped unless `force` is set. Once the provider reports
/// itself unavailable the remaining symbols fail without a request.
pub fn download_symbols(
    provider: &dyn DataProvider,
    cache: &ParquetCache,
    symbols: &[&str],
    start: NaiveDate,
    end: NaiveDate,
    force: bool,
    progress: &dyn DownloadProgress,
) -> DownloadSummary {
    let total = symbols.len();
    let mut succeeded = 0;
    let mut errors: Vec<(String, DataError)> = Vec::new();

    for (i, symbol) in symbols.iter().enumerate() {
        if !provider.is_available() {
            for sym in &symbols[i..] {
                errors.push((sym.to_string(), DataError::ProviderBlocked));
            }
            break;
        }

        progress.on_start(symbol, i, total);

        if !force && cache.covers_range(symbol, start, end) == CoverageResult::FullyCovered {
            progress.on_complete(symbol, i, total, &Ok(()));
            succeeded += 1;
            continue;
        }

        let result = download_single(provider, cache, symbol, start, end);
        progress.on_complete(symbol, i, total, &result);
        match result {
            Ok(()) => succeeded += 1,
            Err(e) => errors.push((symbol.to_string(), e)),
        }
    }

    let failed = errors.len();
    progress.on_batch_complete(succeeded, failed, total);

    DownloadSummary {
        total,
        succeeded,
        failed,
        errors,
    }
}

/// fetch → clean → cache.
pub fn download_single(
    provider: &dyn DataProvider,
    cache: &ParquetCache,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(), DataError> {
    let fetched = provider.fetch(symbol, start, end)?;
    let series = PriceSeries::from_unclean(symbol, fetched.bars)?;
    cache.write(&series, fetched.source)?;
    Ok(())
}

#[derive(Debug)]
pub struct DownloadSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<(String, DataError)>,
}

impl DownloadSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::{DataSource, FetchResult, LogProgress};
    use crate::data::synthetic::SyntheticProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Synthetic data, but refuses one symbol and blocks after `limit` calls.
    struct Flaky {
        inner: SyntheticProvider,
        calls: AtomicUsize,
        limit: usize,
    }

    impl DataProvider for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }
        fn fetch(
            &self,
            symbol: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<FetchResult, DataError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if symbol == "BAD" {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.into(),
                });
            }
            self.inner.fetch(symbol, start, end)
        }
        fn is_available(&self) -> bool {
            self.calls.load(Ordering::Relaxed) < self.limit
        }
    }

    fn dates() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        )
    }

    #[test]
    fn failures_are_collected_and_blocking_stops_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        let provider = Flaky {
            inner: SyntheticProvider::default(),
            calls: AtomicUsize::new(0),
            limit: 2,
        };
        let (start, end) = dates();
        let summary = download_symbols(
            &provider,
            &cache,
            &["AAPL", "BAD", "MSFT"],
            start,
            end,
            false,
            &LogProgress,
        );

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 2);
        assert!(matches!(summary.errors[1].1, DataError::ProviderBlocked));
        assert_eq!(cache.get_meta("AAPL").unwrap().source, DataSource::Synthetic);
    }

    #[test]
    fn covered_symbols_are_not_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        let provider = Flaky {
            inner: SyntheticProvider::default(),
            calls: AtomicUsize::new(0),
            limit: usize::MAX,
        };
        let (start, end) = dates();
        // synthetic bars skip weekends, so request the weekday span they cover
        download_single(&provider, &cache, "AAPL", start, end).unwrap();
        let meta = cache.get_meta("AAPL").unwrap();

        let summary = download_symbols(
            &provider,
            &cache,
            &["AAPL"],
            meta.start_date,
            meta.end_date,
            false,
            &LogProgress,
        );
        assert!(summary.all_succeeded());
        assert_eq!(provider.calls.load(Ordering::Relaxed), 1);
    }
}
