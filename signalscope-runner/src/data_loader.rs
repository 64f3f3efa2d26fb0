//! Price series resolution for the runner.
//!
//! Fallback policy for one symbol:
//! 1. Cached bars covering the range → use them
//! 2. Not cached (or stale) and a provider is available → download, cache, use
//! 3. Download failed but partial cache exists → use the cached bars
//! 4. `synthetic` set → generate a seeded random walk (never cached)
//! 5. Otherwise fail

use chrono::{Duration, Local, NaiveDate};
use signalscope_core::data::{
    download_single, CacheMeta, DataError, DataProvider, DataSource, ParquetCache,
    SyntheticProvider,
};
use signalscope_core::{PipelineError, PriceSeries};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Gap tolerated at either end of a cached range (weekends, holidays).
const COVERAGE_SLACK_DAYS: i64 = 4;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(
        "no cached data for '{symbol}' and no network access (use --synthetic for synthetic data)"
    )]
    NoCachedDataOffline { symbol: String },

    #[error("no cached data for '{symbol}' and download failed: {reason}")]
    DownloadFailed { symbol: String, reason: String },

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl From<LoadError> for PipelineError {
    fn from(e: LoadError) -> Self {
        match e {
            LoadError::Pipeline(inner) => inner,
            LoadError::Data(inner) => inner.into(),
            other => PipelineError::DataUnavailable(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Never make network requests.
    pub offline: bool,
    /// Generate synthetic bars when real data is unavailable.
    pub synthetic: bool,
    /// Re-download even if cached.
    pub force: bool,
}

impl LoadOptions {
    /// The `days` calendar days ending today.
    pub fn lookback(days: i64) -> Self {
        let end = Local::now().date_naive();
        Self {
            start: end - Duration::days(days),
            end,
            offline: false,
            synthetic: false,
            force: false,
        }
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn synthetic(mut self, synthetic: bool) -> Self {
        self.synthetic = synthetic;
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// A resolved series and where its bars came from.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub series: PriceSeries,
    pub source: DataSource,
}

/// True if the cached range reaches both ends of `[start, end]`, allowing
/// for non-trading days at the edges.
pub fn meta_covers(meta: &CacheMeta, start: NaiveDate, end: NaiveDate) -> bool {
    let slack = Duration::days(COVERAGE_SLACK_DAYS);
    meta.start_date <= start + slack && meta.end_date + slack >= end
}

/// Resolve the bars for `symbol` over `opts.start..=opts.end`.
pub fn load_series(
    symbol: &str,
    cache: &ParquetCache,
    provider: Option<&dyn DataProvider>,
    opts: &LoadOptions,
) -> Result<LoadedSeries, LoadError> {
    let cached_meta = cache.get_meta(symbol);

    if !opts.force {
        if let Some(meta) = &cached_meta {
            if meta_covers(meta, opts.start, opts.end) || opts.offline {
                match cache.load_series(symbol, opts.start, opts.end) {
                    Ok(series) => {
                        debug!(symbol, bars = series.len(), "loaded from cache");
                        return Ok(LoadedSeries {
                            series,
                            source: DataSource::Cache,
                        });
                    }
                    Err(e) => warn!(symbol, error = %e, "cached data unusable"),
                }
            }
        }
    }

    let mut download_error: Option<DataError> = None;
    if !opts.offline {
        if let Some(prov) = provider.filter(|p| p.is_available()) {
            info!(symbol, provider = prov.name(), "downloading");
            match download_single(prov, cache, symbol, opts.start, opts.end) {
                Ok(()) => {
                    let series = cache.load_series(symbol, opts.start, opts.end)?;
                    let source = cache
                        .get_meta(symbol)
                        .map(|m| m.source)
                        .unwrap_or(DataSource::Cache);
                    return Ok(LoadedSeries { series, source });
                }
                Err(e) => {
                    warn!(symbol, error = %e, "download failed");
                    download_error = Some(e);
                }
            }
        }
    }

    if cached_meta.is_some() {
        if let Ok(series) = cache.load_series(symbol, opts.start, opts.end) {
            warn!(symbol, bars = series.len(), "using partially cached data");
            return Ok(LoadedSeries {
                series,
                source: DataSource::Cache,
            });
        }
    }

    if opts.synthetic {
        let fetched = SyntheticProvider::default().fetch(symbol, opts.start, opts.end)?;
        let series = PriceSeries::from_unclean(symbol, fetched.bars)?;
        return Ok(LoadedSeries {
            series,
            source: DataSource::Synthetic,
        });
    }

    match download_error {
        Some(e) => Err(LoadError::DownloadFailed {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        }),
        None if opts.offline => Err(LoadError::NoCachedDataOffline {
            symbol: symbol.to_string(),
        }),
        None => Err(LoadError::DownloadFailed {
            symbol: symbol.to_string(),
            reason: "no data provider available".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signalscope_core::data::FetchResult;

    fn opts() -> LoadOptions {
        LoadOptions {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
            offline: false,
            synthetic: false,
            force: false,
        }
    }

    struct Failing;

    impl DataProvider for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        fn fetch(&self, _: &str, _: NaiveDate, _: NaiveDate) -> Result<FetchResult, DataError> {
            Err(DataError::NetworkUnreachable("no route".into()))
        }
        fn is_available(&self) -> bool {
            true
        }
    }

    #[test]
    fn downloads_then_serves_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        let provider = SyntheticProvider::new(7);

        let first = load_series("AAPL", &cache, Some(&provider), &opts()).unwrap();
        assert_eq!(first.source, DataSource::Synthetic);

        let second = load_series("AAPL", &cache, Some(&Failing), &opts()).unwrap();
        assert_eq!(second.source, DataSource::Cache);
        assert_eq!(first.series.bars(), second.series.bars());
    }

    #[test]
    fn offline_without_cache_fails_clearly() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        let err = load_series("AAPL", &cache, None, &opts().offline(true)).unwrap_err();
        assert!(matches!(err, LoadError::NoCachedDataOffline { .. }));
    }

    #[test]
    fn failed_download_reports_the_reason() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        let err = load_series("AAPL", &cache, Some(&Failing), &opts()).unwrap_err();
        match err {
            LoadError::DownloadFailed { reason, .. } => assert!(reason.contains("no route")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn synthetic_fallback_is_tagged_and_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        let loaded = load_series("MSFT", &cache, Some(&Failing), &opts().synthetic(true)).unwrap();
        assert_eq!(loaded.source, DataSource::Synthetic);
        assert!(!loaded.series.is_empty());
        assert!(cache.get_meta("MSFT").is_none());
    }

    #[test]
    fn coverage_allows_weekend_edges() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        let provider = SyntheticProvider::default();
        download_single(&provider, &cache, "AAPL", opts().start, opts().end).unwrap();
        let meta = cache.get_meta("AAPL").unwrap();

        // 2024-01-01 is a Monday; the random walk starts on it
        assert!(meta_covers(&meta, opts().start, opts().end));
        assert!(!meta_covers(
            &meta,
            opts().start - Duration::days(30),
            opts().end
        ));
    }
}
