//! Parquet cache with per-symbol, per-year partitions.
//!
//! Layout: `{cache_dir}/symbol={SYMBOL}/{year}.parquet` plus a `meta.json`
//! sidecar holding the date range, bar count, source and a BLAKE3 hash of
//! the cached bars.
//!
//! - Writes replace the symbol's partitions atomically (write .tmp, rename)
//! - Corrupt partitions are quarantined as `{year}.parquet.quarantined`
//! - `verify` recomputes the hash against the sidecar

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::provider::{DataError, DataSource};
use crate::domain::{PriceBar, PriceSeries};
use crate::features::frame::{date_column, date_series, f64_column};

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

/// Metadata sidecar for a cached symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMeta {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub bar_count: usize,
    pub data_hash: String,
    pub source: DataSource,
    pub cached_at: NaiveDateTime,
}

/// Cache status for a single symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatus {
    pub symbol: String,
    pub cached: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub bar_count: Option<usize>,
    pub source: Option<DataSource>,
}

/// How well the cache covers a requested date range.
#[derive(Debug, Clone, PartialEq)]
pub enum CoverageResult {
    NotCached,
    FullyCovered,
    PartiallyCovered {
        cached_start: NaiveDate,
        cached_end: NaiveDate,
    },
}

pub struct ParquetCache {
    cache_dir: PathBuf,
}

impl ParquetCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn symbol_dir(&self, symbol: &str) -> PathBuf {
        self.cache_dir.join(format!("symbol={symbol}"))
    }

    fn year_path(&self, symbol: &str, year: i32) -> PathBuf {
        self.symbol_dir(symbol).join(format!("{year}.parquet"))
    }

    fn meta_path(&self, symbol: &str) -> PathBuf {
        self.symbol_dir(symbol).join("meta.json")
    }

    /// Replace everything cached for `symbol` with `series`.
    pub fn write(&self, series: &PriceSeries, source: DataSource) -> Result<CacheMeta, DataError> {
        let symbol = series.symbol();
        let bars = series.bars();
        let sym_dir = self.symbol_dir(symbol);
        fs::create_dir_all(&sym_dir)
            .map_err(|e| DataError::CacheError(format!("failed to create dir: {e}")))?;

        for stale in parquet_files(&sym_dir)? {
            fs::remove_file(&stale)
                .map_err(|e| DataError::CacheError(format!("remove {}: {e}", stale.display())))?;
        }

        let mut by_year: BTreeMap<i32, Vec<PriceBar>> = BTreeMap::new();
        for bar in bars {
            by_year.entry(bar.date.year()).or_default().push(*bar);
        }

        for (year, year_bars) in &by_year {
            let df = bars_to_dataframe(year_bars)?;
            let path = self.year_path(symbol, *year);
            let tmp_path = path.with_extension("parquet.tmp");
            write_parquet(&df, &tmp_path)?;
            fs::rename(&tmp_path, &path).map_err(|e| {
                let _ = fs::remove_file(&tmp_path);
                DataError::CacheError(format!("atomic rename failed: {e}"))
            })?;
        }

        let meta = CacheMeta {
            symbol: symbol.to_string(),
            start_date: series.first_date(),
            end_date: series.last_date(),
            bar_count: bars.len(),
            data_hash: bars_hash(bars)?,
            source,
            cached_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::CacheError(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(symbol), meta_json)
            .map_err(|e| DataError::CacheError(format!("meta write: {e}")))?;

        debug!(symbol, bars = bars.len(), partitions = by_year.len(), "cached");
        Ok(meta)
    }

    /// All cached bars for a symbol, sorted by date.
    pub fn load(&self, symbol: &str) -> Result<Vec<PriceBar>, DataError> {
        let sym_dir = self.symbol_dir(symbol);
        if !sym_dir.exists() {
            return Err(DataError::NoCachedData {
                symbol: symbol.to_string(),
            });
        }

        let mut all_bars = Vec::new();
        for path in parquet_files(&sym_dir)? {
            match load_and_validate_parquet(&path) {
                Ok(bars) => all_bars.extend(bars),
                Err(e) => {
                    let quarantine = path.with_extension("parquet.quarantined");
                    warn!(path = %path.display(), error = %e, "quarantining corrupt cache file");
                    let _ = fs::rename(&path, &quarantine);
                }
            }
        }

        if all_bars.is_empty() {
            return Err(DataError::NoCachedData {
                symbol: symbol.to_string(),
            });
        }
        all_bars.sort_by_key(|b| b.date);
        Ok(all_bars)
    }

    /// Cached bars within `[start, end]` as a validated series.
    pub fn load_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        let bars: Vec<PriceBar> = self
            .load(symbol)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        if bars.is_empty() {
            return Err(DataError::EmptyRange {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        Ok(PriceSeries::from_unclean(symbol, bars)?)
    }

    pub fn get_meta(&self, symbol: &str) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path(symbol)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// True if the cached bars still hash to the sidecar's value.
    pub fn verify(&self, symbol: &str) -> Result<bool, DataError> {
        let meta = self.get_meta(symbol).ok_or_else(|| DataError::NoCachedData {
            symbol: symbol.to_string(),
        })?;
        Ok(bars_hash(&self.load(symbol)?)? == meta.data_hash)
    }

    /// Symbols that have a `symbol=` directory, sorted.
    pub fn symbols(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.cache_dir) else {
            return Vec::new();
        };
        let mut symbols: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|e| e.path().is_dir())
            .filter_map(|e| {
                e.file_name()
                    .to_str()
                    .and_then(|n| n.strip_prefix("symbol="))
                    .map(str::to_string)
            })
            .collect();
        symbols.sort();
        symbols
    }

    pub fn status(&self, symbols: &[&str]) -> Vec<CacheStatus> {
        symbols
            .iter()
            .map(|sym| {
                let meta = self.get_meta(sym);
                CacheStatus {
                    symbol: sym.to_string(),
                    cached: meta.is_some(),
                    start_date: meta.as_ref().map(|m| m.start_date),
                    end_date: meta.as_ref().map(|m| m.end_date),
                    bar_count: meta.as_ref().map(|m| m.bar_count),
                    source: meta.as_ref().map(|m| m.source),
                }
            })
            .collect()
    }

    pub fn covers_range(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> CoverageResult {
        match self.get_meta(symbol) {
            None => CoverageResult::NotCached,
            Some(meta) if meta.start_date <= start && meta.end_date >= end => {
                CoverageResult::FullyCovered
            }
            Some(meta) => CoverageResult::PartiallyCovered {
                cached_start: meta.start_date,
                cached_end: meta.end_date,
            },
        }
    }
}

/// BLAKE3 hex digest over the JSON encoding of `bars`.
pub fn bars_hash(bars: &[PriceBar]) -> Result<String, DataError> {
    let payload = serde_json::to_vec(bars)
        .map_err(|e| DataError::CacheError(format!("hash serialization: {e}")))?;
    Ok(blake3::hash(&payload).to_hex().to_string())
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn parquet_files(dir: &Path) -> Result<Vec<PathBuf>, DataError> {
    let entries = fs::read_dir(dir).map_err(|e| DataError::CacheError(format!("read dir: {e}")))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| DataError::CacheError(format!("dir entry: {e}")))?
            .path();
        if path.extension().and_then(|e| e.to_str()) == Some("parquet") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn bars_to_dataframe(bars: &[PriceBar]) -> Result<DataFrame, DataError> {
    let column = |f: fn(&PriceBar) -> f64| bars.iter().map(f).collect::<Vec<f64>>();
    let dates: Vec<NaiveDate> = bars.iter().map(|b| b.date).collect();

    DataFrame::new(vec![
        date_series("date", &dates)?,
        Column::new("open".into(), column(|b| b.open)),
        Column::new("high".into(), column(|b| b.high)),
        Column::new("low".into(), column(|b| b.low)),
        Column::new("close".into(), column(|b| b.close)),
        Column::new("volume".into(), column(|b| b.volume)),
    ])
    .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

fn write_parquet(df: &DataFrame, path: &Path) -> Result<(), DataError> {
    let file =
        fs::File::create(path).map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(&mut df.clone())
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    Ok(())
}

fn load_and_validate_parquet(path: &Path) -> Result<Vec<PriceBar>, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::ParquetError(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;

    if df.height() == 0 {
        return Err(DataError::ParquetError("empty parquet file".into()));
    }
    for name in COLUMNS {
        if df.column(name).is_err() {
            return Err(DataError::ParquetError(format!("missing column '{name}'")));
        }
    }

    let dates = date_column(&df, "date")?;
    let opens = f64_column(&df, "open")?;
    let highs = f64_column(&df, "high")?;
    let lows = f64_column(&df, "low")?;
    let closes = f64_column(&df, "close")?;
    let volumes = f64_column(&df, "volume")?;

    Ok((0..df.height())
        .map(|i| PriceBar {
            date: dates[i],
            open: opens[i],
            high: highs[i],
            low: lows[i],
            close: closes[i],
            volume: volumes[i],
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_cache_dir() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = env::temp_dir().join(format!("signalscope_cache_{}_{id}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn bar(y: i32, m: u32, d: u32, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 1000.0,
        }
    }

    fn sample_series() -> PriceSeries {
        PriceSeries::new(
            "SPY",
            vec![
                bar(2023, 12, 29, 99.0),
                bar(2024, 1, 2, 101.0),
                bar(2024, 1, 3, 102.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn write_and_load_roundtrip_across_years() {
        let dir = temp_cache_dir();
        let cache = ParquetCache::new(&dir);

        cache.write(&sample_series(), DataSource::YahooFinance).unwrap();
        let loaded = cache.load("SPY").unwrap();

        assert_eq!(loaded, sample_series().bars().to_vec());
        assert!(dir.join("symbol=SPY/2023.parquet").exists());
        assert!(dir.join("symbol=SPY/2024.parquet").exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn rewrite_replaces_stale_partitions() {
        let dir = temp_cache_dir();
        let cache = ParquetCache::new(&dir);
        cache.write(&sample_series(), DataSource::Synthetic).unwrap();

        let newer = PriceSeries::new("SPY", vec![bar(2024, 2, 1, 110.0)]).unwrap();
        cache.write(&newer, DataSource::YahooFinance).unwrap();

        assert_eq!(cache.load("SPY").unwrap().len(), 1);
        assert!(!dir.join("symbol=SPY/2023.parquet").exists());
        assert_eq!(cache.get_meta("SPY").unwrap().source, DataSource::YahooFinance);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_nonexistent_returns_error() {
        let dir = temp_cache_dir();
        let cache = ParquetCache::new(&dir);
        assert!(matches!(
            cache.load("NONEXISTENT"),
            Err(DataError::NoCachedData { .. })
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn meta_hash_verifies() {
        let dir = temp_cache_dir();
        let cache = ParquetCache::new(&dir);
        let meta = cache.write(&sample_series(), DataSource::CsvImport).unwrap();

        assert_eq!(meta.bar_count, 3);
        assert_eq!(meta.start_date, NaiveDate::from_ymd_opt(2023, 12, 29).unwrap());
        assert_eq!(cache.get_meta("SPY").unwrap(), meta);
        assert!(cache.verify("SPY").unwrap());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_partition_is_quarantined() {
        let dir = temp_cache_dir();
        let cache = ParquetCache::new(&dir);
        cache.write(&sample_series(), DataSource::CsvImport).unwrap();
        fs::write(dir.join("symbol=SPY/2023.parquet"), b"not parquet").unwrap();

        let loaded = cache.load("SPY").unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(dir.join("symbol=SPY/2023.parquet.quarantined").exists());
        assert!(!cache.verify("SPY").unwrap());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn status_symbols_and_coverage() {
        let dir = temp_cache_dir();
        let cache = ParquetCache::new(&dir);
        cache.write(&sample_series(), DataSource::YahooFinance).unwrap();

        assert_eq!(cache.symbols(), vec!["SPY".to_string()]);
        let statuses = cache.status(&["SPY", "QQQ"]);
        assert!(statuses[0].cached);
        assert!(!statuses[1].cached);

        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(
            cache.covers_range("SPY", d(2023, 12, 29), d(2024, 1, 3)),
            CoverageResult::FullyCovered
        );
        assert!(matches!(
            cache.covers_range("SPY", d(2023, 1, 1), d(2024, 1, 3)),
            CoverageResult::PartiallyCovered { .. }
        ));
        assert_eq!(
            cache.covers_range("QQQ", d(2024, 1, 1), d(2024, 1, 2)),
            CoverageResult::NotCached
        );

        let series = cache.load_series("SPY", d(2024, 1, 1), d(2024, 12, 31)).unwrap();
        assert_eq!(series.len(), 2);

        let _ = fs::remove_dir_all(&dir);
    }
}
