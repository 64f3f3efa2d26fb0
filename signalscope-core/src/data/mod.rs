//! Price data: providers, the Parquet cache and batch download.

pub mod cache;
pub mod csv_import;
pub mod download;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use cache::{CacheMeta, CacheStatus, CoverageResult, ParquetCache};
pub use csv_import::CsvProvider;
pub use download::{download_single, download_symbols, DownloadSummary};
pub use provider::{DataError, DataProvider, DataSource, DownloadProgress, FetchResult, LogProgress};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
