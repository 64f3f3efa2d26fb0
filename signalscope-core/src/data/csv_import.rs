//! CSV import provider.
//!
//! Reads `{dir}/{SYMBOL}.csv` files in the layout Yahoo's download button
//! produces (`Date,Open,High,Low,Close,Adj Close,Volume`) or the lowercase
//! layout written by the exporter. Unparsable numeric cells such as `null`
//! become void rows and are dropped.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::PriceBar;

#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(alias = "Open", deserialize_with = "csv::invalid_option")]
    open: Option<f64>,
    #[serde(alias = "High", deserialize_with = "csv::invalid_option")]
    high: Option<f64>,
    #[serde(alias = "Low", deserialize_with = "csv::invalid_option")]
    low: Option<f64>,
    #[serde(alias = "Close", deserialize_with = "csv::invalid_option")]
    close: Option<f64>,
    #[serde(alias = "Volume", deserialize_with = "csv::invalid_option")]
    volume: Option<f64>,
}

impl CsvRecord {
    fn into_bar(self) -> Option<PriceBar> {
        Some(PriceBar {
            date: self.date,
            open: self.open?,
            high: self.high?,
            low: self.low?,
            close: self.close?,
            volume: self.volume.unwrap_or(0.0),
        })
    }
}

/// Parse bars from any CSV reader. Rows with missing prices are skipped.
pub fn read_bars<R: Read>(reader: R) -> Result<Vec<PriceBar>, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();
    for (line, record) in rdr.deserialize::<CsvRecord>().enumerate() {
        let record = record.map_err(|e| DataError::CsvError(format!("row {}: {e}", line + 1)))?;
        if let Some(bar) = record.into_bar() {
            bars.push(bar);
        }
    }
    Ok(bars)
}

pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    /// Every bar in a CSV file, unfiltered.
    pub fn read_file(path: &Path) -> Result<Vec<PriceBar>, DataError> {
        let file = File::open(path)
            .map_err(|e| DataError::CsvError(format!("open {}: {e}", path.display())))?;
        read_bars(file)
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let bars: Vec<PriceBar> = Self::read_file(&path)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        debug!(symbol, path = %path.display(), bars = bars.len(), "csv import");
        if bars.is_empty() {
            return Err(DataError::EmptyRange {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::CsvImport,
        })
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}
