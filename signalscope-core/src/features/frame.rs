//! DataFrame boundary for feature tables.
//!
//! The presentation layer and CSV tooling exchange tables as polars
//! DataFrames. Column names are lowercase: `date, open, high, low, close,
//! volume` followed by the [`FEATURE_NAMES`] columns.

use chrono::NaiveDate;
use polars::prelude::*;

use super::{generate_features, FeatureSet, FEATURE_NAMES};
use crate::domain::{PriceBar, PriceSeries};
use crate::error::PipelineError;

fn epoch() -> NaiveDate {
    // chrono defaults to 1970-01-01
    NaiveDate::default()
}

fn frame_err(context: &str) -> impl Fn(PolarsError) -> PipelineError + '_ {
    move |e| PipelineError::SchemaMismatch(format!("{context}: {e}"))
}

/// Read a numeric column as f64, casting integer columns.
pub(crate) fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<f64>, PipelineError> {
    let column = df
        .column(name)
        .map_err(|_| PipelineError::missing_column(name))?;
    let cast = column
        .cast(&DataType::Float64)
        .map_err(frame_err(name))?;
    let ca = cast.f64().map_err(frame_err(name))?;
    Ok(ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

/// Read a Date column.
pub(crate) fn date_column(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>, PipelineError> {
    let column = df
        .column(name)
        .map_err(|_| PipelineError::missing_column(name))?;
    if column.dtype() != &DataType::Date {
        return Err(PipelineError::SchemaMismatch(format!(
            "column '{name}' has type {}, expected date",
            column.dtype()
        )));
    }
    let days = column.cast(&DataType::Int32).map_err(frame_err(name))?;
    let ca = days.i32().map_err(frame_err(name))?;
    ca.into_iter()
        .enumerate()
        .map(|(i, d)| {
            d.map(|d| epoch() + chrono::Duration::days(d as i64))
                .ok_or_else(|| PipelineError::SchemaMismatch(format!("null date at row {i}")))
        })
        .collect()
}

pub(crate) fn date_series(name: &str, dates: &[NaiveDate]) -> Result<Column, PipelineError> {
    let days: Vec<i32> = dates
        .iter()
        .map(|d| (*d - epoch()).num_days() as i32)
        .collect();
    Column::new(name.into(), days)
        .cast(&DataType::Date)
        .map_err(frame_err("date cast"))
}

/// Convert an OHLCV DataFrame into a validated price series.
///
/// `date`, `close` and `volume` are required. Missing `open`/`high`/`low`
/// columns fall back to the close.
pub fn series_from_frame(df: &DataFrame, symbol: &str) -> Result<PriceSeries, PipelineError> {
    let closes = f64_column(df, "close")?;
    let volumes = f64_column(df, "volume")?;
    let dates = date_column(df, "date")?;

    let optional = |name: &str| -> Result<Vec<f64>, PipelineError> {
        match df.column(name) {
            Ok(_) => f64_column(df, name),
            Err(_) => Ok(closes.clone()),
        }
    };
    let opens = optional("open")?;
    let highs = optional("high")?;
    let lows = optional("low")?;

    let bars = (0..df.height())
        .map(|i| PriceBar {
            date: dates[i],
            open: opens[i],
            high: highs[i],
            low: lows[i],
            close: closes[i],
            volume: volumes[i],
        })
        .collect();

    PriceSeries::new(symbol, bars)
}

/// Compute the standard features for an OHLCV DataFrame.
pub fn features_from_frame(df: &DataFrame, symbol: &str) -> Result<FeatureSet, PipelineError> {
    generate_features(&series_from_frame(df, symbol)?)
}

impl FeatureSet {
    /// Table view: OHLCV columns followed by every feature column.
    pub fn to_dataframe(&self) -> Result<DataFrame, PipelineError> {
        let dates: Vec<NaiveDate> = self.rows.iter().map(|r| r.bar.date).collect();
        let mut columns = vec![date_series("date", &dates)?];

        let bar_fields: [(&str, fn(&PriceBar) -> f64); 5] = [
            ("open", |b| b.open),
            ("high", |b| b.high),
            ("low", |b| b.low),
            ("close", |b| b.close),
            ("volume", |b| b.volume),
        ];
        for (name, field) in bar_fields {
            let values: Vec<f64> = self.rows.iter().map(|r| field(&r.bar)).collect();
            columns.push(Column::new(name.into(), values));
        }

        for (idx, name) in FEATURE_NAMES.iter().enumerate() {
            let values: Vec<f64> = self.rows.iter().map(|r| r.features.to_array()[idx]).collect();
            columns.push(Column::new((*name).into(), values));
        }

        DataFrame::new(columns).map_err(frame_err("feature table"))
    }
}
