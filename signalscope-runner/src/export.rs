//! Artifact export: signal table, equity curves and run summary.
//!
//! A run directory `{symbol}_{timestamp}/` holds:
//! - `signals.csv`: date, close, features, signal, reason
//! - `equity.csv`: date, strategy, market (cumulative equity, base 1.0)
//! - `summary.json`: headline numbers plus the latest signals
//! - `report.md`: the same summary for humans
//!
//! `summary.json` carries a `schema_version`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use signalscope_core::data::DataSource;
use signalscope_core::features::FEATURE_NAMES;

use crate::pipeline::{AnalysisReport, LATEST_SIGNALS};

pub const SUMMARY_SCHEMA_VERSION: u32 = 1;

/// One line of the "latest signals" table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    pub date: NaiveDate,
    pub close: f64,
    pub signal: i8,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub schema_version: u32,
    pub symbol: String,
    pub source: DataSource,
    pub classifier: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub bars: usize,
    pub warmup_bars: usize,
    pub trades: usize,
    /// Percent.
    pub avg_return: f64,
    /// Percent.
    pub total_return: f64,
    /// Percent, buy-and-hold over the same bars.
    pub market_return: f64,
    pub entries: usize,
    pub exits: usize,
    pub latest_signals: Vec<SignalSnapshot>,
}

impl RunSummary {
    pub fn from_report(report: &AnalysisReport) -> Self {
        use signalscope_core::backtest::MarkerKind;

        let entries = report
            .markers
            .iter()
            .filter(|m| m.kind == MarkerKind::Entry)
            .count();
        Self {
            schema_version: SUMMARY_SCHEMA_VERSION,
            symbol: report.symbol.clone(),
            source: report.source,
            classifier: report.classifier.clone(),
            start_date: report.start_date(),
            end_date: report.end_date(),
            bars: report.signals.len(),
            warmup_bars: report.warmup_bars,
            trades: report.backtest.trades,
            avg_return: report.backtest.avg_return,
            total_return: report.backtest.total_return,
            market_return: report.backtest.market_total_return(),
            entries,
            exits: report.markers.len() - entries,
            latest_signals: report
                .latest(LATEST_SIGNALS)
                .iter()
                .map(|r| SignalSnapshot {
                    date: r.bar.date,
                    close: r.bar.close,
                    signal: r.signal.value(),
                    reason: r.reason.to_string(),
                })
                .collect(),
        }
    }
}

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_summary_json(summary: &RunSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("failed to serialize run summary")
}

pub fn import_summary_json(json: &str) -> Result<RunSummary> {
    let summary: RunSummary =
        serde_json::from_str(json).context("failed to deserialize run summary")?;
    if summary.schema_version > SUMMARY_SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            summary.schema_version,
            SUMMARY_SCHEMA_VERSION
        );
    }
    Ok(summary)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Per-bar signal table with every feature column.
pub fn export_signals_csv(report: &AnalysisReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["date", "close"];
    header.extend(FEATURE_NAMES);
    header.extend(["signal", "reason"]);
    wtr.write_record(&header)?;

    for row in &report.signals {
        let mut record = vec![row.bar.date.to_string(), format!("{:.6}", row.bar.close)];
        record.extend(row.features.to_array().iter().map(|v| format!("{v:.6}")));
        record.push(row.signal.value().to_string());
        record.push(row.reason.to_string());
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Strategy and market equity curves side by side.
pub fn export_equity_csv(report: &AnalysisReport) -> Result<String> {
    let bt = &report.backtest;
    if bt.len() != report.signals.len() {
        bail!(
            "equity curve has {} points but the signal table has {} rows",
            bt.len(),
            report.signals.len()
        );
    }

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "strategy", "market"])?;
    for (i, row) in report.signals.iter().enumerate() {
        wtr.write_record([
            &row.bar.date.to_string(),
            &format!("{:.6}", bt.cumulative_strategy[i]),
            &format!("{:.6}", bt.cumulative_market[i]),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Markdown ───────────────────────────────────────────────────────

pub fn generate_report(summary: &RunSummary) -> String {
    let mut md = String::new();
    md.push_str(&format!("# Signal analysis: {}\n\n", summary.symbol));

    let period = match (summary.start_date, summary.end_date) {
        (Some(s), Some(e)) => format!("{s} to {e}"),
        _ => "n/a".to_string(),
    };
    md.push_str("| | |\n|---|---|\n");
    md.push_str(&format!("| Period | {period} |\n"));
    md.push_str(&format!("| Data source | {} |\n", summary.source.label()));
    md.push_str(&format!("| Classifier | {} |\n", summary.classifier));
    md.push_str(&format!(
        "| Bars | {} ({} warm-up) |\n",
        summary.bars, summary.warmup_bars
    ));
    md.push_str(&format!("| Trades | {} |\n", summary.trades));
    md.push_str(&format!("| Avg return / bar | {:.4}% |\n", summary.avg_return));
    md.push_str(&format!("| Total return | {:.2}% |\n", summary.total_return));
    md.push_str(&format!("| Buy & hold | {:.2}% |\n", summary.market_return));

    md.push_str("\n## Latest signals\n\n");
    md.push_str("| Date | Close | Signal | Reason |\n|---|---:|---:|---|\n");
    for s in &summary.latest_signals {
        md.push_str(&format!(
            "| {} | {:.2} | {} | {} |\n",
            s.date, s.close, s.signal, s.reason
        ));
    }

    if summary.source == DataSource::Synthetic {
        md.push_str("\n> Results are based on SYNTHETIC data.\n");
    }
    md
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write the full artifact set and return the run directory.
pub fn save_artifacts(report: &AnalysisReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        sanitize(&report.symbol),
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let summary = RunSummary::from_report(report);
    std::fs::write(run_dir.join("signals.csv"), export_signals_csv(report)?)?;
    std::fs::write(run_dir.join("equity.csv"), export_equity_csv(report)?)?;
    std::fs::write(run_dir.join("summary.json"), export_summary_json(&summary)?)?;
    std::fs::write(run_dir.join("report.md"), generate_report(&summary))?;

    Ok(run_dir)
}

pub fn load_summary(run_dir: &Path) -> Result<RunSummary> {
    let path = run_dir.join("summary.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_summary_json(&json)
}

/// Symbols like `^GSPC` or `BRK/B` are not safe directory names.
fn sanitize(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
