//! SignalScope CLI: download, train, analyze and cache commands.
//!
//! Commands:
//! - `download`: fetch daily bars from Yahoo Finance into the Parquet cache
//! - `train`: fit the global random forest on the configured symbols
//! - `analyze`: features → signals → backtest for one symbol, with artifacts
//! - `cache status`: report cached symbols, date ranges and sources

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use signalscope_core::data::{
    download_symbols, CsvProvider, DataProvider, LogProgress, ParquetCache, YahooProvider,
};
use signalscope_core::model::{ModelStore, RuleClassifier};
use signalscope_core::Classifier;
use signalscope_runner::{
    analyze_symbol, logging, save_artifacts, save_model, train_global_model, AnalysisReport,
    AppConfig, LoadOptions, TrainingReport, LATEST_SIGNALS,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "signalscope",
    version,
    about = "SignalScope: technical-indicator signals and a long/flat backtest"
)]
struct Cli {
    /// Path to a TOML config file. Defaults to ./signalscope.toml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `signalscope_core=trace`. Overrides the config.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Cache directory. Overrides the config.
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by commands that load price data.
#[derive(clap::Args, Clone, Copy)]
struct DataFlags {
    /// No network access; use cached bars only.
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Fall back to synthetic bars when real data is unavailable.
    #[arg(long, default_value_t = false)]
    synthetic: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Download daily bars and cache them as Parquet.
    Download {
        /// Symbols to download. Defaults to the training symbols.
        symbols: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to the training lookback.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Force re-download even if cached.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Import `{SYMBOL}.csv` files from this directory instead of Yahoo.
        #[arg(long)]
        csv_dir: Option<PathBuf>,
    },
    /// Train the global random forest and save it.
    Train {
        /// Symbols to train on. Defaults to the configured list.
        symbols: Vec<String>,

        /// Calendar days of history per symbol.
        #[arg(long)]
        lookback_days: Option<i64>,

        /// Number of trees.
        #[arg(long)]
        trees: Option<usize>,

        /// Where to write the model artifact.
        #[arg(long)]
        model: Option<PathBuf>,

        #[command(flatten)]
        data: DataFlags,
    },
    /// Analyze one symbol: signals, backtest and artifacts.
    Analyze {
        /// Symbol to analyze. Defaults to the configured symbol.
        symbol: Option<String>,

        /// Calendar days of history.
        #[arg(long)]
        lookback_days: Option<i64>,

        /// Model artifact to load.
        #[arg(long)]
        model: Option<PathBuf>,

        /// Use the RSI/MACD rule classifier instead of a trained model.
        #[arg(long, default_value_t = false)]
        rules: bool,

        /// Output directory for artifacts.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the summary only; write no artifacts.
        #[arg(long, default_value_t = false)]
        no_export: bool,

        #[command(flatten)]
        data: DataFlags,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report cached symbols, date ranges, bar counts and sources.
    Status {
        /// Also recompute each symbol's content hash.
        #[arg(long, default_value_t = false)]
        verify: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(dir) = cli.cache_dir {
        config.data.cache_dir = dir;
    }
    logging::init(&config.logging.level);

    match cli.command {
        Commands::Download {
            symbols,
            start,
            end,
            force,
            csv_dir,
        } => run_download(&config, symbols, start, end, force, csv_dir),
        Commands::Train {
            symbols,
            lookback_days,
            trees,
            model,
            data,
        } => {
            apply_data_flags(&mut config, data);
            if !symbols.is_empty() {
                config.training.symbols = symbols;
            }
            if let Some(days) = lookback_days {
                config.training.lookback_days = days;
            }
            if let Some(n) = trees {
                config.training.n_trees = n;
            }
            if let Some(path) = model {
                config.model.path = path;
            }
            run_train(&config)
        }
        Commands::Analyze {
            symbol,
            lookback_days,
            model,
            rules,
            output,
            no_export,
            data,
        } => {
            apply_data_flags(&mut config, data);
            if let Some(sym) = symbol {
                config.analysis.symbol = sym;
            }
            if let Some(days) = lookback_days {
                config.analysis.lookback_days = days;
            }
            if let Some(path) = model {
                config.model.path = path;
            }
            if let Some(dir) = output {
                config.analysis.output_dir = dir;
            }
            run_analyze(&config, rules, !no_export)
        }
        Commands::Cache { action } => match action {
            CacheAction::Status { verify } => run_cache_status(&config.data.cache_dir, verify),
        },
    }
}

fn apply_data_flags(config: &mut AppConfig, flags: DataFlags) {
    config.data.offline |= flags.offline;
    config.data.synthetic |= flags.synthetic;
}

fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
        })
        .transpose()
}

/// Yahoo provider unless offline.
fn provider_for(config: &AppConfig) -> Result<Option<YahooProvider>> {
    if config.data.offline {
        return Ok(None);
    }
    match YahooProvider::new() {
        Ok(p) => Ok(Some(p)),
        Err(e) if config.data.synthetic => {
            warn!(error = %e, "HTTP client unavailable, continuing with synthetic data");
            Ok(None)
        }
        Err(e) => Err(e).context("failed to build HTTP client"),
    }
}

fn load_options(config: &AppConfig, lookback_days: i64) -> LoadOptions {
    LoadOptions::lookback(lookback_days)
        .offline(config.data.offline)
        .synthetic(config.data.synthetic)
}

fn run_download(
    config: &AppConfig,
    symbols: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    force: bool,
    csv_dir: Option<PathBuf>,
) -> Result<()> {
    let symbols = if symbols.is_empty() {
        config.training.symbols.clone()
    } else {
        symbols
    };
    let defaults = LoadOptions::lookback(config.training.lookback_days);
    let start_date = parse_date(start.as_deref())?.unwrap_or(defaults.start);
    let end_date = parse_date(end.as_deref())?.unwrap_or(defaults.end);
    if start_date > end_date {
        bail!("start date {start_date} is after end date {end_date}");
    }

    let provider: Box<dyn DataProvider> = match csv_dir {
        Some(dir) => Box::new(CsvProvider::new(dir)),
        None => Box::new(YahooProvider::new().context("failed to build HTTP client")?),
    };
    let cache = ParquetCache::new(&config.data.cache_dir);
    let sym_refs: Vec<&str> = symbols.iter().map(|s| s.as_str()).collect();

    let summary = download_symbols(
        provider.as_ref(),
        &cache,
        &sym_refs,
        start_date,
        end_date,
        force,
        &LogProgress,
    );

    println!(
        "Downloaded {}/{} symbols into {}",
        summary.succeeded,
        summary.total,
        config.data.cache_dir.display()
    );
    if !summary.all_succeeded() {
        for (sym, err) in &summary.errors {
            eprintln!("Error for {sym}: {err}");
        }
        bail!("{} of {} downloads failed", summary.failed, summary.total);
    }
    Ok(())
}

fn run_train(config: &AppConfig) -> Result<()> {
    let cache = ParquetCache::new(&config.data.cache_dir);
    let provider = provider_for(config)?;
    let opts = load_options(config, config.training.lookback_days);

    let (forest, report) = train_global_model(
        &config.training.symbols,
        &cache,
        provider.as_ref().map(|p| p as &dyn DataProvider),
        &opts,
        config.training.forest_config(),
    )?;
    print_training_report(&report);

    save_model(forest, &config.model.path)?;
    println!("Model saved to: {}", config.model.path.display());
    Ok(())
}

fn run_analyze(config: &AppConfig, use_rules: bool, export: bool) -> Result<()> {
    let classifier: Box<dyn Classifier> = if use_rules {
        Box::new(RuleClassifier::default())
    } else {
        ModelStore::load(&config.model.path).with_context(|| {
            format!(
                "could not load model '{}' (run `signalscope train` or pass --rules)",
                config.model.path.display()
            )
        })?
    };
    info!(classifier = classifier.name(), "classifier ready");

    let cache = ParquetCache::new(&config.data.cache_dir);
    let provider = provider_for(config)?;
    let opts = load_options(config, config.analysis.lookback_days);

    let report = analyze_symbol(
        &config.analysis.symbol,
        &cache,
        provider.as_ref().map(|p| p as &dyn DataProvider),
        &opts,
        classifier.as_ref(),
    )?;
    print_summary(&report);

    if export {
        let run_dir = save_artifacts(&report, &config.analysis.output_dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_cache_status(cache_dir: &Path, verify: bool) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let cache = ParquetCache::new(cache_dir);
    let symbols = cache.symbols();
    if symbols.is_empty() {
        println!("Cache is empty: {}", cache_dir.display());
        return Ok(());
    }

    let sym_refs: Vec<&str> = symbols.iter().map(|s| s.as_str()).collect();
    println!("Cache: {}", cache_dir.display());
    println!("Symbols: {}", symbols.len());
    println!("Total size: {}", format_size(dir_size(cache_dir)));
    println!();
    println!(
        "{:<10} {:<25} {:>8} {:<10} {:<8}",
        "Symbol", "Date Range", "Bars", "Source", "Hash"
    );
    println!("{}", "-".repeat(65));
    for status in cache.status(&sym_refs) {
        let range = match (status.start_date, status.end_date) {
            (Some(s), Some(e)) => format!("{s} to {e}"),
            _ => "(no meta)".to_string(),
        };
        let bars = status.bar_count.map_or("-".to_string(), |n| n.to_string());
        let source = status.source.map_or("-", |s| s.label());
        let hash = if !verify {
            ""
        } else {
            match cache.verify(&status.symbol) {
                Ok(true) => "ok",
                Ok(false) => "MISMATCH",
                Err(_) => "error",
            }
        };
        println!(
            "{:<10} {:<25} {:>8} {:<10} {:<8}",
            status.symbol, range, bars, source, hash
        );
    }
    Ok(())
}

fn dir_size(path: &Path) -> u64 {
    let Ok(entries) = std::fs::read_dir(path) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| match entry.metadata() {
            Ok(meta) if meta.is_dir() => dir_size(&entry.path()),
            Ok(meta) => meta.len(),
            Err(_) => 0,
        })
        .sum()
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn print_training_report(report: &TrainingReport) {
    println!();
    println!("=== Training ===");
    println!("Symbols:        {}", report.processed.join(", "));
    println!("Samples:        {}", report.samples);
    println!(
        "Class balance:  sell {} / hold {} / buy {}",
        report.class_counts[0], report.class_counts[1], report.class_counts[2]
    );
    println!("Trees:          {}", report.n_trees);
    println!("Train accuracy: {:.1}%", report.accuracy * 100.0);
    for (sym, reason) in &report.failed {
        println!("SKIPPED {sym}: {reason}");
    }
    println!();
}

fn print_summary(report: &AnalysisReport) {
    let bt = &report.backtest;
    println!();
    println!("=== Analysis: {} ===", report.symbol);
    if let (Some(start), Some(end)) = (report.start_date(), report.end_date()) {
        println!("Period:         {start} to {end}");
    }
    println!(
        "Bars:           {} ({} warmup)",
        report.signals.len(),
        report.warmup_bars
    );
    println!("Classifier:     {}", report.classifier);
    println!("Data source:    {}", report.source.label());
    println!();
    println!("--- Performance ---");
    println!("Trades:         {}", bt.trades);
    println!("Avg Return:     {:.4}%", bt.avg_return);
    println!("Total Return:   {:.2}%", bt.total_return);
    println!("Market Return:  {:.2}%", bt.market_total_return());
    println!();
    println!("--- Latest {LATEST_SIGNALS} signals ---");
    println!("{:<12} {:>10} {:>7}  Reason", "Date", "Close", "Signal");
    for row in report.latest(LATEST_SIGNALS) {
        println!(
            "{:<12} {:>10.2} {:>7}  {}",
            row.bar.date.to_string(),
            row.bar.close,
            row.signal.value(),
            row.reason
        );
    }
    if report.source == signalscope_core::data::DataSource::Synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}
