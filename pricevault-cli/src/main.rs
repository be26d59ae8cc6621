//! PriceVault CLI — fetch, crypto, and cache inspection commands.
//!
//! Commands:
//! - `fetch` — refresh daily-adjusted security history from Alpha Vantage
//! - `crypto` — refresh daily digital-currency history
//! - `cache status` — report cached datasets, snapshot counts, date ranges

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pricevault_core::{
    refresh_many, AlphaVantage, FetchOptions, RefreshKind, RefreshSummary, Settings,
    SnapshotStore, StdoutProgress,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "pricevault",
    about = "PriceVault CLI — market-data snapshot cache"
)]
struct Cli {
    /// Path to the settings file (TOML with `api_key` and optional `data_dir`).
    #[arg(long, global = true, default_value = "pricevault.toml")]
    config: PathBuf,

    /// Snapshot directory, overriding the settings file.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh daily-adjusted security history from Alpha Vantage.
    Fetch {
        /// Ticker symbols to refresh (e.g., SPY QQQ AAPL).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Fetch the provider's maximum history and maintain the cached
        /// snapshot instead of a fresh recent window.
        #[arg(long, default_value_t = false)]
        full: bool,

        /// Persist the recent window even without --full.
        #[arg(long, default_value_t = false)]
        save: bool,
    },
    /// Refresh daily digital-currency history.
    Crypto {
        /// Coin codes to refresh (e.g., BTC ETH).
        #[arg(required = true)]
        coins: Vec<String>,

        /// Market to denominate prices in.
        #[arg(long, default_value = "USD")]
        market: String,
    },
    /// Cache inspection commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cached datasets, snapshot counts, and the latest date range.
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch { ref symbols, full, save } => {
            let settings = load_settings(&cli.config)?;
            let data_dir = resolve_data_dir(&cli, &settings);
            let kind = RefreshKind::Daily(FetchOptions { full, save });
            run_refresh(&settings, &data_dir, symbols, kind)
        }
        Commands::Crypto { ref coins, ref market } => {
            let settings = load_settings(&cli.config)?;
            let data_dir = resolve_data_dir(&cli, &settings);
            let kind = RefreshKind::Crypto { market: market.as_str() };
            run_refresh(&settings, &data_dir, coins, kind)
        }
        Commands::Cache { ref action } => match action {
            CacheAction::Status => {
                // Status works without credentials; fall back to the
                // default directory when there is no settings file.
                let data_dir = cli.data_dir.clone().unwrap_or_else(|| {
                    Settings::from_file(&cli.config)
                        .map(|s| s.data_dir)
                        .unwrap_or_else(|_| PathBuf::from(pricevault_core::config::DEFAULT_DATA_DIR))
                });
                run_cache_status(&data_dir)
            }
        },
    }
}

fn load_settings(path: &Path) -> Result<Settings> {
    Settings::from_file(path)
        .with_context(|| format!("failed to load settings from {}", path.display()))
}

fn resolve_data_dir(cli: &Cli, settings: &Settings) -> PathBuf {
    cli.data_dir.clone().unwrap_or_else(|| settings.data_dir.clone())
}

fn run_refresh(
    settings: &Settings,
    data_dir: &Path,
    names: &[String],
    kind: RefreshKind,
) -> Result<()> {
    let provider = AlphaVantage::new(settings.api_key.clone());
    let store = SnapshotStore::new(data_dir);
    let today = chrono::Local::now().date_naive();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();

    let summary = refresh_many(&provider, &store, &refs, kind, today, &StdoutProgress);
    print_outcomes(&summary);

    if !summary.all_succeeded() {
        for (name, err) in &summary.errors {
            eprintln!("Error for {name}: {err}");
        }
        std::process::exit(1);
    }

    Ok(())
}

fn print_outcomes(summary: &RefreshSummary) {
    for outcome in &summary.outcomes {
        let written = match &outcome.written {
            Some(path) => format!(" -> {}", path.display()),
            None => String::new(),
        };
        println!(
            "{}: {} rows ({}){}",
            outcome.dataset.name(),
            outcome.dataset.len(),
            outcome.source,
            written
        );
    }
}

fn run_cache_status(data_dir: &Path) -> Result<()> {
    if !data_dir.exists() {
        println!("Data directory does not exist: {}", data_dir.display());
        return Ok(());
    }

    // Group snapshot files by dataset name
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for entry in std::fs::read_dir(data_dir)? {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let Some(stem) = file_name.strip_suffix(".csv") else {
            continue;
        };
        *counts.entry(dataset_name(stem).to_string()).or_default() += 1;
    }

    if counts.is_empty() {
        println!("Cache is empty: {}", data_dir.display());
        return Ok(());
    }

    let store = SnapshotStore::new(data_dir);

    println!("Cache: {}", data_dir.display());
    println!("Datasets: {}", counts.len());
    println!();
    println!(
        "{:<10} {:<25} {:>8} {:>10}",
        "Dataset", "Date Range", "Rows", "Snapshots"
    );
    println!("{}", "-".repeat(58));

    for (name, count) in &counts {
        let (range, rows) = match store.read_latest(name) {
            Ok(ds) => {
                let range = match (ds.rows().first(), ds.rows().last()) {
                    (Some(first), Some(last)) => format!("{} to {}", first.date, last.date),
                    _ => "(empty)".into(),
                };
                (range, ds.len().to_string())
            }
            Err(e) => (format!("(unreadable: {e})"), "-".into()),
        };
        println!("{:<10} {:<25} {:>8} {:>10}", name, range, rows, count);
    }

    Ok(())
}

/// Strip the `_latest` or `_{MMDD}_{HHMMSS}` snapshot suffix from a file
/// stem, leaving the dataset name.
fn dataset_name(stem: &str) -> &str {
    if let Some(base) = stem.strip_suffix("_latest") {
        return base;
    }
    if stem.len() > 12 {
        let (base, suffix) = stem.split_at(stem.len() - 12);
        let bytes = suffix.as_bytes();
        let digits = |range: std::ops::Range<usize>| {
            suffix[range].chars().all(|c| c.is_ascii_digit())
        };
        if bytes[0] == b'_' && bytes[5] == b'_' && digits(1..5) && digits(6..12) {
            return base;
        }
    }
    stem
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_name_strips_snapshot_suffixes() {
        assert_eq!(dataset_name("SPY_latest"), "SPY");
        assert_eq!(dataset_name("SPY_0105_093007"), "SPY");
        assert_eq!(dataset_name("BRK_B_0105_093007"), "BRK_B");
        assert_eq!(dataset_name("SPY"), "SPY");
        assert_eq!(dataset_name("SPY_0105_09300x"), "SPY_0105_09300x");
    }
}
