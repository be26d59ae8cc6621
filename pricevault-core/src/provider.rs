//! Market-data provider trait and structured error types.
//!
//! The MarketDataProvider trait abstracts over the Alpha Vantage client so
//! the refresh orchestrator can be exercised against a mock in tests. The
//! snapshot store sits beside this trait — providers don't know about the
//! cache.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

/// One raw row from a provider response: a calendar date plus the
/// provider-labelled cells for that day, values still as strings.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub date: NaiveDate,
    pub fields: BTreeMap<String, String>,
}

/// A full provider response: metadata plus rows in ascending date order.
///
/// Column labels are provider-defined (`1. open`, `2a. high (USD)`, ...)
/// and must be remapped by the schema normalizer before use.
#[derive(Debug, Clone)]
pub struct RawSeries {
    pub meta: BTreeMap<String, String>,
    pub rows: Vec<RawRow>,
}

/// How much history to request for a daily-adjusted series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSize {
    /// The provider's short recent window (around 100 trading days).
    Compact,
    /// The provider's maximum history.
    Full,
}

impl OutputSize {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Full => "full",
        }
    }
}

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    Network(String),

    #[error("rate limited by provider: {0}")]
    RateLimited(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("response missing expected column '{column}'")]
    MissingColumn { column: String },

    #[error("unparseable value '{value}' in column '{column}'")]
    Malformed { column: String, value: String },

    #[error("no cached snapshot for '{name}' — run a full fetch first")]
    NoSnapshot { name: String },

    #[error("snapshot store error: {0}")]
    Store(String),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Trait for market-data providers.
///
/// Implementations handle the specifics of talking to a particular vendor.
/// Both operations are synchronous and blocking; one call maps to at most
/// one outbound request.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Daily-adjusted history for a security symbol.
    fn daily_adjusted(&self, symbol: &str, output_size: OutputSize)
        -> Result<RawSeries, DataError>;

    /// Daily history for a digital currency, denominated in `market`.
    fn digital_currency_daily(&self, symbol: &str, market: &str)
        -> Result<RawSeries, DataError>;
}

/// Progress callback for multi-dataset refresh operations.
pub trait FetchProgress: Send {
    /// Called when starting to refresh a dataset.
    fn on_start(&self, name: &str, index: usize, total: usize);

    /// Called when a dataset refresh completes.
    fn on_complete(&self, name: &str, index: usize, total: usize, result: &Result<(), DataError>);

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl FetchProgress for StdoutProgress {
    fn on_start(&self, name: &str, index: usize, total: usize) {
        println!("[{}/{}] Refreshing {name}...", index + 1, total);
    }

    fn on_complete(
        &self,
        name: &str,
        _index: usize,
        _total: usize,
        result: &Result<(), DataError>,
    ) {
        match result {
            Ok(()) => println!("  OK: {name}"),
            Err(e) => println!("  FAIL: {name}: {e}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("\nRefresh complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}
