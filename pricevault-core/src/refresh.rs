//! Cache refresh orchestration — decides, per dataset, whether a cache
//! hit, an incremental fetch, or a full fetch applies, then merges,
//! dedupes, and persists.
//!
//! Each invocation performs at most one outbound network call, one
//! snapshot read, and one snapshot write. `today` is supplied by the
//! caller so staleness decisions are testable.
//!
//! The staleness comparisons differ between the security and crypto
//! paths: securities refetch only when the signed gap (last cached date
//! minus today) is strictly positive, crypto whenever it is nonzero.
//! Both behaviors are kept distinct on purpose.

use crate::dataset::Dataset;
use crate::provider::{DataError, FetchProgress, MarketDataProvider, OutputSize};
use crate::schema::{self, DatasetKind};
use crate::store::SnapshotStore;
use chrono::NaiveDate;
use std::fmt;
use std::path::PathBuf;

/// Where a refreshed dataset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshSource {
    /// Cached snapshot returned unchanged; nothing fetched or written.
    Cache,
    /// Fetched fresh from the provider; cache not consulted or replaced
    /// wholesale.
    Provider,
    /// Cached snapshot extended with a freshly fetched window.
    Merged,
}

impl fmt::Display for RefreshSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cache => "cache",
            Self::Provider => "provider",
            Self::Merged => "merged",
        };
        f.write_str(s)
    }
}

/// Result of a single dataset refresh.
#[derive(Debug)]
pub struct RefreshOutcome {
    pub dataset: Dataset,
    pub source: RefreshSource,
    /// Snapshot written by this refresh, if any.
    pub written: Option<PathBuf>,
}

/// Options for the security refresh path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Maintain the full cached history instead of fetching a fresh
    /// recent window.
    pub full: bool,
    /// Persist the recent window. Only consulted when `full` is false.
    pub save: bool,
}

/// Refresh a security's daily-adjusted history.
///
/// Three branches:
/// 1. `full` with no cache — fetch the provider's maximum history,
///    normalize, persist.
/// 2. `full` with a cache — fetch the short recent window only when the
///    staleness gap is strictly positive, merge keep-first, persist;
///    otherwise return the cache unchanged without writing.
/// 3. default — always fetch the recent window fresh; the cache is
///    neither consulted nor merged; persist only on `save`.
pub fn refresh_daily(
    provider: &dyn MarketDataProvider,
    store: &SnapshotStore,
    symbol: &str,
    opts: FetchOptions,
    today: NaiveDate,
) -> Result<RefreshOutcome, DataError> {
    if !opts.full {
        let series = provider.daily_adjusted(symbol, OutputSize::Compact)?;
        let dataset = schema::normalize(symbol, &series, DatasetKind::Equity)?;
        let written = if opts.save {
            Some(store.write(&dataset, true)?)
        } else {
            None
        };
        return Ok(RefreshOutcome {
            dataset,
            source: RefreshSource::Provider,
            written,
        });
    }

    match store.try_read_latest(symbol)? {
        None => {
            let series = provider.daily_adjusted(symbol, OutputSize::Full)?;
            let dataset = schema::normalize(symbol, &series, DatasetKind::Equity)?;
            let written = store.write(&dataset, true)?;
            Ok(RefreshOutcome {
                dataset,
                source: RefreshSource::Provider,
                written: Some(written),
            })
        }
        Some(cached) => {
            let stale = staleness_gap(&cached, today).map_or(false, |gap| gap > 0);
            if stale {
                let series = provider.daily_adjusted(symbol, OutputSize::Compact)?;
                let window = schema::normalize(symbol, &series, DatasetKind::Equity)?;
                let merged = cached.merge(window)?;
                let written = store.write(&merged, true)?;
                Ok(RefreshOutcome {
                    dataset: merged,
                    source: RefreshSource::Merged,
                    written: Some(written),
                })
            } else {
                Ok(RefreshOutcome {
                    dataset: cached,
                    source: RefreshSource::Cache,
                    written: None,
                })
            }
        }
    }
}

/// Refresh a digital currency's daily history, denominated in `market`.
///
/// Same shape as the security path, except there is no recent-window
/// mode and the staleness comparison refetches whenever the gap is
/// nonzero in either direction. An empty cached snapshot also refetches.
pub fn refresh_crypto(
    provider: &dyn MarketDataProvider,
    store: &SnapshotStore,
    symbol: &str,
    market: &str,
    today: NaiveDate,
) -> Result<RefreshOutcome, DataError> {
    match store.try_read_latest(symbol)? {
        None => {
            let series = provider.digital_currency_daily(symbol, market)?;
            let dataset = schema::normalize(symbol, &series, DatasetKind::Crypto)?;
            let written = store.write(&dataset, true)?;
            Ok(RefreshOutcome {
                dataset,
                source: RefreshSource::Provider,
                written: Some(written),
            })
        }
        Some(cached) => {
            let stale = staleness_gap(&cached, today).map_or(true, |gap| gap != 0);
            if stale {
                let series = provider.digital_currency_daily(symbol, market)?;
                let window = schema::normalize(symbol, &series, DatasetKind::Crypto)?;
                let merged = cached.merge(window)?;
                let written = store.write(&merged, true)?;
                Ok(RefreshOutcome {
                    dataset: merged,
                    source: RefreshSource::Merged,
                    written: Some(written),
                })
            } else {
                Ok(RefreshOutcome {
                    dataset: cached,
                    source: RefreshSource::Cache,
                    written: None,
                })
            }
        }
    }
}

/// Signed whole-day gap between the cache's last index date and `today`.
fn staleness_gap(cached: &Dataset, today: NaiveDate) -> Option<i64> {
    cached.last_date().map(|last| (last - today).num_days())
}

/// Which refresh path a batch runs.
#[derive(Debug, Clone, Copy)]
pub enum RefreshKind<'a> {
    Daily(FetchOptions),
    Crypto { market: &'a str },
}

/// Summary of a batch refresh.
#[derive(Debug)]
pub struct RefreshSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<RefreshOutcome>,
    pub errors: Vec<(String, DataError)>,
}

impl RefreshSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Refresh multiple datasets with progress reporting.
///
/// One dataset's failure does not abort the batch; failures are
/// collected in the summary's error list.
pub fn refresh_many(
    provider: &dyn MarketDataProvider,
    store: &SnapshotStore,
    symbols: &[&str],
    kind: RefreshKind,
    today: NaiveDate,
    progress: &dyn FetchProgress,
) -> RefreshSummary {
    let total = symbols.len();
    let mut succeeded = 0;
    let mut failed = 0;
    let mut outcomes = Vec::new();
    let mut errors: Vec<(String, DataError)> = Vec::new();

    for (i, symbol) in symbols.iter().enumerate() {
        progress.on_start(symbol, i, total);

        let result = match kind {
            RefreshKind::Daily(opts) => refresh_daily(provider, store, symbol, opts, today),
            RefreshKind::Crypto { market } => {
                refresh_crypto(provider, store, symbol, market, today)
            }
        };

        match result {
            Ok(outcome) => {
                progress.on_complete(symbol, i, total, &Ok(()));
                succeeded += 1;
                outcomes.push(outcome);
            }
            Err(e) => {
                let failure: Result<(), DataError> = Err(e);
                progress.on_complete(symbol, i, total, &failure);
                if let Err(e) = failure {
                    errors.push((symbol.to_string(), e));
                }
                failed += 1;
            }
        }
    }

    progress.on_batch_complete(succeeded, failed, total);

    RefreshSummary {
        total,
        succeeded,
        failed,
        outcomes,
        errors,
    }
}
