//! End-to-end refresh flows over a temporary snapshot directory:
//! full fetch → persist → cache hit → incremental merge, with the
//! persisted files re-read between steps.

use chrono::NaiveDate;
use pricevault_core::{
    refresh_crypto, refresh_daily, DataError, FetchOptions, MarketDataProvider, OutputSize,
    RawRow, RawSeries, RefreshSource, SnapshotStore,
};
use std::collections::BTreeMap;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn equity_row(date: NaiveDate, base: f64) -> RawRow {
    let fields: BTreeMap<String, String> = [
        ("1. open", base),
        ("2. high", base + 2.0),
        ("3. low", base - 1.0),
        ("4. close", base + 1.0),
        ("5. adjusted close", base + 0.5),
        ("6. volume", 1000.0),
        ("7. dividend amount", 0.0),
        ("8. split coefficient", 1.0),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), format!("{v:.3}")))
    .collect();
    RawRow { date, fields }
}

fn crypto_row(date: NaiveDate, base: f64) -> RawRow {
    let fields: BTreeMap<String, String> = [
        ("1a. open (USD)", base),
        ("2a. high (USD)", base + 2.0),
        ("3a. low (USD)", base - 1.0),
        ("4a. close (USD)", base + 1.0),
        ("5. volume", 1000.0),
        ("6. market cap (USD)", 5000.0),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), format!("{v:.3}")))
    .collect();
    RawRow { date, fields }
}

/// Provider whose "current" window advances between test steps.
struct ScriptedProvider {
    full_days: Vec<u32>,
    compact_days: Vec<u32>,
    crypto_days: Vec<u32>,
}

impl MarketDataProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn daily_adjusted(
        &self,
        _symbol: &str,
        output_size: OutputSize,
    ) -> Result<RawSeries, DataError> {
        let days = match output_size {
            OutputSize::Full => &self.full_days,
            OutputSize::Compact => &self.compact_days,
        };
        Ok(RawSeries {
            meta: BTreeMap::new(),
            rows: days.iter().map(|&d| equity_row(day(d), 100.0)).collect(),
        })
    }

    fn digital_currency_daily(&self, _symbol: &str, _market: &str) -> Result<RawSeries, DataError> {
        Ok(RawSeries {
            meta: BTreeMap::new(),
            rows: self
                .crypto_days
                .iter()
                .map(|&d| crypto_row(day(d), 40000.0))
                .collect(),
        })
    }
}

#[test]
fn daily_full_history_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    let opts = FetchOptions { full: true, save: false };

    // Day 5: nothing cached, full history lands on disk
    let provider = ScriptedProvider {
        full_days: vec![1, 2, 4, 5],
        compact_days: vec![4, 5],
        crypto_days: vec![],
    };
    let outcome = refresh_daily(&provider, &store, "SPY", opts, day(5)).unwrap();
    assert_eq!(outcome.source, RefreshSource::Provider);
    assert_eq!(outcome.dataset.len(), 4);

    // Same day again: served from the snapshot, nothing new on disk
    let files_before = std::fs::read_dir(dir.path()).unwrap().count();
    let outcome = refresh_daily(&provider, &store, "SPY", opts, day(5)).unwrap();
    assert_eq!(outcome.source, RefreshSource::Cache);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), files_before);

    // The persisted snapshot round-trips exactly (values are 3-decimal clean)
    let reloaded = store.read_latest("SPY").unwrap();
    assert_eq!(reloaded, outcome.dataset);
}

#[test]
fn crypto_incremental_merge_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());

    // Day 5: first fetch caches the full history
    let provider = ScriptedProvider {
        full_days: vec![],
        compact_days: vec![],
        crypto_days: vec![1, 2, 4, 5],
    };
    let outcome = refresh_crypto(&provider, &store, "BTC", "USD", day(5)).unwrap();
    assert_eq!(outcome.source, RefreshSource::Provider);
    assert_eq!(outcome.dataset.columns().len(), 6);

    // Day 7: the provider now has two more days; the nonzero gap triggers
    // a refetch and the overlap dedupes away
    let provider = ScriptedProvider {
        full_days: vec![],
        compact_days: vec![],
        crypto_days: vec![4, 5, 6, 7],
    };
    let outcome = refresh_crypto(&provider, &store, "BTC", "USD", day(7)).unwrap();
    assert_eq!(outcome.source, RefreshSource::Merged);
    // 4 cached + 4 fetched - 2 overlapping
    assert_eq!(outcome.dataset.len(), 6);

    // Day 7 again: the merged snapshot now ends today, so it's a cache hit
    let outcome = refresh_crypto(&provider, &store, "BTC", "USD", day(7)).unwrap();
    assert_eq!(outcome.source, RefreshSource::Cache);
    assert_eq!(outcome.dataset.len(), 6);
}
