//! PriceVault Core — dataset model, schema normalizer, snapshot store,
//! Alpha Vantage client, and the cache refresh orchestrator.
//!
//! The flow per dataset: the orchestrator asks the snapshot store for the
//! most recently written cached snapshot, decides between cache-hit,
//! incremental fetch, or full fetch, normalizes whatever the provider
//! returned, merges it with the cache, and persists the combined result.

pub mod alpha_vantage;
pub mod config;
pub mod dataset;
pub mod provider;
pub mod refresh;
pub mod schema;
pub mod store;

pub use alpha_vantage::AlphaVantage;
pub use config::{ConfigError, Settings};
pub use dataset::Dataset;
pub use provider::{
    DataError, FetchProgress, MarketDataProvider, OutputSize, RawRow, RawSeries, StdoutProgress,
};
pub use refresh::{
    refresh_crypto, refresh_daily, refresh_many, FetchOptions, RefreshKind, RefreshOutcome,
    RefreshSource, RefreshSummary,
};
pub use schema::{normalize, DatasetKind};
pub use store::SnapshotStore;
