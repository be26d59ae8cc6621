//! Alpha Vantage provider client.
//!
//! Fetches daily-adjusted security history and daily digital-currency
//! history over Alpha Vantage's JSON query API. Responses arrive as an
//! object keyed by date, each date mapping provider column labels to
//! string values; rows are returned ascending by date. No retries, no
//! backoff, no pagination — a transport failure aborts the operation.

use crate::provider::{DataError, MarketDataProvider, OutputSize, RawRow, RawSeries};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

const BASE_URL: &str = "https://www.alphavantage.co/query";

const DAILY_SERIES_KEY: &str = "Time Series (Daily)";
const CRYPTO_SERIES_KEY: &str = "Time Series (Digital Currency Daily)";

/// Top-level Alpha Vantage response. The series object's key depends on
/// the function called, so everything that isn't metadata or an error
/// marker is collected by the flatten map.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(rename = "Meta Data")]
    meta: Option<BTreeMap<String, String>>,

    #[serde(rename = "Error Message")]
    error_message: Option<String>,

    #[serde(rename = "Note")]
    note: Option<String>,

    #[serde(rename = "Information")]
    information: Option<String>,

    #[serde(flatten)]
    series: BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>,
}

/// Alpha Vantage market-data provider.
pub struct AlphaVantage {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
}

impl AlphaVantage {
    /// Build a client with the given API key (from settings — the key is
    /// never compiled in).
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    fn get(&self, params: &[(&str, &str)]) -> Result<ApiResponse, DataError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(params)
            .send()
            .map_err(|e| DataError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::Network(format!("HTTP {status}")));
        }

        resp.json::<ApiResponse>()
            .map_err(|e| DataError::ResponseFormatChanged(format!("failed to parse response: {e}")))
    }

    /// Pull the expected series object out of a response, mapping the
    /// provider's error markers to structured errors.
    fn extract_series(
        symbol: &str,
        series_key: &str,
        resp: ApiResponse,
    ) -> Result<RawSeries, DataError> {
        if resp.error_message.is_some() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        if let Some(note) = resp.note.or(resp.information) {
            return Err(DataError::RateLimited(note));
        }

        let mut series = resp.series;
        let table = series.remove(series_key).ok_or_else(|| {
            DataError::ResponseFormatChanged(format!("missing '{series_key}' object"))
        })?;

        let mut rows = Vec::with_capacity(table.len());
        for (date_str, fields) in table {
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                DataError::ResponseFormatChanged(format!("invalid date key '{date_str}': {e}"))
            })?;
            rows.push(RawRow { date, fields });
        }

        Ok(RawSeries {
            meta: resp.meta.unwrap_or_default(),
            rows,
        })
    }
}

impl MarketDataProvider for AlphaVantage {
    fn name(&self) -> &str {
        "alpha_vantage"
    }

    fn daily_adjusted(
        &self,
        symbol: &str,
        output_size: OutputSize,
    ) -> Result<RawSeries, DataError> {
        let resp = self.get(&[
            ("function", "TIME_SERIES_DAILY_ADJUSTED"),
            ("symbol", symbol),
            ("outputsize", output_size.as_str()),
            ("apikey", self.api_key.as_str()),
        ])?;
        Self::extract_series(symbol, DAILY_SERIES_KEY, resp)
    }

    fn digital_currency_daily(&self, symbol: &str, market: &str) -> Result<RawSeries, DataError> {
        let resp = self.get(&[
            ("function", "DIGITAL_CURRENCY_DAILY"),
            ("symbol", symbol),
            ("market", market),
            ("apikey", self.api_key.as_str()),
        ])?;
        Self::extract_series(symbol, CRYPTO_SERIES_KEY, resp)
    }
}
