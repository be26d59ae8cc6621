//! Provider-to-internal column maps and the schema normalizer.
//!
//! The rename mapping is a schema-versioned contract with the provider,
//! kept as a declarative table per dataset kind and validated against the
//! shape of the actual response rather than assumed blindly.

use crate::dataset::Dataset;
use crate::provider::{DataError, RawSeries};

/// Which column contract a dataset follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Equity,
    Crypto,
}

/// Provider label → internal column name, for daily-adjusted securities.
const EQUITY_COLUMNS: &[(&str, &str)] = &[
    ("1. open", "open"),
    ("2. high", "high"),
    ("3. low", "low"),
    ("4. close", "close"),
    ("5. adjusted close", "adj_close"),
    ("6. volume", "volume"),
    ("7. dividend amount", "dividend_amount"),
    ("8. split coefficient", "split_coefficient"),
];

/// Provider label → internal column name, for digital currencies. Only the
/// USD-denominated columns are kept; everything else the provider sends is
/// discarded.
const CRYPTO_COLUMNS: &[(&str, &str)] = &[
    ("1a. open (USD)", "open"),
    ("2a. high (USD)", "high"),
    ("3a. low (USD)", "low"),
    ("4a. close (USD)", "close"),
    ("5. volume", "volume"),
    ("6. market cap (USD)", "market_cap"),
];

impl DatasetKind {
    pub fn column_map(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Equity => EQUITY_COLUMNS,
            Self::Crypto => CRYPTO_COLUMNS,
        }
    }
}

/// Rename provider columns to the internal schema and project down to the
/// mapped subset.
///
/// A provider row missing a mapped column fails the whole operation with
/// `DataError::MissingColumn`; no row-count or value-range validation is
/// performed beyond that.
pub fn normalize(name: &str, series: &RawSeries, kind: DatasetKind) -> Result<Dataset, DataError> {
    let map = kind.column_map();
    let columns = map.iter().map(|(_, internal)| internal.to_string()).collect();
    let mut dataset = Dataset::new(name, columns);

    for raw in &series.rows {
        let mut values = Vec::with_capacity(map.len());
        for (label, _) in map {
            let cell = raw.fields.get(*label).ok_or_else(|| DataError::MissingColumn {
                column: label.to_string(),
            })?;
            let value: f64 = cell.parse().map_err(|_| DataError::Malformed {
                column: label.to_string(),
                value: cell.clone(),
            })?;
            values.push(value);
        }
        dataset.push(raw.date, values);
    }

    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::RawRow;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn raw_row(date: NaiveDate, fields: &[(&str, &str)]) -> RawRow {
        RawRow {
            date,
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn series(rows: Vec<RawRow>) -> RawSeries {
        RawSeries {
            meta: BTreeMap::new(),
            rows,
        }
    }

    #[test]
    fn equity_labels_are_renamed_in_order() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let s = series(vec![raw_row(
            d,
            &[
                ("1. open", "100.0"),
                ("2. high", "102.0"),
                ("3. low", "99.0"),
                ("4. close", "101.0"),
                ("5. adjusted close", "100.5"),
                ("6. volume", "12345"),
                ("7. dividend amount", "0.0"),
                ("8. split coefficient", "1.0"),
            ],
        )]);

        let ds = normalize("SPY", &s, DatasetKind::Equity).unwrap();

        assert_eq!(
            ds.columns(),
            &[
                "open",
                "high",
                "low",
                "close",
                "adj_close",
                "volume",
                "dividend_amount",
                "split_coefficient"
            ]
        );
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.rows()[0].values[4], 100.5);
        assert_eq!(ds.rows()[0].values[5], 12345.0);
    }

    #[test]
    fn crypto_projects_to_six_columns_and_drops_extras() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let s = series(vec![raw_row(
            d,
            &[
                ("1a. open (USD)", "42000.0"),
                ("1b. open (USD)", "42000.0"),
                ("2a. high (USD)", "43000.0"),
                ("3a. low (USD)", "41000.0"),
                ("4a. close (USD)", "42500.0"),
                ("5. volume", "999.5"),
                ("6. market cap (USD)", "800000000.0"),
            ],
        )]);

        let ds = normalize("BTC", &s, DatasetKind::Crypto).unwrap();

        assert_eq!(ds.columns().len(), 6);
        assert_eq!(
            ds.columns(),
            &["open", "high", "low", "close", "volume", "market_cap"]
        );
        assert_eq!(ds.rows()[0].values, vec![
            42000.0, 43000.0, 41000.0, 42500.0, 999.5, 800000000.0
        ]);
    }

    #[test]
    fn missing_expected_column_fails_the_operation() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let s = series(vec![raw_row(d, &[("1. open", "100.0")])]);

        let err = normalize("SPY", &s, DatasetKind::Equity).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { column } if column == "2. high"));
    }

    #[test]
    fn unparseable_cell_is_malformed() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let s = series(vec![raw_row(
            d,
            &[
                ("1a. open (USD)", "not-a-number"),
                ("2a. high (USD)", "1.0"),
                ("3a. low (USD)", "1.0"),
                ("4a. close (USD)", "1.0"),
                ("5. volume", "1.0"),
                ("6. market cap (USD)", "1.0"),
            ],
        )]);

        let err = normalize("BTC", &s, DatasetKind::Crypto).unwrap_err();
        assert!(matches!(err, DataError::Malformed { .. }));
    }
}
