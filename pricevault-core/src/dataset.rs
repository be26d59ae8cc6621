//! Named, time-indexed tables of daily market data.
//!
//! A Dataset is built in memory per refresh call, possibly merged with a
//! prior snapshot, written once, then dropped — persistence is entirely
//! file-based.

use crate::provider::DataError;
use chrono::NaiveDate;
use std::collections::HashSet;

/// One row of the date index: a calendar day and its column values, in the
/// same order as the owning dataset's column list.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub date: NaiveDate,
    pub values: Vec<f64>,
}

/// A named table of daily rows with a fixed column list.
///
/// Rows are kept in the order received; provider responses and persisted
/// snapshots are date-ascending, so the last row carries the most recent
/// date.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Dataset name — the ticker or coin code, also the snapshot file prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Final entry of the date index, None when the dataset has no rows.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// Append a row. Callers supply values in column order; the normalizer
    /// and the snapshot store both guarantee the width matches.
    pub fn push(&mut self, date: NaiveDate, values: Vec<f64>) {
        self.rows.push(Row { date, values });
    }

    /// Merge a freshly fetched window into this dataset.
    ///
    /// Rows from `window` whose date already appears in the index are
    /// dropped (first occurrence wins); the rest are appended in order.
    /// After a merge the date index contains no duplicate entries.
    pub fn merge(mut self, window: Dataset) -> Result<Dataset, DataError> {
        if self.columns != window.columns {
            return Err(DataError::Validation(format!(
                "column mismatch merging '{}': cached {:?} vs fetched {:?}",
                self.name, self.columns, window.columns
            )));
        }

        let mut seen: HashSet<NaiveDate> = self.rows.iter().map(|r| r.date).collect();
        for row in window.rows {
            if seen.insert(row.date) {
                self.rows.push(row);
            }
        }
        Ok(self)
    }
}
