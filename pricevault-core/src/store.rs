//! CSV snapshot store: newest-by-mtime reads, timestamped writes.
//!
//! Layout: `{data_dir}/{name}_{MMDD_HHMMSS}.csv` or `{data_dir}/{name}_latest.csv`
//!
//! Repeated timestamped writes on the same day leave multiple coexisting
//! snapshot files per dataset; nothing is cleaned up automatically, and
//! "most recent by modification time" is the read contract.

use crate::dataset::Dataset;
use crate::provider::DataError;
use chrono::{DateTime, Datelike, Local, NaiveDate, Timelike};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Tokens recognized as boolean truth when a snapshot cell fails numeric
/// parsing. Read back as 1.0.
pub const TRUE_TOKENS: [&str; 7] = ["Yes", "yes", "y", "Y", "T", "True", "TRUE"];

/// Tokens recognized as boolean falsehood. Read back as 0.0.
pub const FALSE_TOKENS: [&str; 7] = ["No", "no", "n", "N", "F", "False", "FALSE"];

/// The CSV snapshot store.
pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Root directory of the store.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Find the most recently modified file named `{prefix}*{ext}`.
    ///
    /// The extension may be given with or without a leading dot. Fails with
    /// `DataError::NoSnapshot` when nothing matches (a missing directory
    /// counts as nothing cached).
    pub fn find_latest(&self, prefix: &str, ext: &str) -> Result<PathBuf, DataError> {
        let ext = if ext.starts_with('.') {
            ext.to_string()
        } else {
            format!(".{ext}")
        };

        if !self.data_dir.exists() {
            return Err(DataError::NoSnapshot {
                name: prefix.to_string(),
            });
        }

        let entries = fs::read_dir(&self.data_dir)
            .map_err(|e| DataError::Store(format!("read dir {}: {e}", self.data_dir.display())))?;

        let mut newest: Option<(SystemTime, PathBuf)> = None;
        for entry in entries {
            let entry = entry.map_err(|e| DataError::Store(format!("dir entry: {e}")))?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !(file_name.starts_with(prefix) && file_name.ends_with(&ext)) {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .map_err(|e| DataError::Store(format!("stat {file_name}: {e}")))?;
            if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
                newest = Some((modified, entry.path()));
            }
        }

        newest.map(|(_, path)| path).ok_or_else(|| DataError::NoSnapshot {
            name: prefix.to_string(),
        })
    }

    /// Read the most recent snapshot for a dataset, failing loudly with
    /// `NoSnapshot` when nothing is cached.
    pub fn read_latest(&self, name: &str) -> Result<Dataset, DataError> {
        let path = self.find_latest(name, ".csv")?;
        self.read_snapshot(name, &path)
    }

    /// Read the most recent snapshot if one exists.
    ///
    /// An absent cache is not an error here — `Ok(None)` signals "no
    /// snapshot" so callers can fall through to a full fetch. Real I/O or
    /// parse failures still propagate.
    pub fn try_read_latest(&self, name: &str) -> Result<Option<Dataset>, DataError> {
        match self.find_latest(name, ".csv") {
            Ok(path) => self.read_snapshot(name, &path).map(Some),
            Err(DataError::NoSnapshot { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Serialize a dataset to a new snapshot file and return its path.
    ///
    /// The filename carries a month/day_hour/minute/second stamp when
    /// `timestamped` is true, otherwise the fixed `latest` suffix (which
    /// overwrites any previous `latest` snapshot).
    pub fn write(&self, dataset: &Dataset, timestamped: bool) -> Result<PathBuf, DataError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| DataError::Store(format!("create dir {}: {e}", self.data_dir.display())))?;

        let path = self.snapshot_path(dataset.name(), timestamped, Local::now());
        let mut writer = csv::Writer::from_path(&path)
            .map_err(|e| DataError::Store(format!("create {}: {e}", path.display())))?;

        writer
            .write_record(
                std::iter::once("date").chain(dataset.columns().iter().map(String::as_str)),
            )
            .map_err(|e| DataError::Store(format!("write header: {e}")))?;

        for row in dataset.rows() {
            let mut record = Vec::with_capacity(row.values.len() + 1);
            record.push(row.date.format("%Y-%m-%d").to_string());
            record.extend(row.values.iter().map(|v| format!("{v:.3}")));
            writer
                .write_record(&record)
                .map_err(|e| DataError::Store(format!("write row: {e}")))?;
        }

        writer
            .flush()
            .map_err(|e| DataError::Store(format!("flush {}: {e}", path.display())))?;
        Ok(path)
    }

    /// Snapshot path for a dataset name at a given wall-clock instant.
    fn snapshot_path(&self, name: &str, timestamped: bool, now: DateTime<Local>) -> PathBuf {
        let suffix = if timestamped {
            format!(
                "{:02}{:02}_{:02}{:02}{:02}",
                now.month(),
                now.day(),
                now.hour(),
                now.minute(),
                now.second()
            )
        } else {
            "latest".to_string()
        };
        self.data_dir.join(format!("{name}_{suffix}.csv"))
    }

    fn read_snapshot(&self, name: &str, path: &Path) -> Result<Dataset, DataError> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| DataError::Store(format!("open {}: {e}", path.display())))?;

        let headers = reader
            .headers()
            .map_err(|e| DataError::Store(format!("read header: {e}")))?
            .clone();

        // First column is the date index; the rest are data columns.
        let columns = headers.iter().skip(1).map(|h| h.to_string()).collect();
        let mut dataset = Dataset::new(name, columns);

        for record in reader.records() {
            let record = record.map_err(|e| DataError::Store(format!("read row: {e}")))?;
            let date_cell = record
                .get(0)
                .ok_or_else(|| DataError::Store("empty record".into()))?;
            let date = NaiveDate::parse_from_str(date_cell, "%Y-%m-%d")
                .map_err(|e| DataError::Store(format!("bad date '{date_cell}': {e}")))?;

            let mut values = Vec::with_capacity(record.len().saturating_sub(1));
            for (i, cell) in record.iter().enumerate().skip(1) {
                values.push(parse_cell(headers.get(i).unwrap_or(""), cell)?);
            }
            dataset.push(date, values);
        }

        Ok(dataset)
    }
}

/// Parse one snapshot cell: numeric first, then the fixed boolean token
/// sets (truthy → 1.0, falsy → 0.0), anything else is malformed.
fn parse_cell(column: &str, cell: &str) -> Result<f64, DataError> {
    if let Ok(v) = cell.parse::<f64>() {
        return Ok(v);
    }
    if TRUE_TOKENS.contains(&cell) {
        return Ok(1.0);
    }
    if FALSE_TOKENS.contains(&cell) {
        return Ok(0.0);
    }
    Err(DataError::Malformed {
        column: column.to_string(),
        value: cell.to_string(),
    })
}
