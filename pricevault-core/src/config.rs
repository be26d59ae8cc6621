//! Process configuration: API credentials and the snapshot directory.
//!
//! Constructed once at startup and passed to components explicitly —
//! there are no module-level globals, and the API key lives outside the
//! binary.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default snapshot directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Settings loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Alpha Vantage API key.
    pub api_key: String,

    /// Snapshot directory. Defaults to `./data`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("settings are missing an API key")]
    MissingApiKey,
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        if settings.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_and_data_dir() {
        let settings = Settings::from_toml(
            r#"
            api_key = "demo"
            data_dir = "snapshots"
            "#,
        )
        .unwrap();

        assert_eq!(settings.api_key, "demo");
        assert_eq!(settings.data_dir, PathBuf::from("snapshots"));
    }

    #[test]
    fn data_dir_defaults() {
        let settings = Settings::from_toml(r#"api_key = "demo""#).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let err = Settings::from_toml(r#"api_key = "  ""#).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn missing_api_key_fails_to_parse() {
        assert!(matches!(
            Settings::from_toml(r#"data_dir = "snapshots""#),
            Err(ConfigError::Parse(_))
        ));
    }
}
