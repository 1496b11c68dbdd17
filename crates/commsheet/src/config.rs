//! Configuration management for commsheet.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "commsheet";

/// Default store database file name.
const STORE_FILE_NAME: &str = "library.db";

/// Default master call dataset file name.
const MASTER_CALLS_FILE_NAME: &str = "radio_calls_master.json";

/// Default airport directory file name.
const AIRPORTS_FILE_NAME: &str = "airports.json";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `COMMSHEET_`)
/// 2. TOML config file at `~/.config/commsheet/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dataset and store path configuration.
    pub data: DataConfig,
    /// Sheet editing configuration.
    pub sheet: SheetConfig,
}

/// Dataset and store paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Path to the override store database.
    /// Defaults to `~/.local/share/commsheet/library.db`
    pub store_path: Option<PathBuf>,
    /// Path to the master call dataset.
    /// Defaults to `~/.local/share/commsheet/radio_calls_master.json`
    pub master_calls_path: Option<PathBuf>,
    /// Path to the airport directory dataset.
    /// Defaults to `~/.local/share/commsheet/airports.json`
    pub airports_path: Option<PathBuf>,
}

/// Sheet editing limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    /// Maximum number of undo snapshots retained per editor.
    pub undo_depth: usize,
    /// Maximum number of remembered call signs.
    pub callsign_history_limit: usize,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            undo_depth: 20,
            callsign_history_limit: 20,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("COMMSHEET_").split("_"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.sheet.undo_depth == 0 {
            return Err(Error::ConfigValidation {
                message: "undo_depth must be greater than 0".to_string(),
            });
        }

        if self.sheet.callsign_history_limit == 0 {
            return Err(Error::ConfigValidation {
                message: "callsign_history_limit must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the store database path, resolving defaults if not set.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.data
            .store_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(STORE_FILE_NAME))
    }

    /// Get the master call dataset path, resolving defaults if not set.
    #[must_use]
    pub fn master_calls_path(&self) -> PathBuf {
        self.data
            .master_calls_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(MASTER_CALLS_FILE_NAME))
    }

    /// Get the airport directory path, resolving defaults if not set.
    #[must_use]
    pub fn airports_path(&self) -> PathBuf {
        self.data
            .airports_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(AIRPORTS_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.data.store_path.is_none());
        assert!(config.data.master_calls_path.is_none());
        assert_eq!(config.sheet.undo_depth, 20);
        assert_eq!(config.sheet.callsign_history_limit, 20);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_undo_depth() {
        let mut config = Config::default();
        config.sheet.undo_depth = 0;

        let result = config.validate();
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("undo_depth"));
    }

    #[test]
    fn test_validate_zero_history_limit() {
        let mut config = Config::default();
        config.sheet.callsign_history_limit = 0;

        let result = config.validate();
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("callsign_history_limit"));
    }

    #[test]
    fn test_store_path_default() {
        let config = Config::default();
        let path = config.store_path();
        assert!(path.to_string_lossy().contains("library.db"));
    }

    #[test]
    fn test_store_path_custom() {
        let mut config = Config::default();
        config.data.store_path = Some(PathBuf::from("/custom/path/lib.db"));
        assert_eq!(config.store_path(), PathBuf::from("/custom/path/lib.db"));
    }

    #[test]
    fn test_master_calls_path_default() {
        let config = Config::default();
        let path = config.master_calls_path();
        assert!(path.to_string_lossy().contains("radio_calls_master.json"));
    }

    #[test]
    fn test_airports_path_default() {
        let config = Config::default();
        let path = config.airports_path();
        assert!(path.to_string_lossy().contains("airports.json"));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("commsheet"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults)
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());

        let config = result.unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_serialize_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("undo_depth"));

        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_sheet_config_deserialize() {
        let json = r#"{"undo_depth": 5, "callsign_history_limit": 10}"#;
        let sheet: SheetConfig = serde_json::from_str(json).unwrap();
        assert_eq!(sheet.undo_depth, 5);
        assert_eq!(sheet.callsign_history_limit, 10);
    }
}
