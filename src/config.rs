//! Application configuration.
//!
//! Loaded from TOML; every section is optional.
//!
//! ```toml
//! [optimizer]
//! generations = 100
//! population_size = 50
//! elite_count = 10
//! pool_size = 20
//! seed = 42
//!
//! [storage]
//! path = "saved_routes.jsonl"
//!
//! [geocoding]
//! gazetteer = "places.csv"
//! ```

use crate::error::ConfigError;
use crate::heuristics::genetic::GAConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub optimizer: GAConfig,
    pub storage: StorageConfig,
    pub geocoding: GeocodingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Append-only route log
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            path: PathBuf::from("saved_routes.jsonl"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// CSV file with `name,lat,lng` rows
    pub gazetteer: Option<PathBuf>,
}

impl AppConfig {
    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Load `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.optimizer.generations, 100);
        assert_eq!(config.storage.path, PathBuf::from("saved_routes.jsonl"));
        assert!(config.geocoding.gazetteer.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let config = AppConfig::from_toml_str(
            r#"
            [optimizer]
            population_size = 30
            seed = 9

            [geocoding]
            gazetteer = "places.csv"
            "#,
        )
        .unwrap();
        assert_eq!(config.optimizer.population_size, 30);
        assert_eq!(config.optimizer.elite_count, 10);
        assert_eq!(config.optimizer.seed, Some(9));
        assert_eq!(config.geocoding.gazetteer, Some(PathBuf::from("places.csv")));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(dir.path().join("missing.toml"));
        assert!(matches!(err, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_invalid_values_surface_on_validate() {
        let config = AppConfig::from_toml_str("[optimizer]\npool_size = 1\n").unwrap();
        assert!(config.optimizer.validate().is_err());
    }
}
