//! Configuration for plumbstock-core
//!
//! Storage keys, collection capacity, and the size limits applied to items
//! and images.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Key holding the persisted item array.
pub const ITEMS_KEY: &str = "recentlyAddedItems";
/// Key holding the single item staged for editing.
pub const EDIT_KEY: &str = "itemToUpdate";

const APP_DIR: &str = "plumbstock";
const CONFIG_FILE: &str = "config.toml";

/// Store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Key of the persisted item array
    pub items_key: String,
    /// Key of the edit handoff slot
    pub edit_key: String,
    /// Maximum number of items kept; inserts past this evict the oldest
    pub capacity: usize,
    /// Serialized collection size above which writes log a warning
    pub size_warning_bytes: usize,
    /// Largest source image accepted at selection time
    pub max_image_bytes: usize,
    /// Low-stock threshold used by category views
    pub default_reorder_level: i64,
    /// Directory for the file backend; platform data dir when unset
    pub data_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            items_key: ITEMS_KEY.to_string(),
            edit_key: EDIT_KEY.to_string(),
            capacity: 20,
            size_warning_bytes: 4 * 1024 * 1024,
            max_image_bytes: 2 * 1024 * 1024,
            default_reorder_level: 15,
            data_dir: None,
        }
    }
}

impl StoreConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `<config_dir>/plumbstock/config.toml`, falling back to
    /// defaults when no file exists there.
    pub fn load_standard() -> Result<Self, ConfigError> {
        match Self::standard_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn standard_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Directory the file backend writes to.
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR)))
            .unwrap_or_else(|| PathBuf::from(".").join(format!(".{}", APP_DIR)))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::OutOfRange(
                "capacity must be positive".to_string(),
            ));
        }

        if self.items_key.is_empty() || self.edit_key.is_empty() {
            return Err(ConfigError::OutOfRange(
                "storage keys must not be empty".to_string(),
            ));
        }

        if self.items_key == self.edit_key {
            return Err(ConfigError::OutOfRange(
                "items_key and edit_key must differ".to_string(),
            ));
        }

        if self.default_reorder_level < 0 {
            return Err(ConfigError::OutOfRange(
                "default_reorder_level must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.capacity, 20);
        assert_eq!(config.items_key, "recentlyAddedItems");
        assert_eq!(config.edit_key, "itemToUpdate");
        assert_eq!(config.max_image_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = StoreConfig::from_toml("capacity = 5\n").unwrap();
        assert_eq!(config.capacity, 5);
        assert_eq!(config.default_reorder_level, 15);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = StoreConfig::default();
        config.data_dir = Some(PathBuf::from("/tmp/plumbstock"));
        let toml_str = config.to_toml().unwrap();
        assert_eq!(StoreConfig::from_toml(&toml_str).unwrap(), config);
    }

    #[test]
    fn test_json_serialization() {
        let config = StoreConfig::default();
        let json = config.to_json().unwrap();
        let parsed = StoreConfig::from_json(&json).unwrap();
        assert_eq!(config.capacity, parsed.capacity);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = StoreConfig::default();
        config.capacity = 0;
        assert!(config.validate().is_err());

        let mut config = StoreConfig::default();
        config.edit_key = config.items_key.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "capacity = 3\ndefault_reorder_level = 4\n").unwrap();
        let config = StoreConfig::load(&path).unwrap();
        assert_eq!(config.capacity, 3);
        assert_eq!(config.default_reorder_level, 4);

        std::fs::write(&path, "capacity = 0\n").unwrap();
        assert!(matches!(
            StoreConfig::load(&path),
            Err(ConfigError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_explicit_data_dir_wins() {
        let mut config = StoreConfig::default();
        config.data_dir = Some(PathBuf::from("/srv/stock"));
        assert_eq!(config.resolved_data_dir(), PathBuf::from("/srv/stock"));
    }
}
