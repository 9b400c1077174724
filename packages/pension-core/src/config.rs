//! Dashboard configuration loaded from TOML.

use crate::i18n;
use crate::types::{AssetClass, CompareMode, DataType};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of periods between the end and start boundaries.
pub const DEFAULT_LOOKBACK: usize = 3;

/// Default name of the data resource served through the offline cache.
pub const DEFAULT_DATA_RESOURCE: &str = "pension_data.json";

/// User configuration. Every field is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct DashboardConfig {
    /// `en` or `zh`; detected from the environment when unset
    pub locale: Option<String>,
    /// Persistence file for the last uploaded document
    pub store_path: Option<PathBuf>,
    /// Directory the data resource is refreshed from
    pub data_dir: Option<PathBuf>,
    pub data_resource: Option<String>,
    pub lookback: Option<usize>,
    pub data_type: DataType,
    pub asset_class: AssetClass,
    pub compare_mode: CompareMode,
}

impl DashboardConfig {
    /// Get the default config file path.
    ///
    /// Default path: `~/.pension/config.toml`
    /// Can be overridden with `PENSION_CONFIG_FILE` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("PENSION_CONFIG_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".pension/config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Load from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load from a specific path. A missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn locale(&self) -> String {
        self.locale.clone().unwrap_or_else(i18n::detect_locale)
    }

    pub fn lookback(&self) -> usize {
        self.lookback.unwrap_or(DEFAULT_LOOKBACK)
    }

    pub fn data_resource(&self) -> &str {
        self.data_resource.as_deref().unwrap_or(DEFAULT_DATA_RESOURCE)
    }

    /// Configured store path, else `PENSION_STORE_FILE`, else `~/.pension/pension_data.json`.
    pub fn store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(crate::store::FileStore::default_path)
    }

    /// Configured data directory, else the directory holding the store file.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        self.store_path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.lookback(), 3);
        assert_eq!(config.data_resource(), "pension_data.json");
        assert_eq!(config.data_type, DataType::Return);
        assert_eq!(config.asset_class, AssetClass::Fixed);
        assert_eq!(config.compare_mode, CompareMode::Trend);
    }

    #[test]
    fn test_from_toml() {
        let config = DashboardConfig::from_toml_str(
            r#"
            locale = "zh"
            lookback = 6
            data_type = "asset"
            compare_mode = "cross-section"
            data_dir = "/srv/pension"
            "#,
        )
        .unwrap();

        assert_eq!(config.locale(), "zh");
        assert_eq!(config.lookback(), 6);
        assert_eq!(config.data_type, DataType::Asset);
        assert_eq!(config.asset_class, AssetClass::Fixed);
        assert_eq!(config.compare_mode, CompareMode::CrossSection);
        assert_eq!(config.data_dir(), PathBuf::from("/srv/pension"));
    }

    #[test]
    fn test_invalid_toml() {
        let result = DashboardConfig::from_toml_str("data_type = \"bonds\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let missing = DashboardConfig::load_from_path(&path).unwrap();
        assert_eq!(missing, DashboardConfig::default());

        fs::write(&path, "store_path = \"data/store.json\"\n").unwrap();
        let config = DashboardConfig::load_from_path(&path).unwrap();
        assert_eq!(config.store_path(), PathBuf::from("data/store.json"));
        assert_eq!(config.data_dir(), PathBuf::from("data"));
    }
}
