//! Configuration for Ode
//!
//! The same file is read by the server and the management CLI. Missing
//! sections fall back to their defaults, so an empty file is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::content::RECENT_TUTORIALS;
use crate::db::DatabaseConfig;
use crate::error::{ConfigError, CoreError};
use crate::pagination::DEFAULT_PAGE_SIZE;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OdeConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub content: ContentConfig,
}

/// Listing behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Items per page on every paginated listing
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// How many tutorials the "recent" listing shows
    #[serde(default = "default_recent_limit")]
    pub recent_limit: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_recent_limit() -> u32 {
    RECENT_TUTORIALS
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            recent_limit: default_recent_limit(),
        }
    }
}

/// Load configuration from a TOML file
pub async fn load_config(path: &Path) -> Result<OdeConfig> {
    let content =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CoreError::ConfigurationError {
                config_path: path.display().to_string(),
                field: "file".to_string(),
                expected: "readable TOML file".to_string(),
                cause: ConfigError::Io(e.to_string()),
            })?;

    parse_config(&content, path)
}

fn parse_config(content: &str, path: &Path) -> Result<OdeConfig> {
    let config: OdeConfig =
        toml::from_str(content).map_err(|e| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "content".to_string(),
            expected: "valid TOML configuration".to_string(),
            cause: ConfigError::TomlParse(e.to_string()),
        })?;

    if config.content.page_size == 0 {
        return Err(CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "content.page_size".to_string(),
            expected: "positive integer".to_string(),
            cause: ConfigError::TomlParse("page_size must be at least 1".to_string()),
        });
    }

    Ok(config)
}

/// Save configuration to a TOML file
pub async fn save_config(config: &OdeConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CoreError::ConfigurationError {
                config_path: parent.display().to_string(),
                field: "directory".to_string(),
                expected: "writable directory".to_string(),
                cause: ConfigError::Io(e.to_string()),
            })?;
    }

    let content = toml::to_string_pretty(config).map_err(|e| CoreError::ConfigurationError {
        config_path: path.display().to_string(),
        field: "serialization".to_string(),
        expected: "serializable config structure".to_string(),
        cause: ConfigError::TomlSerialize(e.to_string()),
    })?;

    tokio::fs::write(path, content)
        .await
        .map_err(|e| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "file".to_string(),
            expected: "writable file location".to_string(),
            cause: ConfigError::Io(e.to_string()),
        })?;

    Ok(())
}

/// Standard config file locations
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // Project-specific config
    paths.push(PathBuf::from("ode.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("ode").join("config.toml"));
    }

    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".ode").join("config.toml"));
    }

    paths
}

/// Load configuration from the first standard location that exists
pub async fn load_config_from_standard_locations() -> Result<OdeConfig> {
    for path in config_paths() {
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            return load_config(&path).await;
        }
    }

    Ok(OdeConfig::default())
}

impl OdeConfig {
    pub async fn load() -> Result<Self> {
        load_config_from_standard_locations().await
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        load_config(path).await
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        save_config(self, path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = OdeConfig::default();
        assert_eq!(config.content.page_size, 12);
        assert_eq!(config.content.recent_limit, 12);
        assert_eq!(config.database, DatabaseConfig::default());
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = parse_config("", Path::new("ode.toml")).unwrap();
        assert_eq!(config, OdeConfig::default());
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let err = parse_config("[content]\npage_size = 0\n", Path::new("ode.toml")).unwrap_err();
        assert!(matches!(err, CoreError::ConfigurationError { .. }));
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ode.toml");

        let config = OdeConfig {
            database: DatabaseConfig::Memory,
            content: ContentConfig {
                page_size: 5,
                recent_limit: 3,
            },
        };
        config.save_to(&path).await.unwrap();

        let loaded = OdeConfig::load_from(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_missing_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("absent.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ConfigurationError { .. }));
    }
}
