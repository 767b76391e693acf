//! Server configuration

use std::path::Path;

use ode_core::config::ContentConfig;
use ode_core::db::DatabaseConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// File read when no explicit path is given
pub const DEFAULT_CONFIG_FILE: &str = "ode-server.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "127.0.0.1:8000")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub content: ContentConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// `"*"` allows any origin
    pub allowed_origins: Vec<String>,
    pub max_age: u64,
}

fn default_bind_address() -> String {
    "127.0.0.1:8000".to_string()
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            max_age: 3600,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors: CorsConfig::default(),
            database: DatabaseConfig::default(),
            content: ContentConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read a TOML file; missing sections keep their defaults
    pub async fn load_from(path: &Path) -> ServerResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| ServerError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise [`DEFAULT_CONFIG_FILE`] if it exists,
    /// otherwise the defaults
    pub async fn load(path: Option<&Path>) -> ServerResult<Self> {
        match path {
            Some(path) => Self::load_from(path).await,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    tracing::info!("Loading configuration from {}", default.display());
                    Self::load_from(default).await
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply `ODE_BIND_ADDRESS`, `ODE_DATABASE_PATH` and `ODE_PAGE_SIZE`
    ///
    /// `get` is the variable lookup, normally `|k| std::env::var(k).ok()`.
    /// A database path of `memory` selects the in-memory engine.
    pub fn apply_env_overrides(mut self, get: impl Fn(&str) -> Option<String>) -> ServerResult<Self> {
        if let Some(addr) = get("ODE_BIND_ADDRESS") {
            self.bind_address = addr;
        }

        if let Some(path) = get("ODE_DATABASE_PATH") {
            self.database = if path == "memory" {
                DatabaseConfig::Memory
            } else {
                DatabaseConfig::Embedded { path }
            };
        }

        if let Some(size) = get("ODE_PAGE_SIZE") {
            self.content.page_size = size
                .trim()
                .parse()
                .map_err(|_| ServerError::Config(format!("ODE_PAGE_SIZE={} is not a number", size)))?;
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> ServerResult<()> {
        if self.content.page_size == 0 {
            return Err(ServerError::Config(
                "content.page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
