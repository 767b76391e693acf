//! Application state

use ode_core::db::{self, Db};

use crate::{config::ServerConfig, error::ServerResult};

/// Shared by every handler; cloning is cheap
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub db: Db,
}

impl AppState {
    /// Connect to the configured database, running migrations
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        let db = db::client::connect(&config.database).await?;
        Ok(Self::with_db(config, db))
    }

    /// Wrap an already open database
    pub fn with_db(config: ServerConfig, db: Db) -> Self {
        Self { config, db }
    }
}
