//! Database layer for Ode
//!
//! Everything is stored in SurrealDB and accessed through [`Db`], a
//! `Surreal<Any>` handle that can point at an in-memory engine, an embedded
//! SurrealKV file or a remote server depending on [`DatabaseConfig`].

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use thiserror::Error;

pub mod client;
pub mod migration;
pub mod models;
pub mod ops;
pub mod schema;

pub use models::{strip_brackets, strip_dt};

/// The database handle shared by every store
pub type Db = Surreal<Any>;

/// Namespace and database selected on every connection
pub const NAMESPACE: &str = "ode";
pub const DATABASE: &str = "ode";

/// Core database error type
#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("Connection failed")]
    #[diagnostic(help("Check your database configuration and ensure the database is running"))]
    ConnectionFailed(#[source] surrealdb::Error),

    #[error("Query failed")]
    #[diagnostic(help("Check the query syntax and table schema"))]
    QueryFailed(#[source] surrealdb::Error),

    #[error("Record already exists: {entity}")]
    #[diagnostic(help("A unique index or record key rejected the write"))]
    Conflict { entity: String },

    #[error("Record not found: {entity}")]
    NotFound { entity: String },

    #[error("Schema version mismatch: database is at v{db_version}, code expects v{code_version}")]
    #[diagnostic(help("The database was written by a newer release of Ode"))]
    SchemaVersionMismatch { db_version: u32, code_version: u32 },

    #[error("{0}")]
    Other(String),
}

impl DatabaseError {
    /// Classify a failed write, turning uniqueness violations into [`DatabaseError::Conflict`]
    pub fn from_write(err: surrealdb::Error, entity: impl Into<String>) -> Self {
        if is_uniqueness_violation(&err) {
            Self::Conflict {
                entity: entity.into(),
            }
        } else {
            Self::QueryFailed(err)
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The transaction lost a read/write race and may simply be run again
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::QueryFailed(e) if is_transaction_conflict(e))
    }
}

/// Optimistic transactions that collide abort with a conflict the engine
/// marks as safe to retry.
pub(crate) fn is_transaction_conflict(err: &surrealdb::Error) -> bool {
    err.to_string().contains("can be retried")
}

/// SurrealDB reports both a clashing record key and a clashing UNIQUE index as
/// plain errors, so the message is the only place the distinction survives.
fn is_uniqueness_violation(err: &surrealdb::Error) -> bool {
    let message = err.to_string();
    message.contains("already exists") || message.contains("already contains")
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Configuration for database backends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DatabaseConfig {
    /// Throwaway in-process database, lost on exit
    Memory,
    Embedded {
        #[serde(default = "default_db_path")]
        path: String,
    },
    #[cfg(feature = "surreal-remote")]
    Remote {
        url: String,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
        #[serde(default = "default_namespace")]
        namespace: String,
        #[serde(default = "default_database")]
        database: String,
    },
}

fn default_db_path() -> String {
    "./ode.db".to_string()
}

#[cfg(feature = "surreal-remote")]
fn default_namespace() -> String {
    NAMESPACE.to_string()
}

#[cfg(feature = "surreal-remote")]
fn default_database() -> String {
    DATABASE.to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig::Embedded {
            path: default_db_path(),
        }
    }
}
