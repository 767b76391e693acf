//! Connecting to SurrealDB

use surrealdb::engine::any;

use crate::db::migration::MigrationRunner;
use crate::db::{DATABASE, DatabaseConfig, DatabaseError, Db, NAMESPACE, Result};

/// Create a fresh in-memory database with the schema applied
pub async fn create_test_db() -> Result<Db> {
    connect(&DatabaseConfig::Memory).await
}

/// Open the configured database, select the namespace and run migrations
pub async fn connect(config: &DatabaseConfig) -> Result<Db> {
    let db = match config {
        DatabaseConfig::Memory => {
            tracing::debug!("Opening in-memory database");
            let db = any::connect("memory")
                .await
                .map_err(DatabaseError::ConnectionFailed)?;
            db.use_ns(NAMESPACE)
                .use_db(DATABASE)
                .await
                .map_err(DatabaseError::ConnectionFailed)?;
            db
        }
        DatabaseConfig::Embedded { path } => {
            // Ensure parent directory exists for file-based storage
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        DatabaseError::Other(format!(
                            "Failed to create database directory {}: {}",
                            parent.display(),
                            e
                        ))
                    })?;
                }
            }

            tracing::info!("Connecting to embedded database at: {}", path);
            let connect_start = std::time::Instant::now();
            let db = any::connect(format!("surrealkv://{}", path))
                .await
                .map_err(DatabaseError::ConnectionFailed)?;
            tracing::info!(
                "Database connection established in {:?}",
                connect_start.elapsed()
            );

            db.use_ns(NAMESPACE)
                .use_db(DATABASE)
                .await
                .map_err(DatabaseError::ConnectionFailed)?;
            db
        }
        #[cfg(feature = "surreal-remote")]
        DatabaseConfig::Remote {
            url,
            username,
            password,
            namespace,
            database,
        } => {
            use surrealdb::opt::auth::Root;

            tracing::info!("Connecting to remote database at: {}", url);
            let db = any::connect(url.as_str())
                .await
                .map_err(DatabaseError::ConnectionFailed)?;

            if let (Some(username), Some(password)) = (username, password) {
                db.signin(Root { username, password })
                    .await
                    .map_err(DatabaseError::ConnectionFailed)?;
            }

            db.use_ns(namespace.as_str())
                .use_db(database.as_str())
                .await
                .map_err(DatabaseError::ConnectionFailed)?;
            db
        }
    };

    let migration_start = std::time::Instant::now();
    MigrationRunner::run(&db).await?;
    tracing::debug!("Migrations completed in {:?}", migration_start.elapsed());

    Ok(db)
}

/// Cheap round trip used by health checks
pub async fn ping(db: &Db) -> Result<()> {
    db.query("RETURN true")
        .await
        .map_err(DatabaseError::QueryFailed)?
        .check()
        .map_err(DatabaseError::QueryFailed)?;
    Ok(())
}
