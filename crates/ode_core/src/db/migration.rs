//! Schema versioning

use super::{DatabaseError, Db, Result};
use crate::db::schema::Schema;

/// Highest schema version this build knows how to create
pub const SCHEMA_VERSION: u32 = 1;

/// Database migration runner
pub struct MigrationRunner;

impl MigrationRunner {
    /// Run all migrations
    pub async fn run(db: &Db) -> Result<()> {
        let current_version = Self::get_schema_version(db).await?;

        if current_version > SCHEMA_VERSION {
            return Err(DatabaseError::SchemaVersionMismatch {
                db_version: current_version,
                code_version: SCHEMA_VERSION,
            });
        }

        if current_version < 1 {
            tracing::info!("Running migration v1: Initial schema");
            Self::migrate_v1(db).await?;
            Self::update_schema_version(db, 1).await?;
        }

        Ok(())
    }

    /// Migration v1: Initial schema
    async fn migrate_v1(db: &Db) -> Result<()> {
        for table in Schema::tables() {
            tracing::debug!("Defining table {}", table.name);
            db.query(&table.schema)
                .await
                .map_err(DatabaseError::QueryFailed)?
                .check()
                .map_err(DatabaseError::QueryFailed)?;

            for index in &table.indexes {
                db.query(index)
                    .await
                    .map_err(DatabaseError::QueryFailed)?
                    .check()
                    .map_err(DatabaseError::QueryFailed)?;
            }
        }

        Ok(())
    }

    /// Get schema version, 0 for an empty database
    pub async fn get_schema_version(db: &Db) -> Result<u32> {
        let mut result = db
            .query("SELECT schema_version FROM system_metadata LIMIT 1")
            .await
            .map_err(DatabaseError::QueryFailed)?;

        #[derive(serde::Deserialize)]
        struct SchemaVersion {
            schema_version: u32,
        }

        // The table does not exist yet on a fresh database
        let versions: Vec<SchemaVersion> = result.take(0).unwrap_or_default();

        Ok(versions.first().map(|v| v.schema_version).unwrap_or(0))
    }

    /// Update schema version
    async fn update_schema_version(db: &Db, version: u32) -> Result<()> {
        let updated: Vec<serde_json::Value> = db
            .query("UPDATE system_metadata SET schema_version = $version, updated_at = time::now()")
            .bind(("version", version))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        if updated.is_empty() {
            db.query("CREATE system_metadata SET schema_version = $version, created_at = time::now(), updated_at = time::now()")
                .bind(("version", version))
                .await
                .map_err(DatabaseError::QueryFailed)?
                .check()
                .map_err(DatabaseError::QueryFailed)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::client;

    #[tokio::test]
    async fn test_migration_runner() {
        let db = client::create_test_db().await.unwrap();

        let version = MigrationRunner::get_schema_version(&db).await.unwrap();
        assert_eq!(version, SCHEMA_VERSION);

        // Running migrations again should be idempotent
        MigrationRunner::run(&db).await.unwrap();
        let version = MigrationRunner::get_schema_version(&db).await.unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_newer_database_is_rejected() {
        let db = client::create_test_db().await.unwrap();
        db.query("UPDATE system_metadata SET schema_version = 99")
            .await
            .unwrap();

        let err = MigrationRunner::run(&db).await.unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::SchemaVersionMismatch { db_version: 99, .. }
        ));
    }
}
