//! Database operations - direct SurrealQL behind the store traits
//!
//! Each submodule implements one store trait for [`Db`]. Writes use
//! `type::thing(table, $id)` with integer ids drawn from [`next_id`], and
//! reads go through the `Db*` wrappers in [`super::models`].

use surrealdb::Response;

use super::models::CountRow;
use super::schema::{COUNTER_TABLE, Schema};
use super::{DatabaseError, Db, Result, is_transaction_conflict};

pub mod author;
pub mod content;
pub mod engagement;

/// Attempts made before a transaction conflict is reported as a failure
const WRITE_RETRIES: u64 = 16;

#[derive(serde::Deserialize)]
struct CounterRow {
    last_id: i64,
}

async fn bump_counter(db: &Db, table: &str) -> std::result::Result<Option<i64>, surrealdb::Error> {
    let rows: Vec<CounterRow> = db
        .query(format!(
            "UPSERT type::thing('{}', $table) SET last_id = (last_id OR 0) + 1 RETURN last_id",
            COUNTER_TABLE
        ))
        .bind(("table", table.to_string()))
        .await?
        .take(0)?;

    Ok(rows.first().map(|row| row.last_id))
}

/// Allocate the next integer id for `table`
///
/// Concurrent allocations on the same counter can abort with a retryable
/// transaction conflict, so the upsert is attempted a few times.
pub async fn next_id(db: &Db, table: &str) -> Result<i64> {
    let mut last_error = None;

    for attempt in 1..=WRITE_RETRIES {
        match bump_counter(db, table).await {
            Ok(Some(id)) => return Ok(id),
            Ok(None) => {
                return Err(DatabaseError::Other(format!(
                    "Counter for {} returned no value",
                    table
                )));
            }
            Err(e) if is_transaction_conflict(&e) => {
                tracing::debug!("Retrying id allocation for {} (attempt {})", table, attempt);
                last_error = Some(e);
                tokio::time::sleep(std::time::Duration::from_millis(attempt * 2)).await;
            }
            Err(e) => return Err(DatabaseError::QueryFailed(e)),
        }
    }

    match last_error {
        Some(e) => Err(DatabaseError::QueryFailed(e)),
        None => Err(DatabaseError::Other(format!(
            "Could not allocate an id for {}",
            table
        ))),
    }
}

/// Run `op` again while it fails with a retryable transaction conflict
///
/// Whatever the final attempt returns is passed through, so a write that
/// loses a race and then finds the record already there reports `Conflict`.
pub(crate) async fn retry_conflicts<T, F, Fut>(what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(e) if e.is_retryable() && attempt < WRITE_RETRIES => {
                tracing::debug!("Retrying {} after a transaction conflict (attempt {})", what, attempt);
                tokio::time::sleep(std::time::Duration::from_millis(attempt * 2)).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

/// Surface statement errors of a write, preferring a uniqueness violation
///
/// Inside a failed transaction every statement reports an error, but only
/// one of them carries the real cause.
pub(crate) fn check_write(mut response: Response, entity: impl Into<String>) -> Result<Response> {
    let mut errors: Vec<(usize, surrealdb::Error)> = response.take_errors().into_iter().collect();
    if errors.is_empty() {
        return Ok(response);
    }
    errors.sort_by_key(|(index, _)| *index);

    let entity = entity.into();
    if let Some(pos) = errors.iter().position(|(_, e)| {
        let message = e.to_string();
        message.contains("already exists") || message.contains("already contains")
    }) {
        let (_, e) = errors.swap_remove(pos);
        return Err(DatabaseError::from_write(e, entity));
    }

    let (_, e) = errors.swap_remove(0);
    Err(DatabaseError::QueryFailed(e))
}

/// Read the `total` of a `count() ... GROUP ALL` statement; no rows means zero
pub(crate) fn total(rows: Vec<CountRow>) -> u64 {
    rows.first().map(|row| row.total).unwrap_or(0)
}

/// Row counts for every content-bearing table
pub async fn table_counts(db: &Db) -> Result<Vec<(String, u64)>> {
    let mut counts = Vec::new();

    for table in Schema::tables() {
        if table.name == "system_metadata" || table.name == COUNTER_TABLE {
            continue;
        }

        let rows: Vec<CountRow> = db
            .query("SELECT count() AS total FROM type::table($table) GROUP ALL")
            .bind(("table", table.name.clone()))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        counts.push((table.name, total(rows)));
    }

    Ok(counts)
}
