//! Engagement persistence
//!
//! One record per `(author, kind, content_kind, content_id)`, with the tuple
//! itself as the record key so a duplicate `CREATE` collides.

use surrealdb::RecordId;

use super::{check_write, retry_conflicts, total};
use crate::db::models::CountRow;
use crate::db::schema::ENGAGEMENT_TABLE;
use crate::db::{DatabaseError, Db, Result};
use crate::engagement::{ContentKind, ContentRef, EngagementKind, EngagementStore};
use crate::id::{AuthorId, AuthorIdType, IdType};

fn label(author: AuthorId, content: ContentRef, kind: EngagementKind) -> String {
    format!(
        "engagement {} on {} by {:?}",
        kind.as_str(),
        content,
        author
    )
}

fn thing() -> String {
    format!(
        "type::thing('{}', [$author, $kind, $content_kind, $content_id])",
        ENGAGEMENT_TABLE
    )
}

async fn select_engagement(
    db: &Db,
    author: AuthorId,
    content: ContentRef,
    kind: EngagementKind,
) -> Result<bool> {
    let ids: Vec<RecordId> = db
        .query(format!("SELECT VALUE id FROM {}", thing()))
        .bind(("author", author.value()))
        .bind(("kind", kind.as_str()))
        .bind(("content_kind", content.kind.as_str()))
        .bind(("content_id", content.id))
        .await
        .map_err(DatabaseError::QueryFailed)?
        .take(0)
        .map_err(DatabaseError::QueryFailed)?;

    Ok(!ids.is_empty())
}

async fn create_engagement(
    db: &Db,
    author: AuthorId,
    content: ContentRef,
    kind: EngagementKind,
) -> Result<()> {
    let response = db
        .query(format!(
            "CREATE {} SET
                author = type::thing('{}', $author),
                kind = $kind,
                content_kind = $content_kind,
                content_id = $content_id,
                created_at = time::now()
             RETURN NONE",
            thing(),
            AuthorIdType::PREFIX
        ))
        .bind(("author", author.value()))
        .bind(("kind", kind.as_str()))
        .bind(("content_kind", content.kind.as_str()))
        .bind(("content_id", content.id))
        .await
        .map_err(DatabaseError::QueryFailed)?;

    check_write(response, label(author, content, kind))?;
    Ok(())
}

async fn delete_engagement(
    db: &Db,
    author: AuthorId,
    content: ContentRef,
    kind: EngagementKind,
) -> Result<()> {
    let removed: Vec<RecordId> = db
        .query(format!("DELETE {} RETURN BEFORE", thing()))
        .bind(("author", author.value()))
        .bind(("kind", kind.as_str()))
        .bind(("content_kind", content.kind.as_str()))
        .bind(("content_id", content.id))
        .await
        .map_err(DatabaseError::QueryFailed)?
        .take((0, "id"))
        .map_err(DatabaseError::QueryFailed)?;

    if removed.is_empty() {
        return Err(DatabaseError::NotFound {
            entity: label(author, content, kind),
        });
    }
    Ok(())
}

async fn count_engagements(db: &Db, content: ContentRef, kind: EngagementKind) -> Result<u64> {
    let counts: Vec<CountRow> = db
        .query(format!(
            "SELECT count() AS total FROM {}
             WHERE content_kind = $content_kind AND content_id = $content_id AND kind = $kind
             GROUP ALL",
            ENGAGEMENT_TABLE
        ))
        .bind(("kind", kind.as_str()))
        .bind(("content_kind", content.kind.as_str()))
        .bind(("content_id", content.id))
        .await
        .map_err(DatabaseError::QueryFailed)?
        .take(0)
        .map_err(DatabaseError::QueryFailed)?;

    Ok(total(counts))
}

// Concurrent toggles on one item collide inside the engine; a lost race is
// retried, after which the record key decides between success, Conflict and
// NotFound.
impl EngagementStore for Db {
    async fn exists(&self, author: AuthorId, content: ContentRef, kind: EngagementKind) -> Result<bool> {
        retry_conflicts("engagement lookup", || {
            select_engagement(self, author, content, kind)
        })
        .await
    }

    async fn add(&self, author: AuthorId, content: ContentRef, kind: EngagementKind) -> Result<()> {
        retry_conflicts("engagement insert", || {
            create_engagement(self, author, content, kind)
        })
        .await
    }

    async fn remove(&self, author: AuthorId, content: ContentRef, kind: EngagementKind) -> Result<()> {
        retry_conflicts("engagement delete", || {
            delete_engagement(self, author, content, kind)
        })
        .await
    }

    async fn count_for(&self, content: ContentRef, kind: EngagementKind) -> Result<u64> {
        retry_conflicts("engagement count", || count_engagements(self, content, kind)).await
    }

    async fn content_ids_for(
        &self,
        author: AuthorId,
        content_kind: ContentKind,
        kind: EngagementKind,
    ) -> Result<Vec<i64>> {
        let mut ids: Vec<i64> = self
            .query(format!(
                "SELECT VALUE content_id FROM {}
                 WHERE author = type::thing('{}', $author) AND kind = $kind AND content_kind = $content_kind",
                ENGAGEMENT_TABLE,
                AuthorIdType::PREFIX
            ))
            .bind(("author", author.value()))
            .bind(("kind", kind.as_str()))
            .bind(("content_kind", content_kind.as_str()))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        ids.sort_unstable();
        Ok(ids)
    }
}
