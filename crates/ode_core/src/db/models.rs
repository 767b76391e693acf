//! Database model wrappers
//!
//! These types mirror the domain types but use RecordId and SurrealDB's
//! datetime for database operations. Reads deserialize into them and are then
//! converted with `TryFrom`, which is where record keys become typed ids.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use surrealdb::RecordId;
use uuid::Uuid;

use super::DatabaseError;
use crate::author::{Author, Token};
use crate::content::{Post, Series, SeriesType, Tutorial};
use crate::id::{AuthorId, Id, IdType, PostId, SeriesId, TutorialId};

/// Database representation of an Author
#[derive(Debug, Clone, Deserialize)]
pub struct DbAuthor {
    pub id: RecordId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub bio: String,
    pub authenticated: bool,
    pub secret_key: String,
    pub date_joined: surrealdb::Datetime,
}

/// Database representation of a Token
#[derive(Debug, Clone, Deserialize)]
pub struct DbToken {
    pub key: String,
    pub author: RecordId,
    pub created: surrealdb::Datetime,
}

/// Database representation of a Post, with the author's username joined in
#[derive(Debug, Clone, Deserialize)]
pub struct DbPost {
    pub id: RecordId,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub description: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    pub draft: bool,
    pub uuid: String,
    pub timestamp: surrealdb::Datetime,
    pub author: RecordId,
    #[serde(default)]
    pub author_username: Option<String>,
}

/// Database representation of a Tutorial
#[derive(Debug, Clone, Deserialize)]
pub struct DbTutorial {
    pub id: RecordId,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub description: String,
    pub draft: bool,
    pub number: i64,
    pub uuid: String,
    pub timestamp: surrealdb::Datetime,
    #[serde(default)]
    pub series: Option<RecordId>,
    #[serde(default)]
    pub series_name: Option<String>,
    pub author: RecordId,
    #[serde(default)]
    pub author_username: Option<String>,
}

/// Database representation of a Series
#[derive(Debug, Clone, Deserialize)]
pub struct DbSeries {
    pub id: RecordId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub type_of: SeriesType,
    pub timestamp: surrealdb::Datetime,
    pub creator: RecordId,
    #[serde(default)]
    pub creator_username: Option<String>,
    #[serde(default)]
    pub tutorial_count: u64,
}

/// Result row of `SELECT count() AS total ... GROUP ALL`
#[derive(Debug, Clone, Deserialize)]
pub struct CountRow {
    pub total: u64,
}

pub fn strip_brackets(s: &str) -> &str {
    s.strip_prefix('⟨')
        .and_then(|s| s.strip_suffix('⟩'))
        .unwrap_or(s)
}

pub fn strip_dt(s: &str) -> &str {
    s.strip_prefix("d'")
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(s)
}

pub fn from_surreal_datetime(dt: &surrealdb::Datetime) -> Result<DateTime<Utc>, DatabaseError> {
    let raw = dt.to_string();
    DateTime::parse_from_rfc3339(strip_dt(&raw))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Other(format!("Invalid datetime {}: {}", raw, e)))
}

fn id_from<T: IdType>(record: &RecordId) -> Result<Id<T>, DatabaseError> {
    Id::from_record(record).map_err(|e| DatabaseError::Other(e.to_string()))
}

fn uuid_from(raw: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(raw).map_err(|e| DatabaseError::Other(format!("Invalid uuid {}: {}", raw, e)))
}

impl TryFrom<DbAuthor> for Author {
    type Error = DatabaseError;

    fn try_from(db: DbAuthor) -> Result<Self, Self::Error> {
        Ok(Self {
            id: id_from(&db.id)?,
            username: db.username,
            first_name: db.first_name,
            last_name: db.last_name,
            email: db.email,
            password_hash: db.password_hash,
            is_staff: db.is_staff,
            bio: db.bio,
            authenticated: db.authenticated,
            secret_key: uuid_from(&db.secret_key)?,
            date_joined: from_surreal_datetime(&db.date_joined)?,
        })
    }
}

impl TryFrom<DbToken> for Token {
    type Error = DatabaseError;

    fn try_from(db: DbToken) -> Result<Self, Self::Error> {
        Ok(Self {
            key: db.key,
            author_id: id_from(&db.author)?,
            created: from_surreal_datetime(&db.created)?,
        })
    }
}

impl TryFrom<DbPost> for Post {
    type Error = DatabaseError;

    fn try_from(db: DbPost) -> Result<Self, Self::Error> {
        let id: PostId = id_from(&db.id)?;
        let author_id: AuthorId = id_from(&db.author)?;
        Ok(Self {
            id,
            title: db.title,
            slug: db.slug,
            body: db.body,
            description: db.description,
            thumbnail: db.thumbnail,
            draft: db.draft,
            uuid: uuid_from(&db.uuid)?,
            timestamp: from_surreal_datetime(&db.timestamp)?,
            author_id,
            author_username: db.author_username.unwrap_or_default(),
        })
    }
}

impl TryFrom<DbTutorial> for Tutorial {
    type Error = DatabaseError;

    fn try_from(db: DbTutorial) -> Result<Self, Self::Error> {
        let id: TutorialId = id_from(&db.id)?;
        let series_id: Option<SeriesId> = db.series.as_ref().map(id_from).transpose()?;
        Ok(Self {
            id,
            title: db.title,
            slug: db.slug,
            content: db.content,
            description: db.description,
            draft: db.draft,
            number: db.number,
            uuid: uuid_from(&db.uuid)?,
            timestamp: from_surreal_datetime(&db.timestamp)?,
            series_id,
            series_name: db.series_name,
            author_id: id_from(&db.author)?,
            author_username: db.author_username.unwrap_or_default(),
        })
    }
}

impl TryFrom<DbSeries> for Series {
    type Error = DatabaseError;

    fn try_from(db: DbSeries) -> Result<Self, Self::Error> {
        Ok(Self {
            id: id_from(&db.id)?,
            name: db.name,
            slug: db.slug,
            description: db.description,
            type_of: db.type_of,
            timestamp: from_surreal_datetime(&db.timestamp)?,
            creator_id: id_from(&db.creator)?,
            creator_username: db.creator_username.unwrap_or_default(),
            tutorial_count: db.tutorial_count,
        })
    }
}

/// Convert a batch of rows, failing on the first bad one
pub fn convert_all<D, T>(rows: Vec<D>) -> Result<Vec<T>, DatabaseError>
where
    T: TryFrom<D, Error = DatabaseError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_helpers() {
        assert_eq!(strip_brackets("⟨abc⟩"), "abc");
        assert_eq!(strip_brackets("42"), "42");
        assert_eq!(strip_dt("d'2024-05-01T10:00:00Z'"), "2024-05-01T10:00:00Z");
    }

    #[test]
    fn test_datetime_conversion() {
        let now = chrono::Utc::now();
        let surreal: surrealdb::Datetime = now.into();
        let back = from_surreal_datetime(&surreal).unwrap();
        assert_eq!(back.timestamp(), now.timestamp());
    }
}
