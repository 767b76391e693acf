//! Likes, bookmarks and the toggle that flips them
//!
//! An engagement is the presence of an (author, content item, kind) record.
//! Toggling looks the record up and either creates or deletes it; the store
//! guarantees there is never more than one record per tuple, and the
//! controller folds the two possible races back into ordinary outcomes:
//!
//! - a concurrent toggle created the record first: `add` fails with
//!   [`DatabaseError::Conflict`] and the author is engaged anyway (`+1`)
//! - a concurrent toggle deleted it first: `remove` fails with
//!   [`DatabaseError::NotFound`] and the author is disengaged anyway (`-1`)

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::author::AuthorStore;
use crate::content::ContentStore;
use crate::db::{self, DatabaseError};
use crate::id::{AuthorId, PostId, SeriesId, TutorialId};
use crate::identity::{Credentials, IdentityError, resolve_identity};

/// What kind of engagement a record represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementKind {
    Like,
    Bookmark,
}

impl EngagementKind {
    pub const ALL: [EngagementKind; 2] = [EngagementKind::Like, EngagementKind::Bookmark];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementKind::Like => "like",
            EngagementKind::Bookmark => "bookmark",
        }
    }
}

impl fmt::Display for EngagementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kinds of content an engagement can point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Post,
    Tutorial,
    Series,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [ContentKind::Post, ContentKind::Tutorial, ContentKind::Series];

    /// Also the SurrealDB table name
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Post => "post",
            ContentKind::Tutorial => "tutorial",
            ContentKind::Series => "series",
        }
    }

    /// Capitalised form for user-facing messages
    pub fn title(&self) -> &'static str {
        match self {
            ContentKind::Post => "Post",
            ContentKind::Tutorial => "Tutorial",
            ContentKind::Series => "Series",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(ContentKind::Post),
            "tutorial" => Ok(ContentKind::Tutorial),
            "series" => Ok(ContentKind::Series),
            other => Err(format!("unknown content kind '{}'", other)),
        }
    }
}

/// A polymorphic pointer at a post, tutorial or series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentRef {
    pub kind: ContentKind,
    pub id: i64,
}

impl ContentRef {
    pub fn new(kind: ContentKind, id: i64) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl From<PostId> for ContentRef {
    fn from(id: PostId) -> Self {
        Self::new(ContentKind::Post, id.value())
    }
}

impl From<TutorialId> for ContentRef {
    fn from(id: TutorialId) -> Self {
        Self::new(ContentKind::Tutorial, id.value())
    }
}

impl From<SeriesId> for ContentRef {
    fn from(id: SeriesId) -> Self {
        Self::new(ContentKind::Series, id.value())
    }
}

/// The result of a toggle, reported to clients as `1` or `-1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Engaged,
    Disengaged,
}

impl ToggleAction {
    pub fn value(&self) -> i8 {
        match self {
            ToggleAction::Engaged => 1,
            ToggleAction::Disengaged => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub action: ToggleAction,
    /// Engagements of this kind on the item after the toggle
    pub count: u64,
}

/// Persistent (author, content, kind) associations
pub trait EngagementStore {
    fn exists(
        &self,
        author: AuthorId,
        content: ContentRef,
        kind: EngagementKind,
    ) -> impl Future<Output = db::Result<bool>> + Send;

    /// Fails with [`DatabaseError::Conflict`] if the record is already present
    fn add(
        &self,
        author: AuthorId,
        content: ContentRef,
        kind: EngagementKind,
    ) -> impl Future<Output = db::Result<()>> + Send;

    /// Fails with [`DatabaseError::NotFound`] if there is nothing to remove
    fn remove(
        &self,
        author: AuthorId,
        content: ContentRef,
        kind: EngagementKind,
    ) -> impl Future<Output = db::Result<()>> + Send;

    fn count_for(
        &self,
        content: ContentRef,
        kind: EngagementKind,
    ) -> impl Future<Output = db::Result<u64>> + Send;

    /// Ids of every item of `content_kind` the author has engaged with, ascending
    fn content_ids_for(
        &self,
        author: AuthorId,
        content_kind: ContentKind,
        kind: EngagementKind,
    ) -> impl Future<Output = db::Result<Vec<i64>>> + Send;
}

/// Flip one author's engagement with one item
pub async fn toggle_engagement<S: EngagementStore>(
    store: &S,
    author: AuthorId,
    content: ContentRef,
    kind: EngagementKind,
) -> db::Result<ToggleOutcome> {
    let action = if store.exists(author, content, kind).await? {
        match store.remove(author, content, kind).await {
            Ok(()) => ToggleAction::Disengaged,
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    "{} on {} by {:?} was already removed by a concurrent toggle",
                    kind,
                    content,
                    author
                );
                ToggleAction::Disengaged
            }
            Err(e) => return Err(e),
        }
    } else {
        match store.add(author, content, kind).await {
            Ok(()) => ToggleAction::Engaged,
            Err(e) if e.is_conflict() => {
                tracing::warn!(
                    "{} on {} by {:?} was already created by a concurrent toggle",
                    kind,
                    content,
                    author
                );
                ToggleAction::Engaged
            }
            Err(e) => return Err(e),
        }
    };

    let count = store.count_for(content, kind).await?;
    tracing::debug!(
        "{:?} toggled {} on {}: {:?} (count {})",
        author,
        kind,
        content,
        action,
        count
    );

    Ok(ToggleOutcome { action, count })
}

/// A toggle as it arrives from a client: nothing has been validated yet
#[derive(Debug, Clone)]
pub struct ToggleRequest {
    pub credentials: Credentials,
    pub item_id: Option<String>,
    pub content_kind: ContentKind,
    pub kind: EngagementKind,
}

#[derive(Error, Diagnostic, Debug)]
pub enum ToggleError {
    #[error("No credentials supplied")]
    #[diagnostic(code(ode_core::toggle::unauthenticated))]
    Unauthenticated,

    #[error("{} id not provided", .0.title())]
    #[diagnostic(code(ode_core::toggle::missing_item_id))]
    MissingItemId(ContentKind),

    /// The token matched nobody, or the id named no item
    #[error("Invalid auth token provided or {0} does not exist")]
    #[diagnostic(code(ode_core::toggle::invalid_target))]
    InvalidTokenOrMissingItem(ContentKind),

    #[error("Engagement storage failed")]
    #[diagnostic(code(ode_core::toggle::storage))]
    Storage(#[from] DatabaseError),
}

/// Authenticate, validate the target item and flip the engagement
pub async fn toggle<S>(store: &S, request: ToggleRequest) -> Result<ToggleOutcome, ToggleError>
where
    S: AuthorStore + ContentStore + EngagementStore,
{
    let ToggleRequest {
        credentials,
        item_id,
        content_kind,
        kind,
    } = request;

    if credentials.is_empty() {
        return Err(ToggleError::Unauthenticated);
    }

    let item_id = item_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ToggleError::MissingItemId(content_kind))?;

    let author = match resolve_identity(store, &credentials).await {
        Ok(author) => author,
        Err(IdentityError::Unauthenticated) => return Err(ToggleError::Unauthenticated),
        Err(IdentityError::InvalidToken) => {
            return Err(ToggleError::InvalidTokenOrMissingItem(content_kind));
        }
        Err(IdentityError::Database(e)) => return Err(ToggleError::Storage(e)),
    };

    let id: i64 = match item_id.parse() {
        Ok(id) if id > 0 => id,
        _ => return Err(ToggleError::InvalidTokenOrMissingItem(content_kind)),
    };
    let content = ContentRef::new(content_kind, id);

    if !store.content_exists(content).await? {
        return Err(ToggleError::InvalidTokenOrMissingItem(content_kind));
    }

    Ok(toggle_engagement(store, author.id, content, kind).await?)
}
