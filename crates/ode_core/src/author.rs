//! Authors and their bearer tokens

use std::future::Future;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db;
use crate::error::{CoreError, Result};
use crate::id::AuthorId;
use crate::pagination::{Page, PageRequest};

/// Length of a bearer token key
pub const TOKEN_LENGTH: usize = 40;

const USERNAME_MAX: usize = 150;
const BIO_MAX: usize = 260;

/// A registered author: account and profile in one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub is_staff: bool,
    pub bio: String,
    /// Set once the author has followed their promotion link
    pub authenticated: bool,
    /// Secret in the promotion link
    pub secret_key: Uuid,
    pub date_joined: DateTime<Utc>,
}

/// Everything needed to register an author; the password is already hashed
#[derive(Debug, Clone, Default)]
pub struct NewAuthor {
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
    pub bio: String,
}

impl NewAuthor {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(CoreError::validation("username", "may not be blank"));
        }
        if username.chars().count() > USERNAME_MAX {
            return Err(CoreError::validation(
                "username",
                format!("must be at most {} characters", USERNAME_MAX),
            ));
        }
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            return Err(CoreError::validation(
                "username",
                "may contain only letters, digits and @/./+/-/_",
            ));
        }
        if self.password_hash.is_empty() {
            return Err(CoreError::validation("password", "may not be blank"));
        }
        if self.bio.chars().count() > BIO_MAX {
            return Err(CoreError::validation(
                "bio",
                format!("must be at most {} characters", BIO_MAX),
            ));
        }
        Ok(())
    }
}

/// An opaque bearer token; every author has exactly one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub key: String,
    pub author_id: AuthorId,
    pub created: DateTime<Utc>,
}

/// A fresh 40 character hex token key
pub fn generate_token_key() -> String {
    let mut bytes = [0u8; TOKEN_LENGTH / 2];
    rand::thread_rng().fill(&mut bytes[..]);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Author persistence
pub trait AuthorStore {
    /// Insert the author and issue their token in one transaction
    fn create_author(
        &self,
        author: NewAuthor,
    ) -> impl Future<Output = db::Result<(Author, Token)>> + Send;

    fn get_author(&self, id: AuthorId) -> impl Future<Output = db::Result<Option<Author>>> + Send;

    fn get_author_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = db::Result<Option<Author>>> + Send;

    fn get_author_by_secret_key(
        &self,
        secret_key: Uuid,
    ) -> impl Future<Output = db::Result<Option<Author>>> + Send;

    fn author_for_token(
        &self,
        key: &str,
    ) -> impl Future<Output = db::Result<Option<Author>>> + Send;

    fn token_for_author(
        &self,
        id: AuthorId,
    ) -> impl Future<Output = db::Result<Option<Token>>> + Send;

    /// Mark the author authenticated; a no-op when already set
    fn promote_author(&self, id: AuthorId) -> impl Future<Output = db::Result<Author>> + Send;

    /// Authors newest first, or by ascending id with `oldest_first`
    fn list_authors(
        &self,
        page: PageRequest,
        oldest_first: bool,
    ) -> impl Future<Output = db::Result<Page<Author>>> + Send;
}

/// Validate and register an author, issuing their token
pub async fn register_author<S: AuthorStore>(
    store: &S,
    mut author: NewAuthor,
) -> Result<(Author, Token)> {
    author.username = author.username.trim().to_string();
    author.validate()?;

    let username = author.username.clone();
    match store.create_author(author).await {
        Ok((author, token)) => {
            tracing::info!("Registered author {} ({:?})", author.username, author.id);
            Ok((author, token))
        }
        Err(e) if e.is_conflict() => Err(CoreError::DuplicateUsername { username }),
        Err(e) => Err(e.into()),
    }
}

/// Follow a promotion link
pub async fn promote_by_secret_key<S: AuthorStore>(store: &S, secret_key: Uuid) -> Result<Author> {
    let author = store
        .get_author_by_secret_key(secret_key)
        .await?
        .ok_or_else(|| CoreError::AuthorNotFound {
            username: format!("secret key {}", secret_key),
        })?;

    if author.authenticated {
        return Ok(author);
    }

    let author = store.promote_author(author.id).await?;
    tracing::info!("Promoted author {}", author.username);
    Ok(author)
}

/// Look an author up by username, failing when absent
pub async fn require_author<S: AuthorStore>(store: &S, username: &str) -> Result<Author> {
    store
        .get_author_by_username(username)
        .await?
        .ok_or_else(|| CoreError::AuthorNotFound {
            username: username.to_string(),
        })
}
