//! Authentication utilities

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use ode_api::ApiError;
use ode_core::author::{Author, AuthorStore, Token};
use ode_core::db::{DatabaseError, Db};
use ode_core::identity::{Credentials, resolve_identity};

use crate::error::ServerResult;
use crate::middleware::SessionToken;

/// Hash a plaintext password
pub fn hash_password(password: &str) -> ServerResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> ServerResult<bool> {
    let parsed_hash = PasswordHash::new(hash)?;
    let argon2 = Argon2::default();

    Ok(argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Combine a form `token` field with the request's session header
pub fn credentials(form_token: Option<String>, session: SessionToken) -> Credentials {
    Credentials::new(form_token, session.0)
}

/// Resolve credentials to an author, as an API error on failure
pub async fn authenticate(db: &Db, credentials: &Credentials) -> Result<Author, ApiError> {
    Ok(resolve_identity(db, credentials).await?)
}

/// Check a username/password pair and hand back the author's token
pub async fn login(db: &Db, username: &str, password: &str) -> Result<(Author, Token), ApiError> {
    let invalid = || ApiError::unauthorized("Invalid credentials.");

    let author = db
        .get_author_by_username(username)
        .await?
        .ok_or_else(invalid)?;

    // An unreadable stored hash is treated like a wrong password
    let matches = verify_password(password, &author.password_hash).unwrap_or_else(|e| {
        tracing::warn!("Stored password hash for {} is unusable: {}", author.username, e);
        false
    });
    if !matches {
        return Err(invalid());
    }

    let token = db.token_for_author(author.id).await?.ok_or_else(|| {
        ApiError::from(DatabaseError::Other(format!(
            "Author {} has no token",
            author.username
        )))
    })?;

    tracing::debug!("{} logged in", author.username);
    Ok((author, token))
}
