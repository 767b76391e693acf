//! Resolving a request's credentials to an author
//!
//! A request may carry a bearer token in its form body (`token`) and/or an
//! `Authorization` header belonging to an already authenticated session.
//! The form token wins when both are present. Resolution is a pure lookup.

use miette::Diagnostic;
use thiserror::Error;

use crate::author::{Author, AuthorStore};
use crate::db::DatabaseError;

/// Whatever the client sent that might identify it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    token: Option<String>,
    session: Option<String>,
}

impl Credentials {
    /// Blank values count as absent
    pub fn new(token: Option<String>, session: Option<String>) -> Self {
        Self {
            token: non_blank(token),
            session: non_blank(session),
        }
    }

    pub fn token(token: impl Into<String>) -> Self {
        Self::new(Some(token.into()), None)
    }

    pub fn session(session: impl Into<String>) -> Self {
        Self::new(None, Some(session.into()))
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.session.is_none()
    }

    /// The key to look up: the form token first, then the session
    pub fn key(&self) -> Option<&str> {
        self.token.as_deref().or(self.session.as_deref())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Error, Diagnostic, Debug)]
pub enum IdentityError {
    #[error("No credentials supplied")]
    #[diagnostic(
        code(ode_core::identity::unauthenticated),
        help("Send a `token` form field or an `Authorization: Token <key>` header")
    )]
    Unauthenticated,

    #[error("Invalid auth token")]
    #[diagnostic(
        code(ode_core::identity::invalid_token),
        help("The token does not belong to any author")
    )]
    InvalidToken,

    #[error("Identity lookup failed")]
    #[diagnostic(code(ode_core::identity::database))]
    Database(#[from] DatabaseError),
}

/// Map credentials to the author they belong to
pub async fn resolve_identity<S: AuthorStore>(
    store: &S,
    credentials: &Credentials,
) -> Result<Author, IdentityError> {
    let key = credentials.key().ok_or(IdentityError::Unauthenticated)?;

    store
        .author_for_token(key)
        .await?
        .ok_or(IdentityError::InvalidToken)
}
