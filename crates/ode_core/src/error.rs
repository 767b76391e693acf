use miette::Diagnostic;
use thiserror::Error;

use crate::db::DatabaseError;
use crate::engagement::ContentKind;
use crate::id::IdError;

#[derive(Error, Diagnostic, Debug)]
pub enum CoreError {
    #[error("Author not found: {username}")]
    #[diagnostic(
        code(ode_core::author_not_found),
        help("Check the username, or create the author with `ode-cli author create`")
    )]
    AuthorNotFound { username: String },

    #[error("{kind} not found: {key}")]
    #[diagnostic(
        code(ode_core::content_not_found),
        help("The {kind} may be a draft or may have been deleted")
    )]
    ContentNotFound { kind: ContentKind, key: String },

    #[error("Author '{username}' may not {action}")]
    #[diagnostic(
        code(ode_core::forbidden),
        help("Only the owner of a piece of content may modify it")
    )]
    Forbidden { username: String, action: String },

    #[error("Invalid {field}: {message}")]
    #[diagnostic(code(ode_core::validation_failed))]
    Validation { field: String, message: String },

    #[error("A {kind} with slug '{slug}' already exists")]
    #[diagnostic(
        code(ode_core::duplicate_slug),
        help("Slugs are derived from titles, so pick a different title")
    )]
    DuplicateSlug { kind: ContentKind, slug: String },

    #[error("Username '{username}' is already taken")]
    #[diagnostic(code(ode_core::duplicate_username))]
    DuplicateUsername { username: String },

    #[error("Invalid identifier")]
    #[diagnostic(code(ode_core::invalid_id))]
    InvalidId(#[from] IdError),

    #[error("Database operation failed")]
    #[diagnostic(code(ode_core::database_error))]
    Database(#[from] DatabaseError),

    #[error("Configuration error in {config_path}")]
    #[diagnostic(
        code(ode_core::configuration_error),
        help("Check configuration file at {config_path}: {field} should be a {expected}")
    )]
    ConfigurationError {
        config_path: String,
        field: String,
        expected: String,
        #[source]
        cause: ConfigError,
    },
}

/// Low-level causes behind [`CoreError::ConfigurationError`]
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(String),
}

impl CoreError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn content_not_found(kind: ContentKind, key: impl ToString) -> Self {
        Self::ContentNotFound {
            kind,
            key: key.to_string(),
        }
    }

    /// True for any error that means "the thing asked for is not there"
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::AuthorNotFound { .. }
                | Self::ContentNotFound { .. }
                | Self::Database(DatabaseError::NotFound { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
