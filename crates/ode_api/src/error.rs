//! API error types

use miette::{Diagnostic, JSONReportHandler};
use serde::{Deserialize, Serialize};

use ode_core::db::DatabaseError;
use ode_core::engagement::ToggleError;
use ode_core::error::CoreError;
use ode_core::identity::IdentityError;

/// Message returned when a request carries no credential at all
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized to view response.";

/// API error response
///
/// Every variant renders as `{"error": message}` except
/// [`ApiError::MethodNotAllowed`], which renders as `{"detail": message}`.
#[derive(Debug, thiserror::Error, Diagnostic, Serialize, Deserialize)]
pub enum ApiError {
    /// Missing or unrecognised credentials
    #[error("{message}")]
    #[diagnostic(
        code(api::unauthorized),
        help("Send a `token` form field or an `Authorization: Token <key>` header")
    )]
    Unauthorized { message: String },

    /// A required request parameter was absent
    #[error("{message}")]
    #[diagnostic(code(api::missing_parameter))]
    MissingParameter { message: String },

    /// Authenticated, but not allowed to do this
    #[error("{message}")]
    #[diagnostic(code(api::forbidden))]
    Forbidden { message: String },

    #[error("{message}")]
    #[diagnostic(code(api::not_found))]
    NotFound { message: String },

    /// Request validation failed
    #[error("{message}")]
    #[diagnostic(
        code(api::validation_error),
        help("Check the value supplied for the named field")
    )]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Conflict with an existing resource
    #[error("{message}")]
    #[diagnostic(
        code(api::conflict),
        help("The resource already exists or is in a conflicting state")
    )]
    Conflict { message: String },

    /// Anything the client could not have caused
    #[error("{message}")]
    #[diagnostic(code(api::internal_error))]
    Internal { message: String, json: String },

    #[error("{detail}")]
    #[diagnostic(code(api::method_not_allowed))]
    MethodNotAllowed { detail: String },
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Unauthorized { .. } => 401,
            ApiError::MissingParameter { .. } => 401,
            ApiError::Forbidden { .. } => 403,
            ApiError::NotFound { .. } => 404,
            ApiError::MethodNotAllowed { .. } => 405,
            ApiError::Conflict { .. } => 409,
            ApiError::Validation { .. } => 422,
            ApiError::Internal { .. } => 500,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// The request carried no credential
    pub fn no_credentials() -> Self {
        Self::unauthorized(UNAUTHORIZED_MESSAGE)
    }

    pub fn missing_parameter(message: impl Into<String>) -> Self {
        Self::MissingParameter {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn method_not_allowed(detail: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            detail: detail.into(),
        }
    }

    /// A 500 carrying the miette JSON report of `err`
    pub fn internal<E: Diagnostic + Send + Sync + 'static>(err: E) -> Self {
        let handler = JSONReportHandler::new();

        let message = format!("{}", err);
        let mut json = String::new();

        let err: Box<dyn Diagnostic> = Box::new(err);
        handler
            .render_report(&mut json, err.as_ref())
            .unwrap_or_default();

        Self::Internal { message, json }
    }
}

// Conversion implementations
impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Conflict { .. } => Self::Conflict {
                message: err.to_string(),
            },
            DatabaseError::NotFound { .. } => Self::not_found(err.to_string()),
            err => Self::internal(err),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthorNotFound { .. } | CoreError::ContentNotFound { .. } => {
                Self::not_found(err.to_string())
            }
            CoreError::Forbidden { .. } => Self::Forbidden {
                message: err.to_string(),
            },
            CoreError::Validation { ref field, .. } => Self::Validation {
                field: Some(field.clone()),
                message: err.to_string(),
            },
            CoreError::InvalidId(ref id) => Self::Validation {
                field: None,
                message: id.to_string(),
            },
            CoreError::DuplicateSlug { .. } | CoreError::DuplicateUsername { .. } => {
                Self::Conflict {
                    message: err.to_string(),
                }
            }
            CoreError::Database(db) => db.into(),
            err @ CoreError::ConfigurationError { .. } => Self::internal(err),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Unauthenticated => Self::no_credentials(),
            IdentityError::InvalidToken => Self::unauthorized("Invalid auth token provided."),
            IdentityError::Database(db) => db.into(),
        }
    }
}

/// Toggle failures keep the exact wording clients already match on
impl From<ToggleError> for ApiError {
    fn from(err: ToggleError) -> Self {
        match err {
            ToggleError::Unauthenticated => Self::no_credentials(),
            ToggleError::MissingItemId(_) => Self::missing_parameter(format!("{}.", err)),
            ToggleError::InvalidTokenOrMissingItem(_) => Self::unauthorized(format!("{}.", err)),
            ToggleError::Storage(db) => Self::internal(db),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        let diagnostic = miette::miette!(
            code = "json::serialize_error",
            help = "A response could not be encoded",
            "{}",
            err
        );

        let handler = JSONReportHandler::new();
        let message = err.to_string();
        let mut json = String::new();

        handler
            .render_report(&mut json, diagnostic.as_ref())
            .unwrap_or_default();

        Self::Internal { message, json }
    }
}

impl From<uuid::Error> for ApiError {
    fn from(err: uuid::Error) -> Self {
        Self::not_found(format!("Unknown key: {}", err))
    }
}

// Server-side response conversion
#[cfg(feature = "server")]
impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = match &self {
            ApiError::MethodNotAllowed { detail } => serde_json::json!({ "detail": detail }),
            other => serde_json::json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
