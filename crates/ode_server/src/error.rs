//! Server error types

use axum::response::{IntoResponse, Response};
use ode_api::ApiError;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ServerError {
    #[error("Database error: {0}")]
    #[diagnostic(code(ode_server::database))]
    Database(#[from] ode_core::db::DatabaseError),

    #[error("Core error: {0}")]
    #[diagnostic(code(ode_server::core))]
    Core(#[from] ode_core::error::CoreError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Password hashing error: {0}")]
    #[diagnostic(code(ode_server::password_hash))]
    PasswordHash(String),

    #[error("Invalid address: {0}")]
    #[diagnostic(help("bind_address must look like 127.0.0.1:8000"))]
    AddrParse(#[from] std::net::AddrParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(ode_server::config), help("Check ode-server.toml and the ODE_* variables"))]
    Config(String),
}

impl From<argon2::password_hash::Error> for ServerError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::PasswordHash(err.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        // Convert to ApiError for consistent error responses
        let api_error = match self {
            ServerError::Database(e) => ApiError::from(e),
            ServerError::Core(e) => ApiError::from(e),
            ServerError::Api(e) => e,
            other => ApiError::internal(other),
        };

        api_error.into_response()
    }
}
