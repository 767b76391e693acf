//! Ode API types and definitions
//!
//! This crate defines the request/response types for the Ode HTTP API,
//! shared between the server and anything that talks to it.

pub mod error;
pub mod requests;
pub mod responses;

pub use error::ApiError;

// Re-export common types from ode-core
pub use ode_core::id::{AuthorId, PostId, SeriesId, TutorialId};
pub use ode_core::pagination::Page;

/// API version constant
pub const API_VERSION: &str = "v1";

/// Every listing renders as `{"count": total, "results": [...]}`
pub type ListResponse<T> = Page<T>;
