//! Ode Core - domain model and persistence for the Ode publishing backend
//!
//! Authors publish posts, tutorials and series; other authors like tutorials
//! and bookmark series. This crate owns the types, the SurrealDB-backed
//! stores and the engagement toggle that the HTTP server and the CLI share.

pub mod author;
pub mod config;
pub mod content;
pub mod db;
pub mod engagement;
pub mod error;
pub mod id;
pub mod identity;
pub mod pagination;
pub mod slug;

pub use author::{Author, AuthorStore, NewAuthor, Token};
pub use config::OdeConfig;
pub use content::{
    ContentQuery, ContentStore, ListOrder, NewPost, NewSeries, NewTutorial, Post, Series,
    SeriesType, Tutorial,
};
pub use db::{DatabaseConfig, DatabaseError, Db};
pub use engagement::{
    ContentKind, ContentRef, EngagementKind, EngagementStore, ToggleAction, ToggleError,
    ToggleOutcome, ToggleRequest,
};
pub use error::{CoreError, Result};
pub use id::{AuthorId, Id, IdType, PostId, SeriesId, TutorialId};
pub use identity::{Credentials, IdentityError};
pub use pagination::{Page, PageRequest};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        Author, AuthorId, AuthorStore, ContentKind, ContentQuery, ContentRef, ContentStore,
        CoreError, Credentials, Db, EngagementKind, EngagementStore, Page, PageRequest, Post,
        PostId, Result, Series, SeriesId, Tutorial, TutorialId,
    };
}
