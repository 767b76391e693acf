//! Like and bookmark toggles

use axum::{
    Json,
    extract::{Form, State, rejection::FormRejection},
};
use ode_api::ApiError;
use ode_api::requests::{BookmarkForm, LikeForm};
use ode_api::responses::{BookmarkResponse, LikeResponse};
use ode_core::engagement::{ContentKind, EngagementKind, ToggleRequest, toggle};

use super::form_or_default;
use crate::auth::credentials;
use crate::middleware::SessionToken;
use crate::state::AppState;

/// `POST /tutorials/like/`
pub async fn like_tutorial(
    State(state): State<AppState>,
    session: SessionToken,
    form: Result<Form<LikeForm>, FormRejection>,
) -> Result<Json<LikeResponse>, ApiError> {
    let form = form_or_default(form);

    let outcome = toggle(
        &state.db,
        ToggleRequest {
            credentials: credentials(form.token, session),
            item_id: form.tutorial_id,
            content_kind: ContentKind::Tutorial,
            kind: EngagementKind::Like,
        },
    )
    .await?;

    Ok(Json(outcome.into()))
}

/// `GET /tutorials/like/`
pub async fn like_not_allowed() -> ApiError {
    ApiError::method_not_allowed(
        "Method \"GET\" not allowed. Provide a token and a tutorial id number.",
    )
}

/// `POST /series/bookmark/`
pub async fn bookmark_series(
    State(state): State<AppState>,
    session: SessionToken,
    form: Result<Form<BookmarkForm>, FormRejection>,
) -> Result<Json<BookmarkResponse>, ApiError> {
    let form = form_or_default(form);

    let outcome = toggle(
        &state.db,
        ToggleRequest {
            credentials: credentials(form.token, session),
            item_id: form.series_id,
            content_kind: ContentKind::Series,
            kind: EngagementKind::Bookmark,
        },
    )
    .await?;

    Ok(Json(outcome.into()))
}

/// `GET /series/bookmark/`
pub async fn bookmark_not_allowed() -> ApiError {
    ApiError::method_not_allowed(
        "Method \"GET\" not allowed. Provide a token and a series id number.",
    )
}
