//! Blog post endpoints

use axum::{
    Json,
    extract::{Form, Path, Query, State, rejection::FormRejection},
    http::StatusCode,
};
use ode_api::requests::{NewPostForm, PageQuery, non_blank, parse_flag};
use ode_api::responses::{CreatedResponse, PostDetail, PostSummary};
use ode_api::{ApiError, ListResponse};
use ode_core::author::AuthorStore;
use ode_core::content::{ContentQuery, ContentStore, NewPost, publish_post};
use ode_core::engagement::{ContentKind, EngagementKind, EngagementStore};
use ode_core::error::CoreError;

use super::{form_or_default, page_request, summarize_posts};
use crate::auth::{authenticate, credentials};
use crate::middleware::SessionToken;
use crate::state::AppState;

/// `GET /blog/` - published posts, newest first
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<PostSummary>>, ApiError> {
    let posts = state
        .db
        .list_posts(&ContentQuery::published(), page_request(&state, &query))
        .await?;
    Ok(Json(summarize_posts(&state, posts).await?))
}

/// `POST /blog/new/`
pub async fn create_post(
    State(state): State<AppState>,
    session: SessionToken,
    form: Result<Form<NewPostForm>, FormRejection>,
) -> Result<(StatusCode, Json<CreatedResponse<PostDetail>>), ApiError> {
    let form: NewPostForm = form_or_default(form);
    let author = authenticate(&state.db, &credentials(form.token, session)).await?;

    let post = publish_post(
        &state.db,
        &author,
        NewPost {
            title: form.title.unwrap_or_default(),
            description: form.description.unwrap_or_default(),
            body: form.body.unwrap_or_default(),
            thumbnail: non_blank(form.thumbnail),
            draft: parse_flag(form.draft.as_deref()),
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            details: PostDetail::new(&post, &author, 0),
        }),
    ))
}

/// `GET /blog/detail/{slug}/` - published posts only
pub async fn post_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PostDetail>, ApiError> {
    let post = state
        .db
        .get_post(&slug, false)
        .await?
        .ok_or_else(|| CoreError::content_not_found(ContentKind::Post, &slug))?;

    let author = state
        .db
        .get_author(post.author_id)
        .await?
        .ok_or_else(|| CoreError::AuthorNotFound {
            username: post.author_username.clone(),
        })?;
    let likes = state
        .db
        .count_for(post.id.into(), EngagementKind::Like)
        .await?;

    Ok(Json(PostDetail::new(&post, &author, likes)))
}
