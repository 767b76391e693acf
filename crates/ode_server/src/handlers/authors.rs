//! Author endpoints

use axum::{
    Json,
    extract::{Form, Path, Query, State, rejection::FormRejection},
};
use ode_api::requests::{AuthForm, PageQuery, non_blank};
use ode_api::responses::{
    AuthorContentResponse, AuthorDetail, AuthorSummary, PostSummary, SeriesSummary,
    TokenResponse, TutorialSummary,
};
use ode_api::{ApiError, ListResponse};
use ode_core::author::{AuthorStore, promote_by_secret_key, require_author};
use ode_core::content::{ContentQuery, ContentStore};
use ode_core::engagement::{ContentKind, EngagementKind, EngagementStore};
use ode_core::identity::Credentials;
use uuid::Uuid;

use super::{everything, form_or_default, page_request, summarize_posts};
use crate::auth::{authenticate, login};
use crate::middleware::SessionToken;
use crate::state::AppState;

/// `GET /authors/` - staff only
pub async fn list_authors(
    State(state): State<AppState>,
    session: SessionToken,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<AuthorSummary>>, ApiError> {
    let caller = authenticate(&state.db, &Credentials::new(None, session.0)).await?;
    if !caller.is_staff {
        return Err(ApiError::Forbidden {
            message: "You do not have permission to perform this action.".to_string(),
        });
    }

    let authors = state
        .db
        .list_authors(page_request(&state, &query), false)
        .await?;
    Ok(Json(authors.map(|a| AuthorSummary::from(&a))))
}

/// `POST /authors/auth/` - exchange a username and password for a token
pub async fn obtain_token(
    State(state): State<AppState>,
    form: Result<Form<AuthForm>, FormRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let form: AuthForm = form_or_default(form);
    let username = non_blank(form.username)
        .ok_or_else(|| ApiError::validation("username", "Username not provided."))?;
    let password = non_blank(form.password)
        .ok_or_else(|| ApiError::validation("password", "Password not provided."))?;

    let (author, token) = login(&state.db, username.trim(), &password).await?;

    Ok(Json(TokenResponse {
        token: token.key,
        author: AuthorDetail::from(&author),
    }))
}

/// `GET /authors/detail/{username}/`
pub async fn author_detail(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<AuthorSummary>, ApiError> {
    let author = require_author(&state.db, &username).await?;
    Ok(Json(AuthorSummary::from(&author)))
}

/// `GET /authors/detail/{username}/posts/`
pub async fn author_posts(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<PostSummary>>, ApiError> {
    let author = require_author(&state.db, &username).await?;
    let posts = state
        .db
        .list_posts(
            &ContentQuery::published().by_author(author.id),
            page_request(&state, &query),
        )
        .await?;
    Ok(Json(summarize_posts(&state, posts).await?))
}

/// `GET /authors/detail/{username}/tutorials/`
pub async fn author_tutorials(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<TutorialSummary>>, ApiError> {
    let author = require_author(&state.db, &username).await?;
    let tutorials = state
        .db
        .list_tutorials(
            &ContentQuery::published().by_author(author.id),
            page_request(&state, &query),
        )
        .await?;
    Ok(Json(tutorials.map(|t| TutorialSummary::from(&t))))
}

/// `GET /authors/detail/{username}/series/`
pub async fn author_series(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<SeriesSummary>>, ApiError> {
    let author = require_author(&state.db, &username).await?;
    let series = state
        .db
        .list_series(
            &ContentQuery::published().by_author(author.id),
            page_request(&state, &query),
        )
        .await?;
    Ok(Json(series.map(|s| SeriesSummary::from(&s))))
}

/// `GET /authors/liked/tutorials/` - ids of the caller's liked tutorials
pub async fn liked_tutorials(
    State(state): State<AppState>,
    session: SessionToken,
) -> Result<Json<Vec<i64>>, ApiError> {
    let caller = authenticate(&state.db, &Credentials::new(None, session.0)).await?;
    let ids = state
        .db
        .content_ids_for(caller.id, ContentKind::Tutorial, EngagementKind::Like)
        .await?;
    Ok(Json(ids))
}

/// `GET /authors/bookmarked/series/` - ids of the caller's bookmarked series
pub async fn bookmarked_series(
    State(state): State<AppState>,
    session: SessionToken,
) -> Result<Json<Vec<i64>>, ApiError> {
    let caller = authenticate(&state.db, &Credentials::new(None, session.0)).await?;
    let ids = state
        .db
        .content_ids_for(caller.id, ContentKind::Series, EngagementKind::Bookmark)
        .await?;
    Ok(Json(ids))
}

/// `GET /authors/authenticate/{key}/` - follow a promotion link
pub async fn authenticate_author(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<AuthorSummary>, ApiError> {
    let key = Uuid::parse_str(key.trim())?;
    let author = promote_by_secret_key(&state.db, key).await?;
    Ok(Json(AuthorSummary::from(&author)))
}

/// `GET /authors/content/` - everything the caller owns, drafts included
pub async fn own_content(
    State(state): State<AppState>,
    session: SessionToken,
) -> Result<Json<AuthorContentResponse>, ApiError> {
    let caller = authenticate(&state.db, &Credentials::new(None, session.0)).await?;
    let mine = ContentQuery::published().by_author(caller.id).with_drafts();

    let posts = state.db.list_posts(&mine, everything()).await?;
    let tutorials = state.db.list_tutorials(&mine, everything()).await?;
    let series = state.db.list_series(&mine, everything()).await?;

    Ok(Json(AuthorContentResponse {
        posts: summarize_posts(&state, posts).await?.results,
        tutorials: tutorials.results.iter().map(TutorialSummary::from).collect(),
        series: series.results.iter().map(SeriesSummary::from).collect(),
    }))
}
