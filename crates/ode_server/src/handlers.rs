//! HTTP request handlers

use axum::{
    Router,
    extract::{Form, rejection::FormRejection},
    routing::{get, post},
};
use ode_api::ApiError;
use ode_api::requests::PageQuery;
use ode_api::responses::PostSummary;
use ode_core::content::Post;
use ode_core::engagement::{EngagementKind, EngagementStore};
use ode_core::pagination::{Page, PageRequest};

pub mod authors;
pub mod engagement;
pub mod health;
pub mod posts;
pub mod series;
pub mod tutorials;

use crate::state::AppState;

/// Build all API routes
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health/", get(health::health_check))
        // Authors
        .route("/authors/", get(authors::list_authors))
        .route("/authors/auth/", post(authors::obtain_token))
        .route("/authors/detail/:username/", get(authors::author_detail))
        .route("/authors/detail/:username/posts/", get(authors::author_posts))
        .route(
            "/authors/detail/:username/tutorials/",
            get(authors::author_tutorials),
        )
        .route("/authors/detail/:username/series/", get(authors::author_series))
        .route("/authors/liked/tutorials/", get(authors::liked_tutorials))
        .route("/authors/bookmarked/series/", get(authors::bookmarked_series))
        .route("/authors/authenticate/:key/", get(authors::authenticate_author))
        .route("/authors/content/", get(authors::own_content))
        // Blog
        .route("/blog/", get(posts::list_posts))
        .route("/blog/new/", post(posts::create_post))
        .route("/blog/detail/:slug/", get(posts::post_detail))
        // Tutorials
        .route("/tutorials/recent/", get(tutorials::recent_tutorials))
        .route("/tutorials/detail/:slug/", get(tutorials::tutorial_detail))
        .route("/tutorials/new/", post(tutorials::create_tutorial))
        .route("/tutorials/delete/:slug/", post(tutorials::delete_tutorial))
        .route(
            "/tutorials/like/",
            get(engagement::like_not_allowed).post(engagement::like_tutorial),
        )
        // Series
        .route("/series/", get(series::list_series))
        .route("/series/names/", get(series::series_names))
        .route("/series/type/:type_of/", get(series::series_by_type))
        .route("/series/detail/:slug/", get(series::series_detail))
        .route("/series/detail/:slug/tutorials/", get(series::series_tutorials))
        .route("/series/new/", post(series::create_series))
        .route("/series/is_available/", get(series::name_available))
        .route("/series/delete/:slug/", post(series::delete_series))
        .route(
            "/series/bookmark/",
            get(engagement::bookmark_not_allowed).post(engagement::bookmark_series),
        )
}

/// A missing or unreadable body is treated as an empty form
pub(crate) fn form_or_default<T: Default>(form: Result<Form<T>, FormRejection>) -> T {
    match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!("Treating unreadable form as empty: {}", rejection);
            T::default()
        }
    }
}

/// The requested page at the configured page size
pub(crate) fn page_request(state: &AppState, query: &PageQuery) -> PageRequest {
    PageRequest::new(query.page(), state.config.content.page_size)
}

/// Every item at once, for listings that are not paginated
pub(crate) fn everything() -> PageRequest {
    PageRequest::first(u32::MAX)
}

/// Post summaries carry their like count, looked up per post
pub(crate) async fn summarize_posts(
    state: &AppState,
    posts: Page<Post>,
) -> Result<Page<PostSummary>, ApiError> {
    let mut results = Vec::with_capacity(posts.results.len());
    for post in &posts.results {
        let likes = state
            .db
            .count_for(post.id.into(), EngagementKind::Like)
            .await?;
        results.push(PostSummary::new(post, likes));
    }
    Ok(Page::new(posts.count, results))
}
