//! Tutorial endpoints

use axum::{
    Json,
    extract::{Form, Path, State, rejection::FormRejection},
    http::StatusCode,
};
use ode_api::requests::{NewTutorialForm, TokenForm, non_blank, parse_flag};
use ode_api::responses::{CreatedResponse, DeletedResponse, TutorialDetail, TutorialSummary};
use ode_api::{ApiError, ListResponse};
use ode_core::author::AuthorStore;
use ode_core::content::{
    ContentQuery, ContentStore, ListOrder, NewTutorial, publish_tutorial, remove_tutorial,
};
use ode_core::engagement::{ContentKind, EngagementKind, EngagementStore};
use ode_core::error::CoreError;
use ode_core::id::SeriesId;
use ode_core::pagination::{Page, PageRequest};

use super::form_or_default;
use crate::auth::{authenticate, credentials};
use crate::middleware::SessionToken;
use crate::state::AppState;

/// `GET /tutorials/recent/` - the latest published tutorials by id
pub async fn recent_tutorials(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<TutorialSummary>>, ApiError> {
    let recent = state
        .db
        .list_tutorials(
            &ContentQuery::published().ordered(ListOrder::IdDesc),
            PageRequest::first(state.config.content.recent_limit),
        )
        .await?;

    let results: Vec<TutorialSummary> = recent.results.iter().map(TutorialSummary::from).collect();
    Ok(Json(Page::new(results.len() as u64, results)))
}

/// `GET /tutorials/detail/{slug}/` - published tutorials only
pub async fn tutorial_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<TutorialDetail>, ApiError> {
    let tutorial = state
        .db
        .get_tutorial(&slug, false)
        .await?
        .ok_or_else(|| CoreError::content_not_found(ContentKind::Tutorial, &slug))?;

    let author = state
        .db
        .get_author(tutorial.author_id)
        .await?
        .ok_or_else(|| CoreError::AuthorNotFound {
            username: tutorial.author_username.clone(),
        })?;
    let likes = state
        .db
        .count_for(tutorial.id.into(), EngagementKind::Like)
        .await?;

    Ok(Json(TutorialDetail::new(&tutorial, &author, likes)))
}

fn parse_number(raw: Option<String>) -> Result<i64, ApiError> {
    match non_blank(raw) {
        None => Ok(NewTutorial::default().number),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ApiError::validation("number", "number must be an integer")),
    }
}

/// `POST /tutorials/new/`
pub async fn create_tutorial(
    State(state): State<AppState>,
    session: SessionToken,
    form: Result<Form<NewTutorialForm>, FormRejection>,
) -> Result<(StatusCode, Json<CreatedResponse<TutorialDetail>>), ApiError> {
    let form: NewTutorialForm = form_or_default(form);
    let author = authenticate(&state.db, &credentials(form.token, session)).await?;

    let series_id = non_blank(form.series_id)
        .map(|raw| SeriesId::parse(&raw))
        .transpose()
        .map_err(CoreError::from)?;

    let tutorial = publish_tutorial(
        &state.db,
        &author,
        NewTutorial {
            title: form.title.unwrap_or_default(),
            description: form.description.unwrap_or_default(),
            content: form.content.unwrap_or_default(),
            series_id,
            number: parse_number(form.number)?,
            draft: parse_flag(form.draft.as_deref()),
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            details: TutorialDetail::new(&tutorial, &author, 0),
        }),
    ))
}

/// `POST /tutorials/delete/{slug}/` - owner only
pub async fn delete_tutorial(
    State(state): State<AppState>,
    session: SessionToken,
    Path(slug): Path<String>,
    form: Result<Form<TokenForm>, FormRejection>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let form: TokenForm = form_or_default(form);
    let author = authenticate(&state.db, &credentials(form.token, session)).await?;

    remove_tutorial(&state.db, &author, &slug).await?;
    Ok(Json(DeletedResponse { deleted: true }))
}
