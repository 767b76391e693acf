//! Series endpoints

use axum::{
    Json,
    extract::{Form, Path, Query, State, rejection::FormRejection},
    http::StatusCode,
};
use ode_api::requests::{AvailabilityQuery, NewSeriesForm, PageQuery, TokenForm, non_blank};
use ode_api::responses::{
    AvailabilityResponse, CreatedResponse, DeletedResponse, SeriesDetail, SeriesName,
    SeriesSummary, TutorialSummary,
};
use ode_api::{ApiError, ListResponse};
use ode_core::content::{
    self, ContentQuery, ContentStore, ListOrder, NewSeries, Series, SeriesType,
    series_name_available,
};
use ode_core::engagement::ContentKind;
use ode_core::error::CoreError;

use super::{everything, form_or_default, page_request};
use crate::auth::{authenticate, credentials};
use crate::middleware::SessionToken;
use crate::state::AppState;

async fn require_series(state: &AppState, slug: &str) -> Result<Series, ApiError> {
    Ok(state
        .db
        .get_series(slug)
        .await?
        .ok_or_else(|| CoreError::content_not_found(ContentKind::Series, slug))?)
}

/// `GET /series/`
pub async fn list_series(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<SeriesSummary>>, ApiError> {
    let series = state
        .db
        .list_series(&ContentQuery::published(), page_request(&state, &query))
        .await?;
    Ok(Json(series.map(|s| SeriesSummary::from(&s))))
}

/// `GET /series/names/` - every series as `{id, name}`
pub async fn series_names(State(state): State<AppState>) -> Result<Json<Vec<SeriesName>>, ApiError> {
    let names = state.db.series_names().await?;
    Ok(Json(
        names
            .into_iter()
            .map(|(id, name)| SeriesName {
                id: id.value(),
                name,
            })
            .collect(),
    ))
}

/// `GET /series/type/{type_of}/`
pub async fn series_by_type(
    State(state): State<AppState>,
    Path(type_of): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<SeriesSummary>>, ApiError> {
    let type_of: SeriesType = type_of.parse()?;
    let series = state
        .db
        .list_series(
            &ContentQuery::published().of_type(type_of),
            page_request(&state, &query),
        )
        .await?;
    Ok(Json(series.map(|s| SeriesSummary::from(&s))))
}

/// `GET /series/detail/{slug}/`
pub async fn series_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<SeriesDetail>, ApiError> {
    let series = require_series(&state, &slug).await?;
    let tutorials = state
        .db
        .list_tutorials(
            &ContentQuery::published()
                .in_series(series.id)
                .ordered(ListOrder::InSeries),
            everything(),
        )
        .await?;

    Ok(Json(SeriesDetail::new(&series, &tutorials.results)))
}

/// `GET /series/detail/{slug}/tutorials/` - an unknown series is a 404, an empty one is not
pub async fn series_tutorials(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<TutorialSummary>>, ApiError> {
    let series = require_series(&state, &slug).await?;
    let tutorials = state
        .db
        .list_tutorials(
            &ContentQuery::published()
                .in_series(series.id)
                .ordered(ListOrder::InSeries),
            page_request(&state, &query),
        )
        .await?;
    Ok(Json(tutorials.map(|t| TutorialSummary::from(&t))))
}

/// `POST /series/new/`
pub async fn create_series(
    State(state): State<AppState>,
    session: SessionToken,
    form: Result<Form<NewSeriesForm>, FormRejection>,
) -> Result<(StatusCode, Json<CreatedResponse<SeriesSummary>>), ApiError> {
    let form: NewSeriesForm = form_or_default(form);
    let author = authenticate(&state.db, &credentials(form.token, session)).await?;

    let type_of: SeriesType = non_blank(form.type_of)
        .ok_or_else(|| ApiError::validation("type_of", "Series type not provided."))?
        .trim()
        .parse()?;

    let series = content::create_series(
        &state.db,
        &author,
        NewSeries {
            name: form.name.unwrap_or_default(),
            description: form.description.unwrap_or_default(),
            type_of,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            details: SeriesSummary::from(&series),
        }),
    ))
}

/// `GET /series/is_available/?name=`
pub async fn name_available(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let name = non_blank(query.name)
        .ok_or_else(|| ApiError::validation("name", "Name not provided."))?;
    let available = series_name_available(&state.db, &name).await?;
    Ok(Json(AvailabilityResponse { available }))
}

/// `POST /series/delete/{slug}/` - creator only, takes the series' tutorials with it
pub async fn delete_series(
    State(state): State<AppState>,
    session: SessionToken,
    Path(slug): Path<String>,
    form: Result<Form<TokenForm>, FormRejection>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let form: TokenForm = form_or_default(form);
    let author = authenticate(&state.db, &credentials(form.token, session)).await?;

    content::remove_series(&state.db, &author, &slug).await?;
    Ok(Json(DeletedResponse { deleted: true }))
}
