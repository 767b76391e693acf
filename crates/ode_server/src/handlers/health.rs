//! Health check endpoint

use axum::{Json, extract::State};
use ode_api::responses::HealthResponse;
use ode_core::db::client;

use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match client::ping(&state.db).await {
        Ok(()) => "ok".to_string(),
        Err(e) => {
            tracing::error!("Health check could not reach the database: {}", e);
            "unavailable".to_string()
        }
    };

    let status = if database == "ok" { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        version: ode_api::API_VERSION.to_string(),
        database,
    })
}
