//! Ode API Server library
//!
//! HTTP surface for authors, posts, tutorials, series and engagement

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

use std::{net::SocketAddr, time::Duration};

use axum::{Router, http::HeaderValue};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{CorsConfig, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use state::AppState;

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    if cors.allowed_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive().max_age(Duration::from_secs(cors.max_age));
    }

    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring unusable CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(cors.max_age))
}

/// The full application, every route under `/api`
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);

    Router::new()
        .nest("/api", handlers::routes())
        .layer(axum::middleware::from_fn(middleware::log_server_errors))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Ode API server
pub async fn start_server(config: ServerConfig) -> ServerResult<()> {
    let addr: SocketAddr = config.bind_address.parse()?;
    tracing::info!("Starting Ode API Server on {}", addr);

    let state = AppState::new(config).await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
