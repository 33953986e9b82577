//! HTTP API route definitions.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{health, opportunities, ready, render_metrics, scan, status, AppState};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metrics", get(render_metrics))
        // Scan endpoints
        .route("/api/v1/status", get(status))
        .route("/api/v1/scan", post(scan))
        .route("/api/v1/opportunities/:sport", get(opportunities))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
