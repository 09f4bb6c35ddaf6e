//! REST API for on-demand predictions.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::{
    Router,
    body::Body,
    http::Request,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        tracing::info_span!(
            "request",
            id = %Uuid::new_v4(),
            method = %request.method(),
            uri = %request.uri(),
        )
    });

    Router::new()
        .route("/api/v1/predict", post(routes::predict))
        .route("/health", get(routes::health))
        .route("/metrics", get(routes::metrics))
        .layer(trace)
        .layer(cors)
        .with_state(state)
}
