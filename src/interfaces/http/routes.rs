use super::error::ApiError;
use super::state::AppState;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub ticker: String,
}

/// `POST /api/v1/predict`
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    match tokio::time::timeout(state.request_timeout, state.service.predict(&request.ticker)).await
    {
        Ok(result) => Ok(Json(result?.response_body())),
        Err(_) => {
            if let Some(metrics) = &state.metrics {
                metrics.inc_predictions("timeout");
            }
            Err(ApiError::Timeout(state.request_timeout.as_secs()))
        }
    }
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let settings = state.service.settings();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "model": state.service.predictor_name(),
        "data_source": state.service.data_source_name(),
        "lookback": settings.lookback,
        "horizon": settings.horizon,
    }))
}

/// `GET /metrics` in Prometheus text format
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(metrics) => {
            metrics
                .uptime_seconds
                .set(state.started_at.elapsed().as_secs_f64());
            (
                [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
                metrics.render(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}
