//! Error responses for the HTTP API

use crate::application::forecasting::PipelineError;
use crate::domain::errors::{ForecastError, MarketDataError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Request timed out after {0}s")]
    Timeout(u64),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Pipeline(err) => match err {
                PipelineError::Ticker(_) => StatusCode::BAD_REQUEST,
                PipelineError::MarketData(MarketDataError::NoData { .. }) => StatusCode::NOT_FOUND,
                PipelineError::MarketData(MarketDataError::Timeout { .. }) => {
                    StatusCode::GATEWAY_TIMEOUT
                }
                PipelineError::MarketData(_) => StatusCode::BAD_GATEWAY,
                PipelineError::Forecast(
                    ForecastError::InsufficientData { .. } | ForecastError::DegenerateScale { .. },
                ) => StatusCode::UNPROCESSABLE_ENTITY,
                PipelineError::Forecast(_) | PipelineError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Pipeline(PipelineError::MarketData(MarketDataError::NoData { .. })) => {
                "No data found for the given ticker.".to_string()
            }
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(detail = %self, "Internal server error");
                "An internal error occurred".to_string()
            }
            _ if status == StatusCode::BAD_GATEWAY => {
                tracing::warn!(detail = %self, "Upstream data source error");
                self.to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({
            "error": true,
            "message": message,
        }));

        (status, body).into_response()
    }
}
