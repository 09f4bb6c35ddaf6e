use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use stockcast::application::forecasting::{ScalerSource, StockForecastService};
use stockcast::application::ml::naive_predictor::LastValuePredictor;
use stockcast::config::ForecastSettings;
use stockcast::domain::market::candle::Candle;
use stockcast::infrastructure::mock::MockHistoricalDataService;
use stockcast::infrastructure::observability::Metrics;
use stockcast::interfaces::http::{AppState, create_router};
use tower::ServiceExt;

fn candles(len: usize) -> Vec<Candle> {
    (0..len)
        .map(|i| {
            let close = 50.0 + (i % 7) as f64;
            Candle::from_f64(i as i64 * 86_400_000, close, close + 1.0, close - 1.0, close, 5e5)
        })
        .collect()
}

fn flat_candles(len: usize) -> Vec<Candle> {
    (0..len)
        .map(|i| Candle::from_f64(i as i64 * 86_400_000, 75.0, 75.0, 75.0, 75.0, 5e5))
        .collect()
}

fn test_app() -> axum::Router {
    let settings = ForecastSettings {
        lookback: 10,
        ..ForecastSettings::default()
    };
    let data = MockHistoricalDataService::new(3)
        .with_history("AAPL", candles(120))
        .with_history("TINY", candles(4))
        .with_history("FLAT", flat_candles(60));
    let service = StockForecastService::new(
        Arc::new(data),
        Arc::new(LastValuePredictor::new(10, 1, 0)),
        ScalerSource::FitPerRequest,
        settings,
    )
    .unwrap();
    let metrics = Metrics::new().unwrap();

    let state = AppState::new(Arc::new(service.with_metrics(metrics.clone())), Duration::from_secs(5))
        .with_metrics(metrics);
    create_router(state)
}

fn predict_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/predict")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_predict_success() {
    let response = test_app()
        .oneshot(predict_request(r#"{"ticker": "aapl"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["ticker"], "AAPL");
    assert_eq!(body["next_5_days_prediction"].as_array().unwrap().len(), 5);
    assert!(body["mse"].is_number());
    assert!(body["current_price"].is_number());
}

#[tokio::test]
async fn test_predict_invalid_ticker() {
    let response = test_app()
        .oneshot(predict_request(r#"{"ticker": "AAPL123"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"], true);
    assert!(body["message"].as_str().unwrap().contains("only letters"));
}

#[tokio::test]
async fn test_predict_unknown_ticker() {
    let response = test_app()
        .oneshot(predict_request(r#"{"ticker": "ZZZZ"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json_body(response).await;
    assert_eq!(body["message"], "No data found for the given ticker.");
}

#[tokio::test]
async fn test_predict_history_too_short() {
    let response = test_app()
        .oneshot(predict_request(r#"{"ticker": "TINY"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_predict_flat_prices() {
    let response = test_app()
        .oneshot(predict_request(r#"{"ticker": "flat"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(response).await;
    assert_eq!(body["error"], true);
    assert!(body["message"].as_str().unwrap().contains("Degenerate scale"));
}

#[tokio::test]
async fn test_predict_malformed_body() {
    let response = test_app()
        .oneshot(predict_request(r#"{"symbol": "AAPL"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], true);
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = test_app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["data_source"], "mock");
    assert_eq!(body["lookback"], 10);
}

#[tokio::test]
async fn test_metrics_after_prediction() {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(predict_request(r#"{"ticker": "AAPL"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("stockcast_predictions_total{outcome=\"ok\"} 1"));
    assert!(text.contains("stockcast_backtest_rmse{ticker=\"AAPL\"}"));
}
