//! Stockcast Server - prediction API over HTTP
//!
//! # Usage
//! ```sh
//! PORT=8000 cargo run --bin server
//! curl -X POST localhost:8000/api/v1/predict -H 'content-type: application/json' -d '{"ticker":"AAPL"}'
//! ```
//!
//! # Environment Variables
//! - `HOST` / `PORT` - Bind address (default: 0.0.0.0:8000)
//! - `REQUEST_TIMEOUT_SECS` - Per-request budget, fetch included (default: 60)
//! - `OBSERVABILITY_ENABLED` - Serve Prometheus metrics on `/metrics` (default: true)

use anyhow::{Context, Result};
use std::time::Duration;
use stockcast::application::bootstrap::ServicesBootstrap;
use stockcast::config::Config;
use stockcast::interfaces::http::{AppState, create_router};
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("Stockcast Server {} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: Source={:?}, Backend={:?}, Model={:?}",
        config.data_source.source, config.model.backend, config.model.model_path
    );

    info!("Loading model and wiring services...");
    let handle = ServicesBootstrap::init(&config)?;

    let mut state = AppState::new(
        handle.forecast_service.clone(),
        Duration::from_secs(config.server.request_timeout_secs),
    );
    match handle.metrics {
        Some(metrics) => {
            state = state.with_metrics(metrics);
            info!("Metrics available on /metrics");
        }
        None => info!("Metrics disabled."),
    }

    let app = create_router(state);
    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}. Press Ctrl+C to shutdown.", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received. Exiting...");
        })
        .await?;

    Ok(())
}
