//! Stockcast CLI - one-shot prediction for a single ticker
//!
//! Prints the same JSON body as `POST /api/v1/predict`. Logs go to stderr.
//!
//! # Usage
//! ```sh
//! cargo run -- AAPL --horizon 5 --source yahoo
//! DATA_SOURCE=mock MODEL_BACKEND=naive cargo run -- MSFT --with-series
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use stockcast::application::bootstrap::ServicesBootstrap;
use stockcast::config::Config;
use stockcast::infrastructure::persistence::ScalerStore;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ticker symbol, letters only (e.g. AAPL)
    ticker: String,

    /// Days to forecast (overrides FORECAST_HORIZON)
    #[arg(long)]
    horizon: Option<usize>,

    /// Window length (overrides LOOKBACK; must match the model)
    #[arg(long)]
    lookback: Option<usize>,

    /// Data source: yahoo, alpaca, csv or mock (overrides DATA_SOURCE)
    #[arg(long)]
    source: Option<String>,

    /// Model backend: onnx, smartcore or naive (overrides MODEL_BACKEND)
    #[arg(long)]
    backend: Option<String>,

    /// Model artifact path (overrides MODEL_PATH)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Write the scaler used for this run to a JSON file
    #[arg(long)]
    save_scaler: Option<PathBuf>,

    /// Include chart series in the output
    #[arg(long)]
    with_series: bool,
}

impl Args {
    fn overrides(&self) -> HashMap<&'static str, String> {
        let mut vars = HashMap::new();
        if let Some(h) = self.horizon {
            vars.insert("FORECAST_HORIZON", h.to_string());
        }
        if let Some(l) = self.lookback {
            vars.insert("LOOKBACK", l.to_string());
        }
        if let Some(s) = &self.source {
            vars.insert("DATA_SOURCE", s.clone());
        }
        if let Some(b) = &self.backend {
            vars.insert("MODEL_BACKEND", b.clone());
        }
        if let Some(m) = &self.model {
            vars.insert("MODEL_PATH", m.display().to_string());
        }
        vars
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // stdout carries the JSON result only
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    let overrides = args.overrides();
    let config = Config::from_lookup(&|key| {
        overrides
            .get(key)
            .cloned()
            .or_else(|| std::env::var(key).ok())
    })?;
    info!(
        "Stockcast {}: {} via {:?} / {:?}",
        env!("CARGO_PKG_VERSION"),
        args.ticker,
        config.data_source.source,
        config.model.backend
    );

    let handle = ServicesBootstrap::init(&config)?;
    let prediction = handle.forecast_service.predict(&args.ticker).await?;

    if let Some(path) = &args.save_scaler {
        ScalerStore::new(path)
            .save(&prediction.scaler)
            .context("Failed to save scaler")?;
    }

    let mut body = prediction.response_body();
    if !args.with_series
        && let Some(obj) = body.as_object_mut()
    {
        obj.remove("series");
    }
    println!("{}", serde_json::to_string_pretty(&body)?);

    Ok(())
}
