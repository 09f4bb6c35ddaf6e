//! Prometheus metrics definitions for Stockcast
//!
//! All metrics use the `stockcast_` prefix and are read-only.

use prometheus::{
    CounterVec, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge, GenericGaugeVec},
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Tickers kept in `stockcast_backtest_rmse` before the least recently updated is dropped
pub const MAX_RMSE_TICKERS: usize = 500;

/// Prometheus metrics for the forecasting pipeline
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Prediction requests by outcome (ok, bad_request, not_found, upstream_error, ...)
    pub predictions_total: CounterVec,
    /// End-to-end pipeline latency in seconds, per stage
    pub pipeline_latency_seconds: HistogramVec,
    /// Predictor invocations by backend and mode (batch, step)
    pub predictor_calls_total: CounterVec,
    /// Last backtest RMSE per ticker, in price units; at most `ticker_limit` series
    pub backtest_rmse: GenericGaugeVec<AtomicF64>,
    rmse_tickers: Arc<Mutex<VecDeque<String>>>,
    ticker_limit: usize,
    /// Uptime in seconds
    pub uptime_seconds: GenericGauge<AtomicF64>,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges and counters registered
    pub fn new() -> anyhow::Result<Self> {
        Self::with_ticker_limit(MAX_RMSE_TICKERS)
    }

    pub fn with_ticker_limit(ticker_limit: usize) -> anyhow::Result<Self> {
        let registry = Registry::new();

        let predictions_total = CounterVec::new(
            Opts::new("stockcast_predictions_total", "Prediction requests by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(predictions_total.clone()))?;

        let pipeline_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "stockcast_pipeline_latency_seconds",
                "Forecast pipeline latency in seconds",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["stage"],
        )?;
        registry.register(Box::new(pipeline_latency_seconds.clone()))?;

        let predictor_calls_total = CounterVec::new(
            Opts::new(
                "stockcast_predictor_calls_total",
                "Sequence predictor invocations",
            ),
            &["backend", "mode"],
        )?;
        registry.register(Box::new(predictor_calls_total.clone()))?;

        let backtest_rmse = GaugeVec::new(
            Opts::new(
                "stockcast_backtest_rmse",
                "Root mean squared error of the last backtest per ticker",
            ),
            &["ticker"],
        )?;
        registry.register(Box::new(backtest_rmse.clone()))?;

        let uptime_seconds = Gauge::with_opts(Opts::new(
            "stockcast_uptime_seconds",
            "Server uptime in seconds",
        ))?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            predictions_total,
            pipeline_latency_seconds,
            predictor_calls_total,
            backtest_rmse,
            rmse_tickers: Arc::new(Mutex::new(VecDeque::new())),
            ticker_limit: ticker_limit.max(1),
            uptime_seconds,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn inc_predictions(&self, outcome: &str) {
        self.predictions_total.with_label_values(&[outcome]).inc();
    }

    pub fn observe_stage(&self, stage: &str, seconds: f64) {
        self.pipeline_latency_seconds
            .with_label_values(&[stage])
            .observe(seconds);
    }

    pub fn inc_predictor_calls(&self, backend: &str, mode: &str, count: u64) {
        self.predictor_calls_total
            .with_label_values(&[backend, mode])
            .inc_by(count as f64);
    }

    pub fn set_backtest_rmse(&self, ticker: &str, rmse: f64) {
        let mut tickers = match self.rmse_tickers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(pos) = tickers.iter().position(|t| t == ticker) {
            tickers.remove(pos);
        }
        tickers.push_back(ticker.to_string());
        while tickers.len() > self.ticker_limit {
            if let Some(evicted) = tickers.pop_front() {
                debug!("Metrics: dropping backtest RMSE series for {}", evicted);
                let _ = self.backtest_rmse.remove_label_values(&[evicted.as_str()]);
            }
        }
        self.backtest_rmse.with_label_values(&[ticker]).set(rmse);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert!(metrics.is_ok());
    }

    #[test]
    fn test_render_contains_recorded_values() {
        let metrics = Metrics::new().unwrap();
        metrics.inc_predictions("ok");
        metrics.set_backtest_rmse("AAPL", 1.25);
        metrics.inc_predictor_calls("naive", "batch", 3);

        let output = metrics.render();
        assert!(output.contains("stockcast_predictions_total{outcome=\"ok\"} 1"));
        assert!(output.contains("stockcast_backtest_rmse{ticker=\"AAPL\"} 1.25"));
        assert!(output.contains("stockcast_predictor_calls_total"));
    }

    #[test]
    fn test_backtest_rmse_keeps_recent_tickers_only() {
        let metrics = Metrics::with_ticker_limit(2).unwrap();
        metrics.set_backtest_rmse("AAPL", 1.0);
        metrics.set_backtest_rmse("MSFT", 2.0);
        metrics.set_backtest_rmse("AAPL", 1.5);
        metrics.set_backtest_rmse("TSLA", 3.0);

        let output = metrics.render();
        assert!(!output.contains("ticker=\"MSFT\""));
        assert!(output.contains("stockcast_backtest_rmse{ticker=\"AAPL\"} 1.5"));
        assert!(output.contains("stockcast_backtest_rmse{ticker=\"TSLA\"} 3"));
    }
}
