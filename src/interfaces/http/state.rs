use crate::application::forecasting::StockForecastService;
use crate::infrastructure::observability::Metrics;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared by every handler; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<StockForecastService>,
    pub metrics: Option<Metrics>,
    pub request_timeout: Duration,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(service: Arc<StockForecastService>, request_timeout: Duration) -> Self {
        Self {
            service,
            metrics: None,
            request_timeout,
            started_at: Instant::now(),
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}
