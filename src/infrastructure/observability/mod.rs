//! Prometheus metrics for the prediction service.
//!
//! Metrics are exposed read-only through `GET /metrics`; nothing is pushed.

pub mod metrics;

pub use metrics::Metrics;
