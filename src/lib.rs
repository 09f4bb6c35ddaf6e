//! Stockcast: next-days closing price forecasts from daily history.
//!
//! Layers follow the usual split: `domain` (scaling, windows, forecaster,
//! evaluation, ports), `application` (pipeline and model wiring),
//! `infrastructure` (data sources, metrics, artifact storage) and
//! `interfaces` (HTTP API).

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
