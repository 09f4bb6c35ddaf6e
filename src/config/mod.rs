//! Configuration module for Stockcast.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Forecast, Data Source, Model, Server, and Observability.
//!
//! Every sub-config exposes `from_env()` plus a `from_lookup()` taking an
//! [`EnvLookup`], so tests can feed variables without touching the process env.

mod data_source_config;
mod forecast_config;
mod model_config;
mod observability_config;
mod server_config;

pub use data_source_config::{AlpacaConfig, DataSource, DataSourceEnvConfig};
pub use forecast_config::{FeatureMode, ForecastSettings};
pub use model_config::{ModelBackend, ModelEnvConfig};
pub use observability_config::ObservabilityEnvConfig;
pub use server_config::ServerEnvConfig;

use anyhow::{Context, Result};

/// Variable lookup used by every `from_lookup` constructor.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub forecast: ForecastSettings,
    pub data_source: DataSourceEnvConfig,
    pub model: ModelEnvConfig,
    pub server: ServerEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    pub fn from_lookup(vars: EnvLookup<'_>) -> Result<Self> {
        let forecast = ForecastSettings::from_lookup(vars).context("Failed to load forecast config")?;
        let data_source =
            DataSourceEnvConfig::from_lookup(vars).context("Failed to load data source config")?;
        let model = ModelEnvConfig::from_lookup(vars).context("Failed to load model config")?;
        let server = ServerEnvConfig::from_lookup(vars).context("Failed to load server config")?;
        let observability = ObservabilityEnvConfig::from_lookup(vars);

        Ok(Self {
            forecast,
            data_source,
            model,
            server,
            observability,
        })
    }
}
