//! Observability configuration parsing from environment variables.
//!
//! This module handles loading monitoring and metrics configuration.

use crate::config::EnvLookup;

/// Observability environment configuration
#[derive(Debug, Clone)]
pub struct ObservabilityEnvConfig {
    /// Collect Prometheus metrics and serve them on `/metrics`
    pub enabled: bool,
}

impl Default for ObservabilityEnvConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ObservabilityEnvConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    pub fn from_lookup(vars: EnvLookup<'_>) -> Self {
        Self {
            enabled: vars("OBSERVABILITY_ENABLED")
                .unwrap_or_else(|| "true".to_string())
                .parse::<bool>()
                .unwrap_or(true),
        }
    }
}
