//! HTTP server configuration parsing from environment variables.

use crate::config::EnvLookup;
use anyhow::Context;

#[derive(Debug, Clone)]
pub struct ServerEnvConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for one prediction request, fetch included
    pub request_timeout_secs: u64,
}

impl Default for ServerEnvConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            request_timeout_secs: 60,
        }
    }
}

impl ServerEnvConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    pub fn from_lookup(vars: EnvLookup<'_>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            host: vars("HOST").unwrap_or(defaults.host),
            port: match vars("PORT") {
                Some(v) => v.parse().context("PORT must be a valid number")?,
                None => defaults.port,
            },
            request_timeout_secs: match vars("REQUEST_TIMEOUT_SECS") {
                Some(v) => v
                    .parse()
                    .context("REQUEST_TIMEOUT_SECS must be a valid number")?,
                None => defaults.request_timeout_secs,
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
