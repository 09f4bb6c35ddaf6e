//! Historical data source configuration parsing from environment variables.
//!
//! Supported sources:
//! - Yahoo Finance chart API (default, no credentials)
//! - Alpaca market data (daily bars, API key required)
//! - CSV directory (offline, one `<TICKER>.csv` per symbol)
//! - Mock random walk (tests and local development)

use crate::config::EnvLookup;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Yahoo,
    Alpaca,
    Csv,
    Mock,
}

impl FromStr for DataSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yahoo" => Ok(DataSource::Yahoo),
            "alpaca" => Ok(DataSource::Alpaca),
            "csv" => Ok(DataSource::Csv),
            "mock" => Ok(DataSource::Mock),
            _ => anyhow::bail!(
                "Invalid DATA_SOURCE: {}. Must be 'yahoo', 'alpaca', 'csv', or 'mock'",
                s
            ),
        }
    }
}

/// Alpaca API configuration
#[derive(Debug, Clone, Default)]
pub struct AlpacaConfig {
    pub api_key: String,
    pub secret_key: String,
    pub data_url: String,
}

impl AlpacaConfig {
    fn from_lookup(vars: EnvLookup<'_>) -> Self {
        Self {
            api_key: vars("ALPACA_API_KEY").unwrap_or_default(),
            secret_key: vars("ALPACA_SECRET_KEY").unwrap_or_default(),
            data_url: vars("ALPACA_DATA_URL")
                .unwrap_or_else(|| "https://data.alpaca.markets".to_string()),
        }
    }
}

/// Data source environment configuration
#[derive(Debug, Clone)]
pub struct DataSourceEnvConfig {
    pub source: DataSource,
    pub yahoo_base_url: String,
    pub alpaca: AlpacaConfig,
    pub csv_data_dir: PathBuf,
    /// Seed for the mock random walk
    pub mock_seed: u64,
}

impl DataSourceEnvConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    pub fn from_lookup(vars: EnvLookup<'_>) -> anyhow::Result<Self> {
        let source = DataSource::from_str(&vars("DATA_SOURCE").unwrap_or_else(|| "yahoo".to_string()))?;
        let alpaca = AlpacaConfig::from_lookup(vars);

        if source == DataSource::Alpaca && (alpaca.api_key.is_empty() || alpaca.secret_key.is_empty()) {
            anyhow::bail!("DATA_SOURCE=alpaca requires ALPACA_API_KEY and ALPACA_SECRET_KEY");
        }

        Ok(Self {
            source,
            yahoo_base_url: vars("YAHOO_BASE_URL")
                .unwrap_or_else(|| "https://query1.finance.yahoo.com".to_string()),
            alpaca,
            csv_data_dir: PathBuf::from(
                vars("CSV_DATA_DIR").unwrap_or_else(|| "data/history".to_string()),
            ),
            mock_seed: vars("MOCK_SEED")
                .and_then(|v| v.parse().ok())
                .unwrap_or(42),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parsing() {
        assert_eq!(DataSource::from_str("YAHOO").unwrap(), DataSource::Yahoo);
        assert_eq!(DataSource::from_str("csv").unwrap(), DataSource::Csv);
        assert!(DataSource::from_str("bloomberg").is_err());
    }

    #[test]
    fn test_alpaca_requires_keys() {
        let result = DataSourceEnvConfig::from_lookup(&|k| match k {
            "DATA_SOURCE" => Some("alpaca".to_string()),
            _ => None,
        });
        assert!(result.is_err());

        let config = DataSourceEnvConfig::from_lookup(&|k| match k {
            "DATA_SOURCE" => Some("alpaca".to_string()),
            "ALPACA_API_KEY" => Some("key".to_string()),
            "ALPACA_SECRET_KEY" => Some("secret".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.alpaca.data_url, "https://data.alpaca.markets");
    }
}
