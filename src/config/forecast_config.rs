//! Forecast pipeline configuration.
//!
//! Values come from an optional TOML file (`FORECAST_CONFIG_FILE`) and are
//! then overridden by individual environment variables.

use crate::config::EnvLookup;
use crate::domain::ml::feature_registry::FeatureLayout;
use crate::domain::ml::forecaster::{DEFAULT_HORIZON, ReconstructionStrategy};
use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

pub const MAX_HISTORY_YEARS: u32 = 100;

/// Which columns are fed to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureMode {
    /// Close price only
    #[default]
    Univariate,
    /// Open, High, Low, Close, Volume
    Multivariate,
}

impl FeatureMode {
    pub fn layout(&self) -> FeatureLayout {
        match self {
            FeatureMode::Univariate => FeatureLayout::univariate(),
            FeatureMode::Multivariate => FeatureLayout::multivariate(),
        }
    }
}

impl FromStr for FeatureMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "univariate" => Ok(FeatureMode::Univariate),
            "multivariate" => Ok(FeatureMode::Multivariate),
            _ => anyhow::bail!(
                "Invalid FEATURE_MODE: {}. Must be 'univariate' or 'multivariate'",
                s
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    /// Rows per model input window
    pub lookback: usize,
    /// Future days to forecast
    pub horizon: usize,
    /// Share of history used as the training part; the rest is backtested
    pub train_split: f64,
    /// Years of daily history to fetch
    pub history_years: u32,
    pub feature_mode: FeatureMode,
    pub reconstruction: ReconstructionStrategy,
    /// Simple moving averages included in the chart series
    pub moving_average_periods: Vec<usize>,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            lookback: 100,
            horizon: DEFAULT_HORIZON,
            train_split: 0.7,
            history_years: 10,
            feature_mode: FeatureMode::Univariate,
            reconstruction: ReconstructionStrategy::ZeroFill,
            moving_average_periods: vec![100, 200],
        }
    }
}

impl ForecastSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    pub fn from_lookup(vars: EnvLookup<'_>) -> Result<Self> {
        let mut settings = match vars("FORECAST_CONFIG_FILE") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(v) = vars("LOOKBACK") {
            settings.lookback = v.parse().context("Failed to parse LOOKBACK")?;
        }
        if let Some(v) = vars("FORECAST_HORIZON") {
            settings.horizon = v.parse().context("Failed to parse FORECAST_HORIZON")?;
        }
        if let Some(v) = vars("TRAIN_SPLIT") {
            settings.train_split = v.parse().context("Failed to parse TRAIN_SPLIT")?;
        }
        if let Some(v) = vars("HISTORY_YEARS") {
            settings.history_years = v.parse().context("Failed to parse HISTORY_YEARS")?;
        }
        if let Some(v) = vars("FEATURE_MODE") {
            settings.feature_mode = FeatureMode::from_str(&v)?;
        }
        if let Some(v) = vars("RECONSTRUCTION") {
            settings.reconstruction = ReconstructionStrategy::from_str(&v)?;
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read forecast config {:?}", path))?;
        toml::from_str(&raw).with_context(|| format!("Failed to parse forecast config {:?}", path))
    }

    pub fn validate(&self) -> Result<()> {
        if self.lookback == 0 {
            anyhow::bail!("LOOKBACK must be at least 1");
        }
        if self.horizon == 0 {
            anyhow::bail!("FORECAST_HORIZON must be at least 1");
        }
        if !(self.train_split > 0.0 && self.train_split < 1.0) {
            anyhow::bail!("TRAIN_SPLIT must be in (0, 1), got {}", self.train_split);
        }
        if self.history_years == 0 || self.history_years > MAX_HISTORY_YEARS {
            anyhow::bail!(
                "HISTORY_YEARS must be in 1..={}, got {}",
                MAX_HISTORY_YEARS,
                self.history_years
            );
        }
        if self.moving_average_periods.contains(&0) {
            anyhow::bail!("Moving average periods must be positive");
        }
        Ok(())
    }

    pub fn layout(&self) -> FeatureLayout {
        self.feature_mode.layout()
    }

    /// First day of the history window ending at `end`; `None` if it leaves chrono's range.
    pub fn history_start(&self, end: DateTime<Utc>) -> Option<DateTime<Utc>> {
        TimeDelta::try_days(365 * i64::from(self.history_years))
            .and_then(|span| end.checked_sub_signed(span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let vars = lookup(&[]);
        let settings = ForecastSettings::from_lookup(&|k| vars.get(k).cloned()).unwrap();
        assert_eq!(settings, ForecastSettings::default());
        assert_eq!(settings.lookback, 100);
        assert_eq!(settings.horizon, 5);
    }

    #[test]
    fn test_env_overrides() {
        let vars = lookup(&[
            ("LOOKBACK", "60"),
            ("FORECAST_HORIZON", "10"),
            ("FEATURE_MODE", "multivariate"),
            ("RECONSTRUCTION", "carry_forward"),
        ]);
        let settings = ForecastSettings::from_lookup(&|k| vars.get(k).cloned()).unwrap();
        assert_eq!(settings.lookback, 60);
        assert_eq!(settings.horizon, 10);
        assert_eq!(settings.feature_mode, FeatureMode::Multivariate);
        assert_eq!(settings.reconstruction, ReconstructionStrategy::CarryForward);
        assert_eq!(settings.layout().feature_count(), 5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        for (key, value) in [
            ("TRAIN_SPLIT", "1.5"),
            ("LOOKBACK", "0"),
            ("LOOKBACK", "abc"),
            ("FEATURE_MODE", "trivariate"),
            ("HISTORY_YEARS", "0"),
            ("HISTORY_YEARS", "1000000"),
        ] {
            let vars = lookup(&[(key, value)]);
            assert!(
                ForecastSettings::from_lookup(&|k| vars.get(k).cloned()).is_err(),
                "{}={} should fail",
                key,
                value
            );
        }
    }

    #[test]
    fn test_history_start() {
        let end = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let settings = ForecastSettings {
            history_years: 2,
            ..ForecastSettings::default()
        };
        assert_eq!(settings.history_start(end), Some(end - TimeDelta::days(730)));

        let huge = ForecastSettings {
            history_years: 1_000_000,
            ..ForecastSettings::default()
        };
        assert_eq!(huge.history_start(end), None);
        assert_eq!(
            ForecastSettings {
                history_years: u32::MAX,
                ..ForecastSettings::default()
            }
            .history_start(end),
            None
        );
    }

    #[test]
    fn test_toml_file_then_env() {
        let path = std::env::temp_dir().join(format!(
            "stockcast-forecast-{}.toml",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(
            &path,
            "lookback = 60\nhorizon = 7\nfeature_mode = \"multivariate\"\nmoving_average_periods = [50]\n",
        )
        .unwrap();

        let path_str = path.display().to_string();
        let vars = lookup(&[("FORECAST_CONFIG_FILE", path_str.as_str()), ("FORECAST_HORIZON", "3")]);
        let settings = ForecastSettings::from_lookup(&|k| vars.get(k).cloned()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.lookback, 60);
        assert_eq!(settings.horizon, 3);
        assert_eq!(settings.feature_mode, FeatureMode::Multivariate);
        assert_eq!(settings.moving_average_periods, vec![50]);
        // Unset keys keep defaults
        assert_eq!(settings.train_split, 0.7);
    }
}
