//! Model and scaler artifact configuration.

use crate::config::EnvLookup;
use std::path::PathBuf;
use std::str::FromStr;

/// Inference backend for the sequence model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelBackend {
    /// ONNX export of the trained network
    Onnx,
    /// serde_json-serialized smartcore random forest
    SmartCore,
    /// Last-value baseline, no artifact needed
    Naive,
}

impl FromStr for ModelBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "onnx" => Ok(ModelBackend::Onnx),
            "smartcore" => Ok(ModelBackend::SmartCore),
            "naive" => Ok(ModelBackend::Naive),
            _ => anyhow::bail!(
                "Invalid MODEL_BACKEND: {}. Must be 'onnx', 'smartcore', or 'naive'",
                s
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelEnvConfig {
    pub backend: ModelBackend,
    pub model_path: PathBuf,
    /// Pre-fit scaler; when unset the scaler is fit on each request's backtest data
    pub scaler_path: Option<PathBuf>,
}

impl ModelEnvConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    pub fn from_lookup(vars: EnvLookup<'_>) -> anyhow::Result<Self> {
        let backend = ModelBackend::from_str(&vars("MODEL_BACKEND").unwrap_or_else(|| "onnx".to_string()))?;
        Ok(Self {
            backend,
            model_path: PathBuf::from(
                vars("MODEL_PATH")
                    .unwrap_or_else(|| "models/stock_prediction_model.onnx".to_string()),
            ),
            scaler_path: vars("SCALER_PATH").filter(|p| !p.is_empty()).map(PathBuf::from),
        })
    }
}
