use super::artifact_cache::ArtifactCache;
use super::naive_predictor::LastValuePredictor;
use super::smartcore_predictor::SmartCoreSequencePredictor;
use crate::application::forecasting::ScalerSource;
use crate::config::{ForecastSettings, ModelBackend, ModelEnvConfig};
use crate::domain::errors::ForecastError;
use crate::domain::ml::scaler::ScalerState;
use crate::domain::ports::SequencePredictor;
use crate::infrastructure::persistence::ScalerStore;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Builds predictors and scalers from configuration, loading each artifact once.
pub struct ModelRegistry {
    predictors: ArtifactCache<dyn SequencePredictor>,
    scalers: ArtifactCache<ScalerState>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            predictors: ArtifactCache::new("predictors"),
            scalers: ArtifactCache::new("scalers"),
        }
    }

    pub fn predictor(
        &self,
        model: &ModelEnvConfig,
        settings: &ForecastSettings,
    ) -> Result<Arc<dyn SequencePredictor>> {
        let layout = settings.layout();
        let lookback = settings.lookback;
        let feature_count = layout.feature_count();

        let predictor: Arc<dyn SequencePredictor> = match model.backend {
            ModelBackend::Naive => Arc::new(LastValuePredictor::new(
                lookback,
                feature_count,
                layout.target_index(),
            )),
            ModelBackend::SmartCore => self.predictors.get_or_try_load(&model.model_path, |path| {
                SmartCoreSequencePredictor::load(path, lookback, feature_count)
                    .map(|p| Arc::new(p) as Arc<dyn SequencePredictor>)
            })?,
            ModelBackend::Onnx => self
                .predictors
                .get_or_try_load(&model.model_path, |path| {
                    load_onnx(path, lookback, feature_count)
                })?,
        };

        info!(
            "ModelRegistry: using {} {} (lookback={}, features={})",
            predictor.name(),
            predictor.version(),
            predictor.lookback(),
            predictor.feature_count()
        );
        Ok(predictor)
    }

    pub fn scaler_source(&self, model: &ModelEnvConfig) -> Result<ScalerSource> {
        let Some(path) = &model.scaler_path else {
            return Ok(ScalerSource::FitPerRequest);
        };

        let state = self
            .scalers
            .get_or_try_load(path, |p| ScalerStore::new(p).load().map(Arc::new))
            .with_context(|| format!("Failed to load scaler from {:?}", path))?;
        Ok(ScalerSource::Persisted(state))
    }
}

#[cfg(feature = "onnx")]
fn load_onnx(
    path: &Path,
    lookback: usize,
    feature_count: usize,
) -> Result<Arc<dyn SequencePredictor>, ForecastError> {
    super::onnx_predictor::OnnxSequencePredictor::load(path, lookback, feature_count)
        .map(|p| Arc::new(p) as Arc<dyn SequencePredictor>)
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(
    path: &Path,
    _lookback: usize,
    _feature_count: usize,
) -> Result<Arc<dyn SequencePredictor>, ForecastError> {
    Err(ForecastError::Prediction {
        reason: format!(
            "Cannot load {:?}: built without the `onnx` feature",
            path
        ),
    })
}
