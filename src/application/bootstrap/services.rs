use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::application::forecasting::StockForecastService;
use crate::application::ml::ModelRegistry;
use crate::config::Config;
use crate::infrastructure::factory::ServiceFactory;
use crate::infrastructure::observability::Metrics;

pub struct ServicesHandle {
    pub forecast_service: Arc<StockForecastService>,
    pub metrics: Option<Metrics>,
}

pub struct ServicesBootstrap;

impl ServicesBootstrap {
    pub fn init(config: &Config) -> Result<ServicesHandle> {
        // 1. Historical data source
        let data_service = ServiceFactory::create_data_service(&config.data_source);

        // 2. Model artifacts, loaded once and shared
        let registry = ModelRegistry::new();
        let predictor = registry
            .predictor(&config.model, &config.forecast)
            .context("Failed to load sequence model")?;
        let scaler_source = registry.scaler_source(&config.model)?;

        // 3. Metrics
        let metrics = if config.observability.enabled {
            Some(Metrics::new().context("Failed to register metrics")?)
        } else {
            None
        };

        let mut service = StockForecastService::new(
            data_service,
            predictor,
            scaler_source,
            config.forecast.clone(),
        )?;
        if let Some(m) = &metrics {
            service = service.with_metrics(m.clone());
        }

        info!(
            "ServicesBootstrap: lookback={}, horizon={}, features={:?}, reconstruction={:?}",
            config.forecast.lookback,
            config.forecast.horizon,
            config.forecast.layout().names(),
            config.forecast.reconstruction
        );

        Ok(ServicesHandle {
            forecast_service: Arc::new(service),
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_stack_boots_without_artifacts() {
        let config = Config::from_lookup(&|k| match k {
            "DATA_SOURCE" => Some("mock".to_string()),
            "MODEL_BACKEND" => Some("naive".to_string()),
            _ => None,
        })
        .unwrap();

        let handle = ServicesBootstrap::init(&config).unwrap();
        assert!(handle.metrics.is_some());
        assert_eq!(handle.forecast_service.data_source_name(), "mock");
        assert_eq!(handle.forecast_service.predictor_name(), "Last Value (naive)");
    }
}
