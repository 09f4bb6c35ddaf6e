use crate::config::{DataSource, DataSourceEnvConfig};
use crate::domain::ports::HistoricalDataService;
use crate::infrastructure::alpaca::AlpacaHistoricalDataService;
use crate::infrastructure::csv_source::CsvHistoricalDataService;
use crate::infrastructure::mock::MockHistoricalDataService;
use crate::infrastructure::yahoo::YahooHistoricalDataService;
use std::sync::Arc;
use tracing::info;

pub struct ServiceFactory;

impl ServiceFactory {
    pub fn create_data_service(config: &DataSourceEnvConfig) -> Arc<dyn HistoricalDataService> {
        let service: Arc<dyn HistoricalDataService> = match config.source {
            DataSource::Yahoo => Arc::new(YahooHistoricalDataService::new(
                config.yahoo_base_url.clone(),
            )),
            DataSource::Alpaca => Arc::new(AlpacaHistoricalDataService::new(&config.alpaca)),
            DataSource::Csv => Arc::new(CsvHistoricalDataService::new(config.csv_data_dir.clone())),
            DataSource::Mock => Arc::new(MockHistoricalDataService::new(config.mock_seed)),
        };

        info!("ServiceFactory: historical data from {}", service.name());
        service
    }
}
