use super::chart::ChartResponse;
use crate::domain::errors::MarketDataError;
use crate::domain::market::candle::PriceHistory;
use crate::domain::market::ticker::Ticker;
use crate::domain::ports::HistoricalDataService;
use crate::infrastructure::core::http_client_factory::{
    HttpClientFactory, build_url_with_query, map_request_error,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use tracing::{debug, info, warn};

/// Daily history from the public Yahoo Finance chart API. No credentials required.
pub struct YahooHistoricalDataService {
    client: ClientWithMiddleware,
    base_url: String,
}

impl YahooHistoricalDataService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, HttpClientFactory::create_client())
    }

    pub fn with_client(base_url: impl Into<String>, client: ClientWithMiddleware) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl HistoricalDataService for YahooHistoricalDataService {
    async fn get_daily_history(
        &self,
        ticker: &Ticker,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceHistory, MarketDataError> {
        let symbol = ticker.as_str();
        let url = build_url_with_query(
            &self.base_url,
            &format!("v8/finance/chart/{}", symbol),
            &[
                ("period1", start.timestamp().to_string()),
                ("period2", end.timestamp().to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ],
        )?;
        debug!("YahooHistoricalDataService: GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_request_error("Yahoo", e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(MarketDataError::NoData {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(
                "YahooHistoricalDataService: API error {} for {}: {}",
                status, symbol, error_text
            );
            return Err(MarketDataError::RequestFailed {
                reason: format!("Yahoo API error ({}): {}", status, error_text),
            });
        }

        let body: ChartResponse =
            response
                .json()
                .await
                .map_err(|e| MarketDataError::InvalidData {
                    symbol: symbol.to_string(),
                    reason: format!("Failed to parse chart response: {}", e),
                })?;

        if let Some(err) = &body.chart.error {
            debug!(
                "YahooHistoricalDataService: {} returned {}: {}",
                symbol, err.code, err.description
            );
        }

        let candles = body
            .chart
            .result
            .as_deref()
            .and_then(|r| r.first())
            .map(|r| r.candles())
            .unwrap_or_default();

        if candles.is_empty() {
            return Err(MarketDataError::NoData {
                symbol: symbol.to_string(),
            });
        }

        info!(
            "YahooHistoricalDataService: fetched {} daily bars for {}",
            candles.len(),
            symbol
        );
        Ok(PriceHistory::new(ticker.clone(), candles))
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}
