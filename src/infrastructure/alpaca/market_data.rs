use super::common::AlpacaBarResponse;
use crate::config::AlpacaConfig;
use crate::domain::errors::MarketDataError;
use crate::domain::market::candle::{Candle, PriceHistory};
use crate::domain::market::ticker::Ticker;
use crate::domain::ports::HistoricalDataService;
use crate::infrastructure::core::http_client_factory::{
    HttpClientFactory, build_url_with_query, map_request_error,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest_middleware::ClientWithMiddleware;
use tracing::{debug, error, info};

/// Daily bars from the Alpaca market data API (IEX feed).
pub struct AlpacaHistoricalDataService {
    client: ClientWithMiddleware,
    api_key: String,
    api_secret: String,
    data_base_url: String,
}

impl AlpacaHistoricalDataService {
    pub fn new(config: &AlpacaConfig) -> Self {
        Self::with_client(config, HttpClientFactory::create_client())
    }

    pub fn with_client(config: &AlpacaConfig, client: ClientWithMiddleware) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            api_secret: config.secret_key.clone(),
            data_base_url: config.data_url.clone(),
        }
    }

    async fn fetch_page(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page_token: Option<&str>,
    ) -> Result<AlpacaBarResponse, MarketDataError> {
        let mut query_params = vec![
            ("symbols", symbol.to_string()),
            ("start", start.to_rfc3339()),
            ("end", end.to_rfc3339()),
            ("timeframe", "1Day".to_string()),
            ("limit", "10000".to_string()),
            ("adjustment", "all".to_string()),
            ("feed", "iex".to_string()),
        ];
        if let Some(token) = page_token {
            query_params.push(("page_token", token.to_string()));
        }

        let url = build_url_with_query(&self.data_base_url, "v2/stocks/bars", &query_params)?;
        debug!(
            "AlpacaHistoricalDataService: fetching daily bars for {} ({} -> {})",
            symbol, start, end
        );

        let response = self
            .client
            .get(url)
            .header("APCA-API-KEY-ID", &self.api_key)
            .header("APCA-API-SECRET-KEY", &self.api_secret)
            .send()
            .await
            .map_err(|e| map_request_error("Alpaca", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(
                "AlpacaHistoricalDataService: API error {} for {}: {}",
                status, symbol, error_text
            );
            return Err(MarketDataError::RequestFailed {
                reason: format!("Alpaca API error ({}): {}", status, error_text),
            });
        }

        response
            .json::<AlpacaBarResponse>()
            .await
            .map_err(|e| MarketDataError::InvalidData {
                symbol: symbol.to_string(),
                reason: format!("Failed to parse bars response: {}", e),
            })
    }
}

#[async_trait]
impl HistoricalDataService for AlpacaHistoricalDataService {
    async fn get_daily_history(
        &self,
        ticker: &Ticker,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceHistory, MarketDataError> {
        let symbol = ticker.as_str();
        let mut candles: Vec<Candle> = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .fetch_page(symbol, start, end, page_token.as_deref())
                .await?;

            if let Some(bars) = page.bars.get(symbol) {
                candles.extend(bars.iter().filter_map(|b| b.to_candle()));
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        if candles.is_empty() {
            return Err(MarketDataError::NoData {
                symbol: symbol.to_string(),
            });
        }

        info!(
            "AlpacaHistoricalDataService: fetched {} daily bars for {}",
            candles.len(),
            symbol
        );
        Ok(PriceHistory::new(ticker.clone(), candles))
    }

    fn name(&self) -> &str {
        "alpaca"
    }
}
