use crate::domain::errors::MarketDataError;
use crate::domain::market::candle::{Candle, PriceHistory};
use crate::domain::market::ticker::Ticker;
use crate::domain::ports::HistoricalDataService;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use tracing::info;

/// Deterministic history for local runs and tests.
///
/// By default every ticker gets a seeded random walk over weekdays in the
/// requested range. Once fixtures are registered, only those tickers exist.
#[derive(Clone, Default)]
pub struct MockHistoricalDataService {
    seed: u64,
    fixtures: HashMap<String, Vec<Candle>>,
}

impl MockHistoricalDataService {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            fixtures: HashMap::new(),
        }
    }

    pub fn with_history(mut self, ticker: &str, candles: Vec<Candle>) -> Self {
        self.fixtures.insert(ticker.to_uppercase(), candles);
        self
    }

    fn random_walk(&self, ticker: &Ticker, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Candle> {
        let ticker_seed = ticker
            .as_str()
            .bytes()
            .fold(self.seed, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut rng = StdRng::seed_from_u64(ticker_seed);

        let mut price: f64 = rng.random_range(20.0..500.0);
        let mut candles = Vec::new();
        let mut day = start;
        while day <= end {
            if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                let open = price;
                let change = rng.random_range(-0.03..0.03);
                let close = (open * (1.0 + change)).max(0.01);
                let high = open.max(close) * (1.0 + rng.random_range(0.0..0.01));
                let low = open.min(close) * (1.0 - rng.random_range(0.0..0.01));
                let volume = rng.random_range(1_000_000.0..50_000_000.0_f64).round();

                candles.push(Candle::from_f64(
                    day.timestamp_millis(),
                    open,
                    high,
                    low,
                    close,
                    volume,
                ));
                price = close;
            }
            day += Duration::days(1);
        }
        candles
    }
}

#[async_trait]
impl HistoricalDataService for MockHistoricalDataService {
    async fn get_daily_history(
        &self,
        ticker: &Ticker,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceHistory, MarketDataError> {
        let candles = if self.fixtures.is_empty() {
            self.random_walk(ticker, start, end)
        } else {
            self.fixtures.get(ticker.as_str()).cloned().unwrap_or_default()
        };

        if candles.is_empty() {
            return Err(MarketDataError::NoData {
                symbol: ticker.to_string(),
            });
        }

        info!(
            "MockHistoricalDataService: serving {} candles for {}",
            candles.len(),
            ticker
        );
        Ok(PriceHistory::new(ticker.clone(), candles))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> (DateTime<Utc>, DateTime<Utc>) {
        let end = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        (end - Duration::days(365), end)
    }

    #[tokio::test]
    async fn test_random_walk_is_deterministic() {
        let service = MockHistoricalDataService::new(7);
        let ticker = Ticker::parse("AAPL").unwrap();
        let (start, end) = range();

        let a = service.get_daily_history(&ticker, start, end).await.unwrap();
        let b = service.get_daily_history(&ticker, start, end).await.unwrap();
        assert_eq!(a, b);
        // Roughly 261 weekdays in a year
        assert!(a.len() > 250 && a.len() < 265);
        assert!(a.candles().iter().all(|c| c.low <= c.high));
    }

    #[tokio::test]
    async fn test_fixtures_restrict_tickers() {
        let service = MockHistoricalDataService::new(7)
            .with_history("MSFT", vec![Candle::from_f64(0, 1.0, 1.0, 1.0, 1.0, 1.0)]);
        let (start, end) = range();

        let missing = Ticker::parse("AAPL").unwrap();
        assert!(matches!(
            service.get_daily_history(&missing, start, end).await,
            Err(MarketDataError::NoData { .. })
        ));

        let known = Ticker::parse("msft").unwrap();
        assert_eq!(service.get_daily_history(&known, start, end).await.unwrap().len(), 1);
    }
}
