use crate::domain::market::ticker::Ticker;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

/// One daily OHLCV observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    /// Unix timestamp in milliseconds (start of the trading day)
    pub timestamp: i64,
}

impl Candle {
    /// Builds a candle from float quotes as returned by data APIs.
    /// Values that cannot be represented become zero and are rejected by validation.
    pub fn from_f64(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        let dec = |v: f64| Decimal::from_f64(v).unwrap_or(Decimal::ZERO);
        Self {
            open: dec(open),
            high: dec(high),
            low: dec(low),
            close: dec(close),
            volume: dec(volume),
            timestamp,
        }
    }

    pub fn close_f64(&self) -> f64 {
        self.close.to_f64().unwrap_or(0.0)
    }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// Ordered daily history for one ticker, oldest first.
///
/// Read-only once fetched: the pipeline only ever borrows it.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    ticker: Ticker,
    candles: Vec<Candle>,
}

impl PriceHistory {
    /// Builds a history, sorting candles chronologically and dropping duplicate days.
    pub fn new(ticker: Ticker, mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.timestamp);
        candles.dedup_by_key(|c| c.timestamp);
        Self { ticker, candles }
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(Candle::close_f64).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.candles.last().map(Candle::close_f64)
    }

    /// Returns a copy keeping only candles accepted by `keep`.
    pub fn filtered<F>(&self, keep: F) -> Self
    where
        F: Fn(&Candle) -> bool,
    {
        Self {
            ticker: self.ticker.clone(),
            candles: self.candles.iter().filter(|c| keep(c)).cloned().collect(),
        }
    }
}
