//! Wire types for the Yahoo Finance `v8/finance/chart` endpoint.

use crate::domain::market::candle::Candle;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    /// Seconds since epoch, one per row
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
}

/// Column-oriented quotes. Holidays and halts show up as `null`.
#[derive(Debug, Default, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

impl ChartResult {
    /// Zips the columns into candles, skipping rows with any missing field.
    pub fn candles(&self) -> Vec<Candle> {
        let Some(quote) = self.indicators.quote.first() else {
            return Vec::new();
        };

        self.timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, ts)| {
                let field = |column: &Vec<Option<f64>>| column.get(i).copied().flatten();
                Some(Candle::from_f64(
                    ts * 1000,
                    field(&quote.open)?,
                    field(&quote.high)?,
                    field(&quote.low)?,
                    field(&quote.close)?,
                    field(&quote.volume).unwrap_or(0.0),
                ))
            })
            .collect()
    }
}
