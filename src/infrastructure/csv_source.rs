//! Offline history from CSV exports, one `<TICKER>.csv` per symbol.
//!
//! Expected header: `Date,Open,High,Low,Close,Volume` (extra columns such as
//! `Adj Close` are ignored). Dates are `YYYY-MM-DD`.

use crate::domain::errors::MarketDataError;
use crate::domain::market::candle::{Candle, PriceHistory};
use crate::domain::market::ticker::Ticker;
use crate::domain::ports::HistoricalDataService;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume")]
    volume: f64,
}

impl CsvRow {
    fn timestamp(&self) -> Option<i64> {
        // Accept both plain dates and "YYYY-MM-DD hh:mm:ss+tz" stamps by reading the date prefix
        let day = self.date.get(..10)?;
        let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?;
        Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
    }
}

pub struct CsvHistoricalDataService {
    data_dir: PathBuf,
}

impl CsvHistoricalDataService {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn file_for(&self, ticker: &Ticker) -> PathBuf {
        self.data_dir.join(format!("{}.csv", ticker.as_str()))
    }

    fn read_file(path: &Path, symbol: &str) -> Result<Vec<Candle>, MarketDataError> {
        let mut rdr = csv::Reader::from_path(path).map_err(|e| MarketDataError::RequestFailed {
            reason: format!("Failed to open {:?}: {}", path, e),
        })?;

        let mut candles = Vec::new();
        let mut skipped = 0usize;
        for record in rdr.deserialize::<CsvRow>() {
            let row = record.map_err(|e| MarketDataError::InvalidData {
                symbol: symbol.to_string(),
                reason: format!("Malformed CSV row: {}", e),
            })?;
            match row.timestamp() {
                Some(ts) => candles.push(Candle::from_f64(
                    ts, row.open, row.high, row.low, row.close, row.volume,
                )),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(
                "CsvHistoricalDataService: skipped {} rows with unreadable dates in {:?}",
                skipped, path
            );
        }
        Ok(candles)
    }
}

#[async_trait]
impl HistoricalDataService for CsvHistoricalDataService {
    async fn get_daily_history(
        &self,
        ticker: &Ticker,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceHistory, MarketDataError> {
        let symbol = ticker.as_str().to_string();
        let path = self.file_for(ticker);
        if !path.exists() {
            debug!("CsvHistoricalDataService: no file at {:?}", path);
            return Err(MarketDataError::NoData { symbol });
        }

        let candles = {
            let symbol = symbol.clone();
            let path = path.clone();
            tokio::task::spawn_blocking(move || Self::read_file(&path, &symbol))
                .await
                .map_err(|e| MarketDataError::RequestFailed {
                    reason: format!("CSV reader task failed: {}", e),
                })??
        };

        let (from, to) = (start.timestamp_millis(), end.timestamp_millis());
        let in_range: Vec<Candle> = candles
            .into_iter()
            .filter(|c| c.timestamp >= from && c.timestamp <= to)
            .collect();

        if in_range.is_empty() {
            return Err(MarketDataError::NoData { symbol });
        }

        info!(
            "CsvHistoricalDataService: loaded {} daily bars for {} from {:?}",
            in_range.len(),
            symbol,
            path
        );
        Ok(PriceHistory::new(ticker.clone(), in_range))
    }

    fn name(&self) -> &str {
        "csv"
    }
}
