use crate::domain::market::candle::Candle;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct AlpacaBar {
    #[serde(rename = "t")]
    pub timestamp: String,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v")]
    pub volume: f64,
}

impl AlpacaBar {
    /// Bars with an unparseable timestamp are skipped.
    pub fn to_candle(&self) -> Option<Candle> {
        let timestamp = chrono::DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()?
            .timestamp_millis();
        Some(Candle::from_f64(
            timestamp,
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct AlpacaBarResponse {
    #[serde(default)]
    pub bars: HashMap<String, Vec<AlpacaBar>>,
    pub next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_response_parsing() {
        let body = r#"{
            "bars": {"AAPL": [{"t": "2024-01-02T05:00:00Z", "o": 187.15, "h": 188.44, "l": 183.89, "c": 185.64, "v": 82488700}]},
            "next_page_token": null
        }"#;
        let response: AlpacaBarResponse = serde_json::from_str(body).unwrap();
        let candle = response.bars["AAPL"][0].to_candle().unwrap();
        assert_eq!(candle.close_f64(), 185.64);
        assert!(response.next_page_token.is_none());
    }

    #[test]
    fn test_bad_timestamp_skipped() {
        let bar = AlpacaBar {
            timestamp: "yesterday".to_string(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 1.0,
        };
        assert!(bar.to_candle().is_none());
    }
}
