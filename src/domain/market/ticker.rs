use crate::domain::errors::TickerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest symbol accepted at the API boundary
pub const MAX_TICKER_LEN: usize = 20;

/// Validated stock ticker: ASCII letters only, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    pub fn parse(raw: &str) -> Result<Self, TickerError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(TickerError::Empty);
        }
        if value.len() > MAX_TICKER_LEN {
            return Err(TickerError::TooLong {
                len: value.len(),
                max: MAX_TICKER_LEN,
            });
        }
        if !value.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(TickerError::NonAlphabetic {
                value: value.to_string(),
            });
        }
        Ok(Self(value.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Ticker {
    type Err = TickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = TickerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
