use thiserror::Error;

/// Errors raised by the forecasting core (scaling, windowing, inference, evaluation)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Insufficient data: need {required} rows, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Degenerate scale for feature '{feature}': max equals min")]
    DegenerateScale { feature: String },

    #[error(
        "Shape mismatch: expected {expected_rows}x{expected_cols}, got {rows}x{cols}"
    )]
    ShapeMismatch {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Length mismatch: {predicted} predictions vs {actual} actual values")]
    LengthMismatch { predicted: usize, actual: usize },

    #[error("Prediction failed: {reason}")]
    Prediction { reason: String },
}

/// Errors related to fetching historical market data
#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("No data found for {symbol}")]
    NoData { symbol: String },

    #[error("Invalid market data for {symbol}: {reason}")]
    InvalidData { symbol: String, reason: String },

    #[error("Request to data source failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Service timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },
}

/// Errors related to ticker symbol validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TickerError {
    #[error("Ticker must not be empty")]
    Empty,

    #[error("Ticker is too long: {len} > {max} characters")]
    TooLong { len: usize, max: usize },

    #[error("Ticker should contain only letters: {value}")]
    NonAlphabetic { value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_formatting() {
        let error = ForecastError::ShapeMismatch {
            expected_rows: 100,
            expected_cols: 5,
            rows: 100,
            cols: 1,
        };

        let msg = error.to_string();
        assert!(msg.contains("100x5"));
        assert!(msg.contains("100x1"));
    }

    #[test]
    fn test_market_data_error_formatting() {
        let error = MarketDataError::NoData {
            symbol: "ZZZZ".to_string(),
        };
        assert!(error.to_string().contains("ZZZZ"));
    }
}
