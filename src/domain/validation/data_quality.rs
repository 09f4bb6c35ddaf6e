use crate::domain::market::candle::{Candle, PriceHistory};
use rust_decimal::Decimal;
use tracing::warn;

/// Centralized validator for fetched daily bars.
///
/// Rejects data that is physically impossible before it reaches the scaler.
pub struct StrictCandleValidator;

impl StrictCandleValidator {
    /// Validates a Candle. Returns true if valid, false otherwise.
    pub fn validate_candle(symbol: &str, candle: &Candle) -> bool {
        if candle.open <= Decimal::ZERO
            || candle.high <= Decimal::ZERO
            || candle.low <= Decimal::ZERO
            || candle.close <= Decimal::ZERO
        {
            warn!(
                "Validation FAILED: Candle for {} at {} has non-positive price component(s)",
                symbol, candle.timestamp
            );
            return false;
        }

        if candle.low > candle.high {
            warn!(
                "Validation FAILED: Candle for {} has low {} > high {}",
                symbol, candle.low, candle.high
            );
            return false;
        }

        if candle.volume < Decimal::ZERO {
            warn!(
                "Validation FAILED: Candle for {} has negative volume: {}",
                symbol, candle.volume
            );
            return false;
        }

        true
    }

    /// Drops invalid candles, logging how many were removed.
    pub fn sanitize(history: &PriceHistory) -> PriceHistory {
        let symbol = history.ticker().as_str();
        let clean = history.filtered(|c| Self::validate_candle(symbol, c));

        let dropped = history.len() - clean.len();
        if dropped > 0 {
            warn!(
                "StrictCandleValidator: dropped {} of {} candles for {}",
                dropped,
                history.len(),
                symbol
            );
        }
        clean
    }
}
