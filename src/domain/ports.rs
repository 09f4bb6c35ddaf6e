use crate::domain::errors::{ForecastError, MarketDataError};
use crate::domain::market::candle::PriceHistory;
use crate::domain::market::ticker::Ticker;
use crate::domain::ml::window::Window;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rayon::prelude::*;

/// Source of daily OHLCV history. Retries, if any, live inside implementations.
#[async_trait]
pub trait HistoricalDataService: Send + Sync {
    async fn get_daily_history(
        &self,
        ticker: &Ticker,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceHistory, MarketDataError>;

    fn name(&self) -> &str;
}

/// Trained one-step-ahead sequence model.
///
/// Maps a `(lookback, feature_count)` window of normalized rows to the
/// normalized next value of the target feature. Implementations must be
/// immutable after load so one instance can serve concurrent requests.
pub trait SequencePredictor: Send + Sync {
    /// Window length the model was trained with
    fn lookback(&self) -> usize;

    /// Columns per window row the model was trained with
    fn feature_count(&self) -> usize;

    fn predict(&self, window: &Window) -> Result<f64, ForecastError>;

    /// Scores many independent windows. The default fans out over rayon;
    /// runtimes with native batching override it.
    fn predict_batch(&self, windows: &[Window]) -> Result<Vec<f64>, ForecastError> {
        windows.par_iter().map(|w| self.predict(w)).collect()
    }

    /// Get model name/type
    fn name(&self) -> &str;

    /// Get model version/id
    fn version(&self) -> &str;
}
