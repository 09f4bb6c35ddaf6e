use crate::domain::errors::ForecastError;
use crate::domain::ml::window::Window;
use crate::domain::ports::SequencePredictor;

/// Persistence baseline: tomorrow's target equals today's.
///
/// Used in mock mode and as a yardstick for trained models.
pub struct LastValuePredictor {
    lookback: usize,
    feature_count: usize,
    target_index: usize,
}

impl LastValuePredictor {
    pub fn new(lookback: usize, feature_count: usize, target_index: usize) -> Self {
        Self {
            lookback,
            feature_count,
            target_index,
        }
    }
}

impl SequencePredictor for LastValuePredictor {
    fn lookback(&self) -> usize {
        self.lookback
    }

    fn feature_count(&self) -> usize {
        self.feature_count
    }

    fn predict(&self, window: &Window) -> Result<f64, ForecastError> {
        window.check_shape(self.lookback, self.feature_count)?;
        window
            .last_row()
            .and_then(|row| row.get(self.target_index).copied())
            .ok_or_else(|| ForecastError::Prediction {
                reason: "Empty window".to_string(),
            })
    }

    fn name(&self) -> &str {
        "Last Value (naive)"
    }

    fn version(&self) -> &str {
        "v1.0"
    }
}
