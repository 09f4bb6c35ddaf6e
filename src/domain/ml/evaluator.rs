use crate::domain::errors::ForecastError;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Backtest accuracy in original price units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub mse: f64,
    pub rmse: f64,
    /// `None` when the actual series is constant (R² undefined)
    pub r2: Option<f64>,
    pub samples: usize,
}

/// Computes MSE, RMSE and R² of `predicted` against `actual`.
///
/// Both slices must be non-empty and of equal length.
pub fn evaluate(predicted: &[f64], actual: &[f64]) -> Result<EvaluationResult, ForecastError> {
    if predicted.len() != actual.len() || actual.is_empty() {
        return Err(ForecastError::LengthMismatch {
            predicted: predicted.len(),
            actual: actual.len(),
        });
    }

    let n = actual.len() as f64;
    let ss_res: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (a - p) * (a - p))
        .sum();
    let mse = ss_res / n;

    let mean_actual = actual.iter().mean();
    let ss_tot: f64 = actual
        .iter()
        .map(|a| (a - mean_actual) * (a - mean_actual))
        .sum();

    let r2 = if ss_tot > 0.0 {
        Some(1.0 - ss_res / ss_tot)
    } else {
        None
    };

    Ok(EvaluationResult {
        mse,
        rmse: mse.sqrt(),
        r2,
        samples: actual.len(),
    })
}
