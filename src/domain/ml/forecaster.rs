//! Autoregressive multi-step forecasting.
//!
//! Each step predicts the next normalized target value from the current
//! window, rebuilds a full feature row around it, and slides the window one
//! row forward. Steps depend on each other and run strictly in order.

use crate::domain::errors::ForecastError;
use crate::domain::ml::scaler::ScalerState;
use crate::domain::ml::window::{Window, build_last_window};
use crate::domain::ports::SequencePredictor;
use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_HORIZON: usize = 5;

/// How non-target slots of a predicted row are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconstructionStrategy {
    /// Non-target features are set to 0.0. Error compounds with every step.
    #[default]
    ZeroFill,
    /// Non-target features repeat the last row of the current window.
    CarryForward,
}

impl FromStr for ReconstructionStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zero_fill" | "zero" => Ok(ReconstructionStrategy::ZeroFill),
            "carry_forward" | "carry" => Ok(ReconstructionStrategy::CarryForward),
            _ => anyhow::bail!(
                "Invalid RECONSTRUCTION: {}. Must be 'zero_fill' or 'carry_forward'",
                s
            ),
        }
    }
}

/// One predicted future day.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastStep {
    /// 1-based; step 1 is the day after the last observation
    pub step: usize,
    pub normalized: f64,
    pub value: f64,
    /// Window the prediction was made from
    pub window: Window,
    /// Row appended to the window after this prediction
    pub appended_row: Array1<f64>,
}

pub struct Forecaster<'a> {
    predictor: &'a dyn SequencePredictor,
    scaler: &'a ScalerState,
    target_index: usize,
    strategy: ReconstructionStrategy,
}

impl<'a> Forecaster<'a> {
    pub fn new(
        predictor: &'a dyn SequencePredictor,
        scaler: &'a ScalerState,
        target_index: usize,
    ) -> Self {
        Self {
            predictor,
            scaler,
            target_index,
            strategy: ReconstructionStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: ReconstructionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Lazily yields `horizon` steps seeded from the last `lookback` rows of
    /// `normalized`. The first error ends the sequence.
    pub fn steps(
        &self,
        normalized: ArrayView2<f64>,
        horizon: usize,
    ) -> Result<ForecastSteps<'_, 'a>, ForecastError> {
        let seed = build_last_window(normalized, self.predictor.lookback())?;
        seed.check_shape(self.predictor.lookback(), self.predictor.feature_count())?;
        if self.target_index >= seed.feature_count() {
            return Err(ForecastError::ShapeMismatch {
                expected_rows: seed.len(),
                expected_cols: self.target_index + 1,
                rows: seed.len(),
                cols: seed.feature_count(),
            });
        }

        Ok(ForecastSteps {
            forecaster: self,
            window: Some(seed),
            next_step: 1,
            horizon,
        })
    }

    /// Runs every step and collects them in chronological order.
    pub fn forecast(
        &self,
        normalized: ArrayView2<f64>,
        horizon: usize,
    ) -> Result<Vec<ForecastStep>, ForecastError> {
        self.steps(normalized, horizon)?.collect()
    }

    fn reconstruct(&self, window: &Window, prediction: f64) -> Array1<f64> {
        let mut row = match (self.strategy, window.last_row()) {
            (ReconstructionStrategy::CarryForward, Some(last)) => last.to_owned(),
            _ => Array1::zeros(window.feature_count()),
        };
        row[self.target_index] = prediction;
        row
    }

    fn step(&self, window: &Window, step: usize) -> Result<(ForecastStep, Window), ForecastError> {
        let normalized = self.predictor.predict(window)?;
        if !normalized.is_finite() {
            return Err(ForecastError::Prediction {
                reason: format!("non-finite output {} at step {}", normalized, step),
            });
        }

        let row = self.reconstruct(window, normalized);
        let next = window.advance(row.view())?;
        let value = self
            .scaler
            .inverse_transform_value(self.target_index, normalized)?;

        debug!(
            "Forecaster: step {} normalized={:.6} value={:.4}",
            step, normalized, value
        );

        Ok((
            ForecastStep {
                step,
                normalized,
                value,
                window: window.clone(),
                appended_row: row,
            },
            next,
        ))
    }
}

/// Iterator over forecast steps; fused after the horizon or the first error.
pub struct ForecastSteps<'f, 'a> {
    forecaster: &'f Forecaster<'a>,
    window: Option<Window>,
    next_step: usize,
    horizon: usize,
}

impl Iterator for ForecastSteps<'_, '_> {
    type Item = Result<ForecastStep, ForecastError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_step > self.horizon {
            return None;
        }
        let window = self.window.take()?;

        match self.forecaster.step(&window, self.next_step) {
            Ok((step, next)) => {
                self.window = Some(next);
                self.next_step += 1;
                Some(Ok(step))
            }
            Err(e) => Some(Err(e)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.window.is_none() {
            return (0, Some(0));
        }
        let remaining = (self.horizon + 1).saturating_sub(self.next_step);
        (0, Some(remaining))
    }
}
