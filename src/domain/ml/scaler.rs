//! Per-feature min-max scaling.
//!
//! Values are mapped with `(v - min) / (max - min)` and are never clipped:
//! forecasts routinely drift past the fitted range and the overshoot is meaningful.

use crate::domain::errors::ForecastError;
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Observed range of a single feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRange {
    pub name: String,
    pub min: f64,
    pub max: f64,
}

/// Fitted min-max parameters, one entry per input column.
///
/// Immutable after fit/load; share it behind an `Arc` across requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    features: Vec<FeatureRange>,
}

impl ScalerState {
    /// Learns per-column min and max. `names` labels the columns in errors and on disk.
    pub fn fit(data: ArrayView2<f64>, names: &[String]) -> Result<Self, ForecastError> {
        if data.nrows() == 0 {
            return Err(ForecastError::InsufficientData {
                required: 1,
                available: 0,
            });
        }
        if names.len() != data.ncols() {
            return Err(ForecastError::ShapeMismatch {
                expected_rows: data.nrows(),
                expected_cols: names.len(),
                rows: data.nrows(),
                cols: data.ncols(),
            });
        }

        let features = data
            .axis_iter(Axis(1))
            .zip(names)
            .map(|(column, name)| {
                let (min, max) = column
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                        (lo.min(v), hi.max(v))
                    });
                FeatureRange {
                    name: name.clone(),
                    min,
                    max,
                }
            })
            .collect();

        Ok(Self { features })
    }

    pub fn from_ranges(features: Vec<FeatureRange>) -> Self {
        Self { features }
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn ranges(&self) -> &[FeatureRange] {
        &self.features
    }

    /// Range of one feature, failing if it cannot be used for scaling.
    fn range(&self, index: usize) -> Result<(f64, f64), ForecastError> {
        let feature = self
            .features
            .get(index)
            .ok_or(ForecastError::ShapeMismatch {
                expected_rows: 1,
                expected_cols: self.features.len(),
                rows: 1,
                cols: index + 1,
            })?;

        if !(feature.max > feature.min) {
            return Err(ForecastError::DegenerateScale {
                feature: feature.name.clone(),
            });
        }
        Ok((feature.min, feature.max))
    }

    fn check_columns(&self, data: &ArrayView2<f64>) -> Result<(), ForecastError> {
        if data.ncols() != self.features.len() {
            return Err(ForecastError::ShapeMismatch {
                expected_rows: data.nrows(),
                expected_cols: self.features.len(),
                rows: data.nrows(),
                cols: data.ncols(),
            });
        }
        Ok(())
    }

    pub fn transform(&self, data: ArrayView2<f64>) -> Result<Array2<f64>, ForecastError> {
        self.check_columns(&data)?;
        let mut out = data.to_owned();
        for (index, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (min, max) = self.range(index)?;
            column.mapv_inplace(|v| (v - min) / (max - min));
        }
        Ok(out)
    }

    pub fn inverse_transform(&self, data: ArrayView2<f64>) -> Result<Array2<f64>, ForecastError> {
        self.check_columns(&data)?;
        let mut out = data.to_owned();
        for (index, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (min, max) = self.range(index)?;
            column.mapv_inplace(|v| v * (max - min) + min);
        }
        Ok(out)
    }

    /// Scales one value using only `index`'s range.
    pub fn transform_value(&self, index: usize, value: f64) -> Result<f64, ForecastError> {
        let (min, max) = self.range(index)?;
        Ok((value - min) / (max - min))
    }

    pub fn inverse_transform_value(&self, index: usize, value: f64) -> Result<f64, ForecastError> {
        let (min, max) = self.range(index)?;
        Ok(value * (max - min) + min)
    }

    pub fn transform_column(&self, index: usize, values: &[f64]) -> Result<Vec<f64>, ForecastError> {
        let (min, max) = self.range(index)?;
        Ok(values.iter().map(|v| (v - min) / (max - min)).collect())
    }

    pub fn inverse_transform_column(
        &self,
        index: usize,
        values: &[f64],
    ) -> Result<Vec<f64>, ForecastError> {
        let (min, max) = self.range(index)?;
        Ok(values.iter().map(|v| v * (max - min) + min).collect())
    }
}
