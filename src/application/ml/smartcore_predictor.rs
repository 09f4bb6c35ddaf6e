use crate::domain::errors::ForecastError;
use crate::domain::ml::window::Window;
use crate::domain::ports::SequencePredictor;
use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::info;

pub type ForestModel = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Random forest over the flattened (row-major) window.
///
/// Serialized as `{lookback, feature_count, model}` so the input shape the
/// forest was trained on travels with it.
#[derive(Serialize, Deserialize)]
pub struct SmartCoreSequencePredictor {
    lookback: usize,
    feature_count: usize,
    model: ForestModel,
}

impl SmartCoreSequencePredictor {
    pub fn from_model(model: ForestModel, lookback: usize, feature_count: usize) -> Self {
        Self {
            model,
            lookback,
            feature_count,
        }
    }

    /// Loads a forest saved by [`save`](Self::save) and checks that it was
    /// trained on `lookback` x `feature_count` windows.
    pub fn load(
        model_path: &Path,
        lookback: usize,
        feature_count: usize,
    ) -> Result<Self, ForecastError> {
        let file = File::open(model_path).map_err(|e| ForecastError::Prediction {
            reason: format!("Failed to open model file {:?}: {}", model_path, e),
        })?;

        let predictor: Self =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| ForecastError::Prediction {
                reason: format!("Failed to deserialize ML model: {}", e),
            })?;

        if predictor.lookback != lookback || predictor.feature_count != feature_count {
            return Err(ForecastError::ShapeMismatch {
                expected_rows: lookback,
                expected_cols: feature_count,
                rows: predictor.lookback,
                cols: predictor.feature_count,
            });
        }

        info!(
            "SmartCoreSequencePredictor: loaded model from {:?} (lookback={}, features={})",
            model_path, lookback, feature_count
        );
        Ok(predictor)
    }

    pub fn save(&self, model_path: &Path) -> Result<(), ForecastError> {
        let file = File::create(model_path).map_err(|e| ForecastError::Prediction {
            reason: format!("Failed to create model file {:?}: {}", model_path, e),
        })?;
        serde_json::to_writer(BufWriter::new(file), self).map_err(|e| ForecastError::Prediction {
            reason: format!("Failed to serialize ML model: {}", e),
        })
    }

    fn predict_rows(&self, rows: Vec<Vec<f64>>) -> Result<Vec<f64>, ForecastError> {
        let input_matrix = DenseMatrix::from_2d_vec(&rows).map_err(|e| ForecastError::Prediction {
            reason: format!("Matrix creation failed: {}", e),
        })?;

        self.model
            .predict(&input_matrix)
            .map_err(|e| ForecastError::Prediction {
                reason: format!("Prediction failed: {}", e),
            })
    }
}

impl SequencePredictor for SmartCoreSequencePredictor {
    fn lookback(&self) -> usize {
        self.lookback
    }

    fn feature_count(&self) -> usize {
        self.feature_count
    }

    fn predict(&self, window: &Window) -> Result<f64, ForecastError> {
        window.check_shape(self.lookback, self.feature_count)?;
        self.predict_rows(vec![window.to_f64_vec()])?
            .first()
            .copied()
            .ok_or_else(|| ForecastError::Prediction {
                reason: "No prediction returned".to_string(),
            })
    }

    fn predict_batch(&self, windows: &[Window]) -> Result<Vec<f64>, ForecastError> {
        if windows.is_empty() {
            return Ok(Vec::new());
        }
        let rows = windows
            .iter()
            .map(|w| {
                w.check_shape(self.lookback, self.feature_count)
                    .map(|_| w.to_f64_vec())
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.predict_rows(rows)
    }

    fn name(&self) -> &str {
        "SmartCore Random Forest"
    }

    fn version(&self) -> &str {
        "v1.0"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ml::window::{build_windows, column_matrix};
    use smartcore::ensemble::random_forest_regressor::RandomForestRegressorParameters;

    fn trained_predictor() -> SmartCoreSequencePredictor {
        let series: Vec<f64> = (0..60).map(|i| (i % 20) as f64 / 20.0).collect();
        let matrix = column_matrix(&series);
        let set = build_windows(matrix.view(), 4, 0);

        let x: Vec<Vec<f64>> = set.windows.iter().map(|w| w.to_f64_vec()).collect();
        let x = DenseMatrix::from_2d_vec(&x).unwrap();
        let params = RandomForestRegressorParameters::default()
            .with_n_trees(10)
            .with_max_depth(6);
        let model = RandomForestRegressor::fit(&x, &set.targets, params).unwrap();

        SmartCoreSequencePredictor::from_model(model, 4, 1)
    }

    #[test]
    fn test_batch_matches_single() {
        let predictor = trained_predictor();
        let series: Vec<f64> = (0..10).map(|i| i as f64 / 20.0).collect();
        let matrix = column_matrix(&series);
        let set = build_windows(matrix.view(), 4, 0);

        let batch = predictor.predict_batch(&set.windows).unwrap();
        assert_eq!(batch.len(), set.len());
        for (window, expected) in set.windows.iter().zip(&batch) {
            let single = predictor.predict(window).unwrap();
            assert!((single - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_wrong_shape() {
        let predictor = trained_predictor();
        let window = Window::new(ndarray::Array2::zeros((3, 1)), None);
        assert!(matches!(
            predictor.predict(&window),
            Err(ForecastError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(SmartCoreSequencePredictor::load(Path::new("missing_model.json"), 4, 1).is_err());
    }

    #[test]
    fn test_load_checks_trained_shape() {
        let path = std::env::temp_dir().join(format!("stockcast-forest-{}.json", uuid::Uuid::new_v4()));
        trained_predictor().save(&path).unwrap();

        let loaded = SmartCoreSequencePredictor::load(&path, 4, 1).unwrap();
        assert_eq!((loaded.lookback(), loaded.feature_count()), (4, 1));

        let longer = SmartCoreSequencePredictor::load(&path, 8, 1);
        let wider = SmartCoreSequencePredictor::load(&path, 4, 5);
        std::fs::remove_file(&path).ok();

        assert_eq!(
            longer.err(),
            Some(ForecastError::ShapeMismatch {
                expected_rows: 8,
                expected_cols: 1,
                rows: 4,
                cols: 1,
            })
        );
        assert!(matches!(wider, Err(ForecastError::ShapeMismatch { expected_cols: 5, cols: 1, .. })));
    }
}
