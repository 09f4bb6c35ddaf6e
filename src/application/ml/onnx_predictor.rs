use crate::domain::errors::ForecastError;
use crate::domain::ml::window::Window;
use crate::domain::ports::SequencePredictor;
use ort::session::Session;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Sequence model exported to ONNX (e.g. the Keras LSTM), input `[batch, lookback, features]`.
pub struct OnnxSequencePredictor {
    session: Mutex<Session>,
    model_path: PathBuf,
    lookback: usize,
    feature_count: usize,
}

impl OnnxSequencePredictor {
    pub fn load(
        model_path: &Path,
        lookback: usize,
        feature_count: usize,
    ) -> Result<Self, ForecastError> {
        if !model_path.exists() {
            return Err(ForecastError::Prediction {
                reason: format!("ONNX model file not found at {:?}", model_path),
            });
        }

        let builder = Session::builder().map_err(|e| ForecastError::Prediction {
            reason: format!("Failed to create ONNX session builder: {}", e),
        })?;
        let session =
            builder
                .commit_from_file(model_path)
                .map_err(|e| ForecastError::Prediction {
                    reason: format!("Failed to load ONNX model: {}", e),
                })?;

        if let Some(dims) = session
            .inputs
            .first()
            .and_then(|input| input.input_type.tensor_shape())
        {
            check_input_dims(dims, lookback, feature_count)?;
        }

        info!(
            "OnnxSequencePredictor: loaded model from {:?} (lookback={}, features={})",
            model_path, lookback, feature_count
        );

        Ok(Self {
            session: Mutex::new(session),
            model_path: model_path.to_path_buf(),
            lookback,
            feature_count,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Runs one tensor of `batch` stacked windows and returns the first output per window.
    fn run(&self, flat_data: Vec<f32>, batch: usize) -> Result<Vec<f64>, ForecastError> {
        let shape = vec![batch, self.lookback, self.feature_count];

        let input_value = ort::value::Value::from_array((shape.as_slice(), flat_data))
            .map_err(|e| ForecastError::Prediction {
                reason: format!("Input value creation failed: {}", e),
            })?;

        let inputs = ort::inputs![input_value];

        let mut session = self.session.lock().map_err(|e| ForecastError::Prediction {
            reason: format!("Session lock failed: {}", e),
        })?;

        let outputs = session.run(inputs).map_err(|e| ForecastError::Prediction {
            reason: e.to_string(),
        })?;

        let output_value = outputs
            .iter()
            .next()
            .map(|(_, v)| v)
            .ok_or_else(|| ForecastError::Prediction {
                reason: "No output found".to_string(),
            })?;
        let data = output_value
            .try_extract_tensor::<f32>()
            .map_err(|e| ForecastError::Prediction {
                reason: e.to_string(),
            })?;

        // Output is [batch, 1] (or [batch]); one value per window either way
        let values: Vec<f64> = data.1.iter().map(|v| *v as f64).collect();
        if values.len() < batch || values.len() % batch != 0 {
            return Err(ForecastError::Prediction {
                reason: format!("Expected {} outputs, got {}", batch, values.len()),
            });
        }
        let stride = values.len() / batch;
        Ok(values.into_iter().step_by(stride).collect())
    }
}

/// Compares a declared `[batch, lookback, features]` input with the configured
/// window. Dynamic dimensions (negative) match anything.
fn check_input_dims(
    dims: &[i64],
    lookback: usize,
    feature_count: usize,
) -> Result<(), ForecastError> {
    let fixed = |d: i64| usize::try_from(d).ok();
    match dims {
        [_, rows, cols] => {
            let rows = fixed(*rows).unwrap_or(lookback);
            let cols = fixed(*cols).unwrap_or(feature_count);
            if rows != lookback || cols != feature_count {
                return Err(ForecastError::ShapeMismatch {
                    expected_rows: lookback,
                    expected_cols: feature_count,
                    rows,
                    cols,
                });
            }
            Ok(())
        }
        other => Err(ForecastError::Prediction {
            reason: format!("Expected a rank-3 model input, got shape {:?}", other),
        }),
    }
}

impl SequencePredictor for OnnxSequencePredictor {
    fn lookback(&self) -> usize {
        self.lookback
    }

    fn feature_count(&self) -> usize {
        self.feature_count
    }

    fn predict(&self, window: &Window) -> Result<f64, ForecastError> {
        window.check_shape(self.lookback, self.feature_count)?;
        let outputs = self.run(window.to_f32_vec(), 1)?;
        outputs.first().copied().ok_or_else(|| ForecastError::Prediction {
            reason: "Empty output".to_string(),
        })
    }

    /// All windows go through the runtime as a single batch.
    fn predict_batch(&self, windows: &[Window]) -> Result<Vec<f64>, ForecastError> {
        if windows.is_empty() {
            return Ok(Vec::new());
        }

        let mut flat_data = Vec::with_capacity(windows.len() * self.lookback * self.feature_count);
        for window in windows {
            window.check_shape(self.lookback, self.feature_count)?;
            flat_data.extend(window.to_f32_vec());
        }

        debug!(
            "OnnxSequencePredictor: batched inference over {} windows",
            windows.len()
        );
        self.run(flat_data, windows.len())
    }

    fn name(&self) -> &str {
        "ONNX Runtime (LSTM)"
    }

    fn version(&self) -> &str {
        "v1"
    }
}
