use crate::domain::ml::scaler::ScalerState;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// JSON file holding the min/max ranges a model was trained against.
pub struct ScalerStore {
    file_path: PathBuf,
}

impl ScalerStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn load(&self) -> Result<ScalerState> {
        let content = fs::read_to_string(&self.file_path)
            .with_context(|| format!("Failed to read scaler file {:?}", self.file_path))?;
        let state: ScalerState =
            serde_json::from_str(&content).context("Failed to parse scaler JSON")?;

        info!(
            "Loaded scaler ({} features) from {:?}",
            state.feature_count(),
            self.file_path
        );
        Ok(state)
    }

    pub fn save(&self, state: &ScalerState) -> Result<()> {
        let content = serde_json::to_string_pretty(state).context("Failed to serialize scaler")?;

        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("Failed to create scaler directory")?;
        }

        // Write to temp file then rename
        let temp_path = self.file_path.with_extension("tmp");
        fs::write(&temp_path, content).context("Failed to write temp scaler file")?;
        fs::rename(&temp_path, &self.file_path).context("Failed to rename scaler file")?;

        info!("Saved scaler to {:?}", self.file_path);
        Ok(())
    }
}
