use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info};

/// Process-wide cache of loaded artifacts (models, scalers) keyed by path.
///
/// Each path is loaded at most once; entries are never replaced afterwards.
pub struct ArtifactCache<T: ?Sized> {
    name: &'static str,
    entries: RwLock<HashMap<PathBuf, Arc<T>>>,
}

impl<T: ?Sized> ArtifactCache<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, path: &Path) -> Option<Arc<T>> {
        let entries = match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("ArtifactCache[{}]: lock poisoned during read, recovering", self.name);
                poisoned.into_inner()
            }
        };
        entries.get(path).cloned()
    }

    /// Returns the cached artifact for `path`, running `load` on first use.
    pub fn get_or_try_load<E, F>(&self, path: &Path, load: F) -> Result<Arc<T>, E>
    where
        F: FnOnce(&Path) -> Result<Arc<T>, E>,
    {
        if let Some(hit) = self.get(path) {
            debug!("ArtifactCache[{}]: HIT for {:?}", self.name, path);
            return Ok(hit);
        }

        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("ArtifactCache[{}]: lock poisoned during write, recovering", self.name);
                poisoned.into_inner()
            }
        };

        // Another caller may have loaded it while we waited for the write lock
        if let Some(hit) = entries.get(path) {
            return Ok(hit.clone());
        }

        let artifact = load(path)?;
        info!("ArtifactCache[{}]: loaded {:?}", self.name, path);
        entries.insert(path.to_path_buf(), artifact.clone());
        Ok(artifact)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
