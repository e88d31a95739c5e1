use std::{
    fs,
    path::PathBuf,
    sync::Arc,
    time::{Duration, SystemTime},
};

use crate::{error::ModelLoadError, model::SiteModel, store::ModelStore};

/// Polls the model file and installs a new generation whenever its
/// modification time changes. A file that fails to load leaves the
/// generation in service untouched.
pub struct ModelWatcher {
    path: PathBuf,
    store: Arc<ModelStore>,
    last_modified: Option<SystemTime>,
}

impl ModelWatcher {
    /// `last_modified` is the mtime of the file the current generation was
    /// loaded from, if known.
    pub fn new(path: PathBuf, store: Arc<ModelStore>, last_modified: Option<SystemTime>) -> Self {
        Self {
            path,
            store,
            last_modified,
        }
    }

    /// Returns the new generation number if the file changed and loaded.
    pub fn check(&mut self) -> Result<Option<u64>, ModelLoadError> {
        let modified = fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .map_err(|source| ModelLoadError::Read {
                path: self.path.clone(),
                source,
            })?;
        if self.last_modified == Some(modified) {
            return Ok(None);
        }
        // a broken file is reported once per change, not on every tick
        self.last_modified = Some(modified);

        let model = SiteModel::load(&self.path)?;
        Ok(Some(self.store.swap(model)))
    }

    pub async fn run(mut self, every: Duration) {
        let mut ticker = tokio::time::interval(every);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match self.check() {
                Ok(Some(generation)) => {
                    tracing::info!("reloaded {} as generation {}", self.path.display(), generation)
                }
                Ok(None) => {}
                Err(e) => tracing::error!("model reload failed, keeping current generation: {}", e),
            }
        }
    }
}
