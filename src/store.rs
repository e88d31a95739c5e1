use parking_lot::RwLock;
use std::sync::Arc;

use crate::{
    model::SiteModel,
    tracker::{DistanceTracker, TailBand},
};

/// One atomically installed snapshot: the site model together with the
/// distance state accumulated against it.
#[derive(Debug)]
pub struct ModelGeneration {
    pub number: u64,
    pub model: SiteModel,
    pub tracker: DistanceTracker,
}

/// Holds the generation in service. Readers clone the `Arc` once per report,
/// so a concurrent swap is never observed halfway through scoring.
#[derive(Debug)]
pub struct ModelStore {
    band: TailBand,
    current: RwLock<Arc<ModelGeneration>>,
}

impl ModelStore {
    pub fn new(model: SiteModel, band: TailBand) -> Self {
        let first = ModelGeneration {
            number: 1,
            model,
            tracker: DistanceTracker::new(band),
        };
        Self {
            band,
            current: RwLock::new(Arc::new(first)),
        }
    }

    pub fn current(&self) -> Arc<ModelGeneration> {
        Arc::clone(&*self.current.read())
    }

    /// Install `model` as the next generation with fresh distance state.
    /// Returns the new generation number.
    pub fn swap(&self, model: SiteModel) -> u64 {
        let mut current = self.current.write();
        let number = current.number + 1;
        *current = Arc::new(ModelGeneration {
            number,
            model,
            tracker: DistanceTracker::new(self.band),
        });
        tracing::info!(
            "installed model generation {} ({} vehicles)",
            number,
            current.model.len()
        );
        number
    }
}
