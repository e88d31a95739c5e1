use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    config::EngineConfig,
    error::ScoringError,
    geometry::{direction_cosine, planar_distance},
    store::ModelStore,
    types::{DestinationPrediction, Point, PositionReport, SitePredictions, SiteProbability},
};

/// Scores every report against the vehicle's historical sites and its live
/// trajectory.
#[derive(Debug, Clone)]
pub struct SitePredictionEngine {
    store: Arc<ModelStore>,
    alignment_cosine: f64,
}

impl SitePredictionEngine {
    pub fn new(store: Arc<ModelStore>, cfg: &EngineConfig) -> Self {
        Self {
            store,
            alignment_cosine: cfg.alignment_cosine(),
        }
    }

    pub fn store(&self) -> &Arc<ModelStore> {
        &self.store
    }

    /// Attach `sitePredictions` to a raw report. Anything that cannot be
    /// read or scored is logged and handed back exactly as it arrived.
    pub fn enrich_message(&self, mut message: Value) -> Value {
        match self.score_message(&message) {
            Ok(Some(predictions)) => match serde_json::to_value(predictions) {
                Ok(encoded) => {
                    if let Value::Object(fields) = &mut message {
                        // replaces any value upstream already attached
                        fields.insert("sitePredictions".to_string(), encoded);
                    }
                }
                Err(e) => warn!("failed to encode site predictions, passing report through: {}", e),
            },
            Ok(None) => {}
            Err(e) => warn!("error enriching position report, passing it through: {}", e),
        }
        message
    }

    fn score_message(&self, message: &Value) -> Result<Option<SitePredictions>, ScoringError> {
        if !message.is_object() {
            return Err(ScoringError::MalformedReport(
                "expected a JSON object".to_string(),
            ));
        }
        let report = PositionReport::deserialize(message)
            .map_err(|e| ScoringError::MalformedReport(e.to_string()))?;
        self.enrich(&report)
    }

    /// Site distribution for one report, or `None` when the vehicle is
    /// unidentified or has no model.
    pub fn enrich(&self, report: &PositionReport) -> Result<Option<SitePredictions>, ScoringError> {
        let Some(vehicle_id) = report.vehicle_id.as_deref() else {
            return Ok(None);
        };

        // one generation for the whole pass
        let generation = self.store.current();
        let Some(vehicle) = generation.model.lookup(vehicle_id) else {
            debug!("no site model for {}", vehicle_id);
            return Ok(None);
        };

        let position = validated_position(vehicle_id, report)?;
        validate_destinations(vehicle_id, &report.destination_predictions)?;

        let mut predictions: SitePredictions = vehicle
            .sites
            .values()
            .map(|site| {
                (
                    site.id.clone(),
                    SiteProbability {
                        latitude: site.position.latitude,
                        longitude: site.position.longitude,
                        probability: f64::from(site.count),
                    },
                )
            })
            .collect();
        normalize(&mut predictions);

        {
            let distances = generation.tracker.vehicle(vehicle_id);
            let mut distances = distances.lock();
            for (site_id, site) in predictions.iter_mut() {
                let current = planar_distance(position, site.position());
                let (tail, _) = distances.update(site_id, current);
                if current > tail {
                    site.probability = 0.0;
                }
            }
        }

        for site in predictions.values_mut() {
            if site.probability == 0.0 {
                continue;
            }
            site.probability *=
                self.directional_support(position, site.position(), &report.destination_predictions);
        }
        normalize(&mut predictions);

        if predictions.values().any(|s| !s.probability.is_finite()) {
            return Err(ScoringError::NonFiniteWeights {
                vehicle_id: vehicle_id.to_string(),
            });
        }

        debug!(
            "scored {} sites for {} ({} destinations)",
            predictions.len(),
            vehicle_id,
            report.destination_predictions.len()
        );
        Ok(Some(predictions))
    }

    /// Drop the live distance state of one vehicle in the current generation.
    pub fn reset_vehicle(&self, vehicle_id: &str) -> bool {
        self.store.current().tracker.reset(vehicle_id)
    }

    /// Total probability of the destinations that lie beyond `site` in
    /// roughly the same direction, as seen from `origin`.
    fn directional_support(
        &self,
        origin: Point,
        site: Point,
        destinations: &IndexMap<String, DestinationPrediction>,
    ) -> f64 {
        let to_site = planar_distance(origin, site);
        destinations
            .values()
            .filter(|pd| {
                let aligned = direction_cosine(origin, site, pd.position())
                    .is_some_and(|cos| cos > self.alignment_cosine);
                aligned && to_site <= planar_distance(origin, pd.position())
            })
            .map(|pd| pd.probability)
            .sum()
    }
}

/// Scale weights to sum to one. All-zero weights are left as they are.
pub fn normalize(predictions: &mut SitePredictions) {
    let sum: f64 = predictions.values().map(|s| s.probability).sum();
    if sum == 0.0 {
        return;
    }
    for site in predictions.values_mut() {
        site.probability /= sum;
    }
}

fn validated_position(vehicle_id: &str, report: &PositionReport) -> Result<Point, ScoringError> {
    let position = report.position().ok_or_else(|| ScoringError::MissingPosition {
        vehicle_id: vehicle_id.to_string(),
    })?;
    if !position.is_finite() {
        return Err(ScoringError::InvalidPosition {
            vehicle_id: vehicle_id.to_string(),
            latitude: position.latitude,
            longitude: position.longitude,
        });
    }
    Ok(position)
}

fn validate_destinations(
    vehicle_id: &str,
    destinations: &IndexMap<String, DestinationPrediction>,
) -> Result<(), ScoringError> {
    match destinations
        .iter()
        .find(|(_, pd)| !(pd.position().is_finite() && (0.0..=1.0).contains(&pd.probability)))
    {
        Some((id, _)) => Err(ScoringError::InvalidDestination {
            vehicle_id: vehicle_id.to_string(),
            destination_id: id.clone(),
        }),
        None => Ok(()),
    }
}
