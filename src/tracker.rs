use parking_lot::{Mutex, RwLock};
use std::{collections::HashMap, sync::Arc};

use crate::config::EngineConfig;

/// The band the tail distance trails the current distance by, and the
/// relative jump that starts a new approach episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TailBand {
    pub fraction: f64,
    pub reset_threshold: f64,
}

impl TailBand {
    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self {
            fraction: cfg.tail_fraction,
            reset_threshold: cfg.reset_threshold(),
        }
    }
}

impl Default for TailBand {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Distance history for one (vehicle, site) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceState {
    pub current: f64,
    pub tail: f64,
    pub minimum: f64,
}

impl Default for DistanceState {
    fn default() -> Self {
        Self {
            current: f64::INFINITY,
            tail: f64::INFINITY,
            minimum: f64::INFINITY,
        }
    }
}

impl DistanceState {
    /// Record a new distance and return the adapted `(tail, minimum)`.
    pub fn observe(&mut self, current: f64, band: TailBand) -> (f64, f64) {
        self.current = current;

        if current != 0.0 && (current - self.tail).abs() / current > band.reset_threshold {
            self.tail = f64::INFINITY;
            self.minimum = f64::INFINITY;
        }

        if current != 0.0 && (current - self.tail).abs() / current > band.fraction {
            if current > self.tail {
                self.tail = current * (1.0 - band.fraction);
            } else if current < self.tail {
                self.tail = current * (1.0 + band.fraction);
            }
        }

        self.minimum = self.minimum.min(current);
        (self.tail, self.minimum)
    }
}

/// All distance state for one vehicle. Held under that vehicle's lock for
/// the duration of a scoring pass.
#[derive(Debug)]
pub struct VehicleDistances {
    band: TailBand,
    sites: HashMap<String, DistanceState>,
}

impl VehicleDistances {
    fn new(band: TailBand) -> Self {
        Self {
            band,
            sites: HashMap::new(),
        }
    }

    pub fn update(&mut self, site_id: &str, current: f64) -> (f64, f64) {
        let band = self.band;
        match self.sites.get_mut(site_id) {
            Some(state) => state.observe(current, band),
            None => self
                .sites
                .entry(site_id.to_string())
                .or_default()
                .observe(current, band),
        }
    }

    pub fn get(&self, site_id: &str) -> Option<&DistanceState> {
        self.sites.get(site_id)
    }
}

/// Arena of [`DistanceState`] keyed by vehicle, then site.
///
/// Each vehicle gets its own mutex so reports for different vehicles never
/// contend, while reports for the same vehicle are serialized. A tracker
/// belongs to exactly one model generation and is dropped with it.
#[derive(Debug, Default)]
pub struct DistanceTracker {
    band: TailBand,
    vehicles: RwLock<HashMap<String, Arc<Mutex<VehicleDistances>>>>,
}

impl DistanceTracker {
    pub fn new(band: TailBand) -> Self {
        Self {
            band,
            vehicles: RwLock::new(HashMap::new()),
        }
    }

    /// The lock guarding one vehicle's state, created on first use.
    pub fn vehicle(&self, vehicle_id: &str) -> Arc<Mutex<VehicleDistances>> {
        if let Some(v) = self.vehicles.read().get(vehicle_id) {
            return Arc::clone(v);
        }
        let mut vehicles = self.vehicles.write();
        Arc::clone(
            vehicles
                .entry(vehicle_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(VehicleDistances::new(self.band)))),
        )
    }

    /// Drop every distance state held for `vehicle_id`. Returns whether any existed.
    pub fn reset(&self, vehicle_id: &str) -> bool {
        self.vehicles.write().remove(vehicle_id).is_some()
    }

    pub fn state(&self, vehicle_id: &str, site_id: &str) -> Option<DistanceState> {
        let vehicles = self.vehicles.read();
        let distances = vehicles.get(vehicle_id)?;
        let state = distances.lock().get(site_id).copied();
        state
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_tail(tail: f64) -> DistanceState {
        DistanceState {
            current: tail,
            tail,
            minimum: tail,
        }
    }

    #[test]
    fn first_observation_sets_tail_just_above_current() {
        let mut s = DistanceState::default();
        let (tail, min) = s.observe(50.0, TailBand::default());
        assert!((tail - 51.0).abs() < 1e-9);
        assert_eq!(min, 50.0);
    }

    #[test]
    fn tail_moves_when_outside_band() {
        let mut s = state_with_tail(100.0);
        let (tail, _) = s.observe(97.0, TailBand::default());
        assert!((tail - 98.94).abs() < 1e-9, "tail was {tail}");
    }

    #[test]
    fn tail_holds_inside_band() {
        let mut s = state_with_tail(100.0);
        let (tail, _) = s.observe(99.0, TailBand::default());
        assert_eq!(tail, 100.0);
    }

    #[test]
    fn receding_pulls_tail_below_current() {
        let mut s = state_with_tail(100.0);
        let (tail, _) = s.observe(105.0, TailBand::default());
        assert!((tail - 102.9).abs() < 1e-9);
        assert!(105.0 > tail);
    }

    #[test]
    fn large_jump_starts_new_episode() {
        let mut s = state_with_tail(100.0);
        let (tail, min) = s.observe(200.0, TailBand::default());
        // reset to unbounded, then adapted from scratch
        assert!((tail - 204.0).abs() < 1e-9);
        assert_eq!(min, 200.0);
    }

    #[test]
    fn zero_distance_skips_adaptation() {
        let mut s = DistanceState::default();
        let (tail, min) = s.observe(0.0, TailBand::default());
        assert_eq!(tail, f64::INFINITY);
        assert_eq!(min, 0.0);
    }

    #[test]
    fn reset_drops_vehicle_state() {
        let tracker = DistanceTracker::default();
        tracker.vehicle("V1").lock().update("a", 10.0);
        tracker.vehicle("V2").lock().update("a", 10.0);
        assert!(tracker.state("V1", "a").is_some());

        assert!(tracker.reset("V1"));
        assert!(!tracker.reset("V1"));
        assert!(tracker.state("V1", "a").is_none());
        assert!(tracker.state("V2", "a").is_some());
    }
}
