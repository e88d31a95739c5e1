use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Site id -> probability, in the order the vehicle's model lists its sites.
pub type SitePredictions = IndexMap<String, SiteProbability>;

/// A (latitude, longitude) pair treated as planar coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// The fields of an upstream position report this engine reads. The report
/// itself travels as raw JSON so everything else is emitted untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionReport {
    #[serde(default, alias = "vin")]
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    // upstream serializers write an absent map as null
    #[serde(default, deserialize_with = "null_as_default")]
    pub destination_predictions: IndexMap<String, DestinationPrediction>,
}

impl PositionReport {
    pub fn new(vehicle_id: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            vehicle_id: Some(vehicle_id.to_string()),
            latitude: Some(latitude),
            longitude: Some(longitude),
            ..Self::default()
        }
    }

    pub fn with_destination(mut self, id: &str, destination: DestinationPrediction) -> Self {
        self.destination_predictions.insert(id.to_string(), destination);
        self
    }

    pub fn position(&self) -> Option<Point> {
        Some(Point::new(self.latitude?, self.longitude?))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An externally computed candidate final destination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DestinationPrediction {
    pub latitude: f64,
    pub longitude: f64,
    pub probability: f64,
}

impl DestinationPrediction {
    pub fn new(latitude: f64, longitude: f64, probability: f64) -> Self {
        Self {
            latitude,
            longitude,
            probability,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SiteProbability {
    pub latitude: f64,
    pub longitude: f64,
    pub probability: f64,
}

impl SiteProbability {
    pub fn position(&self) -> Point {
        Point::new(self.latitude, self.longitude)
    }
}
