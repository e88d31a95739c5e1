use indexmap::IndexMap;
use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};

use crate::{error::ModelLoadError, types::Point};

/// One historically visited site of a vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteDescriptor {
    pub id: String,
    pub position: Point,
    pub count: u32,
}

/// Every known site of one vehicle, keyed by site id in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleModel {
    pub vehicle_id: String,
    pub sites: IndexMap<String, SiteDescriptor>,
}

/// The historical visitation model for all vehicles. Immutable once built;
/// a reload produces a new `SiteModel` rather than mutating this one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteModel {
    vehicles: HashMap<String, VehicleModel>,
}

// ---------- On-disk layout ----------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VehicleRecord {
    #[serde(alias = "vin")]
    vehicle_id: String,
    sites: SiteRecords,
}

// Sites are either keyed by id, or (older files) a list carrying an optional name.
#[derive(Deserialize)]
#[serde(untagged)]
enum SiteRecords {
    Keyed(IndexMap<String, SiteRecord>),
    Listed(Vec<NamedSiteRecord>),
}

#[derive(Deserialize)]
struct SiteRecord {
    latitude: f64,
    longitude: f64,
    count: u32,
}

#[derive(Deserialize)]
struct NamedSiteRecord {
    name: Option<String>,
    latitude: f64,
    longitude: f64,
    count: u32,
}

impl SiteModel {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ModelLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let records: Vec<VehicleRecord> =
            serde_json::from_str(&data).map_err(|source| ModelLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_records(records)
    }

    /// Parse a model from JSON text; used by tests and embedders that do
    /// their own I/O.
    pub fn from_json(json: &str) -> Result<Self, ModelLoadError> {
        let records: Vec<VehicleRecord> =
            serde_json::from_str(json).map_err(|source| ModelLoadError::Parse {
                path: "<inline>".into(),
                source,
            })?;
        Self::from_records(records)
    }

    fn from_records(records: Vec<VehicleRecord>) -> Result<Self, ModelLoadError> {
        let mut vehicles = HashMap::with_capacity(records.len());
        for record in records {
            let vehicle = VehicleModel::from_record(record)?;
            if vehicles.contains_key(&vehicle.vehicle_id) {
                return Err(ModelLoadError::DuplicateVehicle {
                    vehicle_id: vehicle.vehicle_id,
                });
            }
            vehicles.insert(vehicle.vehicle_id.clone(), vehicle);
        }
        Ok(Self { vehicles })
    }

    pub fn from_vehicles<I: IntoIterator<Item = VehicleModel>>(vehicles: I) -> Self {
        Self {
            vehicles: vehicles
                .into_iter()
                .map(|v| (v.vehicle_id.clone(), v))
                .collect(),
        }
    }

    pub fn lookup(&self, vehicle_id: &str) -> Option<&VehicleModel> {
        self.vehicles.get(vehicle_id)
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}

impl VehicleModel {
    pub fn new(vehicle_id: &str) -> Self {
        Self {
            vehicle_id: vehicle_id.to_string(),
            sites: IndexMap::new(),
        }
    }

    pub fn with_site(mut self, site_id: &str, latitude: f64, longitude: f64, count: u32) -> Self {
        self.sites.insert(
            site_id.to_string(),
            SiteDescriptor {
                id: site_id.to_string(),
                position: Point::new(latitude, longitude),
                count,
            },
        );
        self
    }

    fn from_record(record: VehicleRecord) -> Result<Self, ModelLoadError> {
        let vehicle_id = record.vehicle_id;
        let entries: Vec<(String, Point, u32)> = match record.sites {
            SiteRecords::Keyed(map) => map
                .into_iter()
                .map(|(id, s)| (id, Point::new(s.latitude, s.longitude), s.count))
                .collect(),
            // unnamed list entries are identified by their position
            SiteRecords::Listed(list) => list
                .into_iter()
                .enumerate()
                .map(|(i, s)| {
                    let id = s.name.unwrap_or_else(|| i.to_string());
                    (id, Point::new(s.latitude, s.longitude), s.count)
                })
                .collect(),
        };

        let mut sites = IndexMap::with_capacity(entries.len());
        for (id, position, count) in entries {
            if !position.is_finite() {
                return Err(ModelLoadError::InvalidSite {
                    vehicle_id,
                    site_id: id,
                });
            }
            if sites.contains_key(&id) {
                return Err(ModelLoadError::DuplicateSite {
                    vehicle_id,
                    site_id: id,
                });
            }
            sites.insert(id.clone(), SiteDescriptor { id, position, count });
        }

        Ok(Self { vehicle_id, sites })
    }
}
