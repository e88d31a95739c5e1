use std::path::PathBuf;

/// Failure to produce a new model generation. The generation already in
/// service is unaffected.
#[derive(thiserror::Error, Debug)]
pub enum ModelLoadError {
    #[error("failed to read model at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse model at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("vehicle {vehicle_id} appears more than once in the model")]
    DuplicateVehicle { vehicle_id: String },
    #[error("vehicle {vehicle_id} lists site {site_id} more than once")]
    DuplicateSite { vehicle_id: String, site_id: String },
    #[error("vehicle {vehicle_id} site {site_id} has non-finite coordinates")]
    InvalidSite { vehicle_id: String, site_id: String },
}

/// Failure while scoring a single report. Never escapes the enrichment
/// boundary; the report is passed through unenriched instead.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ScoringError {
    #[error("report is not a readable position report: {0}")]
    MalformedReport(String),
    #[error("report for {vehicle_id} has no position")]
    MissingPosition { vehicle_id: String },
    #[error("report for {vehicle_id} has non-finite position ({latitude}, {longitude})")]
    InvalidPosition {
        vehicle_id: String,
        latitude: f64,
        longitude: f64,
    },
    #[error("destination {destination_id} for {vehicle_id} needs finite coordinates and a probability in [0, 1]")]
    InvalidDestination {
        vehicle_id: String,
        destination_id: String,
    },
    #[error("weights for {vehicle_id} became non-finite")]
    NonFiniteWeights { vehicle_id: String },
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{name} must be {expected}, got {value}")]
    OutOfRange {
        name: &'static str,
        expected: &'static str,
        value: f64,
    },
    #[error("environment variable {name} is not set")]
    MissingVar { name: &'static str },
    #[error("environment variable {name} has invalid value {value:?}")]
    InvalidVar { name: &'static str, value: String },
}
