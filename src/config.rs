use serde::Deserialize;
use std::{fs, path::PathBuf, time::Duration};

use crate::error::ConfigError;

/// Tuning for the approach/recede filter and the directional weighting.
/// Every field falls back to its default when absent from the file.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Half-width of the band the tail distance trails the current distance by.
    pub tail_fraction: f64,
    /// A relative jump larger than `reset_multiplier * tail_fraction` starts a new episode.
    pub reset_multiplier: f64,
    /// A site counts as "on the way" to a destination when the angle between
    /// them, seen from the vehicle, is below this many degrees.
    pub alignment_angle_deg: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tail_fraction: 0.02,
            reset_multiplier: 10.0,
            alignment_angle_deg: 85.0,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: PathBuf::from(path),
            source,
        })?;
        let cfg: EngineConfig =
            serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
                path: PathBuf::from(path),
                source,
            })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tail_fraction > 0.0 && self.tail_fraction < 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "tail_fraction",
                expected: "in (0, 1)",
                value: self.tail_fraction,
            });
        }
        if !(self.reset_multiplier >= 1.0 && self.reset_multiplier.is_finite()) {
            return Err(ConfigError::OutOfRange {
                name: "reset_multiplier",
                expected: "a finite value >= 1",
                value: self.reset_multiplier,
            });
        }
        if !(0.0..=180.0).contains(&self.alignment_angle_deg) {
            return Err(ConfigError::OutOfRange {
                name: "alignment_angle_deg",
                expected: "in [0, 180]",
                value: self.alignment_angle_deg,
            });
        }
        Ok(())
    }

    pub fn reset_threshold(&self) -> f64 {
        self.reset_multiplier * self.tail_fraction
    }

    pub fn alignment_cosine(&self) -> f64 {
        self.alignment_angle_deg.to_radians().cos()
    }
}

/// Process settings, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub model_path: PathBuf,
    pub port: u16,
    /// `None` disables model polling.
    pub poll_interval: Option<Duration>,
    pub engine_config_path: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model_path = lookup("MODEL_PATH")
            .map(PathBuf::from)
            .ok_or(ConfigError::MissingVar { name: "MODEL_PATH" })?;

        let port = match lookup("PORT") {
            Some(s) => s
                .parse()
                .map_err(|_| ConfigError::InvalidVar { name: "PORT", value: s })?,
            None => 8080,
        };

        let poll_secs: u64 = match lookup("MODEL_POLL_SECS") {
            Some(s) => s.parse().map_err(|_| ConfigError::InvalidVar {
                name: "MODEL_POLL_SECS",
                value: s,
            })?,
            None => 30,
        };
        let poll_interval = (poll_secs > 0).then(|| Duration::from_secs(poll_secs));

        Ok(Self {
            model_path,
            port,
            poll_interval,
            engine_config_path: lookup("ENGINE_CONFIG"),
        })
    }
}
