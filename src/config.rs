//! Configuration loaded from a TOML file
//!
//! Every section and field is optional; anything missing takes the default
//! shown on the corresponding `Default` impl.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub thresholds: ThresholdConfig,
    pub alerts: AlertConfig,
    pub simulator: SimulatorConfig,
    pub sensor: SensorConfig,
}

/// In-memory sample store limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of samples kept
    pub capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { capacity: 525_600 }
    }
}

/// Heart-rate thresholds that raise alerts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Readings below this are reported as low
    pub low_bpm: u32,
    /// Readings above this are reported as high
    pub high_bpm: u32,
    /// Readings above this are treated as a dangerous spike
    pub spike_bpm: u32,
    /// How far back the spike rule looks, in seconds
    pub spike_window_seconds: u64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            low_bpm: 60,
            high_bpm: 100,
            spike_bpm: 140,
            spike_window_seconds: 60,
        }
    }
}

/// Alert dispatch limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertConfig {
    pub rate_limit_per_minute: usize,
    pub max_queue_size: usize,
    /// Opaque address handed to the dispatcher (e.g. a phone number)
    pub recipient: Option<String>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: 3,
            max_queue_size: 100,
            recipient: None,
        }
    }
}

/// Synthetic reading generator parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Seconds between readings in `monitor` mode
    pub interval_seconds: u64,
    /// Starting value of the drifting base rate
    pub initial_rate: f64,
    /// Lower clamp for the drifting base rate
    pub base_min: f64,
    /// Upper clamp for the drifting base rate
    pub base_max: f64,
    /// Probability in `[0, 1]` that a reading carries a spike
    pub spike_chance: f64,
    /// Lowest reading ever produced
    pub floor: f64,
    /// Highest reading ever produced
    pub ceiling: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 10,
            initial_rate: 70.0,
            base_min: 60.0,
            base_max: 100.0,
            spike_chance: 0.1,
            floor: 45.0,
            ceiling: 180.0,
        }
    }
}

/// Remote endpoint readings are posted to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SensorConfig {
    /// e.g. `http://localhost:4000/sensor/heartbeat`; readings stay local when unset
    pub endpoint: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_seconds: 10,
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadError` if the file cannot be read,
    /// `ConfigError::TomlError` if it is not valid TOML for this schema, and
    /// `ConfigError::ValidationError` if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges and cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.capacity == 0 {
            return invalid("store.capacity must be greater than 0");
        }

        let t = &self.thresholds;
        if t.low_bpm >= t.high_bpm {
            return invalid(format!(
                "thresholds.low_bpm ({}) must be below thresholds.high_bpm ({})",
                t.low_bpm, t.high_bpm
            ));
        }
        if t.spike_bpm < t.high_bpm {
            return invalid(format!(
                "thresholds.spike_bpm ({}) must not be below thresholds.high_bpm ({})",
                t.spike_bpm, t.high_bpm
            ));
        }
        if t.spike_window_seconds == 0 {
            return invalid("thresholds.spike_window_seconds must be greater than 0");
        }

        if self.alerts.rate_limit_per_minute == 0 {
            return invalid("alerts.rate_limit_per_minute must be greater than 0");
        }
        if self.alerts.max_queue_size == 0 {
            return invalid("alerts.max_queue_size must be greater than 0");
        }

        let s = &self.simulator;
        if s.interval_seconds == 0 {
            return invalid("simulator.interval_seconds must be greater than 0");
        }
        if !(0.0..=1.0).contains(&s.spike_chance) {
            return invalid(format!(
                "simulator.spike_chance ({}) must be within [0, 1]",
                s.spike_chance
            ));
        }
        if !(s.base_min.is_finite() && s.base_max.is_finite() && s.base_min <= s.base_max) {
            return invalid("simulator.base_min must be finite and not above simulator.base_max");
        }
        if !(s.floor.is_finite() && s.ceiling.is_finite() && 0.0 <= s.floor && s.floor <= s.ceiling)
        {
            return invalid("simulator.floor must be non-negative and not above simulator.ceiling");
        }
        if !s.initial_rate.is_finite() {
            return invalid("simulator.initial_rate must be finite");
        }

        if let Some(ref endpoint) = self.sensor.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return invalid(format!(
                    "sensor.endpoint must be an http(s) URL: {}",
                    endpoint
                ));
            }
        }
        if self.sensor.timeout_seconds == 0 {
            return invalid("sensor.timeout_seconds must be greater than 0");
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> Result<(), ConfigError> {
    Err(ConfigError::ValidationError(message.into()))
}
