//! Configuration loading and typed config structures for the Clutch
//! simulation.
//!
//! The configuration lives in `clutch-config.yaml`. This module defines
//! strongly-typed structs mirroring the YAML structure and a loader that
//! reads, overrides, and validates it. Every field has a default matching
//! the reference scenario: three eggs seeded at -10.1, 0.01, and 0.05,
//! incubated at a constant 30 degrees.

use std::path::Path;

use clutch_embryo::PhysiologyConfig;
use serde::Deserialize;
use tracing::warn;

use crate::cluster::{ClusterSettings, CouplingRule, DEFAULT_WARMUP_ITERATIONS, MIN_CLUSTER_SIZE};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "CLUTCH_CONFIG";

/// Default configuration file name, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "clutch-config.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an unusable simulation.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Cluster composition and incubation conditions.
    #[serde(default)]
    pub incubation: IncubationConfig,

    /// Pipping and hatching thresholds.
    #[serde(default)]
    pub physiology: PhysiologyConfig,

    /// Run bounds and pacing.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Logging and report output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `CLUTCH_ROOM_TEMPERATURE` overrides `incubation.room_temperature`
    /// - `CLUTCH_SEED` overrides `incubation.seed`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process
    /// environment). Unparseable values are logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup("CLUTCH_ROOM_TEMPERATURE") {
            match raw.trim().parse::<f64>() {
                Ok(value) => self.incubation.room_temperature = value,
                Err(e) => warn!(value = %raw, error = %e, "ignoring CLUTCH_ROOM_TEMPERATURE"),
            }
        }
        if let Some(raw) = lookup("CLUTCH_SEED") {
            match raw.trim().parse::<u64>() {
                Ok(value) => self.incubation.seed = Some(value),
                Err(e) => warn!(value = %raw, error = %e, "ignoring CLUTCH_SEED"),
            }
        }
    }

    /// Reject configurations that cannot build a cluster.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.incubation.room_temperature.is_finite() {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "incubation.room_temperature must be finite, got {}",
                    self.incubation.room_temperature
                ),
            });
        }
        if self.incubation.seed_stages.len() < MIN_CLUSTER_SIZE {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "incubation.seed_stages needs at least {MIN_CLUSTER_SIZE} entries, got {}",
                    self.incubation.seed_stages.len()
                ),
            });
        }
        if self.incubation.seed_stages.iter().any(|stage| !stage.is_finite()) {
            return Err(ConfigError::Invalid {
                reason: "incubation.seed_stages must all be finite".to_owned(),
            });
        }
        self.physiology
            .validate()
            .map_err(|e| ConfigError::Invalid {
                reason: e.to_string(),
            })
    }

    /// Cluster tunables derived from this configuration.
    pub const fn cluster_settings(&self) -> ClusterSettings {
        ClusterSettings {
            physiology: self.physiology,
            warmup_iterations: self.incubation.warmup_iterations,
            coupling: self.incubation.coupling,
        }
    }
}

/// Cluster composition and incubation conditions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IncubationConfig {
    /// Ambient temperature driving development and metabolism.
    #[serde(default = "default_room_temperature")]
    pub room_temperature: f64,

    /// Initial stage of each egg, in cluster order.
    #[serde(default = "default_seed_stages")]
    pub seed_stages: Vec<f64>,

    /// Random seed for reproducible runs. Unset means OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Ticks before pipping checks begin.
    #[serde(default = "default_warmup_iterations")]
    pub warmup_iterations: u64,

    /// Neighbour coupling rule.
    #[serde(default)]
    pub coupling: CouplingRule,
}

impl Default for IncubationConfig {
    fn default() -> Self {
        Self {
            room_temperature: default_room_temperature(),
            seed_stages: default_seed_stages(),
            seed: None,
            warmup_iterations: default_warmup_iterations(),
            coupling: CouplingRule::default(),
        }
    }
}

/// Run bounds and pacing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Maximum number of ticks before the run ends (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Real-time milliseconds between ticks when not interactive.
    #[serde(default)]
    pub tick_interval_ms: u64,

    /// Wait for the operator before every tick.
    #[serde(default = "default_true")]
    pub interactive: bool,

    /// End the run once every egg has hatched.
    #[serde(default = "default_true")]
    pub stop_when_all_hatched: bool,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            max_ticks: 0,
            tick_interval_ms: 0,
            interactive: true,
            stop_when_all_hatched: true,
        }
    }
}

/// How the driver writes its per-tick report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// Human-readable text blocks.
    #[default]
    Text,
    /// One JSON object per tick.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG`
    /// is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Report output format.
    #[serde(default)]
    pub report_format: ReportFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            report_format: ReportFormat::default(),
        }
    }
}

const fn default_room_temperature() -> f64 {
    30.0
}

fn default_seed_stages() -> Vec<f64> {
    vec![-10.1, 0.01, 0.05]
}

const fn default_warmup_iterations() -> u64 {
    DEFAULT_WARMUP_ITERATIONS
}

const fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_owned()
}
