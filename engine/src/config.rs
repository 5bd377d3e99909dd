//! Run configuration loaded from TOML.

use std::{fs, path::Path, path::PathBuf};

use gridfort_core::DEFAULT_FRAMES_PER_TICK;
use gridfort_registry::{BuildingOverride, Registry, RegistryError};
use gridfort_system_movement::DEFAULT_SLOW_SCAN_RADIUS;
use gridfort_system_waves::WaveConfig;
use gridfort_world::WorldConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Complete configuration of a run.
///
/// Every section is optional in the TOML source; omitted fields take their
/// defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Grid, ledger and entity tuning.
    pub world: WorldConfig,
    /// Combat-frame tuning.
    pub combat: CombatConfig,
    /// Wave scheduler tuning.
    pub waves: WaveConfig,
    /// Orchestrator settings.
    pub engine: EngineConfig,
    /// Stat overrides applied to the standard catalog, in order.
    pub buildings: Vec<BuildingOverride>,
}

/// Combat-frame tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Reach, in cells, of the slow-field scan around each enemy.
    pub slow_scan_radius: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            slow_scan_radius: DEFAULT_SLOW_SCAN_RADIUS,
        }
    }
}

/// Orchestrator settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Combat frames synthesised per economic tick by headless stepping.
    pub frames_per_tick: u32,
    /// Minimum timestamp delta, in milliseconds, between economic ticks.
    pub tick_interval_ms: f64,
    /// Master seed from which every system stream is derived.
    pub seed: u64,
    /// Share of the invested cost returned on removal.
    pub refund_fraction: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frames_per_tick: DEFAULT_FRAMES_PER_TICK,
            tick_interval_ms: 1000.0,
            seed: 0x6772_6964_666f_7274,
            refund_fraction: 0.5,
        }
    }
}

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// The TOML source is malformed or has unknown fields.
    #[error("failed to parse configuration")]
    Parse(#[from] toml::de::Error),
    /// A building override was rejected by the registry.
    #[error("invalid building override")]
    Registry(#[from] RegistryError),
    /// A value lies outside its accepted range.
    #[error("{field} {reason}")]
    OutOfRange {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Accepted range.
        reason: &'static str,
    },
}

impl SimConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks the ranges the simulation relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            (self.world.grid_size >= 3, "world.grid_size", "must be at least 3"),
            (self.world.max_level >= 1, "world.max_level", "must be at least 1"),
            (
                self.world.contact_interval_ms >= 0.0,
                "world.contact_interval_ms",
                "must not be negative",
            ),
            (
                self.combat.slow_scan_radius >= 0.0,
                "combat.slow_scan_radius",
                "must not be negative",
            ),
            (
                self.engine.frames_per_tick > 0,
                "engine.frames_per_tick",
                "must be positive",
            ),
            (
                self.engine.tick_interval_ms > 0.0,
                "engine.tick_interval_ms",
                "must be positive",
            ),
            (
                (0.0..=1.0).contains(&self.engine.refund_fraction),
                "engine.refund_fraction",
                "must lie in [0, 1]",
            ),
            (
                self.waves.max_spawns_per_step > 0,
                "waves.max_spawns_per_step",
                "must be positive",
            ),
            (
                self.waves.min_delay_secs > 0.0,
                "waves.min_delay_secs",
                "must be positive",
            ),
        ];
        match checks.iter().find(|(valid, _, _)| !*valid) {
            Some(&(_, field, reason)) => Err(ConfigError::OutOfRange { field, reason }),
            None => Ok(()),
        }
    }

    /// Standard catalog with this configuration's overrides applied.
    pub fn registry(&self) -> Result<Registry, ConfigError> {
        let mut registry = Registry::standard();
        registry.apply_overrides(&self.buildings)?;
        Ok(registry)
    }
}
