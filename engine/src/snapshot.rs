//! Persistable run state.

use std::sync::Arc;

use gridfort_core::{WaveStatus, WorldSnapshot};
use gridfort_system_waves::Waves;
use gridfort_world::{query, World};
use serde::{Deserialize, Serialize};

use crate::{derive_seed, Engine, EngineError, SimConfig, RNG_STREAM_WAVES};

/// Grid arrays, pools, unlocks, elapsed time and wave counters.
///
/// Enemies, projectiles and drones are not persisted; a restored run resumes
/// with an empty field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// World state.
    pub world: WorldSnapshot,
    /// Wave scheduler counters.
    pub waves: WaveStatus,
}

impl Engine {
    /// Captures the persistable part of the run.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            world: query::snapshot(&self.world),
            waves: self.waves.status(),
        }
    }

    /// Rebuilds an engine from `snapshot` under `config`.
    ///
    /// The game-start moment is not dispatched again.
    pub fn restore(config: SimConfig, snapshot: &GameSnapshot) -> Result<Self, EngineError> {
        config.validate()?;
        let registry = Arc::new(config.registry()?);
        let world = World::restore(config.world.clone(), registry, &snapshot.world)?;
        let waves = Waves::restore(
            config.waves.clone(),
            derive_seed(config.engine.seed, RNG_STREAM_WAVES),
            snapshot.waves,
        );
        log::info!(
            "run restored at {}s, wave {}",
            snapshot.world.elapsed_secs,
            snapshot.waves.wave
        );
        Ok(Self::assemble(config, world, waves))
    }
}
