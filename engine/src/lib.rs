#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick orchestrator wiring the world to every system.
//!
//! Each call to [`Engine::update`] runs one combat frame: movement, then
//! weapons, then projectile and effect resolution. Once per elapsed economic
//! interval it also opens a clock tick and runs settlement, auras and the
//! wave scheduler. Systems only ever see immutable views; all mutation flows
//! through [`gridfort_world::apply`].

mod config;
mod replay;
mod snapshot;

use std::{fmt, sync::Arc};

use gridfort_core::{
    BuildingKind, BuildingView, CellCoord, CellStats, Command, DroneView, EnemyView, Event,
    IncomeBreakdown, ModuleKind, ProjectileSnapshot, Resources, WaveStatus,
};
use gridfort_system_combat::{Battlefield, Combat};
use gridfort_system_economy::{Auras, Economy};
use gridfort_system_movement::Movement;
use gridfort_system_waves::Waves;
use gridfort_world::{self as world, query, World};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub use config::{CombatConfig, ConfigError, EngineConfig, SimConfig};
pub use replay::{Action, ActionLog, LoggedAction};
pub use snapshot::GameSnapshot;

const RNG_STREAM_COMBAT: &str = "combat";
const RNG_STREAM_WAVES: &str = "waves";

/// Errors raised while building or restoring an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The snapshot does not describe a consistent world.
    #[error("snapshot rejected")]
    Snapshot(#[from] gridfort_world::SnapshotError),
}

/// End-of-run figures for hosts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Economic ticks played.
    pub elapsed_secs: u64,
    /// Current (or last) wave number.
    pub wave: u32,
    /// Waves cleared.
    pub waves_cleared: u32,
    /// Enemies killed.
    pub kills: u64,
    /// Structures standing, the core included.
    pub structures: usize,
    /// Ledger contents.
    pub resources: Resources,
    /// Whether the core fell.
    pub game_over: bool,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.game_over { "core destroyed" } else { "core standing" };
        writeln!(f, "{outcome} after {}s", self.elapsed_secs)?;
        writeln!(
            f,
            "wave {} ({} cleared), {} kills, {} structures",
            self.wave, self.waves_cleared, self.kills, self.structures
        )?;
        let pools: Vec<String> = self
            .resources
            .iter()
            .map(|(kind, amount)| format!("{kind:?} {amount:.1}"))
            .collect();
        write!(f, "{}", pools.join(", "))
    }
}

/// Authoritative simulation plus the systems that drive it.
#[derive(Debug)]
pub struct Engine {
    config: SimConfig,
    world: World,
    economy: Economy,
    auras: Auras,
    movement: Movement,
    combat: Combat,
    waves: Waves,
    paused: bool,
    clock_ms: f64,
    last_tick_ms: Option<f64>,
    events: Vec<Event>,
}

impl Engine {
    /// Builds an engine for a fresh run and dispatches the game-start moment.
    pub fn new(config: SimConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let registry = Arc::new(config.registry()?);
        let world = World::new(config.world.clone(), registry);
        let waves = Waves::new(
            config.waves.clone(),
            derive_seed(config.engine.seed, RNG_STREAM_WAVES),
        );
        log::debug!("system streams derived from seed {:#x}", config.engine.seed);
        let mut engine = Self::assemble(config, world, waves);
        engine.apply(Command::StartGame);
        Ok(engine)
    }

    fn assemble(config: SimConfig, world: World, waves: Waves) -> Self {
        Self {
            economy: Economy::new(),
            auras: Auras::new(),
            movement: Movement::new(config.combat.slow_scan_radius),
            combat: Combat::new(derive_seed(config.engine.seed, RNG_STREAM_COMBAT)),
            waves,
            world,
            config,
            paused: false,
            clock_ms: 0.0,
            last_tick_ms: None,
            events: Vec::new(),
        }
    }

    /// Advances one combat frame at `timestamp_ms`, plus one economic tick
    /// when at least one tick interval has passed since the previous one.
    pub fn update(&mut self, timestamp_ms: f64) {
        if self.is_halted() {
            return;
        }
        self.clock_ms = timestamp_ms;
        self.frame(timestamp_ms);

        let last = *self.last_tick_ms.get_or_insert(timestamp_ms);
        if timestamp_ms - last >= self.config.engine.tick_interval_ms {
            self.last_tick_ms = Some(timestamp_ms);
            self.economic_tick();
        }
    }

    /// Plays one economic second headlessly: the configured number of
    /// sub-frames followed by one economic tick.
    pub fn step_second(&mut self) {
        let frames = self.config.engine.frames_per_tick.max(1);
        let frame_ms = self.config.engine.tick_interval_ms / f64::from(frames);
        for _ in 0..frames {
            if self.is_halted() {
                return;
            }
            self.clock_ms += frame_ms;
            self.frame(self.clock_ms);
        }
        if self.is_halted() {
            return;
        }
        self.last_tick_ms = Some(self.clock_ms);
        self.economic_tick();
    }

    /// Plays up to `seconds` economic seconds, stopping early if the core falls.
    ///
    /// Events emitted along the way are discarded; hosts that consume events
    /// step with [`Engine::step_second`] and drain between steps.
    pub fn run_for(&mut self, seconds: u64) {
        let retained = self.events.len();
        for _ in 0..seconds {
            if self.is_halted() {
                break;
            }
            self.step_second();
            self.discard_events_since(retained);
        }
    }

    /// Drops events emitted after the first `retained` ones.
    fn discard_events_since(&mut self, retained: usize) {
        if self.events.len() > retained {
            log::trace!("discarding {} undrained events", self.events.len() - retained);
            self.events.truncate(retained);
        }
    }

    fn is_halted(&self) -> bool {
        self.paused || query::is_game_over(&self.world)
    }

    fn frame(&mut self, now_ms: f64) {
        let mut commands = Vec::new();
        {
            let buildings = query::building_view(&self.world);
            let enemies = query::enemy_view(&self.world);
            self.movement.handle(
                query::registry(&self.world),
                query::grid_size(&self.world),
                query::config(&self.world).level_scaling,
                query::core_cell(&self.world),
                &buildings,
                &enemies,
                now_ms,
                &mut commands,
            );
        }
        self.apply_all(&mut commands);

        {
            let buildings = query::building_view(&self.world);
            let enemies = query::enemy_view(&self.world);
            let drones = query::drone_view(&self.world);
            let field = Battlefield {
                registry: query::registry(&self.world),
                level_scaling: query::config(&self.world).level_scaling,
                buildings: &buildings,
                enemies: &enemies,
                drones: &drones,
                buffs: query::aura_buffs(&self.world),
            };
            self.combat.handle(&field, &mut commands);
        }
        commands.push(Command::AdvanceFrame { now_ms });
        self.apply_all(&mut commands);
    }

    fn economic_tick(&mut self) {
        self.apply(Command::AdvanceClock);
        let level_scaling = query::config(&self.world).level_scaling;
        let grid_size = query::grid_size(&self.world);

        let mut commands = Vec::new();
        let buildings = query::building_view(&self.world);
        self.economy.handle(
            query::registry(&self.world),
            level_scaling,
            &buildings,
            &mut commands,
        );
        self.apply_all(&mut commands);

        let buildings = query::building_view(&self.world);
        self.auras.handle(
            query::registry(&self.world),
            grid_size,
            level_scaling,
            &buildings,
            &mut commands,
        );
        self.apply_all(&mut commands);

        let live = query::live_enemies_in_wave(&self.world, self.waves.status().wave);
        self.waves.handle(
            query::elapsed_secs(&self.world),
            grid_size,
            live,
            &mut commands,
        );
        self.apply_all(&mut commands);
        log::debug!(
            "tick {} settled with {} enemies on the field",
            query::elapsed_secs(&self.world),
            query::enemy_view(&self.world).len()
        );
    }

    fn apply(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.events);
    }

    fn apply_all(&mut self, commands: &mut Vec<Command>) {
        for command in commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
    }

    /// Applies a structural command and reports whether it succeeded.
    fn structural(&mut self, command: Command) -> bool {
        let start = self.events.len();
        self.apply(command);
        self.events[start..].iter().any(is_structural_success)
    }

    /// Places a structure of `kind` on `cell`.
    pub fn place(&mut self, kind: BuildingKind, cell: CellCoord) -> bool {
        self.structural(Command::PlaceBuilding { kind, cell })
    }

    /// Upgrades the structure on `cell` by one level.
    pub fn upgrade(&mut self, cell: CellCoord) -> bool {
        self.structural(Command::UpgradeBuilding { cell })
    }

    /// Removes the structure on `cell` and credits its refund.
    ///
    /// The refund is the configured fraction of the cost invested across
    /// levels, scaled by the multiplier the remove hooks produced.
    pub fn remove(&mut self, cell: CellCoord) -> bool {
        let start = self.events.len();
        self.apply(Command::RemoveBuilding { cell });
        let removed = self.events[start..].iter().find_map(|event| match event {
            Event::BuildingRemoved {
                kind,
                level,
                refund_multiplier,
                ..
            } => Some((*kind, *level, *refund_multiplier)),
            _ => None,
        });
        let Some((kind, level, multiplier)) = removed else {
            return false;
        };
        let amount = query::registry(&self.world)
            .refund_basis(kind, level)
            .scaled(self.config.engine.refund_fraction * multiplier);
        log::debug!("refunding {amount:?} for {kind:?} at {cell:?}");
        self.apply(Command::Refund { amount });
        true
    }

    /// Installs `module` on the structure at `cell`.
    pub fn install_module(&mut self, cell: CellCoord, module: ModuleKind) -> bool {
        self.structural(Command::InstallModule { cell, module })
    }

    /// Uninstalls the module on the structure at `cell`.
    pub fn uninstall_module(&mut self, cell: CellCoord) -> bool {
        self.structural(Command::UninstallModule { cell })
    }

    /// Researches a locked building kind.
    pub fn unlock_building(&mut self, kind: BuildingKind) -> bool {
        self.structural(Command::UnlockBuilding { kind })
    }

    /// Multiplier produced by dispatching the prestige moment to every structure.
    #[must_use]
    pub fn prestige_multiplier(&self) -> f64 {
        query::prestige_multiplier(&self.world)
    }

    /// Suspends or resumes simulation advancement.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Reports whether advancement is suspended.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Removes and returns every event emitted since the previous drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Configuration the engine was built with.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Read access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Current ledger.
    #[must_use]
    pub fn resources(&self) -> Resources {
        query::resources(&self.world)
    }

    /// Income attribution of the latest economic tick.
    #[must_use]
    pub fn income(&self) -> &IncomeBreakdown {
        query::income(&self.world)
    }

    /// Damage and kills credited to `cell`.
    #[must_use]
    pub fn cell_stats(&self, cell: CellCoord) -> CellStats {
        query::cell_stats(&self.world, cell)
    }

    /// Every structure, row-major.
    #[must_use]
    pub fn buildings(&self) -> BuildingView {
        query::building_view(&self.world)
    }

    /// Every live enemy, by id.
    #[must_use]
    pub fn enemies(&self) -> EnemyView {
        query::enemy_view(&self.world)
    }

    /// Every projectile in flight, by id.
    #[must_use]
    pub fn projectiles(&self) -> Vec<ProjectileSnapshot> {
        query::projectiles(&self.world)
    }

    /// Every drone, by id.
    #[must_use]
    pub fn drones(&self) -> DroneView {
        query::drone_view(&self.world)
    }

    /// Cell holding the core.
    #[must_use]
    pub fn core_cell(&self) -> CellCoord {
        query::core_cell(&self.world)
    }

    /// Wave scheduler counters.
    #[must_use]
    pub fn wave_status(&self) -> WaveStatus {
        self.waves.status()
    }

    /// Economic ticks played.
    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        query::elapsed_secs(&self.world)
    }

    /// Reports whether the core fell.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        query::is_game_over(&self.world)
    }

    /// Figures describing the run so far.
    #[must_use]
    pub fn summary(&self) -> Summary {
        let status = self.waves.status();
        Summary {
            elapsed_secs: self.elapsed_secs(),
            wave: status.wave,
            waves_cleared: status.cleared,
            kills: query::kills(&self.world),
            structures: query::building_view(&self.world).len(),
            resources: self.resources(),
            game_over: self.is_game_over(),
        }
    }
}

fn is_structural_success(event: &Event) -> bool {
    matches!(
        event,
        Event::BuildingPlaced { .. }
            | Event::BuildingUpgraded { .. }
            | Event::BuildingRemoved { .. }
            | Event::ModuleInstalled { .. }
            | Event::ModuleUninstalled { .. }
            | Event::BuildingUnlocked { .. }
    )
}

fn derive_seed(master: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(master.to_le_bytes());
    hasher.update(label.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
