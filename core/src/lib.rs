#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gridfort engine.
//!
//! This crate defines the message surface that connects the host, the
//! authoritative world, and pure systems. Systems read immutable views and
//! describe desired mutations as [`Command`] values, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! describing what actually happened. Nothing here owns state.

mod enemies;
mod resources;

pub use enemies::{EnemyKind, EnemyStats};
pub use glam::Vec2;
pub use resources::{ResourceKind, Resources};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of combat frames resolved per economic tick in a headless run.
pub const DEFAULT_FRAMES_PER_TICK: u32 = 60;

/// Scales a per-level quantity: `1 + (level - 1) * scaling`.
///
/// Level 0 (unoccupied) and level 1 both yield `1.0`.
#[must_use]
pub fn level_multiplier(level: u32, scaling: f32) -> f32 {
    1.0 + level.saturating_sub(1) as f32 * scaling
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an in-flight projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a hangar drone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DroneId(u32);

impl DroneId {
    /// Creates a new drone identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Sort key that orders cells row by row.
    #[must_use]
    pub const fn row_major_key(&self) -> (u32, u32) {
        (self.row, self.column)
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Continuous coordinates of the cell's centre, in cell units.
    #[must_use]
    pub fn center(self) -> Vec2 {
        Vec2::new(self.column as f32 + 0.5, self.row as f32 + 0.5)
    }

    /// Resolves the cell containing `point`, if it lies inside a grid of `grid_size`.
    #[must_use]
    pub fn containing(point: Vec2, grid_size: u32) -> Option<CellCoord> {
        if !point.x.is_finite() || !point.y.is_finite() || point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let column = point.x.floor() as u32;
        let row = point.y.floor() as u32;
        if column < grid_size && row < grid_size {
            Some(CellCoord::new(column, row))
        } else {
            None
        }
    }
}

/// Enumerates, in row-major order, the cells whose centres lie within
/// `radius` of `center`.
///
/// The scan window is clamped to the grid before any coordinate is produced,
/// so callers can index with the results without further bounds checks.
pub fn cells_within(center: Vec2, radius: f32, grid_size: u32) -> impl Iterator<Item = CellCoord> {
    let radius = if radius.is_finite() { radius.max(0.0) } else { 0.0 };
    let (column_start, column_end) = clamp_axis(center.x, radius, grid_size);
    let (row_start, row_end) = clamp_axis(center.y, radius, grid_size);
    (row_start..row_end)
        .flat_map(move |row| (column_start..column_end).map(move |column| CellCoord::new(column, row)))
        .filter(move |cell| cell.center().distance(center) <= radius)
}

fn clamp_axis(value: f32, radius: f32, grid_size: u32) -> (u32, u32) {
    let limit = grid_size as f32;
    let start = (value - radius).floor().clamp(0.0, limit);
    let end = ((value + radius).floor() + 1.0).clamp(0.0, limit);
    (start as u32, end as u32)
}

/// Kinds of structure that can occupy a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildingKind {
    /// The singular core the player defends.
    Core,
    /// Cheap energy producer.
    SolarPanel,
    /// Burns matter into a large energy yield.
    Generator,
    /// Ore-bound matter extractor.
    Extractor,
    /// Ore-bound heavy matter extractor.
    DeepDrill,
    /// Refines matter into alloy.
    Smelter,
    /// Refines alloy into polymer.
    Fabricator,
    /// Refines polymer into quantum matter.
    QuantumLab,
    /// Inert blocker with a deep health pool.
    Wall,
    /// Single-target projectile weapon.
    Turret,
    /// Projectile weapon with an area payload.
    Cannon,
    /// Instant weapon striking several targets at once.
    TeslaCoil,
    /// Focus beam whose damage ramps while locked on.
    Laser,
    /// Periodic line beam piercing everything along its ray.
    Railgun,
    /// Periodic radial blast that needs no target.
    PulseEmitter,
    /// Pulls and slows everything in range without dealing damage.
    GravityWell,
    /// Launches and directs drones.
    Hangar,
    /// Slows enemies passing near it.
    FrostTower,
    /// Heals nearby structures.
    RepairStation,
    /// Recharges shields on nearby structures.
    ShieldGenerator,
    /// Extends the range of nearby weapons.
    Radar,
    /// Raises the damage of every weapon.
    WarBeacon,
    /// Raises the fire rate of every weapon.
    Overclocker,
    /// Heals every structure at once.
    Nanoforge,
}

impl BuildingKind {
    /// Every building kind in registry order.
    pub const ALL: [BuildingKind; 24] = [
        Self::Core,
        Self::SolarPanel,
        Self::Generator,
        Self::Extractor,
        Self::DeepDrill,
        Self::Smelter,
        Self::Fabricator,
        Self::QuantumLab,
        Self::Wall,
        Self::Turret,
        Self::Cannon,
        Self::TeslaCoil,
        Self::Laser,
        Self::Railgun,
        Self::PulseEmitter,
        Self::GravityWell,
        Self::Hangar,
        Self::FrostTower,
        Self::RepairStation,
        Self::ShieldGenerator,
        Self::Radar,
        Self::WarBeacon,
        Self::Overclocker,
        Self::Nanoforge,
    ];

    /// Position of the kind within [`BuildingKind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Installable upgrade modules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleKind {
    /// Multiplies weapon damage.
    DamageAmplifier,
    /// Lowers the fire probability threshold.
    RapidFire,
    /// Extends weapon range.
    RangeExtender,
    /// Arcs hits to nearby enemies.
    ChainLightning,
    /// Slows enemies on hit.
    CryoRounds,
    /// Hits ignore enemy shields.
    ArmorPiercing,
    /// Raises kill rewards.
    Salvager,
    /// Boosts production at a higher consumption.
    Overcharge,
    /// Lowers consumption.
    Efficiency,
    /// Raises extracted matter.
    OreRefiner,
    /// Extends aura radius.
    AuraAmplifier,
    /// Reduces incoming contact damage.
    Plating,
}

impl ModuleKind {
    /// Every module kind in registry order.
    pub const ALL: [ModuleKind; 12] = [
        Self::DamageAmplifier,
        Self::RapidFire,
        Self::RangeExtender,
        Self::ChainLightning,
        Self::CryoRounds,
        Self::ArmorPiercing,
        Self::Salvager,
        Self::Overcharge,
        Self::Efficiency,
        Self::OreRefiner,
        Self::AuraAmplifier,
        Self::Plating,
    ];

    /// Position of the kind within [`ModuleKind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Contents of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tile {
    /// Buildable, traversable ground.
    Empty,
    /// Ore deposit required by extractor kinds; traversable.
    Ore,
    /// Occupied by a structure.
    Building(BuildingKind),
}

/// Timed movement penalty applied to an enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlowEffect {
    /// Speed multiplier while active; lower is slower.
    pub factor: f32,
    /// Remaining combat frames.
    pub frames: u32,
}

impl SlowEffect {
    /// Combines two effects, keeping the stronger factor and the longer duration.
    #[must_use]
    pub fn merge(self, other: SlowEffect) -> SlowEffect {
        SlowEffect {
            factor: self.factor.min(other.factor),
            frames: self.frames.max(other.frames),
        }
    }
}

/// Immutable representation of an occupied cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildingSnapshot {
    /// Cell the structure occupies.
    pub cell: CellCoord,
    /// Kind of structure.
    pub kind: BuildingKind,
    /// Current upgrade level, at least 1.
    pub level: u32,
    /// Current health.
    pub health: f32,
    /// Maximum health at the current level.
    pub max_health: f32,
    /// Current shield pool.
    pub shield: f32,
    /// Installed module, if any.
    pub module: Option<ModuleKind>,
    /// Whether the last economic pass covered the structure's consumption.
    pub powered: bool,
}

/// Read-only snapshot describing every structure in row-major order.
#[derive(Clone, Debug, Default)]
pub struct BuildingView {
    snapshots: Vec<BuildingSnapshot>,
}

impl BuildingView {
    /// Creates a new building view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<BuildingSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.cell.row_major_key());
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &BuildingSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the structure occupying `cell`.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Option<&BuildingSnapshot> {
        self.snapshots
            .binary_search_by_key(&cell.row_major_key(), |snapshot| snapshot.cell.row_major_key())
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of structures captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no structures.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<BuildingSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Archetype of the enemy.
    pub kind: EnemyKind,
    /// Continuous position in cell units.
    pub position: Vec2,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Current shield pool.
    pub shield: f32,
    /// Maximum shield pool.
    pub max_shield: f32,
    /// Unslowed distance per frame, in cells.
    pub speed: f32,
    /// Wave that released the enemy, if spawned by the discrete scheduler.
    pub wave: Option<u32>,
    /// Active timed slow, if any.
    pub slow: Option<SlowEffect>,
}

/// Read-only snapshot describing every enemy in ascending id order.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up an enemy by identifier.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of enemies captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Immutable representation of a drone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DroneSnapshot {
    /// Unique identifier of the drone.
    pub id: DroneId,
    /// Hangar cell that launched the drone.
    pub hangar: CellCoord,
    /// Continuous position in cell units.
    pub position: Vec2,
}

/// Read-only snapshot describing every drone in ascending id order.
#[derive(Clone, Debug, Default)]
pub struct DroneView {
    snapshots: Vec<DroneSnapshot>,
}

impl DroneView {
    /// Creates a new drone view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<DroneSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &DroneSnapshot> {
        self.snapshots.iter()
    }

    /// Number of drones captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no drones.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Immutable representation of an in-flight projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Unique identifier of the projectile.
    pub id: ProjectileId,
    /// Cell that fired the projectile.
    pub source: CellCoord,
    /// Enemy targeted at launch.
    pub target: EnemyId,
    /// Current position.
    pub position: Vec2,
    /// Target position captured at launch.
    pub destination: Vec2,
    /// Payload damage.
    pub damage: f32,
    /// Area radius; zero for single-target payloads.
    pub splash_radius: f32,
}

/// Buffs derived by the aura pass and consumed by combat every frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuraBuffs {
    range_bonus: Vec<(CellCoord, f32)>,
    /// Fractional damage bonus applied to every weapon.
    pub global_damage: f32,
    /// Amount subtracted from every weapon's fire probability.
    pub global_fire_rate: f32,
}

impl AuraBuffs {
    /// Creates a buff set from per-cell range bonuses and global modifiers.
    #[must_use]
    pub fn new(mut range_bonus: Vec<(CellCoord, f32)>, global_damage: f32, global_fire_rate: f32) -> Self {
        range_bonus.sort_by_key(|(cell, _)| cell.row_major_key());
        range_bonus.dedup_by_key(|(cell, _)| *cell);
        Self {
            range_bonus,
            global_damage,
            global_fire_rate,
        }
    }

    /// Range bonus granted to the weapon at `cell`.
    #[must_use]
    pub fn range_bonus(&self, cell: CellCoord) -> f32 {
        self.range_bonus
            .binary_search_by_key(&cell.row_major_key(), |(candidate, _)| candidate.row_major_key())
            .map_or(0.0, |index| self.range_bonus[index].1)
    }
}

/// Combat analytics accumulated per cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CellStats {
    /// Total health and shield removed from enemies by the cell.
    pub damage_dealt: f64,
    /// Enemies killed by the cell.
    pub kills: u32,
}

/// Attribution of the most recent economic pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IncomeBreakdown {
    /// Resources produced by powered structures.
    pub produced: Resources,
    /// Resources consumed by powered structures.
    pub consumed: Resources,
    /// Net contribution per building kind, ordered by kind.
    pub by_kind: Vec<(BuildingKind, Resources)>,
}

impl IncomeBreakdown {
    /// Net change of every pool across the pass.
    #[must_use]
    pub fn net(&self) -> Resources {
        let mut net = self.produced;
        net.spend(&self.consumed);
        net
    }

    /// Records a settled structure's contribution.
    pub fn record(&mut self, kind: BuildingKind, consumed: &Resources, produced: &Resources) {
        self.produced.add(produced);
        self.consumed.add(consumed);
        let mut net = *produced;
        net.spend(consumed);
        match self.by_kind.binary_search_by_key(&kind, |(entry, _)| *entry) {
            Ok(index) => self.by_kind[index].1.add(&net),
            Err(index) => self.by_kind.insert(index, (kind, net)),
        }
    }
}

/// Scheduling mode selected at game start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaveMode {
    /// Enemies trickle in at a rate that grows with elapsed time.
    Continuous,
    /// Build phases alternate with numbered waves.
    #[default]
    Discrete,
}

/// Current stage of the wave scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WavePhase {
    /// Continuous mode before spawning starts.
    Warmup,
    /// Continuous mode while spawning.
    Continuous,
    /// Discrete mode countdown before the next wave.
    Build {
        /// Economic ticks left before the wave begins.
        remaining_secs: u32,
    },
    /// Discrete mode while a wave is being released or fought.
    Spawning,
}

/// Wave counters exposed to the host and persisted in snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaveStatus {
    /// Active scheduling mode.
    pub mode: WaveMode,
    /// Current (or most recent) wave number; zero before the first wave.
    pub wave: u32,
    /// Scheduler stage.
    pub phase: WavePhase,
    /// Enemies released for the current wave.
    pub spawned: u32,
    /// Enemies the current wave will release in total.
    pub target: u32,
    /// Waves completed so far.
    pub cleared: u32,
}

/// Reasons a placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    /// The run has ended.
    #[error("the run is over")]
    GameOver,
    /// The requested cell lies outside the grid.
    #[error("cell is outside the grid")]
    OutOfBounds,
    /// The requested cell already holds a structure.
    #[error("cell is occupied")]
    Occupied,
    /// The core can be neither placed nor overwritten.
    #[error("the core cannot be placed or overwritten")]
    CoreProtected,
    /// The kind must sit on an ore deposit.
    #[error("this structure requires an ore deposit")]
    RequiresOre,
    /// The kind's population cap is reached.
    #[error("population cap reached")]
    PopulationCap,
    /// The kind has not been unlocked yet.
    #[error("structure is locked")]
    Locked,
    /// The ledger cannot cover the cost.
    #[error("insufficient resources")]
    InsufficientFunds,
}

/// Reasons an upgrade request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum UpgradeError {
    /// The run has ended.
    #[error("the run is over")]
    GameOver,
    /// The requested cell lies outside the grid.
    #[error("cell is outside the grid")]
    OutOfBounds,
    /// The cell holds no structure.
    #[error("cell holds no structure")]
    NotABuilding,
    /// The structure is already at the level cap.
    #[error("level cap reached")]
    LevelCap,
    /// The ledger cannot cover the cost.
    #[error("insufficient resources")]
    InsufficientFunds,
}

/// Reasons a module install or uninstall may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum ModuleError {
    /// The run has ended.
    #[error("the run is over")]
    GameOver,
    /// The requested cell lies outside the grid.
    #[error("cell is outside the grid")]
    OutOfBounds,
    /// The cell holds no structure.
    #[error("cell holds no structure")]
    NotABuilding,
    /// A module is already installed.
    #[error("a module is already installed")]
    AlreadyInstalled,
    /// The module does not list the structure's kind.
    #[error("module does not apply to this structure")]
    NotApplicable,
    /// No module is installed.
    #[error("no module installed")]
    NoModule,
    /// The ledger cannot cover the cost.
    #[error("insufficient resources")]
    InsufficientFunds,
}

/// Reasons a removal request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum RemovalError {
    /// The run has ended.
    #[error("the run is over")]
    GameOver,
    /// The requested cell lies outside the grid.
    #[error("cell is outside the grid")]
    OutOfBounds,
    /// The cell holds no structure.
    #[error("cell holds no structure")]
    NotABuilding,
    /// The core can never be removed.
    #[error("the core cannot be removed")]
    CoreProtected,
}

/// Reasons an unlock request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum UnlockError {
    /// The kind is already available.
    #[error("already unlocked")]
    AlreadyUnlocked,
    /// The ledger cannot cover the research cost.
    #[error("insufficient resources")]
    InsufficientFunds,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Dispatches the game-start moment to every structure.
    StartGame,
    /// Requests placement of a structure.
    PlaceBuilding {
        /// Kind of structure to construct.
        kind: BuildingKind,
        /// Target cell.
        cell: CellCoord,
    },
    /// Requests a one-level upgrade.
    UpgradeBuilding {
        /// Cell holding the structure.
        cell: CellCoord,
    },
    /// Requests removal of a structure.
    RemoveBuilding {
        /// Cell holding the structure.
        cell: CellCoord,
    },
    /// Requests installation of a module.
    InstallModule {
        /// Cell holding the structure.
        cell: CellCoord,
        /// Module to install.
        module: ModuleKind,
    },
    /// Requests removal of the installed module.
    UninstallModule {
        /// Cell holding the structure.
        cell: CellCoord,
    },
    /// Requests research of a locked building kind.
    UnlockBuilding {
        /// Kind to unlock.
        kind: BuildingKind,
    },
    /// Credits a removal refund computed by the host.
    Refund {
        /// Resources returned to the ledger.
        amount: Resources,
    },
    /// Opens a new economic tick.
    AdvanceClock,
    /// Settles one structure's consumption and production.
    SettleBuilding {
        /// Cell holding the structure.
        cell: CellCoord,
        /// Resources the structure needs this tick.
        consumption: Resources,
        /// Resources the structure yields when its consumption is covered.
        income: Resources,
    },
    /// Restores health on a structure.
    RepairCell {
        /// Target cell.
        cell: CellCoord,
        /// Health restored.
        amount: f32,
    },
    /// Adds to a structure's shield, up to its cap.
    ChargeShield {
        /// Target cell.
        cell: CellCoord,
        /// Shield added.
        amount: f32,
    },
    /// Replaces the buffs consumed by combat.
    SetAuraBuffs {
        /// Buffs computed by the aura pass.
        buffs: AuraBuffs,
    },
    /// Creates a new enemy.
    SpawnEnemy {
        /// Archetype to spawn.
        kind: EnemyKind,
        /// Spawn position.
        position: Vec2,
        /// Discrete wave tag, if any.
        wave: Option<u32>,
        /// Multiplier on archetype health.
        health_multiplier: f32,
        /// Multiplier on archetype speed.
        speed_multiplier: f32,
    },
    /// Moves an enemy.
    MoveEnemy {
        /// Enemy to move.
        enemy: EnemyId,
        /// New position.
        to: Vec2,
    },
    /// Applies a timed slow to an enemy.
    SlowEnemy {
        /// Enemy to slow.
        enemy: EnemyId,
        /// Effect to merge into the enemy's current slow.
        slow: SlowEffect,
    },
    /// Pulls an enemy and slows it.
    PullEnemy {
        /// Enemy to pull.
        enemy: EnemyId,
        /// Position after the pull.
        to: Vec2,
        /// Effect to merge into the enemy's current slow.
        slow: SlowEffect,
    },
    /// An enemy blocked by a structure strikes it.
    ContactDamage {
        /// Striking enemy.
        enemy: EnemyId,
        /// Cell being struck.
        cell: CellCoord,
        /// Damage before shields and hooks.
        damage: f32,
        /// Frame timestamp, in milliseconds, used for the per-enemy strike gate.
        at_ms: f64,
    },
    /// Launches a projectile at the target's current position.
    LaunchProjectile {
        /// Cell credited with the shot.
        source: CellCoord,
        /// Launch position.
        origin: Vec2,
        /// Enemy targeted.
        target: EnemyId,
        /// Payload damage.
        damage: f32,
        /// Area radius; zero for single-target payloads.
        splash_radius: f32,
        /// Cells travelled per frame.
        speed: f32,
    },
    /// Instantly hits an enemy.
    StrikeEnemy {
        /// Cell credited with the hit.
        source: CellCoord,
        /// Enemy hit.
        enemy: EnemyId,
        /// Damage before hooks and shields.
        damage: f32,
    },
    /// Launches a drone from a hangar.
    SpawnDrone {
        /// Owning hangar cell.
        hangar: CellCoord,
    },
    /// Moves a drone.
    MoveDrone {
        /// Drone to move.
        drone: DroneId,
        /// New position.
        to: Vec2,
    },
    /// Removes a drone.
    RemoveDrone {
        /// Drone to remove.
        drone: DroneId,
    },
    /// Resolves projectiles and timed effects for the current frame.
    AdvanceFrame {
        /// Frame timestamp in milliseconds.
        now_ms: f64,
    },
    /// Announces the start of a discrete wave.
    BeginWave {
        /// Wave number.
        wave: u32,
    },
    /// Announces the completion of a discrete wave.
    CompleteWave {
        /// Wave number.
        wave: u32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// The game-start moment was dispatched.
    GameStarted {
        /// Bonus granted by game-start hooks.
        bonus: Resources,
    },
    /// An economic tick opened.
    TimeAdvanced {
        /// Whole economic seconds elapsed since the run started.
        elapsed_secs: u64,
    },
    /// A structure was placed.
    BuildingPlaced {
        /// Target cell.
        cell: CellCoord,
        /// Kind placed.
        kind: BuildingKind,
        /// Resources debited.
        cost: Resources,
    },
    /// A placement request was rejected.
    PlacementRejected {
        /// Target cell.
        cell: CellCoord,
        /// Kind requested.
        kind: BuildingKind,
        /// Rejection reason.
        reason: PlacementError,
    },
    /// A structure was upgraded.
    BuildingUpgraded {
        /// Target cell.
        cell: CellCoord,
        /// Kind upgraded.
        kind: BuildingKind,
        /// Level after the upgrade.
        level: u32,
        /// Resources debited.
        cost: Resources,
    },
    /// An upgrade request was rejected.
    UpgradeRejected {
        /// Target cell.
        cell: CellCoord,
        /// Rejection reason.
        reason: UpgradeError,
    },
    /// A structure was removed by the player.
    BuildingRemoved {
        /// Vacated cell.
        cell: CellCoord,
        /// Kind removed.
        kind: BuildingKind,
        /// Level the structure had, used to compute the refund.
        level: u32,
        /// Multiplier produced by remove hooks for the refund.
        refund_multiplier: f64,
    },
    /// A removal request was rejected.
    RemovalRejected {
        /// Target cell.
        cell: CellCoord,
        /// Rejection reason.
        reason: RemovalError,
    },
    /// A module was installed.
    ModuleInstalled {
        /// Target cell.
        cell: CellCoord,
        /// Module installed.
        module: ModuleKind,
        /// Resources debited.
        cost: Resources,
    },
    /// A module install or uninstall request was rejected.
    ModuleRejected {
        /// Target cell.
        cell: CellCoord,
        /// Module involved, if the request named one.
        module: Option<ModuleKind>,
        /// Rejection reason.
        reason: ModuleError,
    },
    /// A module was uninstalled.
    ModuleUninstalled {
        /// Target cell.
        cell: CellCoord,
        /// Module removed.
        module: ModuleKind,
    },
    /// A building kind became available.
    BuildingUnlocked {
        /// Kind unlocked.
        kind: BuildingKind,
        /// Resources debited.
        cost: Resources,
    },
    /// An unlock request was rejected.
    UnlockRejected {
        /// Kind requested.
        kind: BuildingKind,
        /// Rejection reason.
        reason: UnlockError,
    },
    /// A structure was destroyed by enemies.
    BuildingDestroyed {
        /// Cell that reverted.
        cell: CellCoord,
        /// Kind destroyed.
        kind: BuildingKind,
    },
    /// The core fell; the run is over.
    CoreDestroyed,
    /// An enemy entered the field.
    EnemySpawned {
        /// Identifier allocated to the enemy.
        enemy: EnemyId,
        /// Archetype spawned.
        kind: EnemyKind,
        /// Discrete wave tag, if any.
        wave: Option<u32>,
    },
    /// An enemy was killed.
    EnemyKilled {
        /// Enemy removed.
        enemy: EnemyId,
        /// Archetype of the enemy.
        kind: EnemyKind,
        /// Discrete wave tag, if any.
        wave: Option<u32>,
        /// Cell credited with the kill, if any.
        source: Option<CellCoord>,
        /// Scrap credited to the matter pool.
        reward: f64,
    },
    /// A projectile was launched.
    ProjectileLaunched {
        /// Identifier allocated to the projectile.
        projectile: ProjectileId,
        /// Cell credited with the shot.
        source: CellCoord,
        /// Enemy targeted.
        target: EnemyId,
    },
    /// A discrete wave started.
    WaveStarted {
        /// Wave number.
        wave: u32,
    },
    /// A discrete wave was cleared.
    WaveCompleted {
        /// Wave number.
        wave: u32,
        /// Bonus granted by wave-end hooks.
        bonus: Resources,
    },
}

/// Persistable world state: grid arrays, pools, unlocks and counters.
///
/// The engine treats this as an opaque structured blob; the byte format is
/// chosen by whoever serialises it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Edge length of the square grid.
    pub grid_size: u32,
    /// Cell contents in row-major order.
    pub tiles: Vec<Tile>,
    /// Cell levels in row-major order.
    pub levels: Vec<u32>,
    /// Cell health in row-major order.
    pub health: Vec<f32>,
    /// Cell shields in row-major order.
    pub shield: Vec<f32>,
    /// Installed modules in row-major order.
    pub modules: Vec<Option<ModuleKind>>,
    /// Ledger pools.
    pub resources: Resources,
    /// Kinds available for placement.
    pub unlocked: Vec<BuildingKind>,
    /// Whole economic seconds elapsed.
    pub elapsed_secs: u64,
    /// Enemies killed so far.
    pub kills: u64,
}
