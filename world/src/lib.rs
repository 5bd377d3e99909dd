#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Gridfort.
//!
//! The world owns the grid, the resource ledger and every mobile entity. It
//! is mutated exclusively through [`apply`], which executes one [`Command`]
//! and reports the outcome as [`Event`] values. Read access goes through the
//! [`query`] module.

mod combat;
mod entities;
mod grid;
mod snapshot;
mod structures;

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use gridfort_core::{
    level_multiplier, AuraBuffs, BuildingKind, BuildingSnapshot, CellCoord, CellStats, Command,
    DroneId, EnemyId, Event, IncomeBreakdown, ProjectileId, ResourceKind, Resources, Vec2,
};
use gridfort_registry::Registry;
use gridfort_system_hooks::{HookChain, HookEvent};
use serde::{Deserialize, Serialize};

use entities::{Drone, Enemy};
use grid::Grid;

pub use snapshot::SnapshotError;

const DEFAULT_GRID_SIZE: u32 = 21;
const DEFAULT_MAP_SEED: u64 = 0x5eed_f047_2a1d_0c39;
const DEFAULT_ORE_DEPOSITS: u32 = 14;

/// Tunable parameters of the authoritative world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Edge length of the square grid.
    pub grid_size: u32,
    /// Seed used to scatter ore deposits.
    pub map_seed: u64,
    /// Number of ore deposits generated.
    pub ore_deposits: u32,
    /// Highest level a structure may reach.
    pub max_level: u32,
    /// Per-level growth applied to health, output and damage.
    pub level_scaling: f32,
    /// Multiplier applied to the base cost for each upgrade.
    pub upgrade_cost_factor: f64,
    /// Shield cap expressed as a fraction of maximum health.
    pub shield_fraction: f32,
    /// Scrap credited per kill before growth and kind multipliers.
    pub kill_reward: f64,
    /// Fractional growth of kill rewards per elapsed minute.
    pub reward_growth: f64,
    /// Minimum milliseconds between two contact strikes of one enemy.
    pub contact_interval_ms: f64,
    /// Ledger contents at the start of a run.
    pub starting_resources: Resources,
    /// Frames a projectile may fly before it counts as a miss.
    pub projectile_lifetime: u32,
    /// Distance below which a projectile counts as arrived.
    pub arrival_threshold: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            map_seed: DEFAULT_MAP_SEED,
            ore_deposits: DEFAULT_ORE_DEPOSITS,
            max_level: 10,
            level_scaling: 0.5,
            upgrade_cost_factor: 1.5,
            shield_fraction: 0.5,
            kill_reward: 5.0,
            reward_growth: 0.1,
            contact_interval_ms: 1000.0,
            starting_resources: Resources::new()
                .with(ResourceKind::Energy, 50.0)
                .with(ResourceKind::Matter, 150.0),
            projectile_lifetime: 300,
            arrival_threshold: 0.2,
        }
    }
}

/// Represents the authoritative Gridfort world state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    registry: Arc<Registry>,
    grid: Grid,
    cell_stats: Vec<CellStats>,
    resources: Resources,
    unlocked: BTreeSet<BuildingKind>,
    enemies: BTreeMap<EnemyId, Enemy>,
    projectiles: BTreeMap<ProjectileId, entities::Projectile>,
    drones: BTreeMap<DroneId, Drone>,
    next_enemy: u32,
    next_projectile: u32,
    next_drone: u32,
    buffs: AuraBuffs,
    income: IncomeBreakdown,
    elapsed_secs: u64,
    now_ms: f64,
    kills: u64,
    started: bool,
    game_over: bool,
}

impl World {
    /// Creates a world with a freshly generated map.
    #[must_use]
    pub fn new(config: WorldConfig, registry: Arc<Registry>) -> Self {
        let core_health = registry.building(BuildingKind::Core).base_health;
        let grid = Grid::generate(config.grid_size, core_health, config.ore_deposits, config.map_seed);
        let cell_stats = vec![CellStats::default(); grid.cells().len()];
        let unlocked = registry.starting_unlocks().collect();
        Self {
            resources: config.starting_resources,
            config,
            registry,
            grid,
            cell_stats,
            unlocked,
            enemies: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            drones: BTreeMap::new(),
            next_enemy: 0,
            next_projectile: 0,
            next_drone: 0,
            buffs: AuraBuffs::default(),
            income: IncomeBreakdown::default(),
            elapsed_secs: 0,
            now_ms: 0.0,
            kills: 0,
            started: false,
            game_over: false,
        }
    }

    fn max_health(&self, kind: BuildingKind, level: u32) -> f32 {
        self.registry.building(kind).base_health * level_multiplier(level, self.config.level_scaling)
    }

    fn shield_cap(&self, kind: BuildingKind, level: u32) -> f32 {
        self.max_health(kind, level) * self.config.shield_fraction
    }

    fn building_snapshot(&self, cell: CellCoord) -> Option<BuildingSnapshot> {
        let state = self.grid.get(cell)?;
        let kind = state.kind()?;
        Some(BuildingSnapshot {
            cell,
            kind,
            level: state.level,
            health: state.health,
            max_health: self.max_health(kind, state.level),
            shield: state.shield,
            module: state.module,
            powered: state.powered,
        })
    }

    fn building_snapshots(&self) -> Vec<BuildingSnapshot> {
        self.grid
            .buildings()
            .filter_map(|(cell, _, _)| self.building_snapshot(cell))
            .collect()
    }

    fn chain(&self, snapshot: &BuildingSnapshot) -> HookChain {
        HookChain::for_building(self.registry.as_ref(), snapshot)
    }

    /// Dispatches one event per structure, in row-major order.
    fn broadcast<E, F>(&self, mut seed: F) -> Vec<E>
    where
        E: HookEvent,
        F: FnMut(BuildingSnapshot) -> E,
    {
        self.building_snapshots()
            .into_iter()
            .map(|snapshot| self.chain(&snapshot).dispatch(seed(snapshot)))
            .collect()
    }

    fn stats_mut(&mut self, cell: CellCoord) -> Option<&mut CellStats> {
        let index = self.grid.index(cell)?;
        self.cell_stats.get_mut(index)
    }

    fn elapsed_minutes(&self) -> f64 {
        self.elapsed_secs as f64 / 60.0
    }

    fn clamp_to_field(&self, position: Vec2) -> Vec2 {
        let limit = self.grid.size() as f32;
        position.clamp(Vec2::ZERO, Vec2::splat(limit))
    }

    fn remove_drones_of(&mut self, hangar: CellCoord) {
        self.drones.retain(|_, drone| drone.hangar != hangar);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default(), Arc::new(Registry::standard()))
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartGame => world.start_game(out_events),
        Command::PlaceBuilding { kind, cell } => world.place(kind, cell, out_events),
        Command::UpgradeBuilding { cell } => world.upgrade(cell, out_events),
        Command::RemoveBuilding { cell } => world.remove(cell, out_events),
        Command::InstallModule { cell, module } => world.install(cell, module, out_events),
        Command::UninstallModule { cell } => world.uninstall(cell, out_events),
        Command::UnlockBuilding { kind } => world.unlock(kind, out_events),
        Command::Refund { amount } => world.resources.add(&amount),
        Command::AdvanceClock => {
            world.elapsed_secs = world.elapsed_secs.saturating_add(1);
            world.income = IncomeBreakdown::default();
            log::debug!("economic tick {} opened", world.elapsed_secs);
            out_events.push(Event::TimeAdvanced {
                elapsed_secs: world.elapsed_secs,
            });
        }
        Command::SettleBuilding {
            cell,
            consumption,
            income,
        } => world.settle(cell, &consumption, &income),
        Command::RepairCell { cell, amount } => world.repair(cell, amount),
        Command::ChargeShield { cell, amount } => world.charge_shield(cell, amount),
        Command::SetAuraBuffs { buffs } => world.buffs = buffs,
        Command::SpawnEnemy {
            kind,
            position,
            wave,
            health_multiplier,
            speed_multiplier,
        } => {
            if world.game_over {
                return;
            }
            let id = EnemyId::new(world.next_enemy);
            world.next_enemy = world.next_enemy.wrapping_add(1);
            let position = world.clamp_to_field(position);
            let enemy = Enemy::spawn(kind, position, wave, health_multiplier, speed_multiplier);
            let _ = world.enemies.insert(id, enemy);
            out_events.push(Event::EnemySpawned {
                enemy: id,
                kind,
                wave,
            });
        }
        Command::MoveEnemy { enemy, to } => {
            let to = world.clamp_to_field(to);
            if let Some(state) = world.enemies.get_mut(&enemy) {
                state.position = to;
            }
        }
        Command::SlowEnemy { enemy, slow } => {
            if let Some(state) = world.enemies.get_mut(&enemy) {
                state.apply_slow(slow);
            }
        }
        Command::PullEnemy { enemy, to, slow } => {
            let to = world.clamp_to_field(to);
            if let Some(state) = world.enemies.get_mut(&enemy) {
                state.position = to;
                state.apply_slow(slow);
            }
        }
        Command::ContactDamage {
            enemy,
            cell,
            damage,
            at_ms,
        } => world.contact(enemy, cell, damage, at_ms, out_events),
        Command::LaunchProjectile {
            source,
            origin,
            target,
            damage,
            splash_radius,
            speed,
        } => world.launch(source, origin, target, damage, splash_radius, speed, out_events),
        Command::StrikeEnemy {
            source,
            enemy,
            damage,
        } => world.strike(source, enemy, damage, out_events),
        Command::SpawnDrone { hangar } => {
            let is_hangar = world
                .grid
                .get(hangar)
                .and_then(|cell| cell.kind())
                .map_or(false, |kind| kind == BuildingKind::Hangar);
            if is_hangar {
                let id = DroneId::new(world.next_drone);
                world.next_drone = world.next_drone.wrapping_add(1);
                let _ = world.drones.insert(
                    id,
                    Drone {
                        hangar,
                        position: hangar.center(),
                    },
                );
            }
        }
        Command::MoveDrone { drone, to } => {
            let to = world.clamp_to_field(to);
            if let Some(state) = world.drones.get_mut(&drone) {
                state.position = to;
            }
        }
        Command::RemoveDrone { drone } => {
            let _ = world.drones.remove(&drone);
        }
        Command::AdvanceFrame { now_ms } => world.advance_frame(now_ms, out_events),
        Command::BeginWave { wave } => world.begin_wave(wave, out_events),
        Command::CompleteWave { wave } => world.complete_wave(wave, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use gridfort_core::{
        AuraBuffs, BuildingKind, BuildingSnapshot, BuildingView, CellCoord, CellStats, DroneView,
        EnemyView, IncomeBreakdown, ProjectileSnapshot, Resources, Tile, WorldSnapshot,
    };
    use gridfort_registry::Registry;
    use gridfort_system_hooks::PrestigeEvent;

    use super::{World, WorldConfig};

    /// Parameters the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// Definitions backing every building and module kind.
    #[must_use]
    pub fn registry(world: &World) -> &Registry {
        world.registry.as_ref()
    }

    /// Edge length of the square grid.
    #[must_use]
    pub fn grid_size(world: &World) -> u32 {
        world.grid.size()
    }

    /// Cell occupied by the core.
    #[must_use]
    pub fn core_cell(world: &World) -> CellCoord {
        world.grid.core_cell()
    }

    /// Contents of a cell, or `None` outside the grid.
    #[must_use]
    pub fn tile(world: &World, cell: CellCoord) -> Option<Tile> {
        world.grid.get(cell).map(|state| state.tile)
    }

    /// Snapshot of the structure occupying `cell`.
    #[must_use]
    pub fn building(world: &World, cell: CellCoord) -> Option<BuildingSnapshot> {
        world.building_snapshot(cell)
    }

    /// Captures every structure in row-major order.
    #[must_use]
    pub fn building_view(world: &World) -> BuildingView {
        BuildingView::from_snapshots(world.building_snapshots())
    }

    /// Captures every live enemy in ascending id order.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(
            world
                .enemies
                .iter()
                .map(|(id, enemy)| enemy.snapshot(*id))
                .collect(),
        )
    }

    /// Captures every drone in ascending id order.
    #[must_use]
    pub fn drone_view(world: &World) -> DroneView {
        DroneView::from_snapshots(
            world
                .drones
                .iter()
                .map(|(id, drone)| drone.snapshot(*id))
                .collect(),
        )
    }

    /// Captures every in-flight projectile in ascending id order.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .iter()
            .map(|(id, projectile)| projectile.snapshot(*id))
            .collect()
    }

    /// Current ledger contents.
    #[must_use]
    pub fn resources(world: &World) -> Resources {
        world.resources
    }

    /// Attribution of the most recent economic pass.
    #[must_use]
    pub fn income(world: &World) -> &IncomeBreakdown {
        &world.income
    }

    /// Combat statistics accumulated by `cell`.
    #[must_use]
    pub fn cell_stats(world: &World, cell: CellCoord) -> CellStats {
        world
            .grid
            .index(cell)
            .and_then(|index| world.cell_stats.get(index).copied())
            .unwrap_or_default()
    }

    /// Buffs produced by the latest aura pass.
    #[must_use]
    pub fn aura_buffs(world: &World) -> &AuraBuffs {
        &world.buffs
    }

    /// Whole economic seconds elapsed.
    #[must_use]
    pub fn elapsed_secs(world: &World) -> u64 {
        world.elapsed_secs
    }

    /// Timestamp of the latest resolved frame, in milliseconds.
    #[must_use]
    pub fn now_ms(world: &World) -> f64 {
        world.now_ms
    }

    /// Enemies killed so far.
    #[must_use]
    pub fn kills(world: &World) -> u64 {
        world.kills
    }

    /// Reports whether the core has fallen.
    #[must_use]
    pub fn is_game_over(world: &World) -> bool {
        world.game_over
    }

    /// Reports whether `kind` may be placed.
    #[must_use]
    pub fn is_unlocked(world: &World, kind: BuildingKind) -> bool {
        world.unlocked.contains(&kind)
    }

    /// Kinds available for placement, in kind order.
    #[must_use]
    pub fn unlocked(world: &World) -> Vec<BuildingKind> {
        world.unlocked.iter().copied().collect()
    }

    /// Number of standing structures of `kind`.
    #[must_use]
    pub fn owned_count(world: &World, kind: BuildingKind) -> u32 {
        world.grid.count(kind)
    }

    /// Live enemies tagged with `wave`.
    #[must_use]
    pub fn live_enemies_in_wave(world: &World, wave: u32) -> u32 {
        world
            .enemies
            .values()
            .filter(|enemy| enemy.wave == Some(wave))
            .count() as u32
    }

    /// Prestige multiplier produced by dispatching the prestige moment to
    /// every structure, starting from `1.0`.
    #[must_use]
    pub fn prestige_multiplier(world: &World) -> f64 {
        world
            .broadcast(|building| PrestigeEvent {
                building,
                multiplier: 1.0,
            })
            .iter()
            .map(|event| event.multiplier)
            .product()
    }

    /// Captures the persistable part of the world.
    #[must_use]
    pub fn snapshot(world: &World) -> WorldSnapshot {
        super::snapshot::capture(world)
    }
}

#[cfg(test)]
mod tests {
    use super::{apply, query, World};
    use gridfort_core::{BuildingKind, CellCoord, Command, Event, Tile};

    #[test]
    fn new_world_places_core_at_centre() {
        let world = World::default();
        let centre = query::core_cell(&world);
        assert_eq!(centre, CellCoord::new(10, 10));
        assert_eq!(query::tile(&world, centre), Some(Tile::Building(BuildingKind::Core)));
        assert_eq!(query::owned_count(&world, BuildingKind::Core), 1);
    }

    #[test]
    fn advance_clock_counts_seconds() {
        let mut world = World::default();
        let mut events = Vec::new();
        apply(&mut world, Command::AdvanceClock, &mut events);
        apply(&mut world, Command::AdvanceClock, &mut events);
        assert_eq!(query::elapsed_secs(&world), 2);
        assert_eq!(
            events.last(),
            Some(&Event::TimeAdvanced { elapsed_secs: 2 })
        );
    }

    #[test]
    fn prestige_multiplier_defaults_to_one_without_labs() {
        let world = World::default();
        assert_eq!(query::prestige_multiplier(&world), 1.0);
    }
}
