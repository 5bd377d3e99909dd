//! Structural operations and economy settlement.
//!
//! Every operation validates completely before it writes anything, so a
//! rejected request leaves the grid and the ledger untouched.

use gridfort_core::{
    BuildingKind, CellCoord, Event, ModuleError, ModuleKind, PlacementError, RemovalError,
    Resources, Tile, UnlockError, UpgradeError,
};
use gridfort_system_hooks::{
    GameStartEvent, PlaceEvent, RemoveEvent, ResourceGainedEvent, UnlockTechEvent, UpgradeEvent,
    WaveEndEvent, WaveStartEvent,
};

use crate::{grid::Cell, World};

impl World {
    pub(crate) fn start_game(&mut self, out_events: &mut Vec<Event>) {
        if self.started {
            return;
        }
        self.started = true;
        let mut bonus = Resources::ZERO;
        for event in self.broadcast(|building| GameStartEvent {
            building,
            bonus: Resources::ZERO,
        }) {
            bonus.add(&event.bonus);
        }
        self.resources.add(&bonus);
        log::info!("run started on a {0}x{0} grid", self.grid.size());
        out_events.push(Event::GameStarted { bonus });
    }

    fn validate_place(&self, kind: BuildingKind, cell: CellCoord) -> Result<Resources, PlacementError> {
        if self.game_over {
            return Err(PlacementError::GameOver);
        }
        let state = self.grid.get(cell).ok_or(PlacementError::OutOfBounds)?;
        match state.tile {
            Tile::Building(BuildingKind::Core) => return Err(PlacementError::CoreProtected),
            Tile::Building(_) => return Err(PlacementError::Occupied),
            Tile::Empty | Tile::Ore => {}
        }
        if kind == BuildingKind::Core {
            return Err(PlacementError::CoreProtected);
        }
        let definition = self.registry.building(kind);
        if definition.requires_ore && state.tile != Tile::Ore {
            return Err(PlacementError::RequiresOre);
        }
        if !self.unlocked.contains(&kind) {
            return Err(PlacementError::Locked);
        }
        let owned = self.grid.count(kind);
        if definition.population_cap.map_or(false, |cap| owned >= cap) {
            return Err(PlacementError::PopulationCap);
        }
        let cost = self.registry.placement_cost(kind, owned);
        if !self.resources.can_afford(&cost) {
            return Err(PlacementError::InsufficientFunds);
        }
        Ok(cost)
    }

    pub(crate) fn place(&mut self, kind: BuildingKind, cell: CellCoord, out_events: &mut Vec<Event>) {
        let cost = match self.validate_place(kind, cell) {
            Ok(cost) => cost,
            Err(reason) => {
                log::debug!("placement of {kind:?} at {cell:?} rejected: {reason}");
                out_events.push(Event::PlacementRejected { cell, kind, reason });
                return;
            }
        };

        self.resources.spend(&cost);
        let max_health = self.max_health(kind, 1);
        if let Some(state) = self.grid.get_mut(cell) {
            *state = Cell::building(kind, max_health);
        }
        if let Some(snapshot) = self.building_snapshot(cell) {
            let placed = self.chain(&snapshot).dispatch(PlaceEvent {
                building: snapshot,
                initial_shield: 0.0,
            });
            let cap = self.shield_cap(kind, 1);
            if let Some(state) = self.grid.get_mut(cell) {
                state.shield = placed.initial_shield.max(0.0).min(cap);
            }
        }
        log::debug!("placed {kind:?} at {cell:?}");
        out_events.push(Event::BuildingPlaced { cell, kind, cost });
    }

    fn validate_upgrade(&self, cell: CellCoord) -> Result<(BuildingKind, u32, Resources), UpgradeError> {
        if self.game_over {
            return Err(UpgradeError::GameOver);
        }
        let state = self.grid.get(cell).ok_or(UpgradeError::OutOfBounds)?;
        let kind = state.kind().ok_or(UpgradeError::NotABuilding)?;
        if state.level >= self.config.max_level {
            return Err(UpgradeError::LevelCap);
        }
        let cost = self
            .registry
            .upgrade_cost(kind, state.level, self.config.upgrade_cost_factor);
        if !self.resources.can_afford(&cost) {
            return Err(UpgradeError::InsufficientFunds);
        }
        Ok((kind, state.level + 1, cost))
    }

    pub(crate) fn upgrade(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        let (kind, level, cost) = match self.validate_upgrade(cell) {
            Ok(outcome) => outcome,
            Err(reason) => {
                log::debug!("upgrade at {cell:?} rejected: {reason}");
                out_events.push(Event::UpgradeRejected { cell, reason });
                return;
            }
        };

        self.resources.spend(&cost);
        let max_health = self.max_health(kind, level);
        if let Some(state) = self.grid.get_mut(cell) {
            state.level = level;
            state.health = max_health;
        }
        if let Some(snapshot) = self.building_snapshot(cell) {
            let upgraded = self.chain(&snapshot).dispatch(UpgradeEvent {
                building: snapshot,
                shield_grant: 0.0,
            });
            self.charge_shield(cell, upgraded.shield_grant);
        }
        log::debug!("upgraded {kind:?} at {cell:?} to level {level}");
        out_events.push(Event::BuildingUpgraded {
            cell,
            kind,
            level,
            cost,
        });
    }

    fn validate_install(&self, cell: CellCoord, module: ModuleKind) -> Result<Resources, ModuleError> {
        if self.game_over {
            return Err(ModuleError::GameOver);
        }
        let state = self.grid.get(cell).ok_or(ModuleError::OutOfBounds)?;
        let kind = state.kind().ok_or(ModuleError::NotABuilding)?;
        if state.module.is_some() {
            return Err(ModuleError::AlreadyInstalled);
        }
        let definition = self.registry.module(module);
        if !definition.applies_to(kind) {
            return Err(ModuleError::NotApplicable);
        }
        if !self.resources.can_afford(&definition.cost) {
            return Err(ModuleError::InsufficientFunds);
        }
        Ok(definition.cost)
    }

    pub(crate) fn install(&mut self, cell: CellCoord, module: ModuleKind, out_events: &mut Vec<Event>) {
        let cost = match self.validate_install(cell, module) {
            Ok(cost) => cost,
            Err(reason) => {
                log::debug!("install of {module:?} at {cell:?} rejected: {reason}");
                out_events.push(Event::ModuleRejected {
                    cell,
                    module: Some(module),
                    reason,
                });
                return;
            }
        };

        self.resources.spend(&cost);
        if let Some(state) = self.grid.get_mut(cell) {
            state.module = Some(module);
        }
        log::debug!("installed {module:?} at {cell:?}");
        out_events.push(Event::ModuleInstalled { cell, module, cost });
    }

    fn validate_uninstall(&self, cell: CellCoord) -> Result<ModuleKind, ModuleError> {
        if self.game_over {
            return Err(ModuleError::GameOver);
        }
        let state = self.grid.get(cell).ok_or(ModuleError::OutOfBounds)?;
        let _ = state.kind().ok_or(ModuleError::NotABuilding)?;
        state.module.ok_or(ModuleError::NoModule)
    }

    pub(crate) fn uninstall(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        match self.validate_uninstall(cell) {
            Ok(module) => {
                if let Some(state) = self.grid.get_mut(cell) {
                    state.module = None;
                }
                log::debug!("uninstalled {module:?} at {cell:?}");
                out_events.push(Event::ModuleUninstalled { cell, module });
            }
            Err(reason) => {
                out_events.push(Event::ModuleRejected {
                    cell,
                    module: None,
                    reason,
                });
            }
        }
    }

    fn validate_remove(&self, cell: CellCoord) -> Result<BuildingKind, RemovalError> {
        if self.game_over {
            return Err(RemovalError::GameOver);
        }
        let state = self.grid.get(cell).ok_or(RemovalError::OutOfBounds)?;
        match state.kind() {
            None => Err(RemovalError::NotABuilding),
            Some(BuildingKind::Core) => Err(RemovalError::CoreProtected),
            Some(kind) => Ok(kind),
        }
    }

    pub(crate) fn remove(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        let kind = match self.validate_remove(cell) {
            Ok(kind) => kind,
            Err(reason) => {
                log::debug!("removal at {cell:?} rejected: {reason}");
                out_events.push(Event::RemovalRejected { cell, reason });
                return;
            }
        };

        let Some(snapshot) = self.building_snapshot(cell) else {
            return;
        };
        let removal = self.chain(&snapshot).dispatch(RemoveEvent {
            building: snapshot,
            refund_multiplier: 1.0,
        });
        let level = self.clear_cell(cell, kind);
        log::debug!("removed {kind:?} at {cell:?}");
        out_events.push(Event::BuildingRemoved {
            cell,
            kind,
            level,
            refund_multiplier: removal.refund_multiplier.max(0.0),
        });
    }

    /// Reverts a structure's cell and returns the level it had.
    pub(crate) fn clear_cell(&mut self, cell: CellCoord, kind: BuildingKind) -> u32 {
        let reverted = if self.registry.building(kind).requires_ore {
            Cell::ORE
        } else {
            Cell::EMPTY
        };
        let level = match self.grid.get_mut(cell) {
            Some(state) => std::mem::replace(state, reverted).level,
            None => 0,
        };
        if kind == BuildingKind::Hangar {
            self.remove_drones_of(cell);
        }
        level
    }

    pub(crate) fn unlock(&mut self, kind: BuildingKind, out_events: &mut Vec<Event>) {
        if self.unlocked.contains(&kind) {
            out_events.push(Event::UnlockRejected {
                kind,
                reason: UnlockError::AlreadyUnlocked,
            });
            return;
        }
        let cost = self
            .registry
            .building(kind)
            .unlock_cost
            .unwrap_or(Resources::ZERO);
        if !self.resources.can_afford(&cost) {
            out_events.push(Event::UnlockRejected {
                kind,
                reason: UnlockError::InsufficientFunds,
            });
            return;
        }

        self.resources.spend(&cost);
        let _ = self.unlocked.insert(kind);
        let mut bonus = Resources::ZERO;
        for event in self.broadcast(|building| UnlockTechEvent {
            building,
            tech: kind,
            bonus: Resources::ZERO,
        }) {
            bonus.add(&event.bonus);
        }
        self.resources.add(&bonus);
        log::debug!("unlocked {kind:?}");
        out_events.push(Event::BuildingUnlocked { kind, cost });
    }

    pub(crate) fn settle(&mut self, cell: CellCoord, consumption: &Resources, income: &Resources) {
        let Some(snapshot) = self.building_snapshot(cell) else {
            return;
        };
        let powered = self.resources.can_afford(consumption);
        if powered {
            self.resources.spend(consumption);
            let gained = if income.is_zero() {
                *income
            } else {
                self.chain(&snapshot)
                    .dispatch(ResourceGainedEvent {
                        building: snapshot,
                        income: *income,
                    })
                    .income
            };
            self.resources.add(&gained);
            self.income.record(snapshot.kind, consumption, &gained);
        }
        if let Some(state) = self.grid.get_mut(cell) {
            state.powered = powered;
        }
    }

    pub(crate) fn repair(&mut self, cell: CellCoord, amount: f32) {
        let Some(snapshot) = self.building_snapshot(cell) else {
            return;
        };
        if let Some(state) = self.grid.get_mut(cell) {
            state.health = (state.health + amount.max(0.0)).min(snapshot.max_health);
        }
    }

    pub(crate) fn charge_shield(&mut self, cell: CellCoord, amount: f32) {
        let Some(snapshot) = self.building_snapshot(cell) else {
            return;
        };
        let cap = self.shield_cap(snapshot.kind, snapshot.level);
        if let Some(state) = self.grid.get_mut(cell) {
            state.shield = (state.shield + amount.max(0.0)).min(cap);
        }
    }

    pub(crate) fn begin_wave(&mut self, wave: u32, out_events: &mut Vec<Event>) {
        let grants = self.broadcast(|building| WaveStartEvent {
            building,
            wave,
            shield_grant: 0.0,
        });
        for grant in grants {
            self.charge_shield(grant.building.cell, grant.shield_grant);
        }
        log::info!("wave {wave} started");
        out_events.push(Event::WaveStarted { wave });
    }

    pub(crate) fn complete_wave(&mut self, wave: u32, out_events: &mut Vec<Event>) {
        let mut bonus = Resources::ZERO;
        for event in self.broadcast(|building| WaveEndEvent {
            building,
            wave,
            bonus: Resources::ZERO,
        }) {
            bonus.add(&event.bonus);
        }
        self.resources.add(&bonus);
        log::info!("wave {wave} cleared");
        out_events.push(Event::WaveCompleted { wave, bonus });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{apply, query, World, WorldConfig};
    use gridfort_core::{
        level_multiplier, BuildingKind, CellCoord, Command, EnemyId, EnemyKind, Event, ModuleError,
        ModuleKind, PlacementError, RemovalError, ResourceKind, Resources, Tile, UpgradeError,
        Vec2,
    };
    use gridfort_registry::Registry;

    fn place(world: &mut World, kind: BuildingKind, cell: CellCoord) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, Command::PlaceBuilding { kind, cell }, &mut events);
        events
    }

    fn empty_cell(world: &World) -> CellCoord {
        let size = query::grid_size(world);
        (0..size)
            .flat_map(|row| (0..size).map(move |column| CellCoord::new(column, row)))
            .find(|cell| query::tile(world, *cell) == Some(Tile::Empty))
            .expect("an empty cell")
    }

    fn ore_cell(world: &World) -> CellCoord {
        let size = query::grid_size(world);
        (0..size)
            .flat_map(|row| (0..size).map(move |column| CellCoord::new(column, row)))
            .find(|cell| query::tile(world, *cell) == Some(Tile::Ore))
            .expect("an ore cell")
    }

    #[test]
    fn placement_debits_cost_and_occupies_cell() {
        let mut world = World::default();
        let cell = empty_cell(&world);
        let before = query::resources(&world).get(ResourceKind::Matter);
        let events = place(&mut world, BuildingKind::Turret, cell);
        assert!(matches!(events.as_slice(), [Event::BuildingPlaced { .. }]));
        assert_eq!(query::resources(&world).get(ResourceKind::Matter), before - 25.0);
        let building = query::building(&world, cell).expect("turret placed");
        assert_eq!(building.level, 1);
        assert_eq!(building.health, building.max_health);
    }

    #[test]
    fn core_is_neither_placeable_nor_removable() {
        let mut world = World::default();
        let core = query::core_cell(&world);
        let events = place(&mut world, BuildingKind::Wall, core);
        assert_eq!(
            events,
            vec![Event::PlacementRejected {
                cell: core,
                kind: BuildingKind::Wall,
                reason: PlacementError::CoreProtected,
            }]
        );

        let cell = empty_cell(&world);
        let events = place(&mut world, BuildingKind::Core, cell);
        assert!(matches!(
            events.as_slice(),
            [Event::PlacementRejected {
                reason: PlacementError::CoreProtected,
                ..
            }]
        ));

        let mut events = Vec::new();
        apply(&mut world, Command::RemoveBuilding { cell: core }, &mut events);
        assert!(matches!(
            events.as_slice(),
            [Event::RemovalRejected {
                reason: RemovalError::CoreProtected,
                ..
            }]
        ));
        assert_eq!(query::owned_count(&world, BuildingKind::Core), 1);
    }

    #[test]
    fn extractors_require_ore_and_revert_to_ore() {
        let mut world = World::default();
        let plain = empty_cell(&world);
        let events = place(&mut world, BuildingKind::Extractor, plain);
        assert!(matches!(
            events.as_slice(),
            [Event::PlacementRejected {
                reason: PlacementError::RequiresOre,
                ..
            }]
        ));

        let ore = ore_cell(&world);
        let events = place(&mut world, BuildingKind::Extractor, ore);
        assert!(matches!(events.as_slice(), [Event::BuildingPlaced { .. }]));

        let mut events = Vec::new();
        apply(&mut world, Command::RemoveBuilding { cell: ore }, &mut events);
        assert!(matches!(
            events.as_slice(),
            [Event::BuildingRemoved { level: 1, .. }]
        ));
        assert_eq!(query::tile(&world, ore), Some(Tile::Ore));
    }

    #[test]
    fn rejected_operations_leave_state_untouched() {
        let mut world = World::default();
        let cell = empty_cell(&world);
        let resources = query::resources(&world);

        let _ = place(&mut world, BuildingKind::Railgun, cell);
        let mut events = Vec::new();
        apply(&mut world, Command::UpgradeBuilding { cell }, &mut events);
        apply(
            &mut world,
            Command::InstallModule {
                cell,
                module: ModuleKind::Salvager,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![
                Event::UpgradeRejected {
                    cell,
                    reason: UpgradeError::NotABuilding,
                },
                Event::ModuleRejected {
                    cell,
                    module: Some(ModuleKind::Salvager),
                    reason: ModuleError::NotABuilding,
                },
            ]
        );
        assert_eq!(query::resources(&world), resources);
        assert_eq!(query::tile(&world, cell), Some(Tile::Empty));
    }

    #[test]
    fn upgrade_heals_to_new_maximum() {
        let mut world = World::default();
        let cell = empty_cell(&world);
        let _ = place(&mut world, BuildingKind::Wall, cell);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::Normal,
                position: Vec2::ZERO,
                wave: None,
                health_multiplier: 1.0,
                speed_multiplier: 1.0,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::ContactDamage {
                enemy: EnemyId::new(0),
                cell,
                damage: 50.0,
                at_ms: 0.0,
            },
            &mut events,
        );
        let damaged = query::building(&world, cell).expect("wall");
        assert_eq!(damaged.health, 160.0);

        apply(&mut world, Command::UpgradeBuilding { cell }, &mut events);
        let wall = query::building(&world, cell).expect("wall");
        assert_eq!(wall.level, 2);
        assert_eq!(wall.max_health, 300.0);
        assert_eq!(wall.health, 300.0);
    }

    #[test]
    fn every_kind_heals_to_its_leveled_maximum_up_to_the_cap() {
        let plenty = ResourceKind::ALL
            .iter()
            .fold(Resources::new(), |pools, kind| pools.with(*kind, 1.0e9));
        let config = WorldConfig {
            ore_deposits: 30,
            starting_resources: plenty,
            ..WorldConfig::default()
        };
        let scaling = config.level_scaling;
        let max_level = config.max_level;
        let mut world = World::new(config, Arc::new(Registry::standard()));
        let mut events = Vec::new();
        for kind in BuildingKind::ALL {
            apply(&mut world, Command::UnlockBuilding { kind }, &mut events);
        }

        for kind in BuildingKind::ALL.into_iter().filter(|kind| *kind != BuildingKind::Core) {
            let definition = query::registry(&world).building(kind);
            let base_health = definition.base_health;
            let cell = if definition.requires_ore {
                ore_cell(&world)
            } else {
                empty_cell(&world)
            };
            let events = place(&mut world, kind, cell);
            assert!(
                matches!(events.last(), Some(Event::BuildingPlaced { .. })),
                "{kind:?}: {events:?}"
            );

            for level in 1..=max_level {
                if level > 1 {
                    let mut events = Vec::new();
                    apply(&mut world, Command::UpgradeBuilding { cell }, &mut events);
                }
                let building = query::building(&world, cell).expect("structure standing");
                let expected = base_health * level_multiplier(level, scaling);
                assert_eq!(building.level, level, "{kind:?}");
                assert_eq!(building.max_health, expected, "{kind:?} level {level}");
                assert_eq!(building.health, expected, "{kind:?} level {level}");
            }

            let before = query::building(&world, cell).expect("structure standing");
            let resources = query::resources(&world);
            let mut events = Vec::new();
            apply(&mut world, Command::UpgradeBuilding { cell }, &mut events);
            assert_eq!(
                events,
                vec![Event::UpgradeRejected {
                    cell,
                    reason: UpgradeError::LevelCap,
                }]
            );
            assert_eq!(query::building(&world, cell), Some(before));
            assert_eq!(query::resources(&world), resources);
        }
    }

    #[test]
    fn modules_respect_applicability_and_single_slot() {
        let mut world = World::default();
        let cell = empty_cell(&world);
        let _ = place(&mut world, BuildingKind::Turret, cell);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::InstallModule {
                cell,
                module: ModuleKind::OreRefiner,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::InstallModule {
                cell,
                module: ModuleKind::RangeExtender,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::InstallModule {
                cell,
                module: ModuleKind::Salvager,
            },
            &mut events,
        );
        assert!(matches!(
            events.as_slice(),
            [
                Event::ModuleRejected {
                    reason: ModuleError::NotApplicable,
                    ..
                },
                Event::ModuleInstalled {
                    module: ModuleKind::RangeExtender,
                    ..
                },
                Event::ModuleRejected {
                    reason: ModuleError::AlreadyInstalled,
                    ..
                },
            ]
        ));

        events.clear();
        apply(&mut world, Command::UninstallModule { cell }, &mut events);
        apply(&mut world, Command::UninstallModule { cell }, &mut events);
        assert!(matches!(
            events.as_slice(),
            [
                Event::ModuleUninstalled { .. },
                Event::ModuleRejected {
                    reason: ModuleError::NoModule,
                    ..
                },
            ]
        ));
    }

    #[test]
    fn locked_kinds_need_research() {
        let mut world = World::default();
        let cell = empty_cell(&world);
        let events = place(&mut world, BuildingKind::TeslaCoil, cell);
        assert!(matches!(
            events.as_slice(),
            [Event::PlacementRejected {
                reason: PlacementError::Locked,
                ..
            }]
        ));

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::UnlockBuilding {
                kind: BuildingKind::TeslaCoil,
            },
            &mut events,
        );
        // No alloy at the start of a run.
        assert!(matches!(
            events.as_slice(),
            [Event::UnlockRejected { .. }]
        ));
        assert!(!query::is_unlocked(&world, BuildingKind::TeslaCoil));
    }
}
