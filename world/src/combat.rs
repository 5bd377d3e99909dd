//! Resolution half of combat: projectiles, hits, kills and structure damage.

use std::cmp::Ordering;

use gridfort_core::{
    BuildingKind, CellCoord, EnemyId, EnemySnapshot, Event, ProjectileId, ResourceKind, Resources,
    SlowEffect, Vec2,
};
use gridfort_system_hooks::{AllyDamagedEvent, DestroyedEvent, HitEvent, KillEvent};

use crate::{entities::Projectile, World};

/// Hit parameters after the source's interceptors ran.
#[derive(Clone, Copy, Debug)]
struct Hit {
    damage: f32,
    chain_count: u32,
    chain_fraction: f32,
    chain_radius: f32,
    slow: Option<SlowEffect>,
    pierce_shield: bool,
}

impl World {
    fn resolve_hit(&self, source: CellCoord, enemy: EnemySnapshot, damage: f32) -> Hit {
        let Some(building) = self.building_snapshot(source) else {
            return Hit {
                damage,
                chain_count: 0,
                chain_fraction: 0.0,
                chain_radius: 0.0,
                slow: None,
                pierce_shield: false,
            };
        };
        let event = self.chain(&building).dispatch(HitEvent {
            building,
            enemy,
            damage,
            chain_count: 0,
            chain_fraction: 0.0,
            chain_radius: 0.0,
            slow: None,
            pierce_shield: false,
        });
        Hit {
            damage: event.damage,
            chain_count: event.chain_count,
            chain_fraction: event.chain_fraction,
            chain_radius: event.chain_radius,
            slow: event.slow,
            pierce_shield: event.pierce_shield,
        }
    }

    /// Lands a single-target hit from `source`, including any arcs it grants.
    pub(crate) fn strike(
        &mut self,
        source: CellCoord,
        target: EnemyId,
        damage: f32,
        out_events: &mut Vec<Event>,
    ) {
        let Some(enemy) = self.enemies.get(&target).map(|enemy| enemy.snapshot(target)) else {
            return;
        };
        let hit = self.resolve_hit(source, enemy, damage);
        self.apply_damage(Some(source), target, hit.damage, hit.pierce_shield, out_events);
        if let Some(slow) = hit.slow {
            if let Some(state) = self.enemies.get_mut(&target) {
                state.apply_slow(slow);
            }
        }
        if hit.chain_count > 0 && hit.chain_fraction > 0.0 {
            let arcs = self.nearest_enemies(enemy.position, hit.chain_radius, hit.chain_count, target);
            let arc_damage = hit.damage * hit.chain_fraction;
            for arc in arcs {
                self.apply_damage(Some(source), arc, arc_damage, hit.pierce_shield, out_events);
            }
        }
    }

    fn nearest_enemies(&self, origin: Vec2, radius: f32, count: u32, exclude: EnemyId) -> Vec<EnemyId> {
        let mut candidates: Vec<(f32, EnemyId)> = self
            .enemies
            .iter()
            .filter(|(id, _)| **id != exclude)
            .map(|(id, enemy)| (enemy.position.distance(origin), *id))
            .filter(|(distance, _)| *distance <= radius)
            .collect();
        candidates.sort_by(|left, right| {
            left.0
                .partial_cmp(&right.0)
                .unwrap_or(Ordering::Equal)
                .then(left.1.cmp(&right.1))
        });
        candidates
            .into_iter()
            .take(count as usize)
            .map(|(_, id)| id)
            .collect()
    }

    fn apply_damage(
        &mut self,
        source: Option<CellCoord>,
        target: EnemyId,
        damage: f32,
        pierce_shield: bool,
        out_events: &mut Vec<Event>,
    ) {
        let Some(enemy) = self.enemies.get_mut(&target) else {
            return;
        };
        let mut remaining = damage.max(0.0);
        let mut dealt = 0.0;
        if !pierce_shield {
            let absorbed = remaining.min(enemy.shield);
            enemy.shield -= absorbed;
            remaining -= absorbed;
            dealt += absorbed;
        }
        dealt += remaining.min(enemy.health.max(0.0));
        enemy.health -= remaining;
        let killed = enemy.health <= 0.0;

        if let Some(cell) = source {
            if let Some(stats) = self.stats_mut(cell) {
                stats.damage_dealt += f64::from(dealt);
            }
        }
        if killed {
            self.kill(target, source, out_events);
        }
    }

    fn kill(&mut self, target: EnemyId, source: Option<CellCoord>, out_events: &mut Vec<Event>) {
        let Some(enemy) = self.enemies.remove(&target) else {
            return;
        };
        let snapshot = enemy.snapshot(target);
        let base = self.config.kill_reward
            * (1.0 + self.elapsed_minutes() * self.config.reward_growth)
            * enemy.kind.stats().reward_multiplier;
        let reward = match source.and_then(|cell| self.building_snapshot(cell)) {
            Some(building) => {
                self.chain(&building)
                    .dispatch(KillEvent {
                        building,
                        enemy: snapshot,
                        reward: base,
                    })
                    .reward
            }
            None => base,
        }
        .max(0.0);

        self.resources
            .add(&Resources::new().with(ResourceKind::Matter, reward));
        self.kills += 1;
        if let Some(cell) = source {
            if let Some(stats) = self.stats_mut(cell) {
                stats.kills += 1;
            }
        }
        out_events.push(Event::EnemyKilled {
            enemy: target,
            kind: enemy.kind,
            wave: enemy.wave,
            source,
            reward,
        });
    }

    /// Damages every enemy within `radius` of `center` once, without attribution.
    fn explode(&mut self, center: Vec2, radius: f32, damage: f32, out_events: &mut Vec<Event>) {
        let victims: Vec<EnemyId> = self
            .enemies
            .iter()
            .filter(|(_, enemy)| enemy.position.distance(center) <= radius)
            .map(|(id, _)| *id)
            .collect();
        for victim in victims {
            self.apply_damage(None, victim, damage, false, out_events);
        }
    }

    /// Resolves an area payload: one hit dispatch, every victim damaged once.
    fn splash(&mut self, projectile: &Projectile, out_events: &mut Vec<Event>) {
        let victims: Vec<EnemyId> = self
            .enemies
            .iter()
            .filter(|(_, enemy)| enemy.position.distance(projectile.destination) <= projectile.splash_radius)
            .map(|(id, _)| *id)
            .collect();
        let representative = if victims.contains(&projectile.target) {
            projectile.target
        } else {
            match victims.first() {
                Some(first) => *first,
                None => return,
            }
        };
        let Some(enemy) = self
            .enemies
            .get(&representative)
            .map(|enemy| enemy.snapshot(representative))
        else {
            return;
        };
        let hit = self.resolve_hit(projectile.source, enemy, projectile.damage);
        for victim in victims {
            self.apply_damage(
                Some(projectile.source),
                victim,
                hit.damage,
                hit.pierce_shield,
                out_events,
            );
            if let (Some(slow), Some(state)) = (hit.slow, self.enemies.get_mut(&victim)) {
                state.apply_slow(slow);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn launch(
        &mut self,
        source: CellCoord,
        origin: Vec2,
        target: EnemyId,
        damage: f32,
        splash_radius: f32,
        speed: f32,
        out_events: &mut Vec<Event>,
    ) {
        let Some(destination) = self.enemies.get(&target).map(|enemy| enemy.position) else {
            return;
        };
        let id = ProjectileId::new(self.next_projectile);
        self.next_projectile = self.next_projectile.wrapping_add(1);
        let _ = self.projectiles.insert(
            id,
            Projectile {
                source,
                target,
                position: origin,
                destination,
                speed: speed.max(0.0),
                damage,
                splash_radius: splash_radius.max(0.0),
                frames_left: self.config.projectile_lifetime.max(1),
            },
        );
        out_events.push(Event::ProjectileLaunched {
            projectile: id,
            source,
            target,
        });
    }

    /// Moves projectiles, resolves arrivals and counts down timed effects.
    pub(crate) fn advance_frame(&mut self, now_ms: f64, out_events: &mut Vec<Event>) {
        self.now_ms = now_ms;
        let threshold = self.config.arrival_threshold;
        let mut arrived = Vec::new();
        let mut expired = Vec::new();
        for (id, projectile) in self.projectiles.iter_mut() {
            if projectile.advance(threshold) {
                arrived.push(*id);
                continue;
            }
            projectile.frames_left = projectile.frames_left.saturating_sub(1);
            if projectile.frames_left == 0 {
                expired.push(*id);
            }
        }
        for id in expired {
            let _ = self.projectiles.remove(&id);
        }
        for id in arrived {
            let Some(projectile) = self.projectiles.remove(&id) else {
                continue;
            };
            if projectile.splash_radius > 0.0 {
                self.splash(&projectile, out_events);
            } else if self.enemies.contains_key(&projectile.target) {
                self.strike(projectile.source, projectile.target, projectile.damage, out_events);
            }
        }
        for enemy in self.enemies.values_mut() {
            enemy.decay_slow();
        }
    }

    /// An enemy blocked by `cell` strikes it, subject to the per-enemy gate.
    pub(crate) fn contact(
        &mut self,
        enemy: EnemyId,
        cell: CellCoord,
        damage: f32,
        at_ms: f64,
        out_events: &mut Vec<Event>,
    ) {
        if self.game_over {
            return;
        }
        let interval = self.config.contact_interval_ms;
        let Some(state) = self.enemies.get_mut(&enemy) else {
            return;
        };
        if !state.ready_to_strike(at_ms, interval) {
            return;
        }
        state.last_contact_ms = Some(at_ms);
        self.damage_building(cell, damage, out_events);
    }

    fn damage_building(&mut self, cell: CellCoord, damage: f32, out_events: &mut Vec<Event>) {
        let Some(snapshot) = self.building_snapshot(cell) else {
            return;
        };
        let struck = self.chain(&snapshot).dispatch(AllyDamagedEvent {
            building: snapshot,
            damage,
        });
        let Some(state) = self.grid.get_mut(cell) else {
            return;
        };
        let mut remaining = struck.damage.max(0.0);
        let absorbed = remaining.min(state.shield);
        state.shield -= absorbed;
        remaining -= absorbed;
        state.health -= remaining;
        if state.health <= 0.0 {
            self.destroy(cell, out_events);
        }
    }

    fn destroy(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        let Some(snapshot) = self.building_snapshot(cell) else {
            return;
        };
        let blast = self.chain(&snapshot).dispatch(DestroyedEvent {
            building: snapshot,
            explosion_radius: 0.0,
            explosion_damage: 0.0,
        });
        out_events.push(Event::BuildingDestroyed {
            cell,
            kind: snapshot.kind,
        });

        if snapshot.kind == BuildingKind::Core {
            if let Some(state) = self.grid.get_mut(cell) {
                state.health = 0.0;
            }
            self.game_over = true;
            log::info!(
                "core destroyed after {} seconds with {} kills",
                self.elapsed_secs,
                self.kills
            );
            out_events.push(Event::CoreDestroyed);
        } else {
            let _ = self.clear_cell(cell, snapshot.kind);
        }

        if blast.explosion_radius > 0.0 && blast.explosion_damage > 0.0 {
            self.explode(cell.center(), blast.explosion_radius, blast.explosion_damage, out_events);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{apply, query, World, WorldConfig};
    use gridfort_core::{
        BuildingKind, CellCoord, Command, EnemyId, EnemyKind, Event, ResourceKind, Resources, Tile,
        Vec2,
    };
    use gridfort_registry::Registry;
    use std::sync::Arc;

    fn rich_world() -> World {
        let config = WorldConfig {
            grid_size: 11,
            ore_deposits: 0,
            starting_resources: Resources::new()
                .with(ResourceKind::Energy, 10_000.0)
                .with(ResourceKind::Matter, 10_000.0)
                .with(ResourceKind::Alloy, 10_000.0)
                .with(ResourceKind::Polymer, 10_000.0),
            ..WorldConfig::default()
        };
        World::new(config, Arc::new(Registry::standard()))
    }

    fn run(world: &mut World, commands: Vec<Command>) -> Vec<Event> {
        let mut events = Vec::new();
        for command in commands {
            apply(world, command, &mut events);
        }
        events
    }

    fn spawn(kind: EnemyKind, x: f32, y: f32) -> Command {
        Command::SpawnEnemy {
            kind,
            position: Vec2::new(x, y),
            wave: Some(1),
            health_multiplier: 1.0,
            speed_multiplier: 1.0,
        }
    }

    #[test]
    fn splash_hits_each_victim_exactly_once() {
        let mut world = rich_world();
        let cannon = CellCoord::new(0, 0);
        let _ = run(
            &mut world,
            vec![
                Command::PlaceBuilding {
                    kind: BuildingKind::Cannon,
                    cell: cannon,
                },
                spawn(EnemyKind::Tank, 3.0, 3.0),
                spawn(EnemyKind::Tank, 3.5, 3.0),
                spawn(EnemyKind::Tank, 9.0, 9.0),
                Command::LaunchProjectile {
                    source: cannon,
                    origin: cannon.center(),
                    target: EnemyId::new(0),
                    damage: 12.0,
                    splash_radius: 1.5,
                    speed: 100.0,
                },
                Command::AdvanceFrame { now_ms: 16.0 },
            ],
        );
        let view = query::enemy_view(&world);
        let health: Vec<f32> = view.iter().map(|enemy| enemy.health).collect();
        assert_eq!(health, vec![128.0, 128.0, 140.0]);
        assert_eq!(query::cell_stats(&world, cannon).damage_dealt, 24.0);
        assert!(query::projectiles(&world).is_empty());
    }

    #[test]
    fn chain_kills_flow_through_kill_accounting() {
        let mut world = rich_world();
        let turret = CellCoord::new(0, 0);
        let _ = run(
            &mut world,
            vec![
                Command::PlaceBuilding {
                    kind: BuildingKind::Turret,
                    cell: turret,
                },
                Command::InstallModule {
                    cell: turret,
                    module: gridfort_core::ModuleKind::ChainLightning,
                },
                spawn(EnemyKind::Swarm, 4.0, 4.0),
                spawn(EnemyKind::Swarm, 4.5, 4.0),
                spawn(EnemyKind::Swarm, 5.0, 4.5),
            ],
        );
        let matter_before = query::resources(&world).get(ResourceKind::Matter);
        let events = run(
            &mut world,
            vec![Command::StrikeEnemy {
                source: turret,
                enemy: EnemyId::new(0),
                damage: 20.0,
            }],
        );
        let killed = events
            .iter()
            .filter(|event| matches!(event, Event::EnemyKilled { .. }))
            .count();
        assert_eq!(killed, 3);
        assert_eq!(query::kills(&world), 3);
        assert_eq!(query::cell_stats(&world, turret).kills, 3);
        assert!(query::enemy_view(&world).is_empty());
        let reward = 3.0 * 5.0 * 0.4;
        assert!((query::resources(&world).get(ResourceKind::Matter) - matter_before - reward).abs() < 1e-9);
    }

    #[test]
    fn shields_absorb_unless_pierced() {
        let mut world = rich_world();
        let turret = CellCoord::new(0, 0);
        let _ = run(
            &mut world,
            vec![
                Command::PlaceBuilding {
                    kind: BuildingKind::Turret,
                    cell: turret,
                },
                spawn(EnemyKind::Shielded, 2.0, 2.0),
                Command::StrikeEnemy {
                    source: turret,
                    enemy: EnemyId::new(0),
                    damage: 10.0,
                },
            ],
        );
        let enemy = *query::enemy_view(&world).iter().next().expect("alive");
        assert_eq!(enemy.shield, 15.0);
        assert_eq!(enemy.health, 50.0);

        let _ = run(
            &mut world,
            vec![
                Command::InstallModule {
                    cell: turret,
                    module: gridfort_core::ModuleKind::ArmorPiercing,
                },
                Command::StrikeEnemy {
                    source: turret,
                    enemy: EnemyId::new(0),
                    damage: 10.0,
                },
            ],
        );
        let enemy = *query::enemy_view(&world).iter().next().expect("alive");
        assert_eq!(enemy.shield, 15.0);
        assert_eq!(enemy.health, 40.0);
    }

    #[test]
    fn destroyed_generator_explodes_and_frees_cell() {
        let mut world = rich_world();
        let generator = CellCoord::new(2, 2);
        let _ = run(
            &mut world,
            vec![
                Command::PlaceBuilding {
                    kind: BuildingKind::Generator,
                    cell: generator,
                },
                spawn(EnemyKind::Normal, 2.5, 1.2),
                spawn(EnemyKind::Normal, 9.0, 9.0),
            ],
        );
        let events = run(
            &mut world,
            vec![Command::ContactDamage {
                enemy: EnemyId::new(0),
                cell: generator,
                damage: 500.0,
                at_ms: 0.0,
            }],
        );
        assert!(events.contains(&Event::BuildingDestroyed {
            cell: generator,
            kind: BuildingKind::Generator,
        }));
        assert_eq!(query::tile(&world, generator), Some(Tile::Empty));
        let survivors: Vec<EnemyId> = query::enemy_view(&world).iter().map(|enemy| enemy.id).collect();
        assert_eq!(survivors, vec![EnemyId::new(1)]);
        assert!(!query::is_game_over(&world));
    }

    #[test]
    fn contact_strikes_are_rate_limited() {
        let mut world = rich_world();
        let wall = CellCoord::new(1, 1);
        let _ = run(
            &mut world,
            vec![
                Command::PlaceBuilding {
                    kind: BuildingKind::Wall,
                    cell: wall,
                },
                spawn(EnemyKind::Normal, 1.5, 0.4),
            ],
        );
        let strike = |at_ms| Command::ContactDamage {
            enemy: EnemyId::new(0),
            cell: wall,
            damage: 10.0,
            at_ms,
        };
        let _ = run(&mut world, vec![strike(0.0), strike(500.0), strike(999.0), strike(1000.0)]);
        let health = query::building(&world, wall).expect("wall").health;
        assert_eq!(health, 200.0 - 2.0 * 8.0);
    }

    #[test]
    fn core_destruction_ends_the_run() {
        let mut world = rich_world();
        let core = query::core_cell(&world);
        let events = run(
            &mut world,
            vec![
                spawn(EnemyKind::Boss, 5.5, 4.4),
                Command::ContactDamage {
                    enemy: EnemyId::new(0),
                    cell: core,
                    damage: 10_000.0,
                    at_ms: 0.0,
                },
                Command::PlaceBuilding {
                    kind: BuildingKind::Wall,
                    cell: CellCoord::new(0, 0),
                },
            ],
        );
        assert!(events.contains(&Event::CoreDestroyed));
        assert!(query::is_game_over(&world));
        assert_eq!(query::owned_count(&world, BuildingKind::Core), 1);
        assert!(matches!(events.last(), Some(Event::PlacementRejected { .. })));
    }

    #[test]
    fn hangar_loss_removes_its_drones() {
        let mut world = rich_world();
        let _ = run(
            &mut world,
            vec![Command::UnlockBuilding {
                kind: BuildingKind::Hangar,
            }],
        );
        let hangar = CellCoord::new(1, 1);
        let _ = run(
            &mut world,
            vec![
                Command::PlaceBuilding {
                    kind: BuildingKind::Hangar,
                    cell: hangar,
                },
                Command::SpawnDrone { hangar },
                Command::SpawnDrone { hangar },
                Command::SpawnDrone {
                    hangar: CellCoord::new(3, 3),
                },
            ],
        );
        assert_eq!(query::drone_view(&world).len(), 2);
        let _ = run(&mut world, vec![Command::RemoveBuilding { cell: hangar }]);
        assert!(query::drone_view(&world).is_empty());
    }

    #[test]
    fn projectiles_expire_after_their_lifetime() {
        let mut world = rich_world();
        let turret = CellCoord::new(0, 0);
        let mut commands = vec![
            spawn(EnemyKind::Normal, 8.0, 8.0),
            Command::LaunchProjectile {
                source: turret,
                origin: turret.center(),
                target: EnemyId::new(0),
                damage: 5.0,
                splash_radius: 0.0,
                speed: 0.0,
            },
        ];
        for frame in 0..query::config(&world).projectile_lifetime {
            commands.push(Command::AdvanceFrame {
                now_ms: f64::from(frame) * 16.0,
            });
        }
        let _ = run(&mut world, commands);
        assert!(query::projectiles(&world).is_empty());
        let enemy = *query::enemy_view(&world).iter().next().expect("alive");
        assert_eq!(enemy.health, enemy.max_health);
    }
}
