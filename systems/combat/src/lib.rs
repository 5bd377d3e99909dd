#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that decides, every combat frame, what each weapon does.
//!
//! The system reads immutable views and emits launch, strike, slow and pull
//! commands. Damage resolution, kills and rewards happen in the world when
//! those commands are applied.

mod drones;
mod targeting;

use std::collections::{BTreeMap, BTreeSet};

use gridfort_core::{
    level_multiplier, AuraBuffs, BuildingSnapshot, BuildingView, CellCoord, Command, DroneView,
    EnemyId, EnemySnapshot, EnemyView,
};
use gridfort_registry::{Registry, WeaponArchetype, WeaponProfile};
use gridfort_system_hooks::{CombatTickEvent, EnterRangeEvent, HookChain};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Immutable inputs of one combat frame.
#[derive(Clone, Copy, Debug)]
pub struct Battlefield<'a> {
    /// Definitions of every building kind.
    pub registry: &'a Registry,
    /// Per-level growth of weapon damage.
    pub level_scaling: f32,
    /// Every structure, row-major.
    pub buildings: &'a BuildingView,
    /// Every live enemy, by id.
    pub enemies: &'a EnemyView,
    /// Every drone, by id.
    pub drones: &'a DroneView,
    /// Buffs from the latest aura pass.
    pub buffs: &'a AuraBuffs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Focus {
    target: EnemyId,
    frames: u32,
}

/// Combat system holding the per-weapon memory that spans frames.
#[derive(Debug)]
pub struct Combat {
    rng: ChaCha8Rng,
    focus: BTreeMap<CellCoord, Focus>,
    charge: BTreeMap<CellCoord, u32>,
    acquired: BTreeMap<CellCoord, EnemyId>,
}

impl Combat {
    /// Creates a combat system whose fire gate draws from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            focus: BTreeMap::new(),
            charge: BTreeMap::new(),
            acquired: BTreeMap::new(),
        }
    }

    /// Emits the commands produced by every powered weapon for one frame.
    pub fn handle(&mut self, field: &Battlefield<'_>, out: &mut Vec<Command>) {
        self.forget_missing(field.buildings);

        for building in field.buildings.iter().filter(|building| building.powered) {
            let Some(profile) = field.registry.building(building.kind).weapon else {
                continue;
            };
            let chain = HookChain::for_building(field.registry, building);
            let tick = chain.dispatch(self.seed_tick(field, building, &profile));
            self.fire(field, &chain, building, &profile, tick, out);
        }

        drones::remove_orphans(field, out);
    }

    fn forget_missing(&mut self, buildings: &BuildingView) {
        let standing: BTreeSet<CellCoord> = buildings.iter().map(|building| building.cell).collect();
        self.focus.retain(|cell, _| standing.contains(cell));
        self.charge.retain(|cell, _| standing.contains(cell));
        self.acquired.retain(|cell, _| standing.contains(cell));
    }

    fn seed_tick(
        &self,
        field: &Battlefield<'_>,
        building: &BuildingSnapshot,
        profile: &WeaponProfile,
    ) -> CombatTickEvent {
        let multiplier = level_multiplier(building.level, field.level_scaling);
        let (target_cap, splash_radius, focus_cap) = match profile.archetype {
            WeaponArchetype::MultiTarget { base_targets } => (base_targets + building.level, 0.0, 1.0),
            WeaponArchetype::Splash { splash_radius, .. } => (1, splash_radius, 1.0),
            WeaponArchetype::FocusBeam { focus_cap } => (1, 0.0, focus_cap),
            _ => (1, 0.0, 1.0),
        };
        CombatTickEvent {
            building: *building,
            level_multiplier: multiplier,
            damage: profile.damage * multiplier * (1.0 + field.buffs.global_damage),
            fire_probability: profile.fire_probability - field.buffs.global_fire_rate,
            range: profile.range + field.buffs.range_bonus(building.cell),
            target_cap,
            splash_radius,
            focus_frames: self.focus.get(&building.cell).map_or(0, |focus| focus.frames),
            focus_cap,
        }
    }

    /// Fire gate: passes when a uniform draw reaches the threshold.
    fn gate(&mut self, fire_probability: f32) -> bool {
        self.rng.gen::<f32>() >= fire_probability.clamp(0.0, 1.0)
    }

    fn fire(
        &mut self,
        field: &Battlefield<'_>,
        chain: &HookChain,
        building: &BuildingSnapshot,
        profile: &WeaponProfile,
        tick: CombatTickEvent,
        out: &mut Vec<Command>,
    ) {
        let cell = building.cell;
        let origin = cell.center();
        match profile.archetype {
            WeaponArchetype::Single { projectile_speed }
            | WeaponArchetype::Splash {
                projectile_speed, ..
            } => {
                let Some(target) = targeting::nearest(field.enemies, origin, tick.range) else {
                    let _ = self.acquired.remove(&cell);
                    return;
                };
                self.acquire(chain, building, target, out);
                if self.gate(tick.fire_probability) {
                    out.push(Command::LaunchProjectile {
                        source: cell,
                        origin,
                        target: target.id,
                        damage: tick.damage,
                        splash_radius: tick.splash_radius,
                        speed: projectile_speed,
                    });
                }
            }
            WeaponArchetype::MultiTarget { .. } => {
                let targets = targeting::nearest_n(field.enemies, origin, tick.range, tick.target_cap);
                let Some(first) = targets.first() else {
                    let _ = self.acquired.remove(&cell);
                    return;
                };
                self.acquire(chain, building, first, out);
                if self.gate(tick.fire_probability) {
                    for target in targets {
                        out.push(Command::StrikeEnemy {
                            source: cell,
                            enemy: target.id,
                            damage: tick.damage,
                        });
                    }
                }
            }
            WeaponArchetype::FocusBeam { .. } => {
                self.focus_beam(field, chain, building, profile, tick, out);
            }
            WeaponArchetype::LineBeam { interval_frames } => {
                if !self.charged(cell, interval_frames) {
                    return;
                }
                let Some(aim) = targeting::nearest(field.enemies, origin, tick.range) else {
                    return;
                };
                self.acquire(chain, building, aim, out);
                if !self.gate(tick.fire_probability) {
                    return;
                }
                let _ = self.charge.insert(cell, 0);
                for target in targeting::along_ray(field.enemies, origin, aim.position, tick.range) {
                    out.push(Command::StrikeEnemy {
                        source: cell,
                        enemy: target.id,
                        damage: tick.damage,
                    });
                }
            }
            WeaponArchetype::Pulse { interval_frames } => {
                if !self.charged(cell, interval_frames) {
                    return;
                }
                let victims: Vec<&EnemySnapshot> =
                    targeting::in_range(field.enemies, origin, tick.range).collect();
                if victims.is_empty() || !self.gate(tick.fire_probability) {
                    return;
                }
                let _ = self.charge.insert(cell, 0);
                for target in victims {
                    out.push(Command::StrikeEnemy {
                        source: cell,
                        enemy: target.id,
                        damage: tick.damage,
                    });
                }
            }
            WeaponArchetype::Gravity { pull, slow } => {
                for target in targeting::in_range(field.enemies, origin, tick.range) {
                    let offset = origin - target.position;
                    let step = offset.normalize_or_zero() * pull.min(offset.length());
                    out.push(Command::PullEnemy {
                        enemy: target.id,
                        to: target.position + step,
                        slow,
                    });
                }
            }
            WeaponArchetype::Drones(drone_profile) => {
                drones::direct(self, field, building, &drone_profile, &tick, out);
            }
        }
    }

    fn focus_beam(
        &mut self,
        field: &Battlefield<'_>,
        chain: &HookChain,
        building: &BuildingSnapshot,
        profile: &WeaponProfile,
        tick: CombatTickEvent,
        out: &mut Vec<Command>,
    ) {
        let cell = building.cell;
        let Some(target) = targeting::nearest(field.enemies, cell.center(), tick.range) else {
            let _ = self.focus.remove(&cell);
            let _ = self.acquired.remove(&cell);
            return;
        };
        let previous = self.focus.get(&cell).copied();
        let tick = match previous {
            Some(focus) if focus.target == target.id => tick,
            _ => chain.dispatch(CombatTickEvent {
                focus_frames: 0,
                ..self.seed_tick(field, building, profile)
            }),
        };
        let frames = match previous {
            Some(focus) if focus.target == target.id => focus.frames.saturating_add(1),
            _ => 1,
        };
        let _ = self.focus.insert(
            cell,
            Focus {
                target: target.id,
                frames,
            },
        );
        self.acquire(chain, building, target, out);
        if self.gate(tick.fire_probability) {
            out.push(Command::StrikeEnemy {
                source: cell,
                enemy: target.id,
                damage: tick.damage,
            });
        }
    }

    /// Counts one frame of charge and reports whether the weapon is ready.
    fn charged(&mut self, cell: CellCoord, interval_frames: u32) -> bool {
        let charge = self.charge.entry(cell).or_insert(0);
        *charge = charge.saturating_add(1).min(interval_frames.max(1));
        *charge >= interval_frames.max(1)
    }

    /// Records the weapon's current target, announcing newly acquired ones.
    fn acquire(
        &mut self,
        chain: &HookChain,
        building: &BuildingSnapshot,
        target: &EnemySnapshot,
        out: &mut Vec<Command>,
    ) {
        if self.acquired.insert(building.cell, target.id) == Some(target.id) {
            return;
        }
        let entered = chain.dispatch(EnterRangeEvent {
            building: *building,
            enemy: *target,
            slow: None,
        });
        if let Some(slow) = entered.slow {
            out.push(Command::SlowEnemy {
                enemy: target.id,
                slow,
            });
        }
    }
}
