#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Static definitions for every building and module kind.
//!
//! The registry is the only place that knows what a kind *is*: its stats,
//! costs, weapon or aura profile and the hook bundle that customises it.
//! Everything else resolves behaviour through it.

mod behaviors;
mod catalog;

use gridfort_core::{BuildingKind, ModuleKind, Resources, SlowEffect};
use gridfort_system_hooks::{BundleSource, HookBundle};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad role of a building kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuildingCategory {
    /// The defended core.
    Core,
    /// Produces or refines resources.
    Production,
    /// Attacks enemies.
    Defense,
    /// Projects an aura.
    Support,
    /// Blocks movement.
    Barrier,
}

/// Attack parameters of a weapon kind at level 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeaponProfile {
    /// How the weapon acquires and damages targets.
    pub archetype: WeaponArchetype,
    /// Damage per hit.
    pub damage: f32,
    /// Reach in cells.
    pub range: f32,
    /// Fire gate threshold in `[0, 1]`; zero fires every frame.
    pub fire_probability: f32,
}

/// Targeting and damage delivery strategy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WeaponArchetype {
    /// Projectile at the nearest enemy.
    Single {
        /// Projectile speed in cells per frame.
        projectile_speed: f32,
    },
    /// Instant hits on the nearest `base_targets + level` enemies.
    MultiTarget {
        /// Targets at level zero.
        base_targets: u32,
    },
    /// Projectile exploding over an area at its destination.
    Splash {
        /// Projectile speed in cells per frame.
        projectile_speed: f32,
        /// Area radius in cells.
        splash_radius: f32,
    },
    /// Continuous beam whose damage ramps while it stays on one target.
    FocusBeam {
        /// Upper bound on the ramp multiplier.
        focus_cap: f32,
    },
    /// Periodic piercing ray aimed at the nearest enemy.
    LineBeam {
        /// Frames between shots.
        interval_frames: u32,
    },
    /// Periodic blast hitting everything within range.
    Pulse {
        /// Frames between blasts.
        interval_frames: u32,
    },
    /// Pulls enemies in range toward the well and slows them.
    Gravity {
        /// Distance pulled per frame, in cells.
        pull: f32,
        /// Slow applied every frame an enemy is in range.
        slow: SlowEffect,
    },
    /// Launches drones that chase and shoot enemies.
    Drones(DroneProfile),
}

/// Parameters of a hangar's drone wing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DroneProfile {
    /// Drones maintained at level zero; the cap grows by one per level.
    pub base_count: u32,
    /// Drone speed in cells per frame.
    pub speed: f32,
    /// Distance at which a drone opens fire.
    pub strike_range: f32,
    /// Speed of the drone's projectiles.
    pub projectile_speed: f32,
}

/// Effect projected by a support kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuraKind {
    /// Repairs structures in radius by `strength` health per tick.
    Heal,
    /// Recharges shields in radius by `strength` per tick.
    ShieldRefresh,
    /// Adds `strength` range to weapons in radius.
    RangeBuff,
    /// Adds `strength` as a fractional damage bonus to every weapon.
    GlobalDamage,
    /// Subtracts `strength` from every weapon's fire probability.
    GlobalFireRate,
    /// Repairs every structure by `strength` health per tick.
    GlobalHeal,
    /// Multiplies the speed of enemies in radius by `strength`.
    SlowField,
}

/// Aura parameters of a support kind at level 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SupportProfile {
    /// Effect projected.
    pub aura: AuraKind,
    /// Reach in cells; ignored by global auras.
    pub radius: f32,
    /// Magnitude, interpreted per aura kind.
    pub strength: f32,
}

impl SupportProfile {
    /// Magnitude projected by a structure with the given level multiplier.
    ///
    /// Slow fields carry a speed factor, which does not grow with level.
    #[must_use]
    pub fn strength_at(&self, level_multiplier: f32) -> f32 {
        match self.aura {
            AuraKind::SlowField => self.strength,
            _ => self.strength * level_multiplier,
        }
    }
}

/// Everything the engine knows about a building kind.
#[derive(Clone, Debug)]
pub struct BuildingDefinition {
    /// Kind described.
    pub kind: BuildingKind,
    /// Broad role.
    pub category: BuildingCategory,
    /// Maximum health at level 1.
    pub base_health: f32,
    /// Price of the first instance.
    pub cost: Resources,
    /// Price multiplier per instance already owned; at least 1.
    pub cost_growth: f64,
    /// Output per economic tick at level 1.
    pub production: Resources,
    /// Upkeep per economic tick at level 1.
    pub consumption: Resources,
    /// Attack profile for weapon kinds.
    pub weapon: Option<WeaponProfile>,
    /// Aura profile for support kinds.
    pub support: Option<SupportProfile>,
    /// Whether the kind must sit on an ore deposit.
    pub requires_ore: bool,
    /// Maximum simultaneous instances.
    pub population_cap: Option<u32>,
    /// Research price; `None` means available from the start.
    pub unlock_cost: Option<Resources>,
    /// Interceptors customising the kind.
    pub hooks: Option<HookBundle>,
}

/// Everything the engine knows about a module kind.
#[derive(Clone, Debug)]
pub struct ModuleDefinition {
    /// Kind described.
    pub kind: ModuleKind,
    /// Building kinds that accept the module.
    pub applies_to: Vec<BuildingKind>,
    /// Flat installation price.
    pub cost: Resources,
    /// Interceptors contributed by the module.
    pub hooks: HookBundle,
}

impl ModuleDefinition {
    /// Reports whether the module may be installed on `kind`.
    #[must_use]
    pub fn applies_to(&self, kind: BuildingKind) -> bool {
        self.applies_to.contains(&kind)
    }
}

/// Tuning override for one building kind, as read from configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildingOverride {
    /// Kind being tuned.
    pub kind: Option<BuildingKind>,
    /// Replacement base health.
    pub base_health: Option<f32>,
    /// Replacement first-instance price.
    pub cost: Option<Resources>,
    /// Replacement price growth.
    pub cost_growth: Option<f64>,
    /// Replacement production.
    pub production: Option<Resources>,
    /// Replacement consumption.
    pub consumption: Option<Resources>,
    /// Replacement weapon damage.
    pub damage: Option<f32>,
    /// Replacement weapon range.
    pub range: Option<f32>,
    /// Replacement fire gate threshold.
    pub fire_probability: Option<f32>,
}

/// Errors raised while building or tuning a registry.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RegistryError {
    /// A building kind has no definition.
    #[error("no definition for building {0:?}")]
    MissingBuilding(BuildingKind),
    /// A building kind is defined more than once.
    #[error("duplicate definition for building {0:?}")]
    DuplicateBuilding(BuildingKind),
    /// A module kind has no definition.
    #[error("no definition for module {0:?}")]
    MissingModule(ModuleKind),
    /// A module kind is defined more than once.
    #[error("duplicate definition for module {0:?}")]
    DuplicateModule(ModuleKind),
    /// Price growth below one would make later instances cheaper.
    #[error("cost growth {growth} for {kind:?} must be finite and at least 1")]
    InvalidCostGrowth {
        /// Offending kind.
        kind: BuildingKind,
        /// Rejected growth.
        growth: f64,
    },
    /// Health must be positive.
    #[error("base health {health} for {kind:?} must be positive")]
    InvalidHealth {
        /// Offending kind.
        kind: BuildingKind,
        /// Rejected health.
        health: f32,
    },
    /// Fire probability outside `[0, 1]`.
    #[error("fire probability {value} for {kind:?} must lie in [0, 1]")]
    InvalidFireProbability {
        /// Offending kind.
        kind: BuildingKind,
        /// Rejected value.
        value: f32,
    },
    /// Weapon stats were overridden on a kind without a weapon.
    #[error("{0:?} has no weapon to tune")]
    NotAWeapon(BuildingKind),
    /// An override omitted its kind.
    #[error("building override is missing its kind")]
    OverrideWithoutKind,
    /// A module lists no applicable building kinds.
    #[error("module {0:?} applies to no building")]
    EmptyApplicability(ModuleKind),
}

/// Lookup table of building and module definitions, indexed by kind.
#[derive(Clone, Debug)]
pub struct Registry {
    buildings: Vec<BuildingDefinition>,
    modules: Vec<ModuleDefinition>,
}

impl Registry {
    /// Registry holding the standard catalog.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            buildings: catalog::buildings(),
            modules: catalog::modules(),
        }
    }

    /// Builds a registry from explicit definitions, one per kind.
    pub fn from_definitions(
        buildings: Vec<BuildingDefinition>,
        modules: Vec<ModuleDefinition>,
    ) -> Result<Self, RegistryError> {
        let mut building_slots: Vec<Option<BuildingDefinition>> = vec![None; BuildingKind::ALL.len()];
        for definition in buildings {
            let slot = &mut building_slots[definition.kind.index()];
            if slot.is_some() {
                return Err(RegistryError::DuplicateBuilding(definition.kind));
            }
            *slot = Some(definition);
        }
        let mut module_slots: Vec<Option<ModuleDefinition>> = vec![None; ModuleKind::ALL.len()];
        for definition in modules {
            let slot = &mut module_slots[definition.kind.index()];
            if slot.is_some() {
                return Err(RegistryError::DuplicateModule(definition.kind));
            }
            *slot = Some(definition);
        }

        let buildings = BuildingKind::ALL
            .iter()
            .zip(building_slots)
            .map(|(kind, slot)| slot.ok_or(RegistryError::MissingBuilding(*kind)))
            .collect::<Result<Vec<_>, _>>()?;
        let modules = ModuleKind::ALL
            .iter()
            .zip(module_slots)
            .map(|(kind, slot)| slot.ok_or(RegistryError::MissingModule(*kind)))
            .collect::<Result<Vec<_>, _>>()?;

        let registry = Self { buildings, modules };
        registry.validate()?;
        Ok(registry)
    }

    /// Checks every definition for values the engine cannot honour.
    pub fn validate(&self) -> Result<(), RegistryError> {
        for definition in &self.buildings {
            validate_building(definition)?;
        }
        for definition in &self.modules {
            if definition.applies_to.is_empty() {
                return Err(RegistryError::EmptyApplicability(definition.kind));
            }
        }
        Ok(())
    }

    /// Definition of a building kind.
    #[must_use]
    pub fn building(&self, kind: BuildingKind) -> &BuildingDefinition {
        &self.buildings[kind.index()]
    }

    /// Definition of a module kind.
    #[must_use]
    pub fn module(&self, kind: ModuleKind) -> &ModuleDefinition {
        &self.modules[kind.index()]
    }

    /// Every building definition in kind order.
    pub fn buildings(&self) -> impl Iterator<Item = &BuildingDefinition> {
        self.buildings.iter()
    }

    /// Every module definition in kind order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleDefinition> {
        self.modules.iter()
    }

    /// Replaces a building definition after validating it.
    pub fn replace_building(&mut self, definition: BuildingDefinition) -> Result<(), RegistryError> {
        validate_building(&definition)?;
        let index = definition.kind.index();
        self.buildings[index] = definition;
        Ok(())
    }

    /// Replaces a module definition after validating it.
    pub fn replace_module(&mut self, definition: ModuleDefinition) -> Result<(), RegistryError> {
        if definition.applies_to.is_empty() {
            return Err(RegistryError::EmptyApplicability(definition.kind));
        }
        let index = definition.kind.index();
        self.modules[index] = definition;
        Ok(())
    }

    /// Applies configuration overrides in order; on error nothing is changed.
    pub fn apply_overrides(&mut self, overrides: &[BuildingOverride]) -> Result<(), RegistryError> {
        let mut tuned = self.buildings.clone();
        for entry in overrides {
            let kind = entry.kind.ok_or(RegistryError::OverrideWithoutKind)?;
            let definition = &mut tuned[kind.index()];
            if let Some(health) = entry.base_health {
                definition.base_health = health;
            }
            if let Some(cost) = entry.cost {
                definition.cost = cost;
            }
            if let Some(growth) = entry.cost_growth {
                definition.cost_growth = growth;
            }
            if let Some(production) = entry.production {
                definition.production = production;
            }
            if let Some(consumption) = entry.consumption {
                definition.consumption = consumption;
            }
            let tunes_weapon =
                entry.damage.is_some() || entry.range.is_some() || entry.fire_probability.is_some();
            if tunes_weapon {
                let weapon = definition
                    .weapon
                    .as_mut()
                    .ok_or(RegistryError::NotAWeapon(kind))?;
                if let Some(damage) = entry.damage {
                    weapon.damage = damage;
                }
                if let Some(range) = entry.range {
                    weapon.range = range;
                }
                if let Some(probability) = entry.fire_probability {
                    weapon.fire_probability = probability;
                }
            }
            validate_building(definition)?;
        }
        self.buildings = tuned;
        Ok(())
    }

    /// Price of the next instance when `owned` instances already exist.
    #[must_use]
    pub fn placement_cost(&self, kind: BuildingKind, owned: u32) -> Resources {
        let definition = self.building(kind);
        definition
            .cost
            .scaled(definition.cost_growth.powi(owned.min(i32::MAX as u32) as i32))
    }

    /// Price of raising a structure from `level` to `level + 1`.
    #[must_use]
    pub fn upgrade_cost(&self, kind: BuildingKind, level: u32, factor: f64) -> Resources {
        self.building(kind).cost.scaled(factor * f64::from(level))
    }

    /// Value a structure at `level` is worth before refund scaling.
    #[must_use]
    pub fn refund_basis(&self, kind: BuildingKind, level: u32) -> Resources {
        self.building(kind).cost.scaled(f64::from(level))
    }

    /// Kinds available without research.
    pub fn starting_unlocks(&self) -> impl Iterator<Item = BuildingKind> + '_ {
        self.buildings
            .iter()
            .filter(|definition| definition.unlock_cost.is_none())
            .map(|definition| definition.kind)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}

impl BundleSource for Registry {
    fn building_bundle(&self, kind: BuildingKind) -> Option<HookBundle> {
        self.building(kind).hooks
    }

    fn module_bundle(&self, module: ModuleKind) -> Option<HookBundle> {
        Some(self.module(module).hooks)
    }
}

fn validate_building(definition: &BuildingDefinition) -> Result<(), RegistryError> {
    let kind = definition.kind;
    if !definition.cost_growth.is_finite() || definition.cost_growth < 1.0 {
        return Err(RegistryError::InvalidCostGrowth {
            kind,
            growth: definition.cost_growth,
        });
    }
    if !(definition.base_health > 0.0 && definition.base_health.is_finite()) {
        return Err(RegistryError::InvalidHealth {
            kind,
            health: definition.base_health,
        });
    }
    if let Some(weapon) = definition.weapon {
        if !(0.0..=1.0).contains(&weapon.fire_probability) {
            return Err(RegistryError::InvalidFireProbability {
                kind,
                value: weapon.fire_probability,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{BuildingOverride, Registry, RegistryError};
    use gridfort_core::{BuildingKind, ModuleKind, ResourceKind};

    #[test]
    fn standard_catalog_validates() {
        let registry = Registry::standard();
        assert_eq!(registry.validate(), Ok(()));
        for kind in BuildingKind::ALL {
            assert_eq!(registry.building(kind).kind, kind);
        }
        for kind in ModuleKind::ALL {
            assert_eq!(registry.module(kind).kind, kind);
        }
    }

    #[test]
    fn placement_cost_is_non_decreasing_in_owned_count() {
        let registry = Registry::standard();
        for kind in BuildingKind::ALL {
            let mut previous = registry.placement_cost(kind, 0);
            for owned in 1..12 {
                let next = registry.placement_cost(kind, owned);
                for resource in ResourceKind::ALL {
                    assert!(next.get(resource) >= previous.get(resource), "{kind:?}");
                }
                previous = next;
            }
        }
    }

    #[test]
    fn override_rejecting_growth_leaves_registry_untouched() {
        let mut registry = Registry::standard();
        let before = registry.building(BuildingKind::Turret).cost_growth;
        let result = registry.apply_overrides(&[BuildingOverride {
            kind: Some(BuildingKind::Turret),
            cost_growth: Some(0.5),
            ..BuildingOverride::default()
        }]);
        assert!(matches!(result, Err(RegistryError::InvalidCostGrowth { .. })));
        assert_eq!(registry.building(BuildingKind::Turret).cost_growth, before);
    }

    #[test]
    fn weapon_overrides_require_a_weapon() {
        let mut registry = Registry::standard();
        let result = registry.apply_overrides(&[BuildingOverride {
            kind: Some(BuildingKind::SolarPanel),
            damage: Some(3.0),
            ..BuildingOverride::default()
        }]);
        assert_eq!(result, Err(RegistryError::NotAWeapon(BuildingKind::SolarPanel)));
    }

    #[test]
    fn from_definitions_rejects_missing_kinds() {
        let mut buildings: Vec<_> = Registry::standard().buildings().cloned().collect();
        let _ = buildings.pop();
        let modules: Vec<_> = Registry::standard().modules().cloned().collect();
        let result = Registry::from_definitions(buildings, modules);
        assert!(matches!(result, Err(RegistryError::MissingBuilding(BuildingKind::Nanoforge))));
    }
}
