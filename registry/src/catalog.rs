//! Standard building and module catalog.

use gridfort_core::{BuildingKind, ModuleKind, ResourceKind, Resources, SlowEffect};
use gridfort_system_hooks::HookBundle;

use crate::{
    behaviors, AuraKind, BuildingCategory, BuildingDefinition, DroneProfile, ModuleDefinition,
    SupportProfile, WeaponArchetype, WeaponProfile,
};

const WEAPONS: [BuildingKind; 8] = [
    BuildingKind::Turret,
    BuildingKind::Cannon,
    BuildingKind::TeslaCoil,
    BuildingKind::Laser,
    BuildingKind::Railgun,
    BuildingKind::PulseEmitter,
    BuildingKind::GravityWell,
    BuildingKind::Hangar,
];

const PRODUCERS: [BuildingKind; 7] = [
    BuildingKind::SolarPanel,
    BuildingKind::Generator,
    BuildingKind::Extractor,
    BuildingKind::DeepDrill,
    BuildingKind::Smelter,
    BuildingKind::Fabricator,
    BuildingKind::QuantumLab,
];

const RADIAL_SUPPORT: [BuildingKind; 4] = [
    BuildingKind::FrostTower,
    BuildingKind::RepairStation,
    BuildingKind::ShieldGenerator,
    BuildingKind::Radar,
];

fn price(energy: f64, matter: f64, alloy: f64, polymer: f64, quantum: f64) -> Resources {
    Resources::new()
        .with(ResourceKind::Energy, energy)
        .with(ResourceKind::Matter, matter)
        .with(ResourceKind::Alloy, alloy)
        .with(ResourceKind::Polymer, polymer)
        .with(ResourceKind::Quantum, quantum)
}

fn matter(amount: f64) -> Resources {
    Resources::new().with(ResourceKind::Matter, amount)
}

fn energy(amount: f64) -> Resources {
    Resources::new().with(ResourceKind::Energy, amount)
}

fn base(kind: BuildingKind, category: BuildingCategory, base_health: f32, cost: Resources) -> BuildingDefinition {
    BuildingDefinition {
        kind,
        category,
        base_health,
        cost,
        cost_growth: 1.15,
        production: Resources::ZERO,
        consumption: Resources::ZERO,
        weapon: None,
        support: None,
        requires_ore: false,
        population_cap: None,
        unlock_cost: None,
        hooks: None,
    }
}

fn weapon(archetype: WeaponArchetype, damage: f32, range: f32, fire_probability: f32) -> Option<WeaponProfile> {
    Some(WeaponProfile {
        archetype,
        damage,
        range,
        fire_probability,
    })
}

fn aura(aura: AuraKind, radius: f32, strength: f32) -> Option<SupportProfile> {
    Some(SupportProfile {
        aura,
        radius,
        strength,
    })
}

pub(crate) fn buildings() -> Vec<BuildingDefinition> {
    use BuildingCategory::{Barrier, Core, Defense, Production, Support};

    vec![
        BuildingDefinition {
            cost_growth: 1.0,
            production: price(2.0, 2.0, 0.0, 0.0, 0.0),
            population_cap: Some(1),
            hooks: Some(behaviors::core()),
            ..base(BuildingKind::Core, Core, 500.0, Resources::ZERO)
        },
        BuildingDefinition {
            production: energy(3.0),
            ..base(BuildingKind::SolarPanel, Production, 40.0, matter(10.0))
        },
        BuildingDefinition {
            cost_growth: 1.2,
            production: energy(12.0),
            consumption: matter(2.0),
            hooks: Some(behaviors::generator()),
            ..base(BuildingKind::Generator, Production, 60.0, matter(30.0))
        },
        BuildingDefinition {
            production: matter(4.0),
            consumption: energy(1.0),
            requires_ore: true,
            ..base(BuildingKind::Extractor, Production, 50.0, price(5.0, 15.0, 0.0, 0.0, 0.0))
        },
        BuildingDefinition {
            cost_growth: 1.25,
            production: matter(12.0),
            consumption: energy(4.0),
            requires_ore: true,
            unlock_cost: Some(price(0.0, 120.0, 20.0, 0.0, 0.0)),
            ..base(BuildingKind::DeepDrill, Production, 80.0, price(0.0, 60.0, 10.0, 0.0, 0.0))
        },
        BuildingDefinition {
            cost_growth: 1.2,
            production: price(0.0, 0.0, 1.0, 0.0, 0.0),
            consumption: price(2.0, 3.0, 0.0, 0.0, 0.0),
            ..base(BuildingKind::Smelter, Production, 60.0, matter(40.0))
        },
        BuildingDefinition {
            cost_growth: 1.25,
            production: price(0.0, 0.0, 0.0, 0.5, 0.0),
            consumption: price(3.0, 0.0, 2.0, 0.0, 0.0),
            unlock_cost: Some(price(0.0, 100.0, 30.0, 0.0, 0.0)),
            ..base(BuildingKind::Fabricator, Production, 60.0, price(0.0, 80.0, 20.0, 0.0, 0.0))
        },
        BuildingDefinition {
            cost_growth: 1.3,
            production: price(0.0, 0.0, 0.0, 0.0, 0.2),
            consumption: price(6.0, 0.0, 0.0, 1.0, 0.0),
            population_cap: Some(2),
            unlock_cost: Some(price(0.0, 200.0, 80.0, 20.0, 0.0)),
            hooks: Some(behaviors::quantum_lab()),
            ..base(BuildingKind::QuantumLab, Production, 70.0, price(0.0, 150.0, 50.0, 20.0, 0.0))
        },
        BuildingDefinition {
            cost_growth: 1.05,
            hooks: Some(behaviors::wall()),
            ..base(BuildingKind::Wall, Barrier, 200.0, matter(5.0))
        },
        BuildingDefinition {
            consumption: energy(1.0),
            weapon: weapon(
                WeaponArchetype::Single {
                    projectile_speed: 0.25,
                },
                5.0,
                4.0,
                0.95,
            ),
            ..base(BuildingKind::Turret, Defense, 80.0, matter(25.0))
        },
        BuildingDefinition {
            cost_growth: 1.2,
            consumption: energy(2.0),
            weapon: weapon(
                WeaponArchetype::Splash {
                    projectile_speed: 0.18,
                    splash_radius: 1.5,
                },
                12.0,
                5.0,
                0.985,
            ),
            ..base(BuildingKind::Cannon, Defense, 100.0, price(0.0, 60.0, 5.0, 0.0, 0.0))
        },
        BuildingDefinition {
            cost_growth: 1.2,
            consumption: energy(3.0),
            weapon: weapon(WeaponArchetype::MultiTarget { base_targets: 3 }, 3.0, 3.0, 0.97),
            unlock_cost: Some(price(0.0, 80.0, 20.0, 0.0, 0.0)),
            hooks: Some(behaviors::tesla_coil()),
            ..base(BuildingKind::TeslaCoil, Defense, 90.0, price(0.0, 50.0, 10.0, 0.0, 0.0))
        },
        BuildingDefinition {
            cost_growth: 1.2,
            consumption: energy(4.0),
            weapon: weapon(WeaponArchetype::FocusBeam { focus_cap: 3.0 }, 0.6, 5.0, 0.0),
            unlock_cost: Some(price(0.0, 120.0, 40.0, 0.0, 0.0)),
            hooks: Some(behaviors::laser()),
            ..base(BuildingKind::Laser, Defense, 90.0, price(0.0, 70.0, 20.0, 0.0, 0.0))
        },
        BuildingDefinition {
            cost_growth: 1.25,
            consumption: energy(6.0),
            weapon: weapon(WeaponArchetype::LineBeam { interval_frames: 90 }, 60.0, 9.0, 0.0),
            unlock_cost: Some(price(0.0, 200.0, 60.0, 20.0, 0.0)),
            hooks: Some(behaviors::railgun()),
            ..base(BuildingKind::Railgun, Defense, 110.0, price(0.0, 120.0, 40.0, 10.0, 0.0))
        },
        BuildingDefinition {
            cost_growth: 1.2,
            consumption: energy(4.0),
            weapon: weapon(WeaponArchetype::Pulse { interval_frames: 45 }, 8.0, 2.5, 0.0),
            unlock_cost: Some(price(0.0, 100.0, 30.0, 0.0, 0.0)),
            ..base(BuildingKind::PulseEmitter, Defense, 100.0, price(0.0, 80.0, 25.0, 0.0, 0.0))
        },
        BuildingDefinition {
            cost_growth: 1.25,
            consumption: energy(5.0),
            weapon: weapon(
                WeaponArchetype::Gravity {
                    pull: 0.01,
                    slow: SlowEffect {
                        factor: 0.5,
                        frames: 30,
                    },
                },
                0.0,
                3.5,
                0.0,
            ),
            population_cap: Some(3),
            unlock_cost: Some(price(0.0, 150.0, 50.0, 10.0, 0.0)),
            ..base(BuildingKind::GravityWell, Defense, 120.0, price(0.0, 90.0, 30.0, 10.0, 0.0))
        },
        BuildingDefinition {
            cost_growth: 1.3,
            consumption: energy(5.0),
            weapon: weapon(
                WeaponArchetype::Drones(DroneProfile {
                    base_count: 2,
                    speed: 0.06,
                    strike_range: 1.5,
                    projectile_speed: 0.3,
                }),
                4.0,
                7.0,
                0.95,
            ),
            population_cap: Some(2),
            unlock_cost: Some(price(0.0, 150.0, 50.0, 0.0, 0.0)),
            ..base(BuildingKind::Hangar, Defense, 150.0, price(0.0, 100.0, 40.0, 0.0, 0.0))
        },
        BuildingDefinition {
            consumption: energy(2.0),
            support: aura(AuraKind::SlowField, 2.5, 0.5),
            ..base(BuildingKind::FrostTower, Support, 70.0, price(0.0, 35.0, 5.0, 0.0, 0.0))
        },
        BuildingDefinition {
            consumption: energy(2.0),
            support: aura(AuraKind::Heal, 2.5, 3.0),
            ..base(BuildingKind::RepairStation, Support, 70.0, matter(40.0))
        },
        BuildingDefinition {
            cost_growth: 1.2,
            consumption: energy(3.0),
            support: aura(AuraKind::ShieldRefresh, 2.5, 5.0),
            unlock_cost: Some(price(0.0, 80.0, 20.0, 0.0, 0.0)),
            hooks: Some(behaviors::shield_generator()),
            ..base(BuildingKind::ShieldGenerator, Support, 80.0, price(0.0, 60.0, 15.0, 0.0, 0.0))
        },
        BuildingDefinition {
            cost_growth: 1.2,
            consumption: energy(2.0),
            support: aura(AuraKind::RangeBuff, 3.0, 1.5),
            ..base(BuildingKind::Radar, Support, 60.0, price(0.0, 45.0, 10.0, 0.0, 0.0))
        },
        BuildingDefinition {
            cost_growth: 1.3,
            consumption: energy(5.0),
            support: aura(AuraKind::GlobalDamage, 0.0, 0.1),
            population_cap: Some(3),
            unlock_cost: Some(price(0.0, 150.0, 60.0, 15.0, 0.0)),
            ..base(BuildingKind::WarBeacon, Support, 90.0, price(0.0, 120.0, 40.0, 10.0, 0.0))
        },
        BuildingDefinition {
            cost_growth: 1.3,
            consumption: energy(5.0),
            support: aura(AuraKind::GlobalFireRate, 0.0, 0.01),
            population_cap: Some(3),
            unlock_cost: Some(price(0.0, 150.0, 60.0, 15.0, 0.0)),
            ..base(BuildingKind::Overclocker, Support, 90.0, price(0.0, 120.0, 40.0, 10.0, 0.0))
        },
        BuildingDefinition {
            cost_growth: 1.3,
            consumption: energy(6.0),
            support: aura(AuraKind::GlobalHeal, 0.0, 1.0),
            population_cap: Some(1),
            unlock_cost: Some(price(0.0, 250.0, 80.0, 25.0, 0.0)),
            ..base(BuildingKind::Nanoforge, Support, 100.0, price(0.0, 150.0, 50.0, 20.0, 0.0))
        },
    ]
}

fn module(kind: ModuleKind, applies_to: &[BuildingKind], cost: Resources, hooks: HookBundle) -> ModuleDefinition {
    ModuleDefinition {
        kind,
        applies_to: applies_to.to_vec(),
        cost,
        hooks,
    }
}

pub(crate) fn modules() -> Vec<ModuleDefinition> {
    let consumers: Vec<BuildingKind> = PRODUCERS
        .iter()
        .chain(WEAPONS.iter())
        .chain(RADIAL_SUPPORT.iter())
        .copied()
        .filter(|kind| *kind != BuildingKind::SolarPanel)
        .collect();
    let armoured: Vec<BuildingKind> = WEAPONS
        .iter()
        .copied()
        .chain([BuildingKind::Wall])
        .collect();

    vec![
        module(
            ModuleKind::DamageAmplifier,
            &WEAPONS,
            price(0.0, 40.0, 10.0, 0.0, 0.0),
            behaviors::damage_amplifier(),
        ),
        module(
            ModuleKind::RapidFire,
            &[
                BuildingKind::Turret,
                BuildingKind::Cannon,
                BuildingKind::TeslaCoil,
                BuildingKind::Hangar,
            ],
            price(0.0, 40.0, 10.0, 0.0, 0.0),
            behaviors::rapid_fire(),
        ),
        module(
            ModuleKind::RangeExtender,
            &WEAPONS,
            price(0.0, 35.0, 5.0, 0.0, 0.0),
            behaviors::range_extender(),
        ),
        module(
            ModuleKind::ChainLightning,
            &[BuildingKind::Turret, BuildingKind::TeslaCoil, BuildingKind::Laser],
            price(0.0, 60.0, 20.0, 0.0, 0.0),
            behaviors::chain_lightning(),
        ),
        module(
            ModuleKind::CryoRounds,
            &[
                BuildingKind::Turret,
                BuildingKind::Cannon,
                BuildingKind::TeslaCoil,
                BuildingKind::Hangar,
            ],
            price(0.0, 40.0, 10.0, 0.0, 0.0),
            behaviors::cryo_rounds(),
        ),
        module(
            ModuleKind::ArmorPiercing,
            &[
                BuildingKind::Turret,
                BuildingKind::Cannon,
                BuildingKind::Laser,
                BuildingKind::Hangar,
            ],
            price(0.0, 50.0, 15.0, 0.0, 0.0),
            behaviors::armor_piercing(),
        ),
        module(ModuleKind::Salvager, &WEAPONS, matter(30.0), behaviors::salvager()),
        module(
            ModuleKind::Overcharge,
            &PRODUCERS,
            price(0.0, 40.0, 10.0, 0.0, 0.0),
            behaviors::overcharge(),
        ),
        module(ModuleKind::Efficiency, &consumers, matter(30.0), behaviors::efficiency()),
        module(
            ModuleKind::OreRefiner,
            &[BuildingKind::Extractor, BuildingKind::DeepDrill],
            price(0.0, 30.0, 5.0, 0.0, 0.0),
            behaviors::ore_refiner(),
        ),
        module(
            ModuleKind::AuraAmplifier,
            &RADIAL_SUPPORT,
            price(0.0, 50.0, 15.0, 0.0, 0.0),
            behaviors::aura_amplifier(),
        ),
        module(ModuleKind::Plating, &armoured, matter(25.0), behaviors::plating()),
    ]
}
