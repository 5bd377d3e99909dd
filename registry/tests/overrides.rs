use gridfort_core::{BuildingKind, ModuleKind, ResourceKind};
use gridfort_registry::{BuildingOverride, Registry, WeaponArchetype};
use gridfort_system_hooks::{BundleSource, HookChain, Moment};
use serde::Deserialize;

#[derive(Deserialize)]
struct Tuning {
    buildings: Vec<BuildingOverride>,
}

#[test]
fn toml_overrides_retune_stats_and_costs() {
    let tuning: Tuning = toml::from_str(
        r#"
        [[buildings]]
        kind = "turret"
        damage = 9.0
        range = 6.5
        cost = { matter = 40.0 }

        [[buildings]]
        kind = "solar-panel"
        production = { energy = 5.0 }
        cost_growth = 1.0
        "#,
    )
    .expect("valid tuning");

    let mut registry = Registry::standard();
    registry.apply_overrides(&tuning.buildings).expect("overrides apply");

    let turret = registry.building(BuildingKind::Turret);
    let weapon = turret.weapon.expect("turret has a weapon");
    assert_eq!(weapon.damage, 9.0);
    assert_eq!(weapon.range, 6.5);
    assert!(matches!(weapon.archetype, WeaponArchetype::Single { .. }));
    assert_eq!(turret.cost.get(ResourceKind::Matter), 40.0);
    assert_eq!(turret.cost.get(ResourceKind::Energy), 0.0);

    let solar = registry.building(BuildingKind::SolarPanel);
    assert_eq!(solar.production.get(ResourceKind::Energy), 5.0);
    assert_eq!(
        registry.placement_cost(BuildingKind::SolarPanel, 7),
        registry.placement_cost(BuildingKind::SolarPanel, 0)
    );
}

#[test]
fn registry_supplies_module_chains_for_installed_modules() {
    let registry = Registry::standard();
    let chain = HookChain::resolve(&registry, BuildingKind::Turret, Some(ModuleKind::Salvager));
    assert!(chain.handles(Moment::Kill));
    assert!(!chain.handles(Moment::Hit));

    let plain = HookChain::resolve(&registry, BuildingKind::Turret, None);
    assert!(!plain.handles(Moment::Kill));
    assert!(registry.building_bundle(BuildingKind::Turret).is_none());
}

#[test]
fn research_gates_advanced_kinds() {
    let registry = Registry::standard();
    let unlocked: Vec<BuildingKind> = registry.starting_unlocks().collect();
    assert!(unlocked.contains(&BuildingKind::Turret));
    assert!(unlocked.contains(&BuildingKind::SolarPanel));
    assert!(!unlocked.contains(&BuildingKind::Railgun));
    assert!(registry.building(BuildingKind::Railgun).unlock_cost.is_some());
}

#[test]
fn upgrade_cost_scales_with_level() {
    let registry = Registry::standard();
    let first = registry.upgrade_cost(BuildingKind::Turret, 1, 1.5);
    let third = registry.upgrade_cost(BuildingKind::Turret, 3, 1.5);
    assert_eq!(first.get(ResourceKind::Matter), 37.5);
    assert_eq!(third.get(ResourceKind::Matter), 112.5);
}
