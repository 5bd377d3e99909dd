//! Hook bundles attached to building and module kinds.

use gridfort_core::{ResourceKind, SlowEffect};
use gridfort_system_hooks::{
    AllyDamagedEvent, AuraTickEvent, CombatTickEvent, DestroyedEvent, EnterRangeEvent,
    GameStartEvent, HitEvent, HookBundle, KillEvent, PlaceEvent, PrestigeEvent, RemoveEvent,
    ResourceGainedEvent, TickEvent, UnlockTechEvent, UpgradeEvent, WaveEndEvent, WaveStartEvent,
};

const LASER_RAMP_PER_FRAME: f32 = 0.05;
const CORE_WAVE_BONUS_PER_WAVE: f64 = 10.0;
const CORE_STARTING_ENERGY: f64 = 10.0;
const GENERATOR_BLAST_RADIUS: f32 = 2.0;
const GENERATOR_BLAST_DAMAGE: f32 = 40.0;

pub(crate) fn core() -> HookBundle {
    HookBundle {
        on_game_start: Some(core_game_start),
        on_wave_end: Some(core_wave_end),
        ..HookBundle::default()
    }
}

fn core_game_start(event: &mut GameStartEvent) {
    let primed = event.bonus.get(ResourceKind::Energy) + CORE_STARTING_ENERGY;
    event.bonus.set(ResourceKind::Energy, primed);
}

fn core_wave_end(event: &mut WaveEndEvent) {
    let bonus = event.bonus.get(ResourceKind::Matter) + CORE_WAVE_BONUS_PER_WAVE * f64::from(event.wave);
    event.bonus.set(ResourceKind::Matter, bonus);
}

pub(crate) fn generator() -> HookBundle {
    HookBundle {
        on_destroyed: Some(generator_destroyed),
        ..HookBundle::default()
    }
}

fn generator_destroyed(event: &mut DestroyedEvent) {
    event.explosion_radius = event.explosion_radius.max(GENERATOR_BLAST_RADIUS);
    event.explosion_damage += GENERATOR_BLAST_DAMAGE;
}

pub(crate) fn quantum_lab() -> HookBundle {
    HookBundle {
        on_prestige: Some(quantum_lab_prestige),
        on_unlock_tech: Some(quantum_lab_unlock_tech),
        ..HookBundle::default()
    }
}

fn quantum_lab_prestige(event: &mut PrestigeEvent) {
    event.multiplier *= 1.0 + 0.05 * f64::from(event.building.level);
}

fn quantum_lab_unlock_tech(event: &mut UnlockTechEvent) {
    let bonus = event.bonus.get(ResourceKind::Quantum) + 1.0;
    event.bonus.set(ResourceKind::Quantum, bonus);
}

pub(crate) fn wall() -> HookBundle {
    HookBundle {
        on_ally_damaged: Some(wall_ally_damaged),
        on_remove: Some(wall_remove),
        ..HookBundle::default()
    }
}

fn wall_ally_damaged(event: &mut AllyDamagedEvent) {
    event.damage *= 0.8;
}

fn wall_remove(event: &mut RemoveEvent) {
    event.refund_multiplier *= 0.5;
}

pub(crate) fn tesla_coil() -> HookBundle {
    HookBundle {
        on_enter_range: Some(tesla_enter_range),
        ..HookBundle::default()
    }
}

fn tesla_enter_range(event: &mut EnterRangeEvent) {
    let jolt = SlowEffect {
        factor: 0.7,
        frames: 20,
    };
    event.slow = Some(event.slow.map_or(jolt, |slow| slow.merge(jolt)));
}

pub(crate) fn laser() -> HookBundle {
    HookBundle {
        on_combat_tick: Some(laser_focus),
        ..HookBundle::default()
    }
}

fn laser_focus(event: &mut CombatTickEvent) {
    let ramp = (1.0 + event.focus_frames as f32 * LASER_RAMP_PER_FRAME).min(event.focus_cap.max(1.0));
    event.damage *= ramp;
}

pub(crate) fn railgun() -> HookBundle {
    HookBundle {
        on_hit: Some(railgun_hit),
        ..HookBundle::default()
    }
}

fn railgun_hit(event: &mut HitEvent) {
    event.pierce_shield = true;
}

pub(crate) fn shield_generator() -> HookBundle {
    HookBundle {
        on_place: Some(shield_generator_place),
        on_upgrade: Some(shield_generator_upgrade),
        on_wave_start: Some(shield_generator_wave_start),
        ..HookBundle::default()
    }
}

fn shield_generator_place(event: &mut PlaceEvent) {
    event.initial_shield += 0.25 * event.building.max_health;
}

fn shield_generator_upgrade(event: &mut UpgradeEvent) {
    event.shield_grant += 0.25 * event.building.max_health;
}

fn shield_generator_wave_start(event: &mut WaveStartEvent) {
    event.shield_grant += 10.0;
}

pub(crate) fn damage_amplifier() -> HookBundle {
    HookBundle {
        on_combat_tick: Some(amplify_damage),
        ..HookBundle::default()
    }
}

fn amplify_damage(event: &mut CombatTickEvent) {
    event.damage *= 1.5;
}

pub(crate) fn rapid_fire() -> HookBundle {
    HookBundle {
        on_combat_tick: Some(quicken_fire),
        ..HookBundle::default()
    }
}

fn quicken_fire(event: &mut CombatTickEvent) {
    event.fire_probability -= 0.03;
}

pub(crate) fn range_extender() -> HookBundle {
    HookBundle {
        on_combat_tick: Some(extend_range),
        ..HookBundle::default()
    }
}

fn extend_range(event: &mut CombatTickEvent) {
    event.range += 2.0;
}

pub(crate) fn chain_lightning() -> HookBundle {
    HookBundle {
        on_hit: Some(arc_hit),
        ..HookBundle::default()
    }
}

fn arc_hit(event: &mut HitEvent) {
    event.chain_count = event.chain_count.max(3);
    event.chain_fraction = event.chain_fraction.max(0.5);
    event.chain_radius = event.chain_radius.max(2.0);
}

pub(crate) fn cryo_rounds() -> HookBundle {
    HookBundle {
        on_hit: Some(chill_hit),
        ..HookBundle::default()
    }
}

fn chill_hit(event: &mut HitEvent) {
    let chill = SlowEffect {
        factor: 0.6,
        frames: 45,
    };
    event.slow = Some(event.slow.map_or(chill, |slow| slow.merge(chill)));
}

pub(crate) fn armor_piercing() -> HookBundle {
    HookBundle {
        on_hit: Some(pierce_hit),
        ..HookBundle::default()
    }
}

fn pierce_hit(event: &mut HitEvent) {
    event.pierce_shield = true;
}

pub(crate) fn salvager() -> HookBundle {
    HookBundle {
        on_kill: Some(salvage),
        ..HookBundle::default()
    }
}

fn salvage(event: &mut KillEvent) {
    event.reward *= 1.5;
}

pub(crate) fn overcharge() -> HookBundle {
    HookBundle {
        on_tick: Some(overcharge_tick),
        ..HookBundle::default()
    }
}

fn overcharge_tick(event: &mut TickEvent) {
    event.income_multiplier *= 1.5;
    event.consumption_multiplier *= 1.25;
}

pub(crate) fn efficiency() -> HookBundle {
    HookBundle {
        on_tick: Some(efficient_tick),
        ..HookBundle::default()
    }
}

fn efficient_tick(event: &mut TickEvent) {
    event.consumption_multiplier *= 0.7;
}

pub(crate) fn ore_refiner() -> HookBundle {
    HookBundle {
        on_resource_gained: Some(refine),
        ..HookBundle::default()
    }
}

fn refine(event: &mut ResourceGainedEvent) {
    event.income = event.income.scaled(1.25);
}

pub(crate) fn aura_amplifier() -> HookBundle {
    HookBundle {
        on_aura_tick: Some(widen_aura),
        ..HookBundle::default()
    }
}

fn widen_aura(event: &mut AuraTickEvent) {
    event.radius += 2.0;
}

pub(crate) fn plating() -> HookBundle {
    HookBundle {
        on_ally_damaged: Some(absorb_impact),
        ..HookBundle::default()
    }
}

fn absorb_impact(event: &mut AllyDamagedEvent) {
    event.damage *= 0.6;
}

#[cfg(test)]
mod tests {
    use super::{laser, LASER_RAMP_PER_FRAME};
    use gridfort_core::{BuildingKind, BuildingSnapshot, CellCoord};
    use gridfort_system_hooks::{CombatTickEvent, HookChain};

    fn laser_event(focus_frames: u32) -> CombatTickEvent {
        CombatTickEvent {
            building: BuildingSnapshot {
                cell: CellCoord::new(0, 0),
                kind: BuildingKind::Laser,
                level: 1,
                health: 90.0,
                max_health: 90.0,
                shield: 0.0,
                module: None,
                powered: true,
            },
            level_multiplier: 1.0,
            damage: 1.0,
            fire_probability: 0.0,
            range: 5.0,
            target_cap: 1,
            splash_radius: 0.0,
            focus_frames,
            focus_cap: 3.0,
        }
    }

    #[test]
    fn laser_ramp_grows_with_focus_and_saturates_at_cap() {
        let chain = HookChain::new(Some(laser()), None);
        let fresh = chain.dispatch(laser_event(0));
        assert_eq!(fresh.damage, 1.0);

        let warmed = chain.dispatch(laser_event(10));
        assert!((warmed.damage - (1.0 + 10.0 * LASER_RAMP_PER_FRAME)).abs() < 1e-6);

        let saturated = chain.dispatch(laser_event(10_000));
        assert_eq!(saturated.damage, 3.0);
    }
}
