//! Hangar wings: launching, hovering, chasing and shooting.

use std::f32::consts::TAU;

use gridfort_core::{BuildingKind, BuildingSnapshot, Command, DroneSnapshot, Vec2};
use gridfort_registry::DroneProfile;
use gridfort_system_hooks::CombatTickEvent;

use crate::{targeting, Battlefield, Combat};

/// Distance between a hangar's centre and its idle drones.
const HOVER_RADIUS: f32 = 0.75;

/// Directs the wing of one hangar for a frame.
pub(crate) fn direct(
    combat: &mut Combat,
    field: &Battlefield<'_>,
    hangar: &BuildingSnapshot,
    profile: &DroneProfile,
    tick: &CombatTickEvent,
    out: &mut Vec<Command>,
) {
    let cell = hangar.cell;
    let origin = cell.center();
    let wing: Vec<&DroneSnapshot> = field
        .drones
        .iter()
        .filter(|drone| drone.hangar == cell)
        .collect();
    let cap = profile.base_count + hangar.level;
    if u32::try_from(wing.len()).map_or(false, |count| count < cap) {
        out.push(Command::SpawnDrone { hangar: cell });
    }

    let threatened = targeting::nearest(field.enemies, origin, tick.range).is_some();
    for (slot, drone) in wing.into_iter().enumerate() {
        if !threatened {
            let hover = hover_point(origin, slot, cap);
            if drone.position != hover {
                out.push(Command::MoveDrone {
                    drone: drone.id,
                    to: step_toward(drone.position, hover, profile.speed),
                });
            }
            continue;
        }

        let Some(target) = targeting::nearest_to(field.enemies, origin, tick.range, drone.position)
        else {
            continue;
        };
        if drone.position.distance(target.position) > profile.strike_range {
            out.push(Command::MoveDrone {
                drone: drone.id,
                to: step_toward(drone.position, target.position, profile.speed),
            });
        } else if combat.gate(tick.fire_probability) {
            out.push(Command::LaunchProjectile {
                source: cell,
                origin: drone.position,
                target: target.id,
                damage: tick.damage,
                splash_radius: 0.0,
                speed: profile.projectile_speed,
            });
        }
    }
}

/// Emits removals for drones whose hangar is gone.
pub(crate) fn remove_orphans(field: &Battlefield<'_>, out: &mut Vec<Command>) {
    for drone in field.drones.iter() {
        let housed = field
            .buildings
            .get(drone.hangar)
            .map_or(false, |building| building.kind == BuildingKind::Hangar);
        if !housed {
            out.push(Command::RemoveDrone { drone: drone.id });
        }
    }
}

fn hover_point(origin: Vec2, slot: usize, cap: u32) -> Vec2 {
    let angle = TAU * slot as f32 / cap.max(1) as f32;
    origin + Vec2::new(angle.cos(), angle.sin()) * HOVER_RADIUS
}

fn step_toward(from: Vec2, to: Vec2, speed: f32) -> Vec2 {
    let offset = to - from;
    if offset.length() <= speed {
        to
    } else {
        from + offset.normalize_or_zero() * speed
    }
}

#[cfg(test)]
mod tests {
    use super::{hover_point, step_toward};
    use gridfort_core::Vec2;

    #[test]
    fn step_toward_never_overshoots() {
        let target = Vec2::new(1.0, 0.0);
        assert_eq!(step_toward(Vec2::ZERO, target, 2.0), target);
        let step = step_toward(Vec2::ZERO, target, 0.25);
        assert!((step.x - 0.25).abs() < 1e-6);
    }

    #[test]
    fn hover_points_ring_the_hangar() {
        let origin = Vec2::new(3.5, 3.5);
        let first = hover_point(origin, 0, 4);
        let third = hover_point(origin, 2, 4);
        assert!((first.distance(origin) - 0.75).abs() < 1e-5);
        assert!((first + third - origin * 2.0).length() < 1e-5);
    }
}
