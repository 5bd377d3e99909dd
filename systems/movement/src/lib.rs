#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that steers enemies toward the core.
//!
//! Enemies walk straight at the core centre. An enemy whose next step would
//! enter a structure's cell stays where it is and strikes that structure
//! instead; the world enforces the per-enemy strike interval.

use gridfort_core::{
    cells_within, level_multiplier, BuildingView, CellCoord, Command, EnemySnapshot, EnemyView,
};
use gridfort_registry::{AuraKind, Registry};
use gridfort_system_hooks::{AuraTickEvent, HookChain};

/// Default reach, in cells, of the slow-field scan around each enemy.
pub const DEFAULT_SLOW_SCAN_RADIUS: f32 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq)]
struct SlowField {
    cell: CellCoord,
    radius: f32,
    factor: f32,
}

/// Pure system that emits enemy steps and contact strikes.
#[derive(Debug)]
pub struct Movement {
    slow_scan_radius: f32,
    fields: Vec<SlowField>,
}

impl Movement {
    /// Creates a movement system scanning `slow_scan_radius` cells for slow fields.
    #[must_use]
    pub fn new(slow_scan_radius: f32) -> Self {
        Self {
            slow_scan_radius: slow_scan_radius.max(0.0),
            fields: Vec::new(),
        }
    }

    /// Emits one move or contact strike per enemy, in ascending id order.
    #[allow(clippy::too_many_arguments)]
    pub fn handle(
        &mut self,
        registry: &Registry,
        grid_size: u32,
        level_scaling: f32,
        core: CellCoord,
        buildings: &BuildingView,
        enemies: &EnemyView,
        now_ms: f64,
        out: &mut Vec<Command>,
    ) {
        self.collect_fields(registry, level_scaling, buildings);
        let goal = core.center();

        for enemy in enemies.iter() {
            let offset = goal - enemy.position;
            let distance = offset.length();
            if distance <= f32::EPSILON {
                continue;
            }
            let step = enemy.speed * self.slow_factor(enemy, grid_size);
            let next = enemy.position + offset / distance * step.min(distance);

            let blocker = CellCoord::containing(next, grid_size)
                .and_then(|cell| buildings.get(cell));
            match blocker {
                Some(building) => out.push(Command::ContactDamage {
                    enemy: enemy.id,
                    cell: building.cell,
                    damage: enemy.kind.stats().contact_damage,
                    at_ms: now_ms,
                }),
                None => out.push(Command::MoveEnemy {
                    enemy: enemy.id,
                    to: next,
                }),
            }
        }
    }

    fn collect_fields(&mut self, registry: &Registry, level_scaling: f32, buildings: &BuildingView) {
        self.fields.clear();
        for building in buildings.iter().filter(|building| building.powered) {
            let Some(profile) = registry.building(building.kind).support else {
                continue;
            };
            if profile.aura != AuraKind::SlowField {
                continue;
            }
            let seed = AuraTickEvent {
                building: *building,
                radius: profile.radius,
                strength: profile.strength_at(level_multiplier(building.level, level_scaling)),
            };
            let aura = HookChain::for_building(registry, building).dispatch(seed);
            self.fields.push(SlowField {
                cell: building.cell,
                radius: aura.radius,
                factor: aura.strength.clamp(0.0, 1.0),
            });
        }
    }

    /// Strongest slow acting on `enemy`: its timed effect or any field in reach.
    fn slow_factor(&self, enemy: &EnemySnapshot, grid_size: u32) -> f32 {
        let mut factor = enemy.slow.map_or(1.0, |slow| slow.factor.clamp(0.0, 1.0));
        if self.fields.is_empty() {
            return factor;
        }
        for cell in cells_within(enemy.position, self.slow_scan_radius, grid_size) {
            let found = self
                .fields
                .binary_search_by_key(&cell.row_major_key(), |field| field.cell.row_major_key());
            let Ok(index) = found else {
                continue;
            };
            let field = self.fields[index];
            if field.cell.center().distance(enemy.position) <= field.radius {
                factor = factor.min(field.factor);
            }
        }
        factor
    }
}

impl Default for Movement {
    fn default() -> Self {
        Self::new(DEFAULT_SLOW_SCAN_RADIUS)
    }
}

#[cfg(test)]
mod tests {
    use super::Movement;
    use gridfort_core::{
        BuildingKind, BuildingSnapshot, BuildingView, CellCoord, Command, EnemyId, EnemyKind,
        EnemySnapshot, EnemyView, SlowEffect, Vec2,
    };
    use gridfort_registry::Registry;

    const CORE: CellCoord = CellCoord::new(5, 5);

    fn building(kind: BuildingKind, column: u32, row: u32) -> BuildingSnapshot {
        BuildingSnapshot {
            cell: CellCoord::new(column, row),
            kind,
            level: 1,
            health: 50.0,
            max_health: 50.0,
            shield: 0.0,
            module: None,
            powered: true,
        }
    }

    fn enemy(id: u32, x: f32, y: f32) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            kind: EnemyKind::Normal,
            position: Vec2::new(x, y),
            health: 30.0,
            max_health: 30.0,
            shield: 0.0,
            max_shield: 0.0,
            speed: 0.1,
            wave: None,
            slow: None,
        }
    }

    fn run(buildings: Vec<BuildingSnapshot>, enemies: Vec<EnemySnapshot>) -> Vec<Command> {
        let registry = Registry::standard();
        let mut all = vec![building(BuildingKind::Core, 5, 5)];
        all.extend(buildings);
        let mut out = Vec::new();
        Movement::default().handle(
            &registry,
            11,
            0.5,
            CORE,
            &BuildingView::from_snapshots(all),
            &EnemyView::from_snapshots(enemies),
            250.0,
            &mut out,
        );
        out
    }

    fn destination(command: &Command) -> Vec2 {
        match command {
            Command::MoveEnemy { to, .. } => *to,
            other => panic!("expected a move, got {other:?}"),
        }
    }

    #[test]
    fn enemies_step_straight_toward_the_core() {
        let out = run(Vec::new(), vec![enemy(0, 0.5, 5.5)]);
        let to = destination(&out[0]);
        assert!((to.x - 0.6).abs() < 1e-6);
        assert!((to.y - 5.5).abs() < 1e-6);
    }

    #[test]
    fn blocked_enemies_strike_instead_of_moving() {
        let out = run(
            vec![building(BuildingKind::Wall, 1, 5)],
            vec![enemy(3, 0.95, 5.5)],
        );
        assert_eq!(
            out,
            vec![Command::ContactDamage {
                enemy: EnemyId::new(3),
                cell: CellCoord::new(1, 5),
                damage: EnemyKind::Normal.stats().contact_damage,
                at_ms: 250.0,
            }]
        );
    }

    #[test]
    fn frost_field_and_timed_slow_do_not_stack() {
        let mut chilled = enemy(1, 0.5, 1.5);
        chilled.slow = Some(SlowEffect {
            factor: 0.8,
            frames: 10,
        });
        let out = run(
            vec![building(BuildingKind::FrostTower, 0, 0)],
            vec![enemy(0, 0.5, 0.5 + 9.0), chilled],
        );
        // The first enemy is outside the field, the second inside it.
        let free = destination(&out[0]);
        let slowed = destination(&out[1]);
        let free_step = free.distance(Vec2::new(0.5, 9.5));
        let slowed_step = slowed.distance(Vec2::new(0.5, 1.5));
        assert!((free_step - 0.1).abs() < 1e-6);
        assert!((slowed_step - 0.05).abs() < 1e-6);
    }

    #[test]
    fn unpowered_frost_tower_has_no_effect() {
        let mut tower = building(BuildingKind::FrostTower, 0, 0);
        tower.powered = false;
        let out = run(vec![tower], vec![enemy(0, 0.5, 1.5)]);
        let step = destination(&out[0]).distance(Vec2::new(0.5, 1.5));
        assert!((step - 0.1).abs() < 1e-6);
    }
}
