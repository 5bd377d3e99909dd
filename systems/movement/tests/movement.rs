use std::sync::Arc;

use gridfort_core::{
    BuildingKind, CellCoord, Command, EnemyId, EnemyKind, Event, ResourceKind, Resources, Vec2,
};
use gridfort_registry::Registry;
use gridfort_system_movement::Movement;
use gridfort_world::{self as world, query, World, WorldConfig};

const FRAME_MS: f64 = 1000.0 / 60.0;

struct Field {
    world: World,
    movement: Movement,
    now_ms: f64,
}

impl Field {
    fn new() -> Self {
        let plenty = ResourceKind::ALL
            .iter()
            .fold(Resources::new(), |pools, kind| pools.with(*kind, 1.0e6));
        let config = WorldConfig {
            ore_deposits: 0,
            starting_resources: plenty,
            ..WorldConfig::default()
        };
        let mut field = Self {
            world: World::new(config, Arc::new(Registry::standard())),
            movement: Movement::default(),
            now_ms: 0.0,
        };
        let unlocks = BuildingKind::ALL
            .iter()
            .map(|kind| Command::UnlockBuilding { kind: *kind })
            .collect();
        let _ = field.apply(unlocks);
        field
    }

    fn apply(&mut self, commands: Vec<Command>) -> Vec<Event> {
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        events
    }

    fn place(&mut self, kind: BuildingKind, column: u32, row: u32) -> CellCoord {
        let cell = CellCoord::new(column, row);
        let events = self.apply(vec![Command::PlaceBuilding { kind, cell }]);
        assert!(
            matches!(events.last(), Some(Event::BuildingPlaced { .. })),
            "placement failed: {events:?}"
        );
        cell
    }

    fn spawn(&mut self, kind: EnemyKind, x: f32, y: f32) -> EnemyId {
        let events = self.apply(vec![Command::SpawnEnemy {
            kind,
            position: Vec2::new(x, y),
            wave: None,
            health_multiplier: 1.0,
            speed_multiplier: 1.0,
        }]);
        match events.last() {
            Some(Event::EnemySpawned { enemy, .. }) => *enemy,
            other => panic!("spawn failed: {other:?}"),
        }
    }

    fn frame(&mut self) {
        let mut commands = Vec::new();
        {
            let buildings = query::building_view(&self.world);
            let enemies = query::enemy_view(&self.world);
            self.movement.handle(
                query::registry(&self.world),
                query::grid_size(&self.world),
                query::config(&self.world).level_scaling,
                query::core_cell(&self.world),
                &buildings,
                &enemies,
                self.now_ms,
                &mut commands,
            );
        }
        self.now_ms += FRAME_MS;
        commands.push(Command::AdvanceFrame {
            now_ms: self.now_ms,
        });
        let _ = self.apply(commands);
    }

    fn frames(&mut self, count: u32) {
        for _ in 0..count {
            self.frame();
        }
    }

    fn position(&self, enemy: EnemyId) -> Vec2 {
        query::enemy_view(&self.world)
            .get(enemy)
            .map(|snapshot| snapshot.position)
            .expect("enemy alive")
    }

    fn health(&self, cell: CellCoord) -> f32 {
        query::building(&self.world, cell)
            .map(|building| building.health)
            .expect("structure standing")
    }
}

#[test]
fn enemy_walks_to_the_core_and_strikes_it() {
    let mut field = Field::new();
    let core = query::core_cell(&field.world);
    let start = core.center() - Vec2::new(2.0, 0.0);
    let enemy = field.spawn(EnemyKind::Fast, start.x, start.y);
    let full = field.health(core);

    field.frames(10);
    let walked = field.position(enemy);
    assert!((walked.x - (start.x + 0.4)).abs() < 1e-4);
    assert!((walked.y - start.y).abs() < 1e-4);

    field.frames(50);
    assert!(field.health(core) < full);
    assert!(field.position(enemy).x < core.center().x - 0.5);
}

#[test]
fn blocked_enemy_strikes_the_wall_once_per_interval() {
    let mut field = Field::new();
    let core = query::core_cell(&field.world);
    let wall = field.place(BuildingKind::Wall, core.column() - 3, core.row());
    let enemy = field.spawn(
        EnemyKind::Normal,
        wall.column() as f32 - 0.01,
        wall.center().y,
    );
    let full = field.health(wall);

    field.frame();
    let after_first = field.health(wall);
    assert!(after_first < full);

    field.frames(30);
    assert_eq!(field.health(wall), after_first);
    assert!((field.position(enemy).x - (wall.column() as f32 - 0.01)).abs() < 1e-6);

    field.frames(32);
    assert_eq!(full - field.health(wall), 2.0 * (full - after_first));
}

#[test]
fn frost_tower_halves_the_step_of_nearby_enemies() {
    let mut plain = Field::new();
    let mut frosted = Field::new();
    let core = query::core_cell(&frosted.world);
    let _ = frosted.place(BuildingKind::FrostTower, core.column() - 4, core.row() + 1);

    let start = core.center() - Vec2::new(4.0, 0.0);
    let free = plain.spawn(EnemyKind::Tank, start.x, start.y);
    let slowed = frosted.spawn(EnemyKind::Tank, start.x, start.y);
    plain.frames(20);
    frosted.frames(20);

    let free_walk = plain.position(free).distance(start);
    let slowed_walk = frosted.position(slowed).distance(start);
    assert!((slowed_walk * 2.0 - free_walk).abs() < 1e-4);
}
