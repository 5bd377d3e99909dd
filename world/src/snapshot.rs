//! Capturing and restoring the persistable part of the world.

use std::sync::Arc;

use gridfort_core::{BuildingKind, Tile, WorldSnapshot};
use gridfort_registry::Registry;
use thiserror::Error;

use crate::{
    grid::{Cell, Grid},
    World, WorldConfig,
};

/// Reasons a snapshot cannot be turned back into a world.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// A per-cell array does not cover the whole grid.
    #[error("snapshot field `{field}` holds {found} entries, expected {expected}")]
    LengthMismatch {
        /// Name of the offending array.
        field: &'static str,
        /// Cell count implied by the grid size.
        expected: usize,
        /// Entries actually present.
        found: usize,
    },
    /// The centre cell does not hold the core, or another cell does.
    #[error("snapshot does not hold exactly one core at the grid centre")]
    CoreMissing,
    /// A cell carries structure state without a structure, or the reverse.
    #[error("cell ({column}, {row}) carries inconsistent state")]
    InconsistentCell {
        /// Column of the offending cell.
        column: u32,
        /// Row of the offending cell.
        row: u32,
    },
}

pub(crate) fn capture(world: &World) -> WorldSnapshot {
    let cells = world.grid.cells();
    WorldSnapshot {
        grid_size: world.grid.size(),
        tiles: cells.iter().map(|cell| cell.tile).collect(),
        levels: cells.iter().map(|cell| cell.level).collect(),
        health: cells.iter().map(|cell| cell.health).collect(),
        shield: cells.iter().map(|cell| cell.shield).collect(),
        modules: cells.iter().map(|cell| cell.module).collect(),
        resources: world.resources,
        unlocked: world.unlocked.iter().copied().collect(),
        elapsed_secs: world.elapsed_secs,
        kills: world.kills,
    }
}

fn check_len(field: &'static str, expected: usize, found: usize) -> Result<(), SnapshotError> {
    if expected == found {
        Ok(())
    } else {
        Err(SnapshotError::LengthMismatch {
            field,
            expected,
            found,
        })
    }
}

impl World {
    /// Rebuilds a world from a snapshot.
    ///
    /// The snapshot's grid size wins over `config.grid_size`. Mobile entities
    /// are not persisted, so the restored world starts without enemies,
    /// projectiles or drones, and with every structure powered until the
    /// next economic tick decides otherwise.
    pub fn restore(
        mut config: WorldConfig,
        registry: Arc<Registry>,
        snapshot: &WorldSnapshot,
    ) -> Result<Self, SnapshotError> {
        let size = snapshot.grid_size;
        let expected = (size as usize) * (size as usize);
        check_len("tiles", expected, snapshot.tiles.len())?;
        check_len("levels", expected, snapshot.levels.len())?;
        check_len("health", expected, snapshot.health.len())?;
        check_len("shield", expected, snapshot.shield.len())?;
        check_len("modules", expected, snapshot.modules.len())?;

        let mut cells = Vec::with_capacity(expected);
        for index in 0..expected {
            let cell = Cell {
                tile: snapshot.tiles[index],
                level: snapshot.levels[index],
                health: snapshot.health[index],
                shield: snapshot.shield[index],
                module: snapshot.modules[index],
                powered: true,
            };
            let consistent = match cell.tile {
                Tile::Building(_) => cell.level >= 1,
                Tile::Empty | Tile::Ore => cell.level == 0 && cell.module.is_none(),
            };
            if !consistent {
                let column = (index % size as usize) as u32;
                let row = (index / size as usize) as u32;
                return Err(SnapshotError::InconsistentCell { column, row });
            }
            cells.push(cell);
        }
        let grid = Grid::from_cells(size, cells);
        let core = grid.core_cell();
        let core_in_centre = grid.get(core).and_then(Cell::kind) == Some(BuildingKind::Core);
        if !core_in_centre || grid.count(BuildingKind::Core) != 1 {
            return Err(SnapshotError::CoreMissing);
        }
        let core_alive = grid.get(core).map_or(false, |cell| cell.health > 0.0);

        config.grid_size = size;
        let mut world = World::new(config, registry);
        world.grid = grid;
        world.resources = snapshot.resources;
        world.unlocked = snapshot.unlocked.iter().copied().collect();
        world.elapsed_secs = snapshot.elapsed_secs;
        world.kills = snapshot.kills;
        world.started = true;
        world.game_over = !core_alive;
        log::debug!(
            "restored {size}x{size} world at {} seconds",
            world.elapsed_secs
        );
        Ok(world)
    }
}
