//! Dense row-major cell storage.

use gridfort_core::{BuildingKind, CellCoord, ModuleKind, Tile};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// State of a single cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Cell {
    pub(crate) tile: Tile,
    pub(crate) level: u32,
    pub(crate) health: f32,
    pub(crate) shield: f32,
    pub(crate) module: Option<ModuleKind>,
    pub(crate) powered: bool,
}

impl Cell {
    pub(crate) const EMPTY: Cell = Cell {
        tile: Tile::Empty,
        level: 0,
        health: 0.0,
        shield: 0.0,
        module: None,
        powered: false,
    };

    pub(crate) const ORE: Cell = Cell {
        tile: Tile::Ore,
        ..Cell::EMPTY
    };

    /// Freshly constructed structure at level 1 and full health.
    pub(crate) fn building(kind: BuildingKind, health: f32) -> Cell {
        Cell {
            tile: Tile::Building(kind),
            level: 1,
            health,
            shield: 0.0,
            module: None,
            powered: true,
        }
    }

    pub(crate) fn kind(&self) -> Option<BuildingKind> {
        match self.tile {
            Tile::Building(kind) => Some(kind),
            Tile::Empty | Tile::Ore => None,
        }
    }
}

/// Square grid of cells stored row by row.
#[derive(Clone, Debug)]
pub(crate) struct Grid {
    size: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates a grid with the core at its centre and seeded ore deposits.
    pub(crate) fn generate(size: u32, core_health: f32, ore_deposits: u32, seed: u64) -> Self {
        let mut grid = Self {
            size,
            cells: vec![Cell::EMPTY; (size as usize) * (size as usize)],
        };
        let core = grid.core_cell();
        if let Some(index) = grid.index(core) {
            grid.cells[index] = Cell::building(BuildingKind::Core, core_health);
        }

        let capacity = grid.cells.len().saturating_sub(1);
        let wanted = (ore_deposits as usize).min(capacity);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut placed = 0;
        while placed < wanted {
            let cell = CellCoord::new(rng.gen_range(0..size), rng.gen_range(0..size));
            let Some(index) = grid.index(cell) else {
                continue;
            };
            if grid.cells[index].tile == Tile::Empty {
                grid.cells[index] = Cell::ORE;
                placed += 1;
            }
        }
        grid
    }

    /// Rebuilds a grid from raw row-major cells.
    pub(crate) fn from_cells(size: u32, cells: Vec<Cell>) -> Self {
        Self { size, cells }
    }

    pub(crate) const fn size(&self) -> u32 {
        self.size
    }

    /// Cell occupied by the core.
    pub(crate) const fn core_cell(&self) -> CellCoord {
        CellCoord::new(self.size / 2, self.size / 2)
    }

    pub(crate) fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.size && cell.row() < self.size {
            Some(cell.row() as usize * self.size as usize + cell.column() as usize)
        } else {
            None
        }
    }

    pub(crate) fn coord(&self, index: usize) -> CellCoord {
        let size = self.size.max(1) as usize;
        CellCoord::new((index % size) as u32, (index / size) as u32)
    }

    pub(crate) fn get(&self, cell: CellCoord) -> Option<&Cell> {
        self.index(cell).map(|index| &self.cells[index])
    }

    pub(crate) fn get_mut(&mut self, cell: CellCoord) -> Option<&mut Cell> {
        self.index(cell).map(move |index| &mut self.cells[index])
    }

    /// Cells in row-major order.
    pub(crate) fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Occupied cells in row-major order.
    pub(crate) fn buildings(&self) -> impl Iterator<Item = (CellCoord, BuildingKind, &Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(index, cell)| cell.kind().map(|kind| (self.coord(index), kind, cell)))
    }

    /// Number of structures of `kind` currently standing.
    pub(crate) fn count(&self, kind: BuildingKind) -> u32 {
        self.cells
            .iter()
            .filter(|cell| cell.tile == Tile::Building(kind))
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::{Cell, Grid};
    use gridfort_core::{BuildingKind, CellCoord, Tile};

    #[test]
    fn generated_grid_holds_core_at_centre_and_requested_ore() {
        let grid = Grid::generate(11, 100.0, 9, 7);
        assert_eq!(
            grid.get(CellCoord::new(5, 5)).map(|cell| cell.tile),
            Some(Tile::Building(BuildingKind::Core))
        );
        let ore = grid.cells().iter().filter(|cell| cell.tile == Tile::Ore).count();
        assert_eq!(ore, 9);
        assert_eq!(grid.count(BuildingKind::Core), 1);
    }

    #[test]
    fn ore_request_is_capped_by_free_cells() {
        let grid = Grid::generate(3, 100.0, 50, 1);
        let ore = grid.cells().iter().filter(|cell| **cell == Cell::ORE).count();
        assert_eq!(ore, 8);
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let first = Grid::generate(15, 100.0, 12, 99);
        let second = Grid::generate(15, 100.0, 12, 99);
        assert_eq!(first.cells(), second.cells());
    }

    #[test]
    fn index_rejects_out_of_bounds_cells() {
        let grid = Grid::generate(4, 100.0, 0, 0);
        assert_eq!(grid.index(CellCoord::new(3, 3)), Some(15));
        assert_eq!(grid.index(CellCoord::new(4, 0)), None);
        assert_eq!(grid.coord(6), CellCoord::new(2, 1));
    }
}
