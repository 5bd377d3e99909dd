//! Scripted opening build placed before the host loop starts.

use gridfort_core::{BuildingKind, CellCoord};
use gridfort_engine::Engine;

/// Offsets from the core, in placement order.
const OPENING: [(BuildingKind, i32, i32); 6] = [
    (BuildingKind::Turret, -2, 0),
    (BuildingKind::Turret, 2, 0),
    (BuildingKind::Turret, 0, -2),
    (BuildingKind::Turret, 0, 2),
    (BuildingKind::SolarPanel, 1, 1),
    (BuildingKind::SolarPanel, -1, -1),
];

/// Places the opening structures the ledger can afford.
///
/// Returns how many were placed.
pub(crate) fn place_opening(engine: &mut Engine) -> usize {
    let core = engine.core_cell();
    OPENING
        .iter()
        .filter(|(kind, columns, rows)| {
            let cell = CellCoord::new(
                core.column().saturating_add_signed(*columns),
                core.row().saturating_add_signed(*rows),
            );
            let placed = engine.place(*kind, cell);
            if !placed {
                log::debug!("opening {kind:?} at {cell:?} skipped");
            }
            placed
        })
        .count()
}
