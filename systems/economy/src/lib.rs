#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure systems that run once per economic tick: settlement and auras.

mod auras;

pub use auras::Auras;

use gridfort_core::{level_multiplier, BuildingView, Command};
use gridfort_registry::Registry;
use gridfort_system_hooks::{HookChain, TickEvent};

/// Economy system that settles production and upkeep for every structure.
#[derive(Debug, Default)]
pub struct Economy {
    scratch: Vec<Command>,
}

impl Economy {
    /// Creates a new economy system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits one `Command::SettleBuilding` per structure in row-major order.
    ///
    /// Income is the kind's production scaled by the level multiplier;
    /// upkeep is the flat consumption. Both pass through the structure's
    /// tick interceptors before the world settles them against the ledger.
    pub fn handle(
        &mut self,
        registry: &Registry,
        level_scaling: f32,
        buildings: &BuildingView,
        out: &mut Vec<Command>,
    ) {
        self.scratch.clear();

        for building in buildings.iter() {
            let definition = registry.building(building.kind);
            let multiplier = f64::from(level_multiplier(building.level, level_scaling));
            let seed = TickEvent {
                building: *building,
                level_multiplier: multiplier,
                income: definition.production.scaled(multiplier),
                consumption: definition.consumption,
                income_multiplier: 1.0,
                consumption_multiplier: 1.0,
            };
            let tick = HookChain::for_building(registry, building).dispatch(seed);
            self.scratch.push(Command::SettleBuilding {
                cell: building.cell,
                consumption: tick.final_consumption(),
                income: tick.final_income(),
            });
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}
