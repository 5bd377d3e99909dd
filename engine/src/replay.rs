//! Structural actions recorded per economic tick and replayed onto a fresh run.

use gridfort_core::{BuildingKind, CellCoord, Event, ModuleKind};
use serde::{Deserialize, Serialize};

use crate::Engine;

/// A successful structural operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "action")]
pub enum Action {
    /// Placement of a structure.
    Place {
        /// Kind placed.
        kind: BuildingKind,
        /// Target cell.
        cell: CellCoord,
    },
    /// One-level upgrade.
    Upgrade {
        /// Target cell.
        cell: CellCoord,
    },
    /// Removal with refund.
    Remove {
        /// Target cell.
        cell: CellCoord,
    },
    /// Module installation.
    Install {
        /// Target cell.
        cell: CellCoord,
        /// Module installed.
        module: ModuleKind,
    },
    /// Module removal.
    Uninstall {
        /// Target cell.
        cell: CellCoord,
    },
    /// Research of a locked kind.
    Unlock {
        /// Kind unlocked.
        kind: BuildingKind,
    },
}

impl Action {
    /// Action recorded for a success event, if `event` is one.
    #[must_use]
    pub fn from_event(event: &Event) -> Option<Self> {
        match *event {
            Event::BuildingPlaced { cell, kind, .. } => Some(Self::Place { kind, cell }),
            Event::BuildingUpgraded { cell, .. } => Some(Self::Upgrade { cell }),
            Event::BuildingRemoved { cell, .. } => Some(Self::Remove { cell }),
            Event::ModuleInstalled { cell, module, .. } => Some(Self::Install { cell, module }),
            Event::ModuleUninstalled { cell, .. } => Some(Self::Uninstall { cell }),
            Event::BuildingUnlocked { kind, .. } => Some(Self::Unlock { kind }),
            _ => None,
        }
    }

    /// Performs the action through the engine facade.
    pub fn apply(self, engine: &mut Engine) -> bool {
        match self {
            Self::Place { kind, cell } => engine.place(kind, cell),
            Self::Upgrade { cell } => engine.upgrade(cell),
            Self::Remove { cell } => engine.remove(cell),
            Self::Install { cell, module } => engine.install_module(cell, module),
            Self::Uninstall { cell } => engine.uninstall_module(cell),
            Self::Unlock { kind } => engine.unlock_building(kind),
        }
    }
}

/// Action performed before economic tick `tick + 1` opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoggedAction {
    /// Economic ticks elapsed when the action was taken.
    pub tick: u64,
    /// The action.
    pub action: Action,
}

/// Ordered record of the structural actions of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLog {
    entries: Vec<LoggedAction>,
}

impl ActionLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every structural success among `events` at `tick`.
    pub fn record(&mut self, tick: u64, events: &[Event]) {
        self.entries.extend(
            events
                .iter()
                .filter_map(Action::from_event)
                .map(|action| LoggedAction { tick, action }),
        );
    }

    /// Recorded actions, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[LoggedAction] {
        &self.entries
    }

    /// Number of recorded actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replays the log onto `engine`, stepping it headlessly for `seconds`
    /// economic seconds. Actions run at the tick they were recorded at;
    /// returns how many of them failed.
    ///
    /// Events emitted during the replay are discarded.
    pub fn replay(&self, engine: &mut Engine, seconds: u64) -> usize {
        let retained = engine.events.len();
        let mut failures = 0;
        let mut pending = self.entries.iter().peekable();
        for _ in 0..seconds {
            let now = engine.elapsed_secs();
            while let Some(entry) = pending.next_if(|entry| entry.tick <= now) {
                if !entry.action.apply(engine) {
                    failures += 1;
                }
            }
            engine.step_second();
            engine.discard_events_since(retained);
        }
        for entry in pending {
            if !entry.action.apply(engine) {
                failures += 1;
            }
        }
        engine.discard_events_since(retained);
        failures
    }
}
