#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Interceptor dispatch that lets buildings and modules reshape lifecycle events.
//!
//! The engine never branches on a building's kind. Instead it seeds an event
//! with computed defaults, resolves the [`HookChain`] for the affected cell and
//! lets [`HookChain::dispatch`] thread the event through the building's bundle
//! and then its module's bundle. Each handler works on a private copy; a
//! handler that panics is logged and its writes are dropped, so one faulty
//! extension can never abort a tick.

mod events;

use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
};

use gridfort_core::{BuildingKind, BuildingSnapshot, ModuleKind};

pub use events::{
    AllyDamagedEvent, AuraTickEvent, CombatTickEvent, DestroyedEvent, EnterRangeEvent,
    GameStartEvent, HitEvent, KillEvent, PlaceEvent, PrestigeEvent, RemoveEvent,
    ResourceGainedEvent, TickEvent, UnlockTechEvent, UpgradeEvent, WaveEndEvent, WaveStartEvent,
};

/// Signature shared by every interceptor.
pub type Handler<E> = fn(&mut E);

/// Event types that can be threaded through a [`HookChain`].
pub trait HookEvent: Clone {
    /// Moment the event represents.
    const MOMENT: Moment;

    /// Extracts the handler registered for this moment, if any.
    fn handler(bundle: &HookBundle) -> Option<Handler<Self>>;
}

macro_rules! hook_table {
    ($($event:ident => $slot:ident, $moment:ident;)*) => {
        /// Capability table holding at most one handler per lifecycle moment.
        #[derive(Clone, Copy, Default)]
        pub struct HookBundle {
            $(
                #[doc = concat!("Handler invoked for [`", stringify!($event), "`].")]
                pub $slot: Option<Handler<$event>>,
            )*
        }

        /// Closed set of lifecycle moments a bundle may intercept.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum Moment {
            $(
                #[doc = concat!("Moment carried by [`", stringify!($event), "`].")]
                $moment,
            )*
        }

        impl Moment {
            /// Stable name of the moment, matching the bundle slot.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$moment => stringify!($slot),)*
                }
            }
        }

        impl HookBundle {
            /// Reports whether the bundle intercepts `moment`.
            #[must_use]
            pub fn handles(&self, moment: Moment) -> bool {
                match moment {
                    $(Moment::$moment => self.$slot.is_some(),)*
                }
            }

            /// Moments the bundle intercepts, in declaration order.
            #[must_use]
            pub fn moments(&self) -> Vec<Moment> {
                let mut moments = Vec::new();
                $(
                    if self.$slot.is_some() {
                        moments.push(Moment::$moment);
                    }
                )*
                moments
            }
        }

        $(
            impl HookEvent for $event {
                const MOMENT: Moment = Moment::$moment;

                fn handler(bundle: &HookBundle) -> Option<Handler<Self>> {
                    bundle.$slot
                }
            }
        )*
    };
}

hook_table! {
    TickEvent => on_tick, Tick;
    CombatTickEvent => on_combat_tick, CombatTick;
    ResourceGainedEvent => on_resource_gained, ResourceGained;
    PlaceEvent => on_place, Place;
    RemoveEvent => on_remove, Remove;
    UpgradeEvent => on_upgrade, Upgrade;
    DestroyedEvent => on_destroyed, Destroyed;
    HitEvent => on_hit, Hit;
    KillEvent => on_kill, Kill;
    EnterRangeEvent => on_enter_range, EnterRange;
    AuraTickEvent => on_aura_tick, AuraTick;
    AllyDamagedEvent => on_ally_damaged, AllyDamaged;
    WaveStartEvent => on_wave_start, WaveStart;
    WaveEndEvent => on_wave_end, WaveEnd;
    GameStartEvent => on_game_start, GameStart;
    PrestigeEvent => on_prestige, Prestige;
    UnlockTechEvent => on_unlock_tech, UnlockTech;
}

impl fmt::Debug for HookBundle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_set()
            .entries(self.moments().iter().map(|moment| moment.name()))
            .finish()
    }
}

/// Lookup of the bundles registered for building and module kinds.
pub trait BundleSource {
    /// Bundle attached to a building kind.
    fn building_bundle(&self, kind: BuildingKind) -> Option<HookBundle>;

    /// Bundle attached to a module kind.
    fn module_bundle(&self, module: ModuleKind) -> Option<HookBundle>;
}

/// Ordered interceptors for one cell: the building's bundle, then its module's.
#[derive(Clone, Copy, Debug, Default)]
pub struct HookChain {
    building: Option<HookBundle>,
    module: Option<HookBundle>,
}

impl HookChain {
    /// Chain that leaves every event untouched.
    pub const EMPTY: HookChain = HookChain {
        building: None,
        module: None,
    };

    /// Creates a chain from explicit bundles.
    #[must_use]
    pub const fn new(building: Option<HookBundle>, module: Option<HookBundle>) -> Self {
        Self { building, module }
    }

    /// Resolves the chain for a building kind and its optional module.
    #[must_use]
    pub fn resolve<S>(source: &S, kind: BuildingKind, module: Option<ModuleKind>) -> Self
    where
        S: BundleSource + ?Sized,
    {
        Self {
            building: source.building_bundle(kind),
            module: module.and_then(|module| source.module_bundle(module)),
        }
    }

    /// Resolves the chain for the structure captured by `snapshot`.
    #[must_use]
    pub fn for_building<S>(source: &S, snapshot: &BuildingSnapshot) -> Self
    where
        S: BundleSource + ?Sized,
    {
        Self::resolve(source, snapshot.kind, snapshot.module)
    }

    /// Reports whether any bundle in the chain intercepts `moment`.
    #[must_use]
    pub fn handles(&self, moment: Moment) -> bool {
        self.bundles().any(|bundle| bundle.handles(moment))
    }

    /// Threads `event` through every handler registered for its moment.
    ///
    /// Handlers run in chain order, each on a copy of the event produced by
    /// its predecessor. A panicking handler is reported through `log::warn!`
    /// and the event continues as it was before that handler ran.
    #[must_use]
    pub fn dispatch<E>(&self, event: E) -> E
    where
        E: HookEvent,
    {
        let mut current = event;
        for bundle in self.bundles() {
            let Some(handler) = E::handler(bundle) else {
                continue;
            };
            let mut working = current.clone();
            match panic::catch_unwind(AssertUnwindSafe(|| handler(&mut working))) {
                Ok(()) => current = working,
                Err(payload) => {
                    log::warn!(
                        "{} handler panicked, discarding its changes: {}",
                        E::MOMENT.name(),
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
        current
    }

    fn bundles(&self) -> impl Iterator<Item = &HookBundle> {
        self.building.iter().chain(self.module.iter())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
