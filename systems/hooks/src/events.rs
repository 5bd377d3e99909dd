//! Mutable event shapes, one per lifecycle moment.

use gridfort_core::{BuildingKind, BuildingSnapshot, EnemySnapshot, Resources, SlowEffect};

/// Economic tick for a single structure.
#[derive(Clone, Debug, PartialEq)]
pub struct TickEvent {
    /// Structure being settled.
    pub building: BuildingSnapshot,
    /// Level scaling applied to base production and consumption.
    pub level_multiplier: f64,
    /// Production before multipliers.
    pub income: Resources,
    /// Consumption before multipliers.
    pub consumption: Resources,
    /// Factor applied to `income` after dispatch.
    pub income_multiplier: f64,
    /// Factor applied to `consumption` after dispatch.
    pub consumption_multiplier: f64,
}

impl TickEvent {
    /// Production after multipliers.
    #[must_use]
    pub fn final_income(&self) -> Resources {
        self.income.scaled(self.income_multiplier)
    }

    /// Consumption after multipliers.
    #[must_use]
    pub fn final_consumption(&self) -> Resources {
        self.consumption.scaled(self.consumption_multiplier)
    }
}

/// Per-frame weapon parameters, seeded with buffs already applied.
#[derive(Clone, Debug, PartialEq)]
pub struct CombatTickEvent {
    /// Weapon being resolved.
    pub building: BuildingSnapshot,
    /// Level scaling already folded into `damage`.
    pub level_multiplier: f32,
    /// Damage per hit.
    pub damage: f32,
    /// Threshold the fire gate must meet or exceed; lower fires more often.
    pub fire_probability: f32,
    /// Reach in cells.
    pub range: f32,
    /// Maximum simultaneous targets.
    pub target_cap: u32,
    /// Projectile area radius.
    pub splash_radius: f32,
    /// Consecutive frames spent on the current target.
    pub focus_frames: u32,
    /// Upper bound on the focus damage ramp.
    pub focus_cap: f32,
}

/// Production credited after a structure's consumption was covered.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceGainedEvent {
    /// Producing structure.
    pub building: BuildingSnapshot,
    /// Amount about to be credited.
    pub income: Resources,
}

/// A structure was just placed.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaceEvent {
    /// Newly placed structure.
    pub building: BuildingSnapshot,
    /// Shield granted on placement.
    pub initial_shield: f32,
}

/// A structure is being removed by the player.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoveEvent {
    /// Structure being removed.
    pub building: BuildingSnapshot,
    /// Factor applied to the removal refund.
    pub refund_multiplier: f64,
}

/// A structure was just upgraded.
#[derive(Clone, Debug, PartialEq)]
pub struct UpgradeEvent {
    /// Structure after the upgrade.
    pub building: BuildingSnapshot,
    /// Shield granted by the upgrade.
    pub shield_grant: f32,
}

/// A structure's health reached zero.
#[derive(Clone, Debug, PartialEq)]
pub struct DestroyedEvent {
    /// Structure being destroyed.
    pub building: BuildingSnapshot,
    /// Radius of the parting explosion; zero for none.
    pub explosion_radius: f32,
    /// Damage dealt to every enemy inside the explosion.
    pub explosion_damage: f32,
}

/// A weapon's payload is landing on an enemy.
#[derive(Clone, Debug, PartialEq)]
pub struct HitEvent {
    /// Weapon credited with the hit.
    pub building: BuildingSnapshot,
    /// Enemy receiving the hit.
    pub enemy: EnemySnapshot,
    /// Damage about to be applied.
    pub damage: f32,
    /// Number of additional enemies the hit arcs to.
    pub chain_count: u32,
    /// Fraction of `damage` dealt by each arc.
    pub chain_fraction: f32,
    /// Maximum arc distance in cells.
    pub chain_radius: f32,
    /// Slow applied to the enemy after the hit.
    pub slow: Option<SlowEffect>,
    /// When set, the hit skips the enemy's shield.
    pub pierce_shield: bool,
}

/// An enemy was killed.
#[derive(Clone, Debug, PartialEq)]
pub struct KillEvent {
    /// Structure credited with the kill.
    pub building: BuildingSnapshot,
    /// Enemy as it was before removal.
    pub enemy: EnemySnapshot,
    /// Scrap about to be credited.
    pub reward: f64,
}

/// A weapon locked onto a new target.
#[derive(Clone, Debug, PartialEq)]
pub struct EnterRangeEvent {
    /// Acquiring weapon.
    pub building: BuildingSnapshot,
    /// Newly acquired target.
    pub enemy: EnemySnapshot,
    /// Slow applied to the target on acquisition.
    pub slow: Option<SlowEffect>,
}

/// A support structure is about to apply its aura.
#[derive(Clone, Debug, PartialEq)]
pub struct AuraTickEvent {
    /// Support structure.
    pub building: BuildingSnapshot,
    /// Aura reach in cells.
    pub radius: f32,
    /// Aura magnitude.
    pub strength: f32,
}

/// A structure is about to take contact damage.
#[derive(Clone, Debug, PartialEq)]
pub struct AllyDamagedEvent {
    /// Structure being struck.
    pub building: BuildingSnapshot,
    /// Damage about to be applied.
    pub damage: f32,
}

/// A discrete wave is starting.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveStartEvent {
    /// Structure notified.
    pub building: BuildingSnapshot,
    /// Wave number.
    pub wave: u32,
    /// Shield granted to the structure.
    pub shield_grant: f32,
}

/// A discrete wave was cleared.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveEndEvent {
    /// Structure notified.
    pub building: BuildingSnapshot,
    /// Wave number.
    pub wave: u32,
    /// Resources credited to the ledger.
    pub bonus: Resources,
}

/// The run is starting.
#[derive(Clone, Debug, PartialEq)]
pub struct GameStartEvent {
    /// Structure notified.
    pub building: BuildingSnapshot,
    /// Resources credited to the ledger.
    pub bonus: Resources,
}

/// The meta layer is computing the prestige multiplier.
#[derive(Clone, Debug, PartialEq)]
pub struct PrestigeEvent {
    /// Structure notified.
    pub building: BuildingSnapshot,
    /// Running multiplier.
    pub multiplier: f64,
}

/// A building kind was researched.
#[derive(Clone, Debug, PartialEq)]
pub struct UnlockTechEvent {
    /// Structure notified.
    pub building: BuildingSnapshot,
    /// Kind that became available.
    pub tech: BuildingKind,
    /// Resources credited to the ledger.
    pub bonus: Resources,
}
