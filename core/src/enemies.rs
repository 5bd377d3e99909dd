//! Catalog of mobile attacker archetypes.

use serde::{Deserialize, Serialize};

/// Fixed catalog of enemy archetypes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnemyKind {
    /// Baseline attacker.
    Normal,
    /// Fragile attacker that closes distance quickly.
    Fast,
    /// Slow attacker with a deep health pool.
    Tank,
    /// Attacker carrying a shield worth half its maximum health.
    Shielded,
    /// Weak attacker released in numbers.
    Swarm,
    /// Rare, heavily armoured attacker.
    Boss,
}

/// Base statistics for an enemy archetype before wave or time scaling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyStats {
    /// Maximum health at scale 1.0.
    pub health: f32,
    /// Distance travelled per combat frame, in cells.
    pub speed: f32,
    /// Damage dealt to a structure on each contact strike.
    pub contact_damage: f32,
    /// Multiplier applied to the scrap reward on kill.
    pub reward_multiplier: f64,
    /// Shield capacity expressed as a fraction of maximum health.
    pub shield_fraction: f32,
}

impl EnemyKind {
    /// Every archetype in catalog order.
    pub const ALL: [EnemyKind; 6] = [
        Self::Normal,
        Self::Fast,
        Self::Tank,
        Self::Shielded,
        Self::Swarm,
        Self::Boss,
    ];

    /// Returns the archetype's base statistics.
    #[must_use]
    pub const fn stats(self) -> EnemyStats {
        match self {
            Self::Normal => EnemyStats {
                health: 30.0,
                speed: 0.02,
                contact_damage: 10.0,
                reward_multiplier: 1.0,
                shield_fraction: 0.0,
            },
            Self::Fast => EnemyStats {
                health: 18.0,
                speed: 0.04,
                contact_damage: 6.0,
                reward_multiplier: 1.2,
                shield_fraction: 0.0,
            },
            Self::Tank => EnemyStats {
                health: 140.0,
                speed: 0.012,
                contact_damage: 25.0,
                reward_multiplier: 2.5,
                shield_fraction: 0.0,
            },
            Self::Shielded => EnemyStats {
                health: 50.0,
                speed: 0.018,
                contact_damage: 12.0,
                reward_multiplier: 2.0,
                shield_fraction: 0.5,
            },
            Self::Swarm => EnemyStats {
                health: 10.0,
                speed: 0.03,
                contact_damage: 3.0,
                reward_multiplier: 0.4,
                shield_fraction: 0.0,
            },
            Self::Boss => EnemyStats {
                health: 900.0,
                speed: 0.01,
                contact_damage: 60.0,
                reward_multiplier: 15.0,
                shield_fraction: 0.25,
            },
        }
    }
}
