//! Five-pool resource ledger arithmetic.

use serde::{Deserialize, Serialize};

/// Fungible resource pools tracked by the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// Primary energy produced by generators and consumed by most structures.
    Energy,
    /// Primary matter; kill rewards ("scrap") are credited here.
    Matter,
    /// First refined tier produced by smelters.
    Alloy,
    /// Second refined tier produced by fabricators.
    Polymer,
    /// Third refined tier produced by quantum labs.
    Quantum,
}

impl ResourceKind {
    /// Every pool in ledger order.
    pub const ALL: [ResourceKind; 5] = [
        Self::Energy,
        Self::Matter,
        Self::Alloy,
        Self::Polymer,
        Self::Quantum,
    ];

    const fn index(self) -> usize {
        self as usize
    }
}

/// Amounts over the five pools.
///
/// The same type describes the player's ledger, partial costs (absent pools
/// are zero), and income deltas. No operation clamps or rounds: callers must
/// check [`Resources::can_afford`] before [`Resources::spend`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ResourceMap", into = "ResourceMap")]
pub struct Resources {
    pools: [f64; 5],
}

impl Resources {
    /// Ledger with every pool empty.
    pub const ZERO: Resources = Resources { pools: [0.0; 5] };

    /// Creates an empty amount.
    #[must_use]
    pub const fn new() -> Self {
        Self::ZERO
    }

    /// Returns a copy with `kind` set to `amount`.
    #[must_use]
    pub fn with(mut self, kind: ResourceKind, amount: f64) -> Self {
        self.pools[kind.index()] = amount;
        self
    }

    /// Amount stored in the provided pool.
    #[must_use]
    pub const fn get(&self, kind: ResourceKind) -> f64 {
        self.pools[kind.index()]
    }

    /// Overwrites the provided pool.
    pub fn set(&mut self, kind: ResourceKind, amount: f64) {
        self.pools[kind.index()] = amount;
    }

    /// Reports whether every pool covers the matching component of `cost`.
    #[must_use]
    pub fn can_afford(&self, cost: &Resources) -> bool {
        self.pools
            .iter()
            .zip(cost.pools.iter())
            .all(|(available, required)| available >= required)
    }

    /// Subtracts `cost` from every pool.
    pub fn spend(&mut self, cost: &Resources) {
        for (pool, amount) in self.pools.iter_mut().zip(cost.pools.iter()) {
            *pool -= amount;
        }
    }

    /// Adds `income` to every pool.
    pub fn add(&mut self, income: &Resources) {
        for (pool, amount) in self.pools.iter_mut().zip(income.pools.iter()) {
            *pool += amount;
        }
    }

    /// Returns every component multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Resources {
        let mut pools = self.pools;
        for pool in &mut pools {
            *pool *= factor;
        }
        Resources { pools }
    }

    /// Reports whether every component is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.pools.iter().all(|amount| *amount == 0.0)
    }

    /// Iterates over `(pool, amount)` pairs in ledger order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, f64)> + '_ {
        ResourceKind::ALL
            .iter()
            .map(move |kind| (*kind, self.pools[kind.index()]))
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ResourceMap {
    energy: f64,
    matter: f64,
    alloy: f64,
    polymer: f64,
    quantum: f64,
}

impl From<ResourceMap> for Resources {
    fn from(map: ResourceMap) -> Self {
        Self {
            pools: [map.energy, map.matter, map.alloy, map.polymer, map.quantum],
        }
    }
}

impl From<Resources> for ResourceMap {
    fn from(resources: Resources) -> Self {
        let [energy, matter, alloy, polymer, quantum] = resources.pools;
        Self {
            energy,
            matter,
            alloy,
            polymer,
            quantum,
        }
    }
}
