//! Mobile entity records stored by the world.

use gridfort_core::{
    CellCoord, DroneId, DroneSnapshot, EnemyId, EnemyKind, EnemySnapshot, ProjectileId,
    ProjectileSnapshot, SlowEffect, Vec2,
};

#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) kind: EnemyKind,
    pub(crate) position: Vec2,
    pub(crate) health: f32,
    pub(crate) max_health: f32,
    pub(crate) shield: f32,
    pub(crate) max_shield: f32,
    pub(crate) speed: f32,
    pub(crate) wave: Option<u32>,
    pub(crate) slow: Option<SlowEffect>,
    pub(crate) last_contact_ms: Option<f64>,
}

impl Enemy {
    pub(crate) fn spawn(
        kind: EnemyKind,
        position: Vec2,
        wave: Option<u32>,
        health_multiplier: f32,
        speed_multiplier: f32,
    ) -> Self {
        let stats = kind.stats();
        let max_health = (stats.health * health_multiplier).max(1.0);
        let max_shield = max_health * stats.shield_fraction;
        Self {
            kind,
            position,
            health: max_health,
            max_health,
            shield: max_shield,
            max_shield,
            speed: (stats.speed * speed_multiplier).max(0.0),
            wave,
            slow: None,
            last_contact_ms: None,
        }
    }

    pub(crate) fn snapshot(&self, id: EnemyId) -> EnemySnapshot {
        EnemySnapshot {
            id,
            kind: self.kind,
            position: self.position,
            health: self.health,
            max_health: self.max_health,
            shield: self.shield,
            max_shield: self.max_shield,
            speed: self.speed,
            wave: self.wave,
            slow: self.slow,
        }
    }

    pub(crate) fn apply_slow(&mut self, slow: SlowEffect) {
        self.slow = Some(match self.slow {
            Some(current) => current.merge(slow),
            None => slow,
        });
    }

    /// Counts one frame off the timed slow.
    pub(crate) fn decay_slow(&mut self) {
        if let Some(slow) = self.slow.as_mut() {
            slow.frames = slow.frames.saturating_sub(1);
            if slow.frames == 0 {
                self.slow = None;
            }
        }
    }

    /// Reports whether enough time has passed since the previous strike.
    pub(crate) fn ready_to_strike(&self, now_ms: f64, interval_ms: f64) -> bool {
        self.last_contact_ms
            .map_or(true, |last| now_ms - last >= interval_ms)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) source: CellCoord,
    pub(crate) target: EnemyId,
    pub(crate) position: Vec2,
    pub(crate) destination: Vec2,
    pub(crate) speed: f32,
    pub(crate) damage: f32,
    pub(crate) splash_radius: f32,
    pub(crate) frames_left: u32,
}

impl Projectile {
    pub(crate) fn snapshot(&self, id: ProjectileId) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id,
            source: self.source,
            target: self.target,
            position: self.position,
            destination: self.destination,
            damage: self.damage,
            splash_radius: self.splash_radius,
        }
    }

    /// Moves one frame toward the destination; returns `true` on arrival.
    pub(crate) fn advance(&mut self, arrival_threshold: f32) -> bool {
        let offset = self.destination - self.position;
        let distance = offset.length();
        if distance <= self.speed.max(arrival_threshold) {
            self.position = self.destination;
            return true;
        }
        self.position += offset / distance * self.speed;
        self.position.distance(self.destination) < arrival_threshold
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Drone {
    pub(crate) hangar: CellCoord,
    pub(crate) position: Vec2,
}

impl Drone {
    pub(crate) fn snapshot(&self, id: DroneId) -> DroneSnapshot {
        DroneSnapshot {
            id,
            hangar: self.hangar,
            position: self.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Enemy, Projectile};
    use gridfort_core::{CellCoord, EnemyId, EnemyKind, SlowEffect, Vec2};

    #[test]
    fn shielded_enemies_spawn_with_half_health_shield() {
        let enemy = Enemy::spawn(EnemyKind::Shielded, Vec2::ZERO, Some(1), 2.0, 1.0);
        assert_eq!(enemy.max_health, 100.0);
        assert_eq!(enemy.shield, 50.0);
    }

    #[test]
    fn slow_merges_and_expires() {
        let mut enemy = Enemy::spawn(EnemyKind::Normal, Vec2::ZERO, None, 1.0, 1.0);
        enemy.apply_slow(SlowEffect {
            factor: 0.5,
            frames: 2,
        });
        enemy.apply_slow(SlowEffect {
            factor: 0.8,
            frames: 3,
        });
        assert_eq!(
            enemy.slow,
            Some(SlowEffect {
                factor: 0.5,
                frames: 3
            })
        );
        for _ in 0..3 {
            enemy.decay_slow();
        }
        assert_eq!(enemy.slow, None);
    }

    #[test]
    fn contact_gate_requires_full_interval() {
        let mut enemy = Enemy::spawn(EnemyKind::Normal, Vec2::ZERO, None, 1.0, 1.0);
        assert!(enemy.ready_to_strike(0.0, 1000.0));
        enemy.last_contact_ms = Some(500.0);
        assert!(!enemy.ready_to_strike(1499.0, 1000.0));
        assert!(enemy.ready_to_strike(1500.0, 1000.0));
    }

    #[test]
    fn projectile_arrives_after_covering_distance() {
        let mut projectile = Projectile {
            source: CellCoord::new(0, 0),
            target: EnemyId::new(0),
            position: Vec2::new(0.0, 0.0),
            destination: Vec2::new(1.0, 0.0),
            speed: 0.3,
            damage: 1.0,
            splash_radius: 0.0,
            frames_left: 10,
        };
        assert!(!projectile.advance(0.2));
        assert!(!projectile.advance(0.2));
        assert!(projectile.advance(0.2));
        assert!(projectile.position.distance(projectile.destination) < 0.2);
    }
}
