#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave scheduler deciding when and what to spawn.
//!
//! The scheduler steps once per economic tick. In continuous mode enemies
//! trickle in at a rate that grows with elapsed time; in discrete mode build
//! phases alternate with numbered waves whose composition is drawn from a
//! stream derived from the master seed and the wave number.

use std::collections::VecDeque;

use gridfort_core::{Command, EnemyKind, Vec2, WaveMode, WavePhase, WaveStatus};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const RNG_STREAM_COMPOSITION: &str = "wave-composition";

/// Kinds released by discrete waves as `(first wave, kind, weight)`.
const WAVE_ROSTER: [(u32, EnemyKind, u32); 5] = [
    (1, EnemyKind::Normal, 10),
    (3, EnemyKind::Fast, 6),
    (5, EnemyKind::Tank, 3),
    (7, EnemyKind::Shielded, 3),
    (9, EnemyKind::Swarm, 8),
];

/// Kinds released in continuous mode as `(first minute, kind, weight)`.
const MINUTE_ROSTER: [(u32, EnemyKind, u32); 5] = [
    (0, EnemyKind::Normal, 10),
    (1, EnemyKind::Fast, 6),
    (3, EnemyKind::Tank, 3),
    (5, EnemyKind::Shielded, 3),
    (7, EnemyKind::Swarm, 8),
];

/// Tuning of both scheduling modes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Scheduling mode used for the run.
    pub mode: WaveMode,
    /// Continuous: economic ticks before the first spawn.
    pub warmup_secs: u32,
    /// Continuous: spawn delay at the start of the run, in seconds.
    pub initial_delay_secs: f64,
    /// Continuous: seconds shaved off the delay per elapsed second.
    pub delay_decay: f64,
    /// Continuous: shortest spawn delay, in seconds.
    pub min_delay_secs: f64,
    /// Continuous: health growth per elapsed minute.
    pub health_growth: f64,
    /// Continuous: speed growth per elapsed minute.
    pub speed_growth: f64,
    /// Discrete: economic ticks of each build phase.
    pub build_phase_secs: u32,
    /// Discrete: enemies in the first wave.
    pub base_count: u32,
    /// Discrete: factor applied to the count for every further wave.
    pub count_growth: f64,
    /// Discrete: every wave divisible by this number brings a boss; zero disables bosses.
    pub boss_interval: u32,
    /// Most enemies released by a single scheduler step.
    pub max_spawns_per_step: u32,
    /// Discrete: health growth per wave after the first.
    pub wave_health_growth: f32,
    /// Discrete: speed growth per wave after the first.
    pub wave_speed_growth: f32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            mode: WaveMode::Discrete,
            warmup_secs: 10,
            initial_delay_secs: 4.0,
            delay_decay: 0.01,
            min_delay_secs: 0.5,
            health_growth: 0.15,
            speed_growth: 0.03,
            build_phase_secs: 20,
            base_count: 5,
            count_growth: 1.25,
            boss_interval: 5,
            max_spawns_per_step: 3,
            wave_health_growth: 0.12,
            wave_speed_growth: 0.02,
        }
    }
}

impl WaveConfig {
    /// Number of enemies released by discrete wave `wave` (1-based).
    #[must_use]
    pub fn target_count(&self, wave: u32) -> u32 {
        let exponent = i32::try_from(wave.saturating_sub(1)).unwrap_or(i32::MAX);
        let count = f64::from(self.base_count) * self.count_growth.powi(exponent);
        count.round().clamp(1.0, f64::from(u32::MAX)) as u32
    }

    /// Weighted composition of discrete wave `wave`.
    ///
    /// Boss waves carry exactly one `(Boss, 1)` entry, placed last.
    #[must_use]
    pub fn composition(&self, wave: u32) -> Vec<(EnemyKind, u32)> {
        let mut entries: Vec<(EnemyKind, u32)> = WAVE_ROSTER
            .iter()
            .filter(|(first, _, _)| wave >= *first)
            .map(|(_, kind, weight)| (*kind, *weight))
            .collect();
        if self.is_boss_wave(wave) {
            entries.push((EnemyKind::Boss, 1));
        }
        entries
    }

    /// Reports whether discrete wave `wave` brings a boss.
    #[must_use]
    pub fn is_boss_wave(&self, wave: u32) -> bool {
        self.boss_interval > 0 && wave > 0 && wave % self.boss_interval == 0
    }

    /// Continuous spawn delay, in seconds, after `elapsed_secs` of play.
    #[must_use]
    pub fn spawn_delay(&self, elapsed_secs: u64) -> f64 {
        let decayed = self.initial_delay_secs - self.delay_decay * elapsed_secs as f64;
        decayed.max(self.min_delay_secs).max(f64::EPSILON)
    }

    fn wave_multipliers(&self, wave: u32) -> (f32, f32) {
        let grown = wave.saturating_sub(1) as f32;
        (
            1.0 + grown * self.wave_health_growth,
            1.0 + grown * self.wave_speed_growth,
        )
    }

    fn minute_multipliers(&self, elapsed_secs: u64) -> (f32, f32) {
        let minutes = elapsed_secs as f64 / 60.0;
        (
            (1.0 + minutes * self.health_growth) as f32,
            (1.0 + minutes * self.speed_growth) as f32,
        )
    }
}

/// Scheduler state spanning economic ticks.
#[derive(Debug)]
pub struct Waves {
    config: WaveConfig,
    seed: u64,
    rng: ChaCha8Rng,
    status: WaveStatus,
    queue: VecDeque<EnemyKind>,
    since_spawn: f64,
}

impl Waves {
    /// Creates a scheduler at the start of a run.
    #[must_use]
    pub fn new(config: WaveConfig, seed: u64) -> Self {
        let phase = match config.mode {
            WaveMode::Continuous => WavePhase::Warmup,
            WaveMode::Discrete => WavePhase::Build {
                remaining_secs: config.build_phase_secs,
            },
        };
        let status = WaveStatus {
            mode: config.mode,
            wave: 0,
            phase,
            spawned: 0,
            target: 0,
            cleared: 0,
        };
        Self {
            config,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            status,
            queue: VecDeque::new(),
            since_spawn: 0.0,
        }
    }

    /// Resumes a scheduler from persisted counters.
    ///
    /// A wave caught mid-release continues with the part of its plan that
    /// was not yet released.
    #[must_use]
    pub fn restore(mut config: WaveConfig, seed: u64, status: WaveStatus) -> Self {
        config.mode = status.mode;
        let mut waves = Self::new(config, seed);
        waves.status = status;
        if status.phase == WavePhase::Spawning {
            waves.queue = waves
                .plan(status.wave)
                .into_iter()
                .skip(status.spawned as usize)
                .collect();
        }
        waves
    }

    /// Current counters.
    #[must_use]
    pub fn status(&self) -> WaveStatus {
        self.status
    }

    /// Tuning in effect.
    #[must_use]
    pub fn config(&self) -> &WaveConfig {
        &self.config
    }

    /// Advances the scheduler by one economic tick.
    ///
    /// `live_in_wave` is the number of live enemies tagged with the current
    /// wave; continuous mode ignores it.
    pub fn handle(
        &mut self,
        elapsed_secs: u64,
        grid_size: u32,
        live_in_wave: u32,
        out: &mut Vec<Command>,
    ) {
        match self.status.mode {
            WaveMode::Continuous => self.step_continuous(elapsed_secs, grid_size, out),
            WaveMode::Discrete => self.step_discrete(grid_size, live_in_wave, out),
        }
    }

    fn step_continuous(&mut self, elapsed_secs: u64, grid_size: u32, out: &mut Vec<Command>) {
        if elapsed_secs < u64::from(self.config.warmup_secs) {
            self.status.phase = WavePhase::Warmup;
            return;
        }
        self.status.phase = WavePhase::Continuous;

        let delay = self.config.spawn_delay(elapsed_secs);
        let minute = u32::try_from(elapsed_secs / 60).unwrap_or(u32::MAX);
        let roster: Vec<(EnemyKind, u32)> = MINUTE_ROSTER
            .iter()
            .filter(|(first, _, _)| minute >= *first)
            .map(|(_, kind, weight)| (*kind, *weight))
            .collect();
        let (health, speed) = self.config.minute_multipliers(elapsed_secs);

        self.since_spawn += 1.0;
        let mut released = 0;
        while self.since_spawn >= delay && released < self.config.max_spawns_per_step {
            self.since_spawn -= delay;
            let kind = pick(&roster, &mut self.rng);
            self.spawn(kind, None, health, speed, grid_size, out);
            released += 1;
        }
        if released == self.config.max_spawns_per_step {
            self.since_spawn = self.since_spawn.min(delay);
        }
    }

    fn step_discrete(&mut self, grid_size: u32, live_in_wave: u32, out: &mut Vec<Command>) {
        match self.status.phase {
            WavePhase::Build { remaining_secs } if remaining_secs > 1 => {
                self.status.phase = WavePhase::Build {
                    remaining_secs: remaining_secs - 1,
                };
            }
            WavePhase::Spawning => {
                if self.status.spawned >= self.status.target && live_in_wave == 0 {
                    self.complete(out);
                } else {
                    self.release(grid_size, out);
                }
            }
            WavePhase::Build { .. } | WavePhase::Warmup | WavePhase::Continuous => {
                self.begin(out);
                self.release(grid_size, out);
            }
        }
    }

    fn begin(&mut self, out: &mut Vec<Command>) {
        let wave = self.status.wave.saturating_add(1);
        self.queue = self.plan(wave).into();
        self.status.wave = wave;
        self.status.phase = WavePhase::Spawning;
        self.status.spawned = 0;
        self.status.target = self.queue.len() as u32;
        log::debug!("wave {wave} planned with {} enemies", self.status.target);
        out.push(Command::BeginWave { wave });
    }

    fn complete(&mut self, out: &mut Vec<Command>) {
        self.status.cleared = self.status.cleared.saturating_add(1);
        self.status.phase = WavePhase::Build {
            remaining_secs: self.config.build_phase_secs,
        };
        out.push(Command::CompleteWave {
            wave: self.status.wave,
        });
    }

    fn release(&mut self, grid_size: u32, out: &mut Vec<Command>) {
        let wave = self.status.wave;
        let (health, speed) = self.config.wave_multipliers(wave);
        for _ in 0..self.config.max_spawns_per_step {
            let Some(kind) = self.queue.pop_front() else {
                break;
            };
            self.spawn(kind, Some(wave), health, speed, grid_size, out);
        }
    }

    fn spawn(
        &mut self,
        kind: EnemyKind,
        wave: Option<u32>,
        health_multiplier: f32,
        speed_multiplier: f32,
        grid_size: u32,
        out: &mut Vec<Command>,
    ) {
        let position = edge_point(&mut self.rng, grid_size);
        self.status.spawned = self.status.spawned.saturating_add(1);
        out.push(Command::SpawnEnemy {
            kind,
            position,
            wave,
            health_multiplier,
            speed_multiplier,
        });
    }

    /// Release order of discrete wave `wave`; a boss always comes last.
    fn plan(&self, wave: u32) -> Vec<EnemyKind> {
        let target = self.config.target_count(wave);
        let boss = self.config.is_boss_wave(wave);
        let regular: Vec<(EnemyKind, u32)> = self
            .config
            .composition(wave)
            .into_iter()
            .filter(|(kind, _)| *kind != EnemyKind::Boss)
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(derive_wave_seed(self.seed, wave));
        let fill = if boss { target.saturating_sub(1) } else { target };
        let mut plan: Vec<EnemyKind> = (0..fill).map(|_| pick(&regular, &mut rng)).collect();
        if boss {
            plan.push(EnemyKind::Boss);
        }
        plan
    }
}

fn pick(entries: &[(EnemyKind, u32)], rng: &mut ChaCha8Rng) -> EnemyKind {
    let total: u32 = entries.iter().map(|(_, weight)| weight).sum();
    if total == 0 {
        return EnemyKind::Normal;
    }
    let mut roll = rng.gen_range(0..total);
    for (kind, weight) in entries {
        if roll < *weight {
            return *kind;
        }
        roll -= weight;
    }
    EnemyKind::Normal
}

/// Centre of a random cell on a random grid edge.
fn edge_point(rng: &mut ChaCha8Rng, grid_size: u32) -> Vec2 {
    let size = grid_size.max(1);
    let along = rng.gen_range(0..size) as f32 + 0.5;
    let far = size as f32 - 0.5;
    match rng.gen_range(0..4u8) {
        0 => Vec2::new(along, 0.5),
        1 => Vec2::new(far, along),
        2 => Vec2::new(along, far),
        _ => Vec2::new(0.5, along),
    }
}

fn derive_wave_seed(base: u64, wave: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(RNG_STREAM_COMPOSITION.as_bytes());
    hasher.update(wave.to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::{edge_point, WaveConfig, Waves};
    use gridfort_core::{Command, EnemyKind, WaveMode, WavePhase};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn discrete(build_phase_secs: u32) -> WaveConfig {
        WaveConfig {
            build_phase_secs,
            ..WaveConfig::default()
        }
    }

    fn spawned_kinds(commands: &[Command]) -> Vec<EnemyKind> {
        commands
            .iter()
            .filter_map(|command| match command {
                Command::SpawnEnemy { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn target_count_grows_geometrically() {
        let config = WaveConfig::default();
        assert_eq!(config.target_count(1), 5);
        assert_eq!(config.target_count(2), 6);
        assert_eq!(config.target_count(3), 8);
    }

    #[test]
    fn kinds_unlock_at_wave_thresholds() {
        let config = WaveConfig::default();
        let kinds = |wave| -> Vec<EnemyKind> {
            config
                .composition(wave)
                .into_iter()
                .map(|(kind, _)| kind)
                .collect()
        };
        assert_eq!(kinds(2), vec![EnemyKind::Normal]);
        assert_eq!(kinds(3), vec![EnemyKind::Normal, EnemyKind::Fast]);
        assert!(!kinds(6).contains(&EnemyKind::Shielded));
        assert!(kinds(9).contains(&EnemyKind::Swarm));
    }

    #[test]
    fn only_every_fifth_wave_carries_one_boss_entry() {
        let config = WaveConfig::default();
        for wave in 1..=20 {
            let bosses = config
                .composition(wave)
                .iter()
                .filter(|(kind, _)| *kind == EnemyKind::Boss)
                .count();
            assert_eq!(bosses, usize::from(wave % 5 == 0), "wave {wave}");
        }
    }

    #[test]
    fn build_phase_counts_down_before_the_first_wave() {
        let mut waves = Waves::new(discrete(3), 7);
        let mut out = Vec::new();
        waves.handle(1, 21, 0, &mut out);
        waves.handle(2, 21, 0, &mut out);
        assert!(out.is_empty());
        assert_eq!(waves.status().phase, WavePhase::Build { remaining_secs: 1 });

        waves.handle(3, 21, 0, &mut out);
        assert_eq!(out[0], Command::BeginWave { wave: 1 });
        assert_eq!(spawned_kinds(&out).len(), 3);
        assert_eq!(waves.status().spawned, 3);
        assert_eq!(waves.status().target, 5);
    }

    #[test]
    fn wave_completes_only_once_released_and_cleared() {
        let mut waves = Waves::new(discrete(1), 7);
        let mut out = Vec::new();
        waves.handle(1, 21, 0, &mut out);
        waves.handle(2, 21, 3, &mut out);
        assert_eq!(waves.status().spawned, 5);

        out.clear();
        waves.handle(3, 21, 1, &mut out);
        assert!(out.is_empty());
        assert_eq!(waves.status().phase, WavePhase::Spawning);

        waves.handle(4, 21, 0, &mut out);
        assert_eq!(out, vec![Command::CompleteWave { wave: 1 }]);
        assert_eq!(waves.status().cleared, 1);
        assert_eq!(waves.status().phase, WavePhase::Build { remaining_secs: 1 });
    }

    #[test]
    fn empty_release_is_not_mistaken_for_completion() {
        let mut waves = Waves::new(discrete(1), 7);
        let mut out = Vec::new();
        waves.handle(1, 21, 0, &mut out);
        out.clear();
        // Three of five released; nothing alive yet must not complete the wave.
        waves.handle(2, 21, 0, &mut out);
        assert!(!out.contains(&Command::CompleteWave { wave: 1 }));
    }

    #[test]
    fn boss_is_released_last_in_its_wave() {
        let config = WaveConfig {
            boss_interval: 1,
            max_spawns_per_step: 100,
            ..discrete(1)
        };
        let mut waves = Waves::new(config, 11);
        let mut out = Vec::new();
        waves.handle(1, 21, 0, &mut out);
        let kinds = spawned_kinds(&out);
        assert_eq!(kinds.len(), 5);
        assert_eq!(kinds.last(), Some(&EnemyKind::Boss));
        assert_eq!(
            kinds.iter().filter(|kind| **kind == EnemyKind::Boss).count(),
            1
        );
    }

    #[test]
    fn later_waves_are_tagged_and_scaled() {
        let mut waves = Waves::new(discrete(1), 3);
        let mut out = Vec::new();
        for elapsed in 1..=3 {
            waves.handle(elapsed, 21, 0, &mut out);
        }
        out.clear();
        waves.handle(4, 21, 0, &mut out);
        waves.handle(5, 21, 0, &mut out);
        let scaled = out.iter().find_map(|command| match command {
            Command::SpawnEnemy {
                wave,
                health_multiplier,
                ..
            } => Some((*wave, *health_multiplier)),
            _ => None,
        });
        assert_eq!(scaled, Some((Some(2), 1.12)));
    }

    #[test]
    fn continuous_mode_waits_out_the_warmup() {
        let config = WaveConfig {
            mode: WaveMode::Continuous,
            warmup_secs: 5,
            initial_delay_secs: 2.0,
            ..WaveConfig::default()
        };
        let mut waves = Waves::new(config, 5);
        let mut out = Vec::new();
        for elapsed in 1..5 {
            waves.handle(elapsed, 21, 0, &mut out);
        }
        assert!(out.is_empty());
        assert_eq!(waves.status().phase, WavePhase::Warmup);

        for elapsed in 5..9 {
            waves.handle(elapsed, 21, 0, &mut out);
        }
        assert_eq!(waves.status().phase, WavePhase::Continuous);
        assert_eq!(spawned_kinds(&out), vec![EnemyKind::Normal; 2]);
        assert!(out.iter().all(|command| matches!(
            command,
            Command::SpawnEnemy { wave: None, .. }
        )));
    }

    #[test]
    fn spawn_delay_shrinks_to_its_floor() {
        let config = WaveConfig::default();
        assert!((config.spawn_delay(0) - 4.0).abs() < 1e-9);
        assert!((config.spawn_delay(100) - 3.0).abs() < 1e-9);
        assert!((config.spawn_delay(10_000) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn restore_resumes_the_unreleased_part_of_a_wave() {
        let mut original = Waves::new(discrete(1), 9);
        let mut out = Vec::new();
        original.handle(1, 21, 0, &mut out);
        let status = original.status();

        let mut resumed = Waves::restore(discrete(1), 9, status);
        let mut first = Vec::new();
        let mut second = Vec::new();
        original.handle(2, 21, 3, &mut first);
        resumed.handle(2, 21, 3, &mut second);
        assert_eq!(spawned_kinds(&first), spawned_kinds(&second));
        assert_eq!(resumed.status(), original.status());
    }

    #[test]
    fn spawn_points_lie_on_the_grid_edge() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..64 {
            let point = edge_point(&mut rng, 9);
            let on_edge = point.x == 0.5 || point.y == 0.5 || point.x == 8.5 || point.y == 8.5;
            assert!(on_edge, "{point:?}");
        }
    }
}
