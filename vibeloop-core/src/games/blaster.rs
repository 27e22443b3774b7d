//! Chakra Blaster: shoot falling enemies through seven chakra levels.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::geometry::{clamp_x, Circle, Vec2, ARENA_HEIGHT, ARENA_WIDTH};
use super::{clamp_step, GameEvent, GameSession, GameStatus};
use crate::types::GameKind;

pub const PLAYER_RADIUS: f64 = 20.0;
/// Centre line of the player ship.
pub const PLAYER_Y: f64 = ARENA_HEIGHT - 40.0;
/// Horizontal speed used by [`ChakraBlaster::move_player`].
pub const PLAYER_SPEED: f64 = 320.0;
pub const BOLT_RADIUS: f64 = 5.0;
pub const BOLT_SPEED: f64 = 480.0;
pub const FIRE_COOLDOWN: f64 = 0.25;
pub const ENEMY_RADIUS: f64 = 18.0;
pub const STARTING_LIVES: u32 = 3;
pub const KILLS_PER_LEVEL: u32 = 10;

/// One level per chakra, root to crown.
pub const CHAKRAS: [&str; 7] = [
    "Root",
    "Sacral",
    "Solar Plexus",
    "Heart",
    "Throat",
    "Third Eye",
    "Crown",
];

/// Seconds between enemy spawns at `level`.
pub fn spawn_interval(level: u32) -> f64 {
    (1.5 - 0.15 * f64::from(level.saturating_sub(1))).max(0.4)
}

/// Enemy fall speed at `level`, px/s.
pub fn enemy_speed(level: u32) -> f64 {
    60.0 + 20.0 * f64::from(level)
}

#[derive(Debug, Clone)]
pub struct ChakraBlaster {
    rng: StdRng,
    player_x: f64,
    bolts: Vec<Vec2>,
    enemies: Vec<Vec2>,
    fire_cooldown: f64,
    spawn_timer: f64,
    score: u32,
    level: u32,
    kills: u32,
    lives: u32,
    elapsed: f64,
    status: GameStatus,
}

impl ChakraBlaster {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Reproducible enemy placement.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            player_x: ARENA_WIDTH / 2.0,
            bolts: Vec::new(),
            enemies: Vec::new(),
            fire_cooldown: 0.0,
            spawn_timer: spawn_interval(1),
            score: 0,
            level: 1,
            kills: 0,
            lives: STARTING_LIVES,
            elapsed: 0.0,
            status: GameStatus::Running,
        }
    }

    pub fn player_x(&self) -> f64 {
        self.player_x
    }

    pub fn player(&self) -> Circle {
        Circle::new(Vec2::new(self.player_x, PLAYER_Y), PLAYER_RADIUS)
    }

    pub fn enemies(&self) -> &[Vec2] {
        &self.enemies
    }

    pub fn bolts(&self) -> &[Vec2] {
        &self.bolts
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn kills_this_level(&self) -> u32 {
        self.kills
    }

    pub fn chakra(&self) -> &'static str {
        CHAKRAS[(self.level as usize - 1).min(CHAKRAS.len() - 1)]
    }

    pub fn set_player_x(&mut self, x: f64) {
        self.player_x = clamp_x(x, PLAYER_RADIUS);
    }

    /// Move at [`PLAYER_SPEED`] for `dt` seconds; `direction` is -1.0 to 1.0.
    pub fn move_player(&mut self, direction: f64, dt: f64) {
        let step = direction.clamp(-1.0, 1.0) * PLAYER_SPEED * dt;
        self.set_player_x(self.player_x + step);
    }

    /// Launch a bolt if the cannon is ready.
    pub fn fire(&mut self) -> bool {
        if self.status.is_finished() || self.fire_cooldown > 0.0 {
            return false;
        }
        self.bolts
            .push(Vec2::new(self.player_x, PLAYER_Y - PLAYER_RADIUS));
        self.fire_cooldown = FIRE_COOLDOWN;
        true
    }

    fn spawn_enemy(&mut self) {
        let x = self
            .rng
            .gen_range(ENEMY_RADIUS..=ARENA_WIDTH - ENEMY_RADIUS);
        self.enemies.push(Vec2::new(x, -ENEMY_RADIUS));
    }

    fn finish(&mut self, status: GameStatus, events: &mut Vec<GameEvent>) {
        self.status = status;
        events.push(match status {
            GameStatus::Victory => GameEvent::Victory,
            _ => GameEvent::GameOver,
        });
        tracing::debug!(score = self.score, level = self.level, ?status, "Chakra Blaster finished");
    }

    /// Bolt/enemy hits. Returns true if the game ended.
    fn resolve_hits(&mut self, events: &mut Vec<GameEvent>) -> bool {
        let mut b = 0;
        while b < self.bolts.len() {
            let bolt = Circle::new(self.bolts[b], BOLT_RADIUS);
            let hit = self
                .enemies
                .iter()
                .position(|&e| bolt.collides(&Circle::new(e, ENEMY_RADIUS)));
            let Some(e) = hit else {
                b += 1;
                continue;
            };

            self.bolts.remove(b);
            self.enemies.remove(e);
            let points = 10 * self.level;
            self.score += points;
            self.kills += 1;
            events.push(GameEvent::EnemyDestroyed { points });

            if self.kills >= KILLS_PER_LEVEL {
                if self.level as usize >= CHAKRAS.len() {
                    self.finish(GameStatus::Victory, events);
                    return true;
                }
                events.push(GameEvent::LevelComplete { level: self.level });
                self.level += 1;
                self.kills = 0;
            }
        }
        false
    }

    /// Enemies reaching the player or the bottom edge. Returns true if the game ended.
    fn resolve_breaches(&mut self, events: &mut Vec<GameEvent>) -> bool {
        let player = self.player();
        let mut i = 0;
        while i < self.enemies.len() {
            let enemy = self.enemies[i];
            let breached = player.collides(&Circle::new(enemy, ENEMY_RADIUS))
                || enemy.y - ENEMY_RADIUS > ARENA_HEIGHT;
            if !breached {
                i += 1;
                continue;
            }

            self.enemies.remove(i);
            self.lives = self.lives.saturating_sub(1);
            events.push(GameEvent::LifeLost {
                lives_left: self.lives,
            });
            if self.lives == 0 {
                self.finish(GameStatus::GameOver, events);
                return true;
            }
        }
        false
    }
}

impl Default for ChakraBlaster {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession for ChakraBlaster {
    fn kind(&self) -> GameKind {
        GameKind::ChakraBlaster
    }

    fn tick(&mut self, dt: f64) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.status.is_finished() {
            return events;
        }
        let Some(dt) = clamp_step(dt) else {
            return events;
        };

        self.elapsed += dt;
        self.fire_cooldown = (self.fire_cooldown - dt).max(0.0);

        self.spawn_timer -= dt;
        while self.spawn_timer <= 0.0 {
            self.spawn_enemy();
            self.spawn_timer += spawn_interval(self.level);
        }

        for bolt in &mut self.bolts {
            bolt.y -= BOLT_SPEED * dt;
        }
        self.bolts.retain(|b| b.y + BOLT_RADIUS >= 0.0);

        let fall = enemy_speed(self.level) * dt;
        for enemy in &mut self.enemies {
            enemy.y += fall;
        }

        if self.resolve_hits(&mut events) {
            return events;
        }
        self.resolve_breaches(&mut events);
        events
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn level(&self) -> u32 {
        self.level
    }

    fn elapsed(&self) -> f64 {
        self.elapsed
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn quit(&mut self) {
        if !self.status.is_finished() {
            self.status = GameStatus::GameOver;
        }
    }
}
