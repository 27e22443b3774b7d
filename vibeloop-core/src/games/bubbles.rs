//! Challenge Bubbles: pop rising wellness challenges before they escape.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use super::geometry::{Circle, Vec2, ARENA_HEIGHT, ARENA_WIDTH};
use super::{clamp_step, GameEvent, GameSession, GameStatus};
use crate::types::GameKind;

pub const ROUND_SECONDS: f64 = 60.0;
pub const MIN_RADIUS: f64 = 30.0;
pub const MAX_RADIUS: f64 = 50.0;
pub const SPAWN_JITTER: f64 = 0.3;
pub const MAX_MISSES: u32 = 5;

pub const CHALLENGES: &[&str] = &[
    "Drink a glass of water",
    "Stretch for one minute",
    "Text a friend something kind",
    "Take five slow breaths",
    "Step outside for fresh air",
    "Write down one win today",
    "Unclench your jaw",
    "Roll your shoulders back",
    "Smile at your reflection",
    "Tidy one small space",
    "Listen to a favorite song",
    "Look away from the screen for 20 seconds",
];

/// Mean seconds between spawns at `level`.
pub fn spawn_base(level: u32) -> f64 {
    (1.2 - 0.1 * f64::from(level.saturating_sub(1))).max(0.5)
}

/// Rise speed at `level`, px/s.
pub fn rise_speed(level: u32) -> f64 {
    50.0 + 15.0 * f64::from(level)
}

/// Pops needed to clear `level`.
pub fn pops_for_level(level: u32) -> u32 {
    5 * level
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bubble {
    pub id: u64,
    pub center: Vec2,
    pub radius: f64,
    pub challenge: &'static str,
}

impl Bubble {
    pub fn circle(&self) -> Circle {
        Circle::new(self.center, self.radius)
    }
}

#[derive(Debug, Clone)]
pub struct ChallengeBubbles {
    rng: StdRng,
    /// Spawn order; later bubbles are drawn on top
    bubbles: Vec<Bubble>,
    next_id: u64,
    spawn_timer: f64,
    score: u32,
    level: u32,
    pops: u32,
    misses: u32,
    time_left: f64,
    status: GameStatus,
}

impl ChallengeBubbles {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Reproducible bubble sizes, positions and timing.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        let mut game = Self {
            rng,
            bubbles: Vec::new(),
            next_id: 0,
            spawn_timer: 0.0,
            score: 0,
            level: 1,
            pops: 0,
            misses: 0,
            time_left: ROUND_SECONDS,
            status: GameStatus::Running,
        };
        game.spawn_timer = game.next_interval();
        game
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }

    pub fn time_left(&self) -> f64 {
        self.time_left
    }

    fn next_interval(&mut self) -> f64 {
        spawn_base(self.level) + self.rng.gen_range(-SPAWN_JITTER..=SPAWN_JITTER)
    }

    fn spawn_bubble(&mut self) {
        let radius = self.rng.gen_range(MIN_RADIUS..=MAX_RADIUS);
        let x = self.rng.gen_range(radius..=ARENA_WIDTH - radius);
        let challenge = CHALLENGES.choose(&mut self.rng).copied().unwrap_or("Breathe");
        self.bubbles.push(Bubble {
            id: self.next_id,
            center: Vec2::new(x, ARENA_HEIGHT + radius),
            radius,
            challenge,
        });
        self.next_id += 1;
    }

    /// Pop the top-most bubble under `point`.
    pub fn pop(&mut self, point: Vec2) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.status.is_finished() {
            return events;
        }
        let Some(index) = self.bubbles.iter().rposition(|b| b.circle().contains(point)) else {
            return events;
        };

        let bubble = self.bubbles.remove(index);
        let points = 5 * self.level;
        self.score += points;
        self.pops += 1;
        events.push(GameEvent::BubblePopped {
            points,
            challenge: bubble.challenge.to_string(),
        });

        if self.pops >= pops_for_level(self.level) {
            events.push(GameEvent::LevelComplete { level: self.level });
            self.level += 1;
            self.pops = 0;
        }
        events
    }
}

impl Default for ChallengeBubbles {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession for ChallengeBubbles {
    fn kind(&self) -> GameKind {
        GameKind::ChallengeBubbles
    }

    fn tick(&mut self, dt: f64) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.status.is_finished() {
            return events;
        }
        let Some(dt) = clamp_step(dt) else {
            return events;
        };

        self.time_left = (self.time_left - dt).max(0.0);
        if self.time_left <= 0.0 {
            self.status = GameStatus::TimeUp;
            events.push(GameEvent::TimeUp);
            tracing::debug!(score = self.score, level = self.level, "Challenge Bubbles time up");
            return events;
        }

        self.spawn_timer -= dt;
        while self.spawn_timer <= 0.0 {
            self.spawn_bubble();
            self.spawn_timer += self.next_interval();
        }

        let rise = rise_speed(self.level) * dt;
        for bubble in &mut self.bubbles {
            bubble.center.y -= rise;
        }

        let mut i = 0;
        while i < self.bubbles.len() {
            let b = &self.bubbles[i];
            if b.center.y + b.radius >= 0.0 {
                i += 1;
                continue;
            }
            self.bubbles.remove(i);
            self.misses += 1;
            events.push(GameEvent::BubbleMissed {
                misses: self.misses,
            });
            if self.misses >= MAX_MISSES {
                self.status = GameStatus::GameOver;
                events.push(GameEvent::GameOver);
                tracing::debug!(score = self.score, "Challenge Bubbles game over");
                break;
            }
        }
        events
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn level(&self) -> u32 {
        self.level
    }

    fn elapsed(&self) -> f64 {
        ROUND_SECONDS - self.time_left
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::MAX_STEP;

    fn quiet() -> ChallengeBubbles {
        let mut game = ChallengeBubbles::with_seed(5);
        game.spawn_timer = f64::MAX;
        game
    }

    fn bubble(id: u64, x: f64, y: f64, radius: f64) -> Bubble {
        Bubble {
            id,
            center: Vec2::new(x, y),
            radius,
            challenge: CHALLENGES[0],
        }
    }

    #[test]
    fn test_level_curves() {
        assert!((spawn_base(1) - 1.2).abs() < 1e-9);
        assert!((spawn_base(5) - 0.8).abs() < 1e-9);
        assert!((spawn_base(30) - 0.5).abs() < 1e-9);
        assert_eq!(rise_speed(2), 80.0);
        assert_eq!(pops_for_level(3), 15);
    }

    #[test]
    fn test_spawned_bubbles_in_range() {
        let mut game = ChallengeBubbles::with_seed(11);
        for _ in 0..300 {
            game.tick(1.0 / 60.0);
        }
        assert!(!game.bubbles().is_empty());
        for b in game.bubbles() {
            assert!(b.radius >= MIN_RADIUS && b.radius <= MAX_RADIUS);
            assert!(b.center.x >= b.radius && b.center.x <= ARENA_WIDTH - b.radius);
        }
    }

    #[test]
    fn test_pop_takes_topmost() {
        let mut game = quiet();
        game.bubbles.push(bubble(0, 400.0, 300.0, 40.0));
        game.bubbles.push(bubble(1, 420.0, 300.0, 40.0));

        let events = game.pop(Vec2::new(410.0, 300.0));
        assert_eq!(events.len(), 1);
        assert_eq!(game.bubbles().len(), 1);
        assert_eq!(game.bubbles()[0].id, 0);
        assert_eq!(game.score(), 5);

        // Miss: nothing under the point
        assert!(game.pop(Vec2::new(10.0, 10.0)).is_empty());
    }

    #[test]
    fn test_level_up_after_enough_pops() {
        let mut game = quiet();
        for id in 0..5 {
            game.bubbles.push(bubble(id, 400.0, 300.0, 40.0));
        }
        let mut events = Vec::new();
        for _ in 0..5 {
            events.extend(game.pop(Vec2::new(400.0, 300.0)));
        }
        assert_eq!(events.last(), Some(&GameEvent::LevelComplete { level: 1 }));
        assert_eq!(game.level(), 2);
        assert_eq!(game.score(), 25);
    }

    #[test]
    fn test_five_misses_end_game() {
        let mut game = quiet();
        for id in 0..MAX_MISSES as u64 {
            game.bubbles.push(bubble(id, 100.0 + id as f64 * 100.0, -39.0, 40.0));
        }
        let events = game.tick(0.1);
        assert_eq!(events.last(), Some(&GameEvent::GameOver));
        assert_eq!(game.misses(), MAX_MISSES);
        assert_eq!(game.status(), GameStatus::GameOver);
        assert!(game.pop(Vec2::new(0.0, 0.0)).is_empty());
    }

    #[test]
    fn test_round_times_out() {
        let mut game = quiet();
        let mut last = Vec::new();
        for _ in 0..121 {
            last = game.tick(MAX_STEP);
            if game.status().is_finished() {
                break;
            }
        }
        assert_eq!(last, vec![GameEvent::TimeUp]);
        assert_eq!(game.status(), GameStatus::TimeUp);
        assert_eq!(game.time_left(), 0.0);
        assert!(game.tick(MAX_STEP).is_empty());
    }
}
