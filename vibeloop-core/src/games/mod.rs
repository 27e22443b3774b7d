//! Mini-games and the leaderboard.
//!
//! Each game is a self-contained simulation advanced frame by frame with
//! [`GameSession::tick`]. Inputs (`fire`, `pop`, movement) are methods on the
//! concrete game. Everything noteworthy comes back as [`GameEvent`]s for the
//! caller to render or react to.

pub mod autopilot;
pub mod blaster;
pub mod bubbles;
pub mod geometry;

pub use blaster::ChakraBlaster;
pub use bubbles::ChallengeBubbles;
pub use geometry::{Circle, Vec2};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::db::Store;
use crate::error::{Error, Result};
use crate::types::{GameKind, GameScore};

/// Longest span a single [`GameSession::tick`] simulates. Larger steps are clamped.
pub const MAX_STEP: f64 = 0.5;

/// The usable part of a frame step, or `None` for zero, negative or non-finite input.
pub(crate) fn clamp_step(dt: f64) -> Option<f64> {
    (dt.is_finite() && dt > 0.0).then(|| dt.min(MAX_STEP))
}

/// Something that happened during a frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    EnemyDestroyed { points: u32 },
    BubblePopped { points: u32, challenge: String },
    LifeLost { lives_left: u32 },
    BubbleMissed { misses: u32 },
    /// `level` was just cleared
    LevelComplete { level: u32 },
    GameOver,
    Victory,
    TimeUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Running,
    GameOver,
    Victory,
    TimeUp,
}

impl GameStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, GameStatus::Running)
    }
}

/// A running game round.
pub trait GameSession {
    fn kind(&self) -> GameKind;

    /// Advance the simulation by `dt` seconds, at most [`MAX_STEP`] at a time.
    /// Finished games and unusable steps return no events.
    fn tick(&mut self, dt: f64) -> Vec<GameEvent>;

    fn score(&self) -> u32;

    /// Current (1-based) level.
    fn level(&self) -> u32;

    /// Seconds of play so far.
    fn elapsed(&self) -> f64;

    fn status(&self) -> GameStatus;

    /// End the round early.
    fn quit(&mut self);

    fn is_finished(&self) -> bool {
        self.status().is_finished()
    }
}

/// Record the result of a finished game.
pub fn submit_score(
    store: &dyn Store,
    user_id: &str,
    game: &dyn GameSession,
    now: DateTime<Utc>,
) -> Result<GameScore> {
    if !game.is_finished() {
        return Err(Error::InvalidInput(format!(
            "{} is still running",
            game.kind().display_name()
        )));
    }
    let score = GameScore {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        game: game.kind(),
        score: game.score(),
        level_reached: game.level(),
        duration_secs: game.elapsed().round() as u32,
        played_at: now,
    };
    store.insert_game_score(&score)?;
    tracing::info!(
        user_id,
        game = %score.game,
        score = score.score,
        level = score.level_reached,
        "Score submitted"
    );
    Ok(score)
}

/// Best scores for `game`, highest first, earliest first on ties.
pub fn leaderboard(store: &dyn Store, game: GameKind, limit: usize) -> Result<Vec<GameScore>> {
    store.top_scores(game, limit)
}

pub fn personal_best(
    store: &dyn Store,
    user_id: &str,
    game: GameKind,
) -> Result<Option<GameScore>> {
    store.best_score(user_id, game)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DemoStore;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_clamp_step() {
        assert_eq!(clamp_step(0.1), Some(0.1));
        assert_eq!(clamp_step(1.0e6), Some(MAX_STEP));
        assert_eq!(clamp_step(0.0), None);
        assert_eq!(clamp_step(-1.0), None);
        assert_eq!(clamp_step(f64::INFINITY), None);
        assert_eq!(clamp_step(f64::NAN), None);
    }

    #[test]
    fn test_unfinished_game_cannot_submit() {
        let store = DemoStore::in_memory();
        let game = ChakraBlaster::with_seed(1);
        assert!(submit_score(&store, "u1", &game, Utc::now()).is_err());
    }

    #[test]
    fn test_submit_and_rank() {
        let store = DemoStore::in_memory();
        let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        let mut game = ChallengeBubbles::with_seed(2);
        for _ in 0..20 {
            game.tick(0.5);
        }
        game.quit();
        let first = submit_score(&store, "u1", &game, t0).unwrap();
        assert_eq!(first.game, GameKind::ChallengeBubbles);
        assert_eq!(first.duration_secs, 10);

        let second = submit_score(&store, "u2", &game, t0 + Duration::minutes(1)).unwrap();
        let board = leaderboard(&store, GameKind::ChallengeBubbles, 10).unwrap();
        assert_eq!(board.len(), 2);
        // Equal scores: earlier wins
        assert_eq!(board[0].id, first.id);
        assert_eq!(board[1].id, second.id);

        assert!(personal_best(&store, "u1", GameKind::ChakraBlaster)
            .unwrap()
            .is_none());
    }
}
