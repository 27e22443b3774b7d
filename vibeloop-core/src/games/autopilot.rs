//! Scripted players for headless runs.
//!
//! Used by the CLI to play a round without a screen. Given the same seed the
//! run is fully reproducible.

use super::blaster::{ChakraBlaster, ENEMY_RADIUS, PLAYER_SPEED};
use super::bubbles::ChallengeBubbles;
use super::geometry::ARENA_HEIGHT;
use super::{GameEvent, GameSession};
use crate::types::GameKind;

/// Simulation step, 60 frames per second.
pub const FRAME_SECONDS: f64 = 1.0 / 60.0;

/// Seconds the bubble player waits between pops.
const POP_REACTION: f64 = 0.4;

/// A finished headless round.
pub struct AutopilotRun {
    pub session: Box<dyn GameSession>,
    pub events: Vec<GameEvent>,
}

/// Play `kind` for at most `max_seconds`, then stop.
pub fn play(kind: GameKind, seed: u64, max_seconds: f64) -> AutopilotRun {
    let frames = (max_seconds.max(0.0) / FRAME_SECONDS).ceil() as u64;
    let (mut session, events) = match kind {
        GameKind::ChakraBlaster => {
            let mut game = ChakraBlaster::with_seed(seed);
            let events = run_blaster(&mut game, frames);
            (Box::new(game) as Box<dyn GameSession>, events)
        }
        GameKind::ChallengeBubbles => {
            let mut game = ChallengeBubbles::with_seed(seed);
            let events = run_bubbles(&mut game, frames);
            (Box::new(game) as Box<dyn GameSession>, events)
        }
    };
    session.quit();
    tracing::debug!(
        game = %kind,
        seed,
        score = session.score(),
        status = ?session.status(),
        "Autopilot run finished"
    );
    AutopilotRun { session, events }
}

/// Chase the lowest enemy and fire once lined up.
fn run_blaster(game: &mut ChakraBlaster, frames: u64) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for _ in 0..frames {
        if game.is_finished() {
            break;
        }
        let target = game
            .enemies()
            .iter()
            .filter(|e| e.y < ARENA_HEIGHT)
            .max_by(|a, b| a.y.total_cmp(&b.y))
            .copied();
        if let Some(target) = target {
            let dx = target.x - game.player_x();
            game.move_player(dx.signum(), FRAME_SECONDS.min(dx.abs() / PLAYER_SPEED));
            if dx.abs() < ENEMY_RADIUS {
                game.fire();
            }
        }
        events.extend(game.tick(FRAME_SECONDS));
    }
    events
}

/// Pop whichever bubble is closest to escaping, at human speed.
fn run_bubbles(game: &mut ChallengeBubbles, frames: u64) -> Vec<GameEvent> {
    let mut events = Vec::new();
    let mut ready_in = POP_REACTION;
    for _ in 0..frames {
        if game.is_finished() {
            break;
        }
        ready_in -= FRAME_SECONDS;
        if ready_in <= 0.0 {
            let target = game
                .bubbles()
                .iter()
                .filter(|b| b.center.y < ARENA_HEIGHT)
                .min_by(|a, b| a.center.y.total_cmp(&b.center.y))
                .map(|b| b.center);
            if let Some(point) = target {
                events.extend(game.pop(point));
                ready_in = POP_REACTION;
            }
        }
        events.extend(game.tick(FRAME_SECONDS));
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_are_reproducible() {
        for kind in GameKind::ALL {
            let a = play(kind, 42, 20.0);
            let b = play(kind, 42, 20.0);
            assert_eq!(a.session.score(), b.session.score());
            assert_eq!(a.events, b.events);
            assert!(a.session.is_finished());
        }
    }

    #[test]
    fn test_autopilot_scores_points() {
        let run = play(GameKind::ChakraBlaster, 7, 30.0);
        assert!(run.session.score() > 0);

        let run = play(GameKind::ChallengeBubbles, 7, 30.0);
        assert!(run.session.score() > 0);
    }

    #[test]
    fn test_time_limit_is_respected() {
        let run = play(GameKind::ChallengeBubbles, 1, 5.0);
        assert!(run.session.elapsed() <= 5.0 + FRAME_SECONDS);
    }
}
