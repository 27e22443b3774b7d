//! Care actions: gating, gauge adjustments and XP.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::{Gauge, PetState};
use crate::config::PetConfig;
use crate::error::{Error, Result};

/// Something the user does to the pet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PetAction {
    Feed,
    Clean,
    Heal,
    Breathe,
    Reflect,
    Play,
    /// Toggles between asleep and awake
    Sleep,
    Tap,
}

impl PetAction {
    pub const ALL: [PetAction; 8] = [
        PetAction::Feed,
        PetAction::Clean,
        PetAction::Heal,
        PetAction::Breathe,
        PetAction::Reflect,
        PetAction::Play,
        PetAction::Sleep,
        PetAction::Tap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PetAction::Feed => "feed",
            PetAction::Clean => "clean",
            PetAction::Heal => "heal",
            PetAction::Breathe => "breathe",
            PetAction::Reflect => "reflect",
            PetAction::Play => "play",
            PetAction::Sleep => "sleep",
            PetAction::Tap => "tap",
        }
    }

    /// Fixed gauge adjustments. Sleep depends on direction and is handled separately.
    fn effects(&self) -> &'static [(Gauge, i32)] {
        match self {
            PetAction::Feed => &[
                (Gauge::Hunger, -30),
                (Gauge::Energy, 10),
                (Gauge::Happiness, 5),
                (Gauge::Health, 2),
            ],
            PetAction::Clean => &[
                (Gauge::Cleanliness, 40),
                (Gauge::Happiness, 5),
                (Gauge::Health, 3),
            ],
            PetAction::Heal => &[(Gauge::Health, 40), (Gauge::Energy, 5)],
            PetAction::Breathe => &[
                (Gauge::Peace, 15),
                (Gauge::Focus, 10),
                (Gauge::Happiness, 3),
            ],
            PetAction::Reflect => &[(Gauge::Focus, 10), (Gauge::Peace, 5), (Gauge::Bond, 10)],
            PetAction::Play => &[
                (Gauge::Happiness, 15),
                (Gauge::Bond, 5),
                (Gauge::Energy, -10),
                (Gauge::Hunger, 5),
                (Gauge::Cleanliness, -5),
            ],
            PetAction::Sleep => &[],
            PetAction::Tap => &[(Gauge::Happiness, 2), (Gauge::Bond, 1)],
        }
    }

    /// XP awarded, given whether the pet was asleep before the action.
    fn xp(&self, was_sleeping: bool) -> u32 {
        match self {
            PetAction::Feed | PetAction::Clean => 10,
            PetAction::Heal | PetAction::Breathe | PetAction::Play => 15,
            PetAction::Reflect => 20,
            PetAction::Sleep if was_sleeping => 0,
            PetAction::Sleep => 5,
            PetAction::Tap => 1,
        }
    }
}

impl std::fmt::Display for PetAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PetAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        PetAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("unknown pet action: {}", s))
    }
}

/// Why an action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    Sleeping,
    Sick,
    NotSick,
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockReason::Sleeping => write!(f, "your pet is sleeping"),
            BlockReason::Sick => write!(f, "your pet is sick"),
            BlockReason::NotSick => write!(f, "your pet is not sick"),
        }
    }
}

/// Minimum spacing between repeats of the cooled-down actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldowns {
    pub feed: Duration,
    pub clean: Duration,
    pub breathe: Duration,
    pub play: Duration,
}

impl Cooldowns {
    pub fn from_config(config: &PetConfig) -> Self {
        let minutes = |m: u32| Duration::from_secs(u64::from(m) * 60);
        Self {
            feed: minutes(config.feed_cooldown_minutes),
            clean: minutes(config.clean_cooldown_minutes),
            breathe: minutes(config.breathe_cooldown_minutes),
            play: minutes(config.play_cooldown_minutes),
        }
    }

    /// No waiting between actions.
    pub fn none() -> Self {
        Self {
            feed: Duration::ZERO,
            clean: Duration::ZERO,
            breathe: Duration::ZERO,
            play: Duration::ZERO,
        }
    }

    fn window(&self, action: PetAction, state: &PetState) -> Option<(Duration, DateTime<Utc>)> {
        match action {
            PetAction::Feed => state.last_fed.map(|t| (self.feed, t)),
            PetAction::Clean => state.last_cleaned.map(|t| (self.clean, t)),
            PetAction::Breathe => state.last_breathed.map(|t| (self.breathe, t)),
            PetAction::Play => state.last_played.map(|t| (self.play, t)),
            _ => None,
        }
    }

    /// Time left before `action` is allowed again, if any.
    pub fn remaining(
        &self,
        action: PetAction,
        state: &PetState,
        now: DateTime<Utc>,
    ) -> Option<Duration> {
        let (window, last) = self.window(action, state)?;
        let elapsed = now
            .signed_duration_since(last)
            .to_std()
            .unwrap_or(Duration::ZERO);
        window.checked_sub(elapsed).filter(|left| !left.is_zero())
    }
}

impl Default for Cooldowns {
    fn default() -> Self {
        Self::from_config(&PetConfig::default())
    }
}

/// Gating rules, in order: sleep, sickness, heal-only-when-sick, cooldown.
pub fn check_action(
    state: &PetState,
    action: PetAction,
    cooldowns: &Cooldowns,
    now: DateTime<Utc>,
) -> Result<()> {
    let blocked =
        |reason: BlockReason| -> Result<()> { Err(Error::ActionBlocked { action, reason }) };

    let exempt_from_sleep = matches!(action, PetAction::Heal | PetAction::Sleep);
    if state.is_sleeping && !exempt_from_sleep {
        return blocked(BlockReason::Sleeping);
    }
    if state.is_sick && matches!(action, PetAction::Play | PetAction::Breathe) {
        return blocked(BlockReason::Sick);
    }
    if action == PetAction::Heal && !state.is_sick {
        return blocked(BlockReason::NotSick);
    }
    if let Some(remaining) = cooldowns.remaining(action, state, now) {
        return Err(Error::Cooldown { action, remaining });
    }
    Ok(())
}

/// Apply an (already checked) action at `now`. Returns the XP gained.
pub fn apply_action(state: &mut PetState, action: PetAction, now: DateTime<Utc>) -> u32 {
    let was_sleeping = state.is_sleeping;

    for &(gauge, delta) in action.effects() {
        state.adjust(gauge, delta);
    }

    match action {
        PetAction::Feed => state.last_fed = Some(now),
        PetAction::Clean => state.last_cleaned = Some(now),
        PetAction::Breathe => state.last_breathed = Some(now),
        PetAction::Play => state.last_played = Some(now),
        PetAction::Sleep => {
            state.is_sleeping = !was_sleeping;
            if state.is_sleeping {
                state.adjust(Gauge::Energy, 25);
            }
        }
        PetAction::Heal | PetAction::Reflect | PetAction::Tap => {}
    }

    let xp = action.xp(was_sleeping);
    state.growth_xp = state.growth_xp.saturating_add(xp);
    state.total_interactions = state.total_interactions.saturating_add(1);
    state.last_interaction = now;
    state.refresh_derived();
    xp
}
