//! Evolution stages and their one-time side effects.
//!
//! A stage is a pure function of `growth_xp`. The persisted
//! `evolution_stage` is what makes events fire at most once per crossing:
//! an event is only emitted when the XP-implied stage is strictly ahead of it.

use chrono::{DateTime, Utc};

use super::state::{EvolutionEvent, PetState};

/// XP required to reach each stage, ascending.
pub const XP_THRESHOLDS: [u32; 6] = [0, 100, 300, 600, 1000, 1500];

/// Display name of each stage.
pub const STAGE_NAMES: [&str; 6] = [
    "Spark",
    "Ember",
    "Flame",
    "Radiant",
    "Celestial",
    "Transcendent",
];

/// Highest reachable stage index.
pub const MAX_STAGE: u8 = (XP_THRESHOLDS.len() - 1) as u8;

/// Stage implied by an XP total: index of the first threshold above `xp`, minus one.
pub fn stage_for(xp: u32) -> u8 {
    match XP_THRESHOLDS.iter().position(|&t| t > xp) {
        Some(idx) => idx.saturating_sub(1) as u8,
        None => MAX_STAGE,
    }
}

pub fn stage_name(stage: u8) -> &'static str {
    STAGE_NAMES[usize::from(stage.min(MAX_STAGE))]
}

/// XP still needed for the next stage, or `None` at the top.
pub fn xp_to_next(xp: u32) -> Option<u32> {
    XP_THRESHOLDS.iter().find(|&&t| t > xp).map(|&t| t - xp)
}

/// Advance `state.evolution_stage` if its XP has crossed a new threshold.
///
/// Returns the single event for the stage reached. A gain that skips several
/// thresholds at once still produces one event.
pub fn check_evolution(
    state: &mut PetState,
    user_id: &str,
    now: DateTime<Utc>,
) -> Option<EvolutionEvent> {
    let next_stage = stage_for(state.growth_xp);
    if next_stage <= state.evolution_stage {
        return None;
    }

    state.evolution_stage = next_stage;
    tracing::info!(
        user_id,
        stage = next_stage,
        name = stage_name(next_stage),
        xp = state.growth_xp,
        "Pet evolved"
    );

    Some(EvolutionEvent {
        user_id: user_id.to_string(),
        stage: next_stage,
        stage_name: stage_name(next_stage).to_string(),
        growth_xp: state.growth_xp,
        snapshot: state.snapshot(),
        occurred_at: now,
    })
}

/// Achievement unlocked on reaching a stage, as `(title, description)`.
pub fn stage_achievement(stage: u8) -> Option<(&'static str, &'static str)> {
    match stage {
        1 => Some(("Ember Awakened", "Your VibeAGotchi reached its Ember form")),
        3 => Some(("Radiant Soul", "Your VibeAGotchi began to shine as Radiant")),
        5 => Some((
            "Transcendent Bond",
            "Your VibeAGotchi reached its final Transcendent form",
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_for_thresholds() {
        assert_eq!(stage_for(0), 0);
        assert_eq!(stage_for(99), 0);
        assert_eq!(stage_for(100), 1);
        assert_eq!(stage_for(299), 1);
        assert_eq!(stage_for(300), 2);
        assert_eq!(stage_for(1499), 4);
        assert_eq!(stage_for(1500), 5);
        assert_eq!(stage_for(u32::MAX), 5);
    }

    #[test]
    fn test_stage_for_is_monotone_and_bounded() {
        let mut previous = 0;
        for xp in 0..2_000 {
            let stage = stage_for(xp);
            assert!(stage >= previous, "stage dropped at xp {}", xp);
            assert!(stage <= MAX_STAGE);
            previous = stage;
        }
    }

    #[test]
    fn test_crossing_threshold_fires_once() {
        let now = Utc::now();
        let mut pet = PetState::hatch("Vibe", now);
        pet.growth_xp = 99;
        assert!(check_evolution(&mut pet, "u", now).is_none());

        pet.growth_xp = 100;
        let event = check_evolution(&mut pet, "u", now).expect("should evolve");
        assert_eq!(event.stage, 1);
        assert_eq!(event.stage_name, "Ember");
        assert_eq!(pet.evolution_stage, 1);

        // Same XP again: nothing
        assert!(check_evolution(&mut pet, "u", now).is_none());
        pet.growth_xp = 150;
        assert!(check_evolution(&mut pet, "u", now).is_none());
    }

    #[test]
    fn test_large_gain_emits_single_event_for_reached_stage() {
        let now = Utc::now();
        let mut pet = PetState::hatch("Vibe", now);
        pet.growth_xp = 650;
        let event = check_evolution(&mut pet, "u", now).unwrap();
        assert_eq!(event.stage, 3);
        assert_eq!(event.snapshot, pet.snapshot());
        assert!(check_evolution(&mut pet, "u", now).is_none());
    }

    #[test]
    fn test_xp_to_next() {
        assert_eq!(xp_to_next(0), Some(100));
        assert_eq!(xp_to_next(250), Some(50));
        assert_eq!(xp_to_next(1500), None);
    }

    #[test]
    fn test_stage_achievements() {
        assert!(stage_achievement(0).is_none());
        assert_eq!(stage_achievement(1).unwrap().0, "Ember Awakened");
        assert!(stage_achievement(2).is_none());
        assert_eq!(stage_achievement(5).unwrap().0, "Transcendent Bond");
    }
}
