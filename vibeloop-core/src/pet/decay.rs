//! Lazy, time-based decay.
//!
//! Decay is computed from the stored `last_interaction` each time the pet is
//! loaded and is never written back on its own, so loading twice without an
//! interaction in between yields the same result.

use chrono::{DateTime, Utc};

use super::state::{Gauge, PetState};

/// Elapsed time below which no decay applies.
pub const DECAY_GRACE_HOURS: f64 = 1.0;

/// Maximum points lost from energy, happiness and health in one decay.
pub const MAX_VITALITY_DECAY: i32 = 30;

/// Amounts derived from elapsed hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecayAmounts {
    /// Subtracted from energy, happiness and health
    pub vitality: i32,
    /// Subtracted from cleanliness
    pub cleanliness: i32,
    /// Added to hunger
    pub hunger: i32,
}

impl DecayAmounts {
    /// `min(floor(h*2), 30)`, `floor(h*3)` and `floor(h*5)`.
    pub fn for_hours(hours_since: f64) -> Self {
        if hours_since <= DECAY_GRACE_HOURS {
            return Self::default();
        }
        // Anything past 100 points saturates the gauges anyway.
        let scaled = |rate: f64| (hours_since * rate).floor().min(100.0) as i32;
        Self {
            vitality: scaled(2.0).min(MAX_VITALITY_DECAY),
            cleanliness: scaled(3.0),
            hunger: scaled(5.0),
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Hours between the last interaction and `now` (negative if the clock went backwards).
pub fn hours_since(state: &PetState, now: DateTime<Utc>) -> f64 {
    now.signed_duration_since(state.last_interaction)
        .num_milliseconds() as f64
        / 3_600_000.0
}

/// Return the decayed view of `state` at `now`.
pub fn apply_decay(state: &PetState, now: DateTime<Utc>) -> PetState {
    let hours = hours_since(state, now);
    let amounts = DecayAmounts::for_hours(hours);
    if amounts.is_zero() {
        return state.clone();
    }

    tracing::debug!(
        hours,
        vitality = amounts.vitality,
        cleanliness = amounts.cleanliness,
        hunger = amounts.hunger,
        "Applying pet decay"
    );

    let mut decayed = state.clone();
    decayed.adjust(Gauge::Energy, -amounts.vitality);
    decayed.adjust(Gauge::Happiness, -amounts.vitality);
    decayed.adjust(Gauge::Health, -amounts.vitality);
    decayed.adjust(Gauge::Cleanliness, -amounts.cleanliness);
    decayed.adjust(Gauge::Hunger, amounts.hunger);
    decayed.refresh_derived();
    decayed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_no_decay_within_grace_hour() {
        let pet = PetState::hatch("Vibe", base_time());
        let later = base_time() + Duration::minutes(60);
        assert_eq!(apply_decay(&pet, later), pet);
    }

    #[test]
    fn test_no_decay_when_clock_is_behind() {
        let pet = PetState::hatch("Vibe", base_time());
        let earlier = base_time() - Duration::hours(5);
        assert_eq!(apply_decay(&pet, earlier), pet);
    }

    #[test]
    fn test_five_hour_example() {
        let mut pet = PetState::hatch("Vibe", base_time());
        pet.energy = 10;
        pet.hunger = 80;
        let now = base_time() + Duration::hours(5);

        let decayed = apply_decay(&pet, now);
        assert_eq!(decayed.energy, 0);
        assert_eq!(decayed.happiness, 60);
        assert_eq!(decayed.health, 90);
        assert_eq!(decayed.cleanliness, 85);
        assert_eq!(decayed.hunger, 100);
        assert!(!decayed.is_sick);
        // Decay never moves the reference point
        assert_eq!(decayed.last_interaction, pet.last_interaction);
    }

    #[test]
    fn test_vitality_decay_is_capped() {
        let pet = PetState::hatch("Vibe", base_time());
        let decayed = apply_decay(&pet, base_time() + Duration::hours(40));
        assert_eq!(decayed.health, 70);
        assert_eq!(decayed.cleanliness, 0);
        assert_eq!(decayed.hunger, 100);
        assert!(decayed.is_sick);
    }

    #[test]
    fn test_decay_is_idempotent_across_loads() {
        let pet = PetState::hatch("Vibe", base_time());
        let now = base_time() + Duration::hours(7);
        let first = apply_decay(&pet, now);
        let second = apply_decay(&pet, now);
        assert_eq!(first, second);
    }

    #[test]
    fn test_long_absence_makes_pet_sick() {
        let mut pet = PetState::hatch("Vibe", base_time());
        pet.health = 40;
        let decayed = apply_decay(&pet, base_time() + Duration::hours(6));
        assert_eq!(decayed.health, 28);
        assert!(decayed.is_sick);
    }

    #[test]
    fn test_fractional_hours_floor() {
        let amounts = DecayAmounts::for_hours(2.9);
        assert_eq!(amounts.vitality, 5);
        assert_eq!(amounts.cleanliness, 8);
        assert_eq!(amounts.hunger, 14);
    }

    #[test]
    fn test_huge_gap_does_not_overflow() {
        let amounts = DecayAmounts::for_hours(1.0e12);
        assert_eq!(amounts.vitality, 30);
        assert_eq!(amounts.cleanliness, 100);
        assert_eq!(amounts.hunger, 100);
    }
}
