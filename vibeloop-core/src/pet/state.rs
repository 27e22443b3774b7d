//! The persisted VibeAGotchi record and its derived views.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lower bound of every gauge.
pub const GAUGE_MIN: u8 = 0;
/// Upper bound of every gauge.
pub const GAUGE_MAX: u8 = 100;

/// Harmony needed on the first interaction of a day to extend the harmony streak.
pub const HARMONY_STREAK_MIN: u8 = 60;

/// `clamp(value + delta, 0, 100)`.
pub fn clamp_gauge(value: u8, delta: i32) -> u8 {
    (i64::from(value) + i64::from(delta)).clamp(i64::from(GAUGE_MIN), i64::from(GAUGE_MAX)) as u8
}

/// One of the eight 0-100 gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gauge {
    Energy,
    Happiness,
    Health,
    Focus,
    Peace,
    Bond,
    Hunger,
    Cleanliness,
}

impl Gauge {
    pub const ALL: [Gauge; 8] = [
        Gauge::Energy,
        Gauge::Happiness,
        Gauge::Health,
        Gauge::Focus,
        Gauge::Peace,
        Gauge::Bond,
        Gauge::Hunger,
        Gauge::Cleanliness,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Gauge::Energy => "energy",
            Gauge::Happiness => "happiness",
            Gauge::Health => "health",
            Gauge::Focus => "focus",
            Gauge::Peace => "peace",
            Gauge::Bond => "bond",
            Gauge::Hunger => "hunger",
            Gauge::Cleanliness => "cleanliness",
        }
    }
}

/// How the pet currently feels. Derived from the gauges, never set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Sick,
    Sleeping,
    Hungry,
    Tired,
    Grumpy,
    Blissful,
    Happy,
    Serene,
    Sad,
    Content,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Sick => "sick",
            Emotion::Sleeping => "sleeping",
            Emotion::Hungry => "hungry",
            Emotion::Tired => "tired",
            Emotion::Grumpy => "grumpy",
            Emotion::Blissful => "blissful",
            Emotion::Happy => "happy",
            Emotion::Serene => "serene",
            Emotion::Sad => "sad",
            Emotion::Content => "content",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sick" => Ok(Emotion::Sick),
            "sleeping" => Ok(Emotion::Sleeping),
            "hungry" => Ok(Emotion::Hungry),
            "tired" => Ok(Emotion::Tired),
            "grumpy" => Ok(Emotion::Grumpy),
            "blissful" => Ok(Emotion::Blissful),
            "happy" => Ok(Emotion::Happy),
            "serene" => Ok(Emotion::Serene),
            "sad" => Ok(Emotion::Sad),
            "content" => Ok(Emotion::Content),
            _ => Err(format!("unknown emotion: {}", s)),
        }
    }
}

/// Per-user virtual pet record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetState {
    pub name: String,
    /// Index into [`super::evolution::STAGE_NAMES`]; only ever increases
    pub evolution_stage: u8,
    pub current_emotion: Emotion,

    pub energy: u8,
    pub happiness: u8,
    pub health: u8,
    pub focus: u8,
    pub peace: u8,
    pub bond: u8,
    pub hunger: u8,
    pub cleanliness: u8,

    pub growth_xp: u32,
    pub is_sleeping: bool,
    pub is_sick: bool,

    pub last_fed: Option<DateTime<Utc>>,
    pub last_cleaned: Option<DateTime<Utc>>,
    pub last_breathed: Option<DateTime<Utc>>,
    pub last_played: Option<DateTime<Utc>>,

    pub owned_items: BTreeSet<String>,
    pub equipped_item: Option<String>,

    pub total_interactions: u32,
    pub daily_harmony_score: u8,
    pub harmony_streak: u32,
    /// Day the harmony streak was last extended
    pub harmony_date: Option<NaiveDate>,

    /// Decay is measured from here
    pub last_interaction: DateTime<Utc>,
}

impl PetState {
    /// A freshly hatched pet.
    pub fn hatch(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        let mut state = Self {
            name: name.into(),
            evolution_stage: 0,
            current_emotion: Emotion::Content,
            energy: 80,
            happiness: 70,
            health: 100,
            focus: 50,
            peace: 50,
            bond: 10,
            hunger: 20,
            cleanliness: 100,
            growth_xp: 0,
            is_sleeping: false,
            is_sick: false,
            last_fed: None,
            last_cleaned: None,
            last_breathed: None,
            last_played: None,
            owned_items: BTreeSet::new(),
            equipped_item: None,
            total_interactions: 0,
            daily_harmony_score: 0,
            harmony_streak: 0,
            harmony_date: None,
            last_interaction: now,
        };
        state.refresh_derived();
        state.daily_harmony_score = state.harmony();
        state
    }

    pub fn gauge(&self, gauge: Gauge) -> u8 {
        match gauge {
            Gauge::Energy => self.energy,
            Gauge::Happiness => self.happiness,
            Gauge::Health => self.health,
            Gauge::Focus => self.focus,
            Gauge::Peace => self.peace,
            Gauge::Bond => self.bond,
            Gauge::Hunger => self.hunger,
            Gauge::Cleanliness => self.cleanliness,
        }
    }

    fn gauge_mut(&mut self, gauge: Gauge) -> &mut u8 {
        match gauge {
            Gauge::Energy => &mut self.energy,
            Gauge::Happiness => &mut self.happiness,
            Gauge::Health => &mut self.health,
            Gauge::Focus => &mut self.focus,
            Gauge::Peace => &mut self.peace,
            Gauge::Bond => &mut self.bond,
            Gauge::Hunger => &mut self.hunger,
            Gauge::Cleanliness => &mut self.cleanliness,
        }
    }

    /// Add `delta` to a gauge, clamped to [0, 100].
    pub fn adjust(&mut self, gauge: Gauge, delta: i32) {
        let slot = self.gauge_mut(gauge);
        *slot = clamp_gauge(*slot, delta);
    }

    /// Sickness rule shared by decay and interactions.
    pub fn sickness_rule(&self) -> bool {
        self.health < 30 || self.cleanliness < 20
    }

    /// Mean wellbeing across all gauges, with hunger inverted.
    pub fn harmony(&self) -> u8 {
        let total: u32 = Gauge::ALL
            .iter()
            .map(|&g| {
                let v = u32::from(self.gauge(g));
                if g == Gauge::Hunger {
                    100 - v
                } else {
                    v
                }
            })
            .sum();
        ((total as f64) / Gauge::ALL.len() as f64).round() as u8
    }

    /// Pick the emotion implied by the current flags and gauges.
    pub fn derive_emotion(&self) -> Emotion {
        if self.is_sick {
            Emotion::Sick
        } else if self.is_sleeping {
            Emotion::Sleeping
        } else if self.hunger >= 70 {
            Emotion::Hungry
        } else if self.energy < 20 {
            Emotion::Tired
        } else if self.cleanliness < 30 {
            Emotion::Grumpy
        } else if self.happiness >= 80 && self.peace >= 60 {
            Emotion::Blissful
        } else if self.happiness >= 70 {
            Emotion::Happy
        } else if self.peace >= 70 {
            Emotion::Serene
        } else if self.happiness < 30 {
            Emotion::Sad
        } else {
            Emotion::Content
        }
    }

    /// Recompute sickness and emotion after any gauge change.
    pub fn refresh_derived(&mut self) {
        self.is_sick = self.sickness_rule();
        self.current_emotion = self.derive_emotion();
    }

    /// Update harmony counters after an interaction on `today`.
    pub fn record_harmony(&mut self, today: NaiveDate) {
        let harmony = self.harmony();
        self.daily_harmony_score = harmony;

        if self.harmony_date == Some(today) || harmony < HARMONY_STREAK_MIN {
            return;
        }
        let yesterday = today.pred_opt();
        self.harmony_streak = if self.harmony_date.is_some() && self.harmony_date == yesterday {
            self.harmony_streak + 1
        } else {
            1
        };
        self.harmony_date = Some(today);
    }

    pub fn snapshot(&self) -> GaugeSnapshot {
        GaugeSnapshot {
            energy: self.energy,
            happiness: self.happiness,
            health: self.health,
            focus: self.focus,
            peace: self.peace,
            bond: self.bond,
            hunger: self.hunger,
            cleanliness: self.cleanliness,
        }
    }
}

/// Gauge values frozen at the moment of an evolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaugeSnapshot {
    pub energy: u8,
    pub happiness: u8,
    pub health: u8,
    pub focus: u8,
    pub peace: u8,
    pub bond: u8,
    pub hunger: u8,
    pub cleanliness: u8,
}

/// Append-only record of a stage transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionEvent {
    pub user_id: String,
    pub stage: u8,
    pub stage_name: String,
    pub growth_xp: u32,
    pub snapshot: GaugeSnapshot,
    pub occurred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_clamp_gauge_bounds() {
        assert_eq!(clamp_gauge(95, 40), 100);
        assert_eq!(clamp_gauge(5, -40), 0);
        assert_eq!(clamp_gauge(50, i32::MAX), 100);
        assert_eq!(clamp_gauge(50, i32::MIN), 0);
        assert_eq!(clamp_gauge(50, 7), 57);
    }

    #[test]
    fn test_hatch_defaults() {
        let pet = PetState::hatch("Vibe", Utc::now());
        assert_eq!(pet.evolution_stage, 0);
        assert_eq!(pet.energy, 80);
        assert_eq!(pet.hunger, 20);
        assert_eq!(pet.cleanliness, 100);
        assert!(!pet.is_sick);
        assert_eq!(pet.current_emotion, Emotion::Happy);
        assert!(pet.owned_items.is_empty());
        // (80 + 70 + 100 + 50 + 50 + 10 + 80 + 100) / 8 = 67.5
        assert_eq!(pet.harmony(), 68);
    }

    #[test]
    fn test_emotion_priority() {
        let mut pet = PetState::hatch("Vibe", Utc::now());
        pet.hunger = 90;
        pet.energy = 5;
        assert_eq!(pet.derive_emotion(), Emotion::Hungry);

        pet.is_sleeping = true;
        assert_eq!(pet.derive_emotion(), Emotion::Sleeping);

        pet.is_sick = true;
        assert_eq!(pet.derive_emotion(), Emotion::Sick);
    }

    #[test]
    fn test_harmony_streak_counts_consecutive_days() {
        let mut pet = PetState::hatch("Vibe", Utc::now());
        pet.record_harmony(day(1));
        assert_eq!(pet.harmony_streak, 1);

        // Same day does not double count
        pet.record_harmony(day(1));
        assert_eq!(pet.harmony_streak, 1);

        pet.record_harmony(day(2));
        assert_eq!(pet.harmony_streak, 2);

        pet.record_harmony(day(4));
        assert_eq!(pet.harmony_streak, 1);
    }

    #[test]
    fn test_low_harmony_does_not_extend_streak() {
        let mut pet = PetState::hatch("Vibe", Utc::now());
        pet.record_harmony(day(1));
        for g in Gauge::ALL {
            pet.adjust(g, -100);
        }
        pet.record_harmony(day(2));
        assert_eq!(pet.harmony_streak, 1);
        assert_eq!(pet.harmony_date, Some(day(1)));
    }
}
