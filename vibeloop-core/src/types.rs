//! Core domain types for vibeloop
//!
//! These are the rows the [`Store`](crate::db::Store) backends persist.
//! The pet record and its evolution history live in [`crate::pet`].
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Practice card** | A short prompt/affirmation drawn once per day |
//! | **Daily card** | The record that a user drew a given card on a given date |
//! | **Daily practice** | The journal entry attached to a daily card (reflection, rating, moods) |
//! | **Activity pulse** | A standalone mood check-in |
//! | **Streak** | Consecutive calendar days with a card pull |

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Profile
// ============================================

/// Per-user profile holding streak counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: Option<String>,
    /// Consecutive days with a pull, ending at `last_pull_date`
    pub current_streak: u32,
    /// Best streak ever; never decreases
    pub longest_streak: u32,
    pub last_pull_date: Option<NaiveDate>,
    /// Number of completed reflections
    pub total_practices: u32,
    /// Connected wallet address, as entered
    pub wallet_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Fresh profile with zeroed counters.
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            current_streak: 0,
            longest_streak: 0,
            last_pull_date: None,
            total_practices: 0,
            wallet_address: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================
// Mood
// ============================================

/// Fixed mood scale used by check-ins and reflections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Radiant,
    Joyful,
    Calm,
    Neutral,
    Tired,
    Anxious,
    Sad,
}

impl Mood {
    pub const ALL: [Mood; 7] = [
        Mood::Radiant,
        Mood::Joyful,
        Mood::Calm,
        Mood::Neutral,
        Mood::Tired,
        Mood::Anxious,
        Mood::Sad,
    ];

    /// Signed valence, +3 (radiant) down to -3 (sad).
    pub fn valence(&self) -> i32 {
        match self {
            Mood::Radiant => 3,
            Mood::Joyful => 2,
            Mood::Calm => 1,
            Mood::Neutral => 0,
            Mood::Tired => -1,
            Mood::Anxious => -2,
            Mood::Sad => -3,
        }
    }

    /// Returns the identifier used in database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Radiant => "radiant",
            Mood::Joyful => "joyful",
            Mood::Calm => "calm",
            Mood::Neutral => "neutral",
            Mood::Tired => "tired",
            Mood::Anxious => "anxious",
            Mood::Sad => "sad",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Mood::Radiant => "🌟",
            Mood::Joyful => "😄",
            Mood::Calm => "😌",
            Mood::Neutral => "😐",
            Mood::Tired => "😴",
            Mood::Anxious => "😟",
            Mood::Sad => "😢",
        }
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown mood: {}", s))
    }
}

// ============================================
// Cards and practices
// ============================================

/// Category of a practice card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardCategory {
    Gratitude,
    Breath,
    Kindness,
    Presence,
    Courage,
    Affirmation,
}

impl CardCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardCategory::Gratitude => "gratitude",
            CardCategory::Breath => "breath",
            CardCategory::Kindness => "kindness",
            CardCategory::Presence => "presence",
            CardCategory::Courage => "courage",
            CardCategory::Affirmation => "affirmation",
        }
    }
}

/// A drawable practice card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeCard {
    /// Stable identifier, e.g. "gratitude-3" or "daily-affirmation-142"
    pub id: String,
    pub title: String,
    pub prompt: String,
    pub category: CardCategory,
}

/// Record that `user_id` drew `card_id` on `date`. Unique per (user, date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCard {
    pub user_id: String,
    pub date: NaiveDate,
    pub card_id: String,
    pub pulled_at: DateTime<Utc>,
}

/// Journal entry for a daily card. Unique per (user, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPractice {
    pub user_id: String,
    pub date: NaiveDate,
    pub card_id: String,
    pub reflection: Option<String>,
    /// 1-5
    pub rating: Option<u8>,
    pub mood_before: Option<Mood>,
    pub mood_after: Option<Mood>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl DailyPractice {
    /// An open (not yet reflected on) practice for a freshly drawn card.
    pub fn open(card: &DailyCard) -> Self {
        Self {
            user_id: card.user_id.clone(),
            date: card.date,
            card_id: card.card_id.clone(),
            reflection: None,
            rating: None,
            mood_before: None,
            mood_after: None,
            completed: false,
            completed_at: None,
        }
    }

    /// Valence change from before to after, when both moods are known.
    pub fn mood_shift(&self) -> Option<i32> {
        match (self.mood_before, self.mood_after) {
            (Some(before), Some(after)) => Some(after.valence() - before.valence()),
            _ => None,
        }
    }
}

/// A card the user saved. Unique per (user, card).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteCard {
    pub user_id: String,
    pub card_id: String,
    pub saved_at: DateTime<Utc>,
}

// ============================================
// Games
// ============================================

/// Available mini-games
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    ChakraBlaster,
    ChallengeBubbles,
}

impl GameKind {
    pub const ALL: [GameKind; 2] = [GameKind::ChakraBlaster, GameKind::ChallengeBubbles];

    pub fn display_name(&self) -> &'static str {
        match self {
            GameKind::ChakraBlaster => "Chakra Blaster",
            GameKind::ChallengeBubbles => "Challenge Bubbles",
        }
    }

    /// Returns the identifier used in database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::ChakraBlaster => "chakra_blaster",
            GameKind::ChallengeBubbles => "challenge_bubbles",
        }
    }
}

impl std::fmt::Display for GameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GameKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chakra_blaster" | "blaster" => Ok(GameKind::ChakraBlaster),
            "challenge_bubbles" | "bubbles" => Ok(GameKind::ChallengeBubbles),
            _ => Err(format!("unknown game: {}", s)),
        }
    }
}

/// Final result of one game round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameScore {
    pub id: String,
    pub user_id: String,
    pub game: GameKind,
    pub score: u32,
    pub level_reached: u32,
    pub duration_secs: u32,
    pub played_at: DateTime<Utc>,
}

// ============================================
// Mood check-ins and achievements
// ============================================

/// A standalone mood check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPulse {
    pub id: String,
    pub user_id: String,
    pub mood: Mood,
    /// Self-reported energy, 1-5
    pub energy: u8,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// A one-time unlock. Unique per (user, title).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub unlocked_at: DateTime<Utc>,
}

/// Parse an RFC 3339 timestamp stored as TEXT.
pub(crate) fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
