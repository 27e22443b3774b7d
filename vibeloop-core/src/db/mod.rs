//! Storage layer for vibeloop
//!
//! Every feature module talks to storage through the [`Store`] trait, which
//! exposes typed get/list/insert/upsert calls per table. Two backends
//! implement it with identical semantics, including unique constraints:
//! - [`Database`]: SQLite with embedded migrations
//! - [`DemoStore`]: "demo mode", one JSON blob holding every table
//!
//! Inserts into uniquely keyed tables report a violated constraint as
//! [`Error::Duplicate`](crate::Error::Duplicate) on both backends, so callers
//! can treat "already exists" the same way regardless of which one is active.

pub mod demo;
pub mod repo;
pub mod schema;

pub use demo::DemoStore;
pub use repo::Database;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::config::{Config, StorageBackend};
use crate::error::Result;
use crate::pet::{EvolutionEvent, PetState};
use crate::types::*;

/// Table-shaped persistence used by every feature module.
pub trait Store: Send + Sync {
    // ---------- user_profile ----------

    fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;

    /// Insert or replace the profile row (last write wins).
    fn upsert_profile(&self, profile: &UserProfile) -> Result<()>;

    // ---------- daily_card ----------

    /// Fails with `Duplicate` if the user already has a card for that date.
    fn insert_daily_card(&self, card: &DailyCard) -> Result<()>;

    fn get_daily_card(&self, user_id: &str, date: NaiveDate) -> Result<Option<DailyCard>>;

    // ---------- daily_practice ----------

    fn upsert_daily_practice(&self, practice: &DailyPractice) -> Result<()>;

    fn get_daily_practice(&self, user_id: &str, date: NaiveDate)
        -> Result<Option<DailyPractice>>;

    /// Practices on or after `since` (all when `None`), newest first.
    fn list_practices(
        &self,
        user_id: &str,
        since: Option<NaiveDate>,
        limit: usize,
    ) -> Result<Vec<DailyPractice>>;

    // ---------- favorite_card ----------

    /// Fails with `Duplicate` if the card is already a favorite.
    fn insert_favorite(&self, favorite: &FavoriteCard) -> Result<()>;

    /// Returns whether a row was removed.
    fn delete_favorite(&self, user_id: &str, card_id: &str) -> Result<bool>;

    /// Newest first.
    fn list_favorites(&self, user_id: &str) -> Result<Vec<FavoriteCard>>;

    // ---------- game_score ----------

    fn insert_game_score(&self, score: &GameScore) -> Result<()>;

    /// Highest scores first; ties go to whoever got there first.
    fn top_scores(&self, game: GameKind, limit: usize) -> Result<Vec<GameScore>>;

    fn best_score(&self, user_id: &str, game: GameKind) -> Result<Option<GameScore>>;

    // ---------- vibeagotchi_state ----------

    fn get_pet_state(&self, user_id: &str) -> Result<Option<PetState>>;

    /// Insert or replace the pet row (last write wins).
    fn save_pet_state(&self, user_id: &str, state: &PetState) -> Result<()>;

    // ---------- evolution_event ----------

    /// Append-only. Fails with `Duplicate` if the stage was already recorded.
    fn append_evolution_event(&self, event: &EvolutionEvent) -> Result<()>;

    /// Oldest first.
    fn list_evolution_events(&self, user_id: &str) -> Result<Vec<EvolutionEvent>>;

    // ---------- achievement ----------

    /// Fails with `Duplicate` if the title is already held.
    fn insert_achievement(&self, achievement: &Achievement) -> Result<()>;

    /// Oldest first.
    fn list_achievements(&self, user_id: &str) -> Result<Vec<Achievement>>;

    fn has_achievement(&self, user_id: &str, title: &str) -> Result<bool> {
        Ok(self
            .list_achievements(user_id)?
            .iter()
            .any(|a| a.title == title))
    }

    // ---------- activity_pulse ----------

    fn insert_pulse(&self, pulse: &ActivityPulse) -> Result<()>;

    /// Pulses recorded at or after `since`, oldest first.
    fn list_pulses(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<ActivityPulse>>;
}

/// Open the backend selected in the configuration, migrated and ready.
pub fn open_store(config: &Config) -> Result<Box<dyn Store>> {
    let path = config.storage.resolved_path();
    match config.storage.backend {
        StorageBackend::Sqlite => {
            tracing::info!(path = %path.display(), "Opening SQLite store");
            let db = Database::open(&path)?;
            db.migrate()?;
            Ok(Box::new(db))
        }
        StorageBackend::Demo => {
            tracing::info!(path = %path.display(), "Opening demo store");
            Ok(Box::new(DemoStore::open(&path)?))
        }
    }
}

/// Stored profile, or a fresh unsaved one if the user has none yet.
pub fn profile_or_new(store: &dyn Store, user_id: &str, now: DateTime<Utc>) -> Result<UserProfile> {
    Ok(store
        .get_profile(user_id)?
        .unwrap_or_else(|| UserProfile::new(user_id, now)))
}

/// Fixed-width UTC timestamp so TEXT ordering matches time ordering.
pub(crate) fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
