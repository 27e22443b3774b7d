//! Demo-mode backend: every table in one JSON document.
//!
//! The whole document is held in memory and rewritten after each write.
//! Unique keys are checked by hand so inserts fail with
//! [`Error::Duplicate`] exactly where the SQLite backend would.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Store;
use crate::error::{Error, Result};
use crate::pet::{EvolutionEvent, PetState};
use crate::types::*;

/// Pet row keyed by owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PetRow {
    user_id: String,
    #[serde(flatten)]
    state: PetState,
}

/// On-disk layout, one top-level key per table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct DemoData {
    user_profile: Vec<UserProfile>,
    daily_card: Vec<DailyCard>,
    daily_practice: Vec<DailyPractice>,
    favorite_card: Vec<FavoriteCard>,
    game_score: Vec<GameScore>,
    vibeagotchi_state: Vec<PetRow>,
    evolution_event: Vec<EvolutionEvent>,
    achievement: Vec<Achievement>,
    activity_pulse: Vec<ActivityPulse>,
}

/// JSON-blob store used for demo mode.
pub struct DemoStore {
    data: Mutex<DemoData>,
    /// `None` keeps everything in memory
    path: Option<PathBuf>,
}

impl DemoStore {
    /// Open the blob at `path`, starting empty if it does not exist yet.
    pub fn open(path: &Path) -> Result<Self> {
        let data = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            if raw.trim().is_empty() {
                DemoData::default()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            DemoData::default()
        };

        Ok(Self {
            data: Mutex::new(data),
            path: Some(path.to_path_buf()),
        })
    }

    /// A store that never touches disk (for testing).
    pub fn in_memory() -> Self {
        Self {
            data: Mutex::new(DemoData::default()),
            path: None,
        }
    }

    fn data(&self) -> MutexGuard<'_, DemoData> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` against a copy of the document. The copy replaces the
    /// in-memory document only once it is safely on disk.
    fn write<T>(&self, f: impl FnOnce(&mut DemoData) -> Result<T>) -> Result<T> {
        let mut data = self.data();
        let mut draft = data.clone();
        let out = f(&mut draft)?;
        self.flush(&draft)?;
        *data = draft;
        Ok(out)
    }

    fn flush(&self, data: &DemoData) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Write then rename so a crash never leaves a truncated blob.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(data)?)?;
        std::fs::rename(&tmp, path)?;
        tracing::debug!(path = %path.display(), "Flushed demo store");
        Ok(())
    }
}

fn duplicate(entity: &'static str, key: String) -> Error {
    Error::Duplicate { entity, key }
}

impl Store for DemoStore {
    fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self
            .data()
            .user_profile
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    fn upsert_profile(&self, profile: &UserProfile) -> Result<()> {
        self.write(|data| {
            match data
                .user_profile
                .iter_mut()
                .find(|p| p.user_id == profile.user_id)
            {
                Some(existing) => {
                    let created_at = existing.created_at;
                    *existing = profile.clone();
                    existing.created_at = created_at;
                }
                None => data.user_profile.push(profile.clone()),
            }
            Ok(())
        })
    }

    fn insert_daily_card(&self, card: &DailyCard) -> Result<()> {
        self.write(|data| {
            if data
                .daily_card
                .iter()
                .any(|c| c.user_id == card.user_id && c.date == card.date)
            {
                return Err(duplicate(
                    "daily card",
                    format!("{}/{}", card.user_id, card.date),
                ));
            }
            data.daily_card.push(card.clone());
            Ok(())
        })
    }

    fn get_daily_card(&self, user_id: &str, date: NaiveDate) -> Result<Option<DailyCard>> {
        Ok(self
            .data()
            .daily_card
            .iter()
            .find(|c| c.user_id == user_id && c.date == date)
            .cloned())
    }

    fn upsert_daily_practice(&self, practice: &DailyPractice) -> Result<()> {
        if let Some(rating) = practice.rating {
            if !(1..=5).contains(&rating) {
                return Err(Error::InvalidInput(format!(
                    "rating must be 1-5, got {}",
                    rating
                )));
            }
        }
        self.write(|data| {
            match data
                .daily_practice
                .iter_mut()
                .find(|p| p.user_id == practice.user_id && p.date == practice.date)
            {
                Some(existing) => *existing = practice.clone(),
                None => data.daily_practice.push(practice.clone()),
            }
            Ok(())
        })
    }

    fn get_daily_practice(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyPractice>> {
        Ok(self
            .data()
            .daily_practice
            .iter()
            .find(|p| p.user_id == user_id && p.date == date)
            .cloned())
    }

    fn list_practices(
        &self,
        user_id: &str,
        since: Option<NaiveDate>,
        limit: usize,
    ) -> Result<Vec<DailyPractice>> {
        let mut practices: Vec<_> = self
            .data()
            .daily_practice
            .iter()
            .filter(|p| p.user_id == user_id)
            .filter(|p| since.map_or(true, |since| p.date >= since))
            .cloned()
            .collect();
        practices.sort_by(|a, b| b.date.cmp(&a.date));
        practices.truncate(limit);
        Ok(practices)
    }

    fn insert_favorite(&self, favorite: &FavoriteCard) -> Result<()> {
        self.write(|data| {
            if data
                .favorite_card
                .iter()
                .any(|f| f.user_id == favorite.user_id && f.card_id == favorite.card_id)
            {
                return Err(duplicate(
                    "favorite",
                    format!("{}/{}", favorite.user_id, favorite.card_id),
                ));
            }
            data.favorite_card.push(favorite.clone());
            Ok(())
        })
    }

    fn delete_favorite(&self, user_id: &str, card_id: &str) -> Result<bool> {
        self.write(|data| {
            let before = data.favorite_card.len();
            data.favorite_card
                .retain(|f| !(f.user_id == user_id && f.card_id == card_id));
            Ok(data.favorite_card.len() < before)
        })
    }

    fn list_favorites(&self, user_id: &str) -> Result<Vec<FavoriteCard>> {
        let mut favorites: Vec<_> = self
            .data()
            .favorite_card
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        favorites.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(favorites)
    }

    fn insert_game_score(&self, score: &GameScore) -> Result<()> {
        self.write(|data| {
            if data.game_score.iter().any(|s| s.id == score.id) {
                return Err(duplicate("game score", score.id.clone()));
            }
            data.game_score.push(score.clone());
            Ok(())
        })
    }

    fn top_scores(&self, game: GameKind, limit: usize) -> Result<Vec<GameScore>> {
        let mut scores: Vec<_> = self
            .data()
            .game_score
            .iter()
            .filter(|s| s.game == game)
            .cloned()
            .collect();
        scores.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.played_at.cmp(&b.played_at))
        });
        scores.truncate(limit);
        Ok(scores)
    }

    fn best_score(&self, user_id: &str, game: GameKind) -> Result<Option<GameScore>> {
        Ok(self
            .data()
            .game_score
            .iter()
            .filter(|s| s.user_id == user_id && s.game == game)
            .min_by(|a, b| {
                b.score
                    .cmp(&a.score)
                    .then_with(|| a.played_at.cmp(&b.played_at))
            })
            .cloned())
    }

    fn get_pet_state(&self, user_id: &str) -> Result<Option<PetState>> {
        Ok(self
            .data()
            .vibeagotchi_state
            .iter()
            .find(|row| row.user_id == user_id)
            .map(|row| row.state.clone()))
    }

    fn save_pet_state(&self, user_id: &str, state: &PetState) -> Result<()> {
        self.write(|data| {
            match data
                .vibeagotchi_state
                .iter_mut()
                .find(|row| row.user_id == user_id)
            {
                Some(row) => row.state = state.clone(),
                None => data.vibeagotchi_state.push(PetRow {
                    user_id: user_id.to_string(),
                    state: state.clone(),
                }),
            }
            Ok(())
        })
    }

    fn append_evolution_event(&self, event: &EvolutionEvent) -> Result<()> {
        self.write(|data| {
            if data
                .evolution_event
                .iter()
                .any(|e| e.user_id == event.user_id && e.stage == event.stage)
            {
                return Err(duplicate(
                    "evolution event",
                    format!("{}/{}", event.user_id, event.stage),
                ));
            }
            data.evolution_event.push(event.clone());
            Ok(())
        })
    }

    fn list_evolution_events(&self, user_id: &str) -> Result<Vec<EvolutionEvent>> {
        let mut events: Vec<_> = self
            .data()
            .evolution_event
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.stage);
        Ok(events)
    }

    fn insert_achievement(&self, achievement: &Achievement) -> Result<()> {
        self.write(|data| {
            if data
                .achievement
                .iter()
                .any(|a| a.user_id == achievement.user_id && a.title == achievement.title)
            {
                return Err(duplicate(
                    "achievement",
                    format!("{}/{}", achievement.user_id, achievement.title),
                ));
            }
            data.achievement.push(achievement.clone());
            Ok(())
        })
    }

    fn list_achievements(&self, user_id: &str) -> Result<Vec<Achievement>> {
        let mut achievements: Vec<_> = self
            .data()
            .achievement
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        achievements.sort_by(|a, b| {
            a.unlocked_at
                .cmp(&b.unlocked_at)
                .then_with(|| a.title.cmp(&b.title))
        });
        Ok(achievements)
    }

    fn insert_pulse(&self, pulse: &ActivityPulse) -> Result<()> {
        if !(1..=5).contains(&pulse.energy) {
            return Err(Error::InvalidInput(format!(
                "energy must be 1-5, got {}",
                pulse.energy
            )));
        }
        self.write(|data| {
            if data.activity_pulse.iter().any(|p| p.id == pulse.id) {
                return Err(duplicate("activity pulse", pulse.id.clone()));
            }
            data.activity_pulse.push(pulse.clone());
            Ok(())
        })
    }

    fn list_pulses(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<ActivityPulse>> {
        let mut pulses: Vec<_> = self
            .data()
            .activity_pulse
            .iter()
            .filter(|p| p.user_id == user_id && p.recorded_at >= since)
            .cloned()
            .collect();
        pulses.sort_by_key(|p| p.recorded_at);
        Ok(pulses)
    }
}
