//! SQLite implementation of [`Store`].

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{fmt_ts, Store};
use crate::error::{Error, Result};
use crate::pet::{EvolutionEvent, GaugeSnapshot, PetState};
use crate::types::*;

/// Database handle (single connection behind a mutex)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        super::schema::run_migrations(&self.conn())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-statement leaves nothing half-written in SQLite, so a
        // poisoned lock is still safe to reuse.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ============================================
    // Row mapping
    // ============================================

    fn row_to_profile(row: &Row) -> rusqlite::Result<UserProfile> {
        Ok(UserProfile {
            user_id: row.get("user_id")?,
            display_name: row.get("display_name")?,
            current_streak: row.get("current_streak")?,
            longest_streak: row.get("longest_streak")?,
            last_pull_date: opt_date_col(row, "last_pull_date")?,
            total_practices: row.get("total_practices")?,
            wallet_address: row.get("wallet_address")?,
            created_at: ts_col(row, "created_at")?,
            updated_at: ts_col(row, "updated_at")?,
        })
    }

    fn row_to_daily_card(row: &Row) -> rusqlite::Result<DailyCard> {
        Ok(DailyCard {
            user_id: row.get("user_id")?,
            date: date_col(row, "date")?,
            card_id: row.get("card_id")?,
            pulled_at: ts_col(row, "pulled_at")?,
        })
    }

    fn row_to_practice(row: &Row) -> rusqlite::Result<DailyPractice> {
        Ok(DailyPractice {
            user_id: row.get("user_id")?,
            date: date_col(row, "date")?,
            card_id: row.get("card_id")?,
            reflection: row.get("reflection")?,
            rating: row.get("rating")?,
            mood_before: opt_parsed_col(row, "mood_before")?,
            mood_after: opt_parsed_col(row, "mood_after")?,
            completed: row.get("completed")?,
            completed_at: opt_ts_col(row, "completed_at")?,
        })
    }

    fn row_to_favorite(row: &Row) -> rusqlite::Result<FavoriteCard> {
        Ok(FavoriteCard {
            user_id: row.get("user_id")?,
            card_id: row.get("card_id")?,
            saved_at: ts_col(row, "saved_at")?,
        })
    }

    fn row_to_score(row: &Row) -> rusqlite::Result<GameScore> {
        Ok(GameScore {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            game: parsed_col(row, "game")?,
            score: row.get("score")?,
            level_reached: row.get("level_reached")?,
            duration_secs: row.get("duration_secs")?,
            played_at: ts_col(row, "played_at")?,
        })
    }

    fn row_to_pet(row: &Row) -> rusqlite::Result<PetState> {
        let owned_items: String = row.get("owned_items")?;
        Ok(PetState {
            name: row.get("name")?,
            evolution_stage: row.get("evolution_stage")?,
            current_emotion: parsed_col(row, "current_emotion")?,
            energy: row.get("energy")?,
            happiness: row.get("happiness")?,
            health: row.get("health")?,
            focus: row.get("focus")?,
            peace: row.get("peace")?,
            bond: row.get("bond")?,
            hunger: row.get("hunger")?,
            cleanliness: row.get("cleanliness")?,
            growth_xp: row.get("growth_xp")?,
            is_sleeping: row.get("is_sleeping")?,
            is_sick: row.get("is_sick")?,
            last_fed: opt_ts_col(row, "last_fed")?,
            last_cleaned: opt_ts_col(row, "last_cleaned")?,
            last_breathed: opt_ts_col(row, "last_breathed")?,
            last_played: opt_ts_col(row, "last_played")?,
            owned_items: serde_json::from_str(&owned_items)
                .map_err(|e| conversion_error("owned_items", e.to_string()))?,
            equipped_item: row.get("equipped_item")?,
            total_interactions: row.get("total_interactions")?,
            daily_harmony_score: row.get("daily_harmony_score")?,
            harmony_streak: row.get("harmony_streak")?,
            harmony_date: opt_date_col(row, "harmony_date")?,
            last_interaction: ts_col(row, "last_interaction")?,
        })
    }

    fn row_to_evolution(row: &Row) -> rusqlite::Result<EvolutionEvent> {
        let snapshot: String = row.get("snapshot")?;
        let snapshot: GaugeSnapshot = serde_json::from_str(&snapshot)
            .map_err(|e| conversion_error("snapshot", e.to_string()))?;
        Ok(EvolutionEvent {
            user_id: row.get("user_id")?,
            stage: row.get("stage")?,
            stage_name: row.get("stage_name")?,
            growth_xp: row.get("growth_xp")?,
            snapshot,
            occurred_at: ts_col(row, "occurred_at")?,
        })
    }

    fn row_to_achievement(row: &Row) -> rusqlite::Result<Achievement> {
        Ok(Achievement {
            user_id: row.get("user_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            unlocked_at: ts_col(row, "unlocked_at")?,
        })
    }

    fn row_to_pulse(row: &Row) -> rusqlite::Result<ActivityPulse> {
        Ok(ActivityPulse {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            mood: parsed_col(row, "mood")?,
            energy: row.get("energy")?,
            note: row.get("note")?,
            recorded_at: ts_col(row, "recorded_at")?,
        })
    }
}

impl Store for Database {
    // ============================================
    // Profile operations
    // ============================================

    fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT * FROM user_profile WHERE user_id = ?",
            [user_id],
            Self::row_to_profile,
        )
        .optional()
        .map_err(Error::from)
    }

    fn upsert_profile(&self, profile: &UserProfile) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO user_profile (user_id, display_name, current_streak, longest_streak,
                                      last_pull_date, total_practices, wallet_address,
                                      created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(user_id) DO UPDATE SET
                display_name = excluded.display_name,
                current_streak = excluded.current_streak,
                longest_streak = excluded.longest_streak,
                last_pull_date = excluded.last_pull_date,
                total_practices = excluded.total_practices,
                wallet_address = excluded.wallet_address,
                updated_at = excluded.updated_at
            "#,
            params![
                profile.user_id,
                profile.display_name,
                profile.current_streak,
                profile.longest_streak,
                profile.last_pull_date.map(|d| d.to_string()),
                profile.total_practices,
                profile.wallet_address,
                fmt_ts(profile.created_at),
                fmt_ts(profile.updated_at),
            ],
        )?;
        Ok(())
    }

    // ============================================
    // Daily card operations
    // ============================================

    fn insert_daily_card(&self, card: &DailyCard) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO daily_card (user_id, date, card_id, pulled_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                card.user_id,
                card.date.to_string(),
                card.card_id,
                fmt_ts(card.pulled_at),
            ],
        )
        .map_err(|e| {
            Error::from_insert(e, "daily card", format!("{}/{}", card.user_id, card.date))
        })?;
        Ok(())
    }

    fn get_daily_card(&self, user_id: &str, date: NaiveDate) -> Result<Option<DailyCard>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT * FROM daily_card WHERE user_id = ? AND date = ?",
            params![user_id, date.to_string()],
            Self::row_to_daily_card,
        )
        .optional()
        .map_err(Error::from)
    }

    // ============================================
    // Daily practice operations
    // ============================================

    fn upsert_daily_practice(&self, practice: &DailyPractice) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO daily_practice (user_id, date, card_id, reflection, rating,
                                        mood_before, mood_after, completed, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(user_id, date) DO UPDATE SET
                card_id = excluded.card_id,
                reflection = excluded.reflection,
                rating = excluded.rating,
                mood_before = excluded.mood_before,
                mood_after = excluded.mood_after,
                completed = excluded.completed,
                completed_at = excluded.completed_at
            "#,
            params![
                practice.user_id,
                practice.date.to_string(),
                practice.card_id,
                practice.reflection,
                practice.rating,
                practice.mood_before.map(|m| m.as_str()),
                practice.mood_after.map(|m| m.as_str()),
                practice.completed,
                practice.completed_at.map(fmt_ts),
            ],
        )?;
        Ok(())
    }

    fn get_daily_practice(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyPractice>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT * FROM daily_practice WHERE user_id = ? AND date = ?",
            params![user_id, date.to_string()],
            Self::row_to_practice,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_practices(
        &self,
        user_id: &str,
        since: Option<NaiveDate>,
        limit: usize,
    ) -> Result<Vec<DailyPractice>> {
        let conn = self.conn();
        let since = since.map(|d| d.to_string()).unwrap_or_default();
        let mut stmt = conn.prepare(
            "SELECT * FROM daily_practice WHERE user_id = ? AND date >= ? \
             ORDER BY date DESC LIMIT ?",
        )?;
        let practices = stmt
            .query_map(
                params![user_id, since, limit as i64],
                Self::row_to_practice,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(practices)
    }

    // ============================================
    // Favorite operations
    // ============================================

    fn insert_favorite(&self, favorite: &FavoriteCard) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO favorite_card (user_id, card_id, saved_at) VALUES (?1, ?2, ?3)",
            params![
                favorite.user_id,
                favorite.card_id,
                fmt_ts(favorite.saved_at)
            ],
        )
        .map_err(|e| {
            Error::from_insert(
                e,
                "favorite",
                format!("{}/{}", favorite.user_id, favorite.card_id),
            )
        })?;
        Ok(())
    }

    fn delete_favorite(&self, user_id: &str, card_id: &str) -> Result<bool> {
        let conn = self.conn();
        let removed = conn.execute(
            "DELETE FROM favorite_card WHERE user_id = ? AND card_id = ?",
            params![user_id, card_id],
        )?;
        Ok(removed > 0)
    }

    fn list_favorites(&self, user_id: &str) -> Result<Vec<FavoriteCard>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT * FROM favorite_card WHERE user_id = ? ORDER BY saved_at DESC")?;
        let favorites = stmt
            .query_map([user_id], Self::row_to_favorite)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(favorites)
    }

    // ============================================
    // Game score operations
    // ============================================

    fn insert_game_score(&self, score: &GameScore) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO game_score (id, user_id, game, score, level_reached, duration_secs, played_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                score.id,
                score.user_id,
                score.game.as_str(),
                score.score,
                score.level_reached,
                score.duration_secs,
                fmt_ts(score.played_at),
            ],
        )
        .map_err(|e| Error::from_insert(e, "game score", score.id.clone()))?;
        Ok(())
    }

    fn top_scores(&self, game: GameKind, limit: usize) -> Result<Vec<GameScore>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT * FROM game_score WHERE game = ? ORDER BY score DESC, played_at ASC LIMIT ?",
        )?;
        let scores = stmt
            .query_map(params![game.as_str(), limit as i64], Self::row_to_score)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(scores)
    }

    fn best_score(&self, user_id: &str, game: GameKind) -> Result<Option<GameScore>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT * FROM game_score WHERE user_id = ? AND game = ? \
             ORDER BY score DESC, played_at ASC LIMIT 1",
            params![user_id, game.as_str()],
            Self::row_to_score,
        )
        .optional()
        .map_err(Error::from)
    }

    // ============================================
    // Pet operations
    // ============================================

    fn get_pet_state(&self, user_id: &str) -> Result<Option<PetState>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT * FROM vibeagotchi_state WHERE user_id = ?",
            [user_id],
            Self::row_to_pet,
        )
        .optional()
        .map_err(Error::from)
    }

    fn save_pet_state(&self, user_id: &str, state: &PetState) -> Result<()> {
        let owned_items = serde_json::to_string(&state.owned_items)?;
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT OR REPLACE INTO vibeagotchi_state (
                user_id, name, evolution_stage, current_emotion,
                energy, happiness, health, focus, peace, bond, hunger, cleanliness,
                growth_xp, is_sleeping, is_sick,
                last_fed, last_cleaned, last_breathed, last_played,
                owned_items, equipped_item,
                total_interactions, daily_harmony_score, harmony_streak, harmony_date,
                last_interaction
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                    ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26)
            "#,
            params![
                user_id,
                state.name,
                state.evolution_stage,
                state.current_emotion.as_str(),
                state.energy,
                state.happiness,
                state.health,
                state.focus,
                state.peace,
                state.bond,
                state.hunger,
                state.cleanliness,
                state.growth_xp,
                state.is_sleeping,
                state.is_sick,
                state.last_fed.map(fmt_ts),
                state.last_cleaned.map(fmt_ts),
                state.last_breathed.map(fmt_ts),
                state.last_played.map(fmt_ts),
                owned_items,
                state.equipped_item,
                state.total_interactions,
                state.daily_harmony_score,
                state.harmony_streak,
                state.harmony_date.map(|d| d.to_string()),
                fmt_ts(state.last_interaction),
            ],
        )?;
        Ok(())
    }

    // ============================================
    // Evolution / achievement operations
    // ============================================

    fn append_evolution_event(&self, event: &EvolutionEvent) -> Result<()> {
        let snapshot = serde_json::to_string(&event.snapshot)?;
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO evolution_event (user_id, stage, stage_name, growth_xp, snapshot, occurred_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                event.user_id,
                event.stage,
                event.stage_name,
                event.growth_xp,
                snapshot,
                fmt_ts(event.occurred_at),
            ],
        )
        .map_err(|e| {
            Error::from_insert(
                e,
                "evolution event",
                format!("{}/{}", event.user_id, event.stage),
            )
        })?;
        Ok(())
    }

    fn list_evolution_events(&self, user_id: &str) -> Result<Vec<EvolutionEvent>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT * FROM evolution_event WHERE user_id = ? ORDER BY stage ASC")?;
        let events = stmt
            .query_map([user_id], Self::row_to_evolution)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(events)
    }

    fn insert_achievement(&self, achievement: &Achievement) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO achievement (user_id, title, description, unlocked_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                achievement.user_id,
                achievement.title,
                achievement.description,
                fmt_ts(achievement.unlocked_at),
            ],
        )
        .map_err(|e| {
            Error::from_insert(
                e,
                "achievement",
                format!("{}/{}", achievement.user_id, achievement.title),
            )
        })?;
        Ok(())
    }

    fn list_achievements(&self, user_id: &str) -> Result<Vec<Achievement>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT * FROM achievement WHERE user_id = ? ORDER BY unlocked_at ASC, title ASC",
        )?;
        let achievements = stmt
            .query_map([user_id], Self::row_to_achievement)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(achievements)
    }

    fn has_achievement(&self, user_id: &str, title: &str) -> Result<bool> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM achievement WHERE user_id = ? AND title = ?",
            params![user_id, title],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    // ============================================
    // Activity pulse operations
    // ============================================

    fn insert_pulse(&self, pulse: &ActivityPulse) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO activity_pulse (id, user_id, mood, energy, note, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                pulse.id,
                pulse.user_id,
                pulse.mood.as_str(),
                pulse.energy,
                pulse.note,
                fmt_ts(pulse.recorded_at),
            ],
        )
        .map_err(|e| Error::from_insert(e, "activity pulse", pulse.id.clone()))?;
        Ok(())
    }

    fn list_pulses(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<ActivityPulse>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT * FROM activity_pulse WHERE user_id = ? AND recorded_at >= ? \
             ORDER BY recorded_at ASC",
        )?;
        let pulses = stmt
            .query_map(params![user_id, fmt_ts(since)], Self::row_to_pulse)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(pulses)
    }
}

// ============================================
// Column helpers
// ============================================

fn conversion_error(column: &str, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        format!("column {}: {}", column, message).into(),
    )
}

fn ts_col(row: &Row, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    parse_ts(&raw).ok_or_else(|| conversion_error(column, format!("bad timestamp {:?}", raw)))
}

fn opt_ts_col(row: &Row, column: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(column)?;
    raw.map(|s| {
        parse_ts(&s).ok_or_else(|| conversion_error(column, format!("bad timestamp {:?}", s)))
    })
    .transpose()
}

fn date_col(row: &Row, column: &str) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(column)?;
    raw.parse::<NaiveDate>()
        .map_err(|e| conversion_error(column, e.to_string()))
}

fn opt_date_col(row: &Row, column: &str) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(column)?;
    raw.map(|s| {
        s.parse::<NaiveDate>()
            .map_err(|e| conversion_error(column, e.to_string()))
    })
    .transpose()
}

fn parsed_col<T>(row: &Row, column: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.get(column)?;
    raw.parse::<T>().map_err(|e| conversion_error(column, e))
}

fn opt_parsed_col<T>(row: &Row, column: &str) -> rusqlite::Result<Option<T>>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: Option<String> = row.get(column)?;
    raw.map(|s| s.parse::<T>().map_err(|e| conversion_error(column, e)))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_pet_state_round_trip() {
        let db = db();
        let mut pet = PetState::hatch("Nova", at(8));
        pet.growth_xp = 120;
        pet.evolution_stage = 1;
        pet.last_fed = Some(at(9));
        pet.owned_items.insert("halo".to_string());
        pet.equipped_item = Some("halo".to_string());
        pet.harmony_date = NaiveDate::from_ymd_opt(2024, 6, 1);

        db.save_pet_state("u1", &pet).unwrap();
        let loaded = db.get_pet_state("u1").unwrap().unwrap();
        assert_eq!(loaded, pet);

        pet.energy = 3;
        db.save_pet_state("u1", &pet).unwrap();
        assert_eq!(db.get_pet_state("u1").unwrap().unwrap().energy, 3);
        assert!(db.get_pet_state("u2").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_daily_card_maps_to_duplicate() {
        let db = db();
        let card = DailyCard {
            user_id: "u1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            card_id: "breath-1".to_string(),
            pulled_at: at(8),
        };
        db.insert_daily_card(&card).unwrap();
        let err = db.insert_daily_card(&card).unwrap_err();
        assert!(err.is_duplicate(), "got {:?}", err);
    }

    #[test]
    fn test_check_violation_is_invalid_input() {
        let db = db();
        let pulse = ActivityPulse {
            id: "p1".to_string(),
            user_id: "u1".to_string(),
            mood: Mood::Calm,
            energy: 9,
            note: None,
            recorded_at: at(8),
        };
        let err = db.insert_pulse(&pulse).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)), "got {:?}", err);

        let ok = ActivityPulse { energy: 3, ..pulse };
        db.insert_pulse(&ok).unwrap();
        assert!(db.insert_pulse(&ok).unwrap_err().is_duplicate());
    }

    #[test]
    fn test_top_scores_order_and_ties() {
        let db = db();
        let mk = |id: &str, user: &str, score: u32, hour: u32| GameScore {
            id: id.to_string(),
            user_id: user.to_string(),
            game: GameKind::ChakraBlaster,
            score,
            level_reached: 1,
            duration_secs: 30,
            played_at: at(hour),
        };
        db.insert_game_score(&mk("a", "u1", 50, 10)).unwrap();
        db.insert_game_score(&mk("b", "u2", 90, 12)).unwrap();
        db.insert_game_score(&mk("c", "u3", 90, 11)).unwrap();

        let ids: Vec<_> = db
            .top_scores(GameKind::ChakraBlaster, 10)
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
        assert!(db
            .top_scores(GameKind::ChallengeBubbles, 10)
            .unwrap()
            .is_empty());
        assert_eq!(
            db.best_score("u1", GameKind::ChakraBlaster)
                .unwrap()
                .unwrap()
                .score,
            50
        );
    }

    #[test]
    fn test_pulses_since_filter() {
        let db = db();
        for (i, hour) in [6, 9, 12].into_iter().enumerate() {
            db.insert_pulse(&ActivityPulse {
                id: format!("p{}", i),
                user_id: "u1".to_string(),
                mood: Mood::Calm,
                energy: 3,
                note: None,
                recorded_at: at(hour),
            })
            .unwrap();
        }
        let pulses = db.list_pulses("u1", at(9) - Duration::minutes(1)).unwrap();
        let ids: Vec<_> = pulses.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }

    #[test]
    fn test_favorites_and_achievements() {
        let db = db();
        let fav = FavoriteCard {
            user_id: "u1".to_string(),
            card_id: "kindness-2".to_string(),
            saved_at: at(8),
        };
        db.insert_favorite(&fav).unwrap();
        assert!(db.insert_favorite(&fav).unwrap_err().is_duplicate());
        assert_eq!(db.list_favorites("u1").unwrap(), vec![fav]);
        assert!(db.delete_favorite("u1", "kindness-2").unwrap());
        assert!(!db.delete_favorite("u1", "kindness-2").unwrap());

        let achievement = Achievement {
            user_id: "u1".to_string(),
            title: "Ember Awakened".to_string(),
            description: "d".to_string(),
            unlocked_at: at(8),
        };
        assert!(!db.has_achievement("u1", "Ember Awakened").unwrap());
        db.insert_achievement(&achievement).unwrap();
        assert!(db.has_achievement("u1", "Ember Awakened").unwrap());
        assert!(db.insert_achievement(&achievement).unwrap_err().is_duplicate());
    }
}
