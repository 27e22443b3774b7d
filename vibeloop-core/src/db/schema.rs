//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: profiles, daily practice, games, pet
    r#"
    CREATE TABLE IF NOT EXISTS user_profile (
        user_id          TEXT PRIMARY KEY,
        display_name     TEXT,
        current_streak   INTEGER NOT NULL DEFAULT 0,
        longest_streak   INTEGER NOT NULL DEFAULT 0,
        last_pull_date   TEXT,               -- YYYY-MM-DD
        total_practices  INTEGER NOT NULL DEFAULT 0,
        wallet_address   TEXT,
        created_at       DATETIME NOT NULL,
        updated_at       DATETIME NOT NULL
    );

    -- One drawn card per user per day
    CREATE TABLE IF NOT EXISTS daily_card (
        user_id          TEXT NOT NULL,
        date             TEXT NOT NULL,
        card_id          TEXT NOT NULL,
        pulled_at        DATETIME NOT NULL,

        PRIMARY KEY (user_id, date)
    );

    CREATE TABLE IF NOT EXISTS daily_practice (
        user_id          TEXT NOT NULL,
        date             TEXT NOT NULL,
        card_id          TEXT NOT NULL,
        reflection       TEXT,
        rating           INTEGER CHECK (rating BETWEEN 1 AND 5),
        mood_before      TEXT,
        mood_after       TEXT,
        completed        INTEGER NOT NULL DEFAULT 0,
        completed_at     DATETIME,

        PRIMARY KEY (user_id, date)
    );

    CREATE TABLE IF NOT EXISTS favorite_card (
        user_id          TEXT NOT NULL,
        card_id          TEXT NOT NULL,
        saved_at         DATETIME NOT NULL,

        PRIMARY KEY (user_id, card_id)
    );

    CREATE TABLE IF NOT EXISTS game_score (
        id               TEXT PRIMARY KEY,
        user_id          TEXT NOT NULL,
        game             TEXT NOT NULL,      -- 'chakra_blaster', 'challenge_bubbles'
        score            INTEGER NOT NULL,
        level_reached    INTEGER NOT NULL,
        duration_secs    INTEGER NOT NULL,
        played_at        DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS vibeagotchi_state (
        user_id             TEXT PRIMARY KEY,
        name                TEXT NOT NULL,
        evolution_stage     INTEGER NOT NULL,
        current_emotion     TEXT NOT NULL,

        energy              INTEGER NOT NULL,
        happiness           INTEGER NOT NULL,
        health              INTEGER NOT NULL,
        focus               INTEGER NOT NULL,
        peace               INTEGER NOT NULL,
        bond                INTEGER NOT NULL,
        hunger              INTEGER NOT NULL,
        cleanliness         INTEGER NOT NULL,

        growth_xp           INTEGER NOT NULL,
        is_sleeping         INTEGER NOT NULL,
        is_sick             INTEGER NOT NULL,

        last_fed            DATETIME,
        last_cleaned        DATETIME,
        last_breathed       DATETIME,
        last_played         DATETIME,

        owned_items         JSON NOT NULL,
        equipped_item       TEXT,

        total_interactions  INTEGER NOT NULL,
        daily_harmony_score INTEGER NOT NULL,
        harmony_streak      INTEGER NOT NULL,
        harmony_date        TEXT,

        last_interaction    DATETIME NOT NULL
    );

    -- Append-only; one row per stage reached
    CREATE TABLE IF NOT EXISTS evolution_event (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id          TEXT NOT NULL,
        stage            INTEGER NOT NULL,
        stage_name       TEXT NOT NULL,
        growth_xp        INTEGER NOT NULL,
        snapshot         JSON NOT NULL,
        occurred_at      DATETIME NOT NULL,

        UNIQUE (user_id, stage)
    );

    CREATE INDEX IF NOT EXISTS idx_game_score_board ON game_score(game, score DESC, played_at);
    CREATE INDEX IF NOT EXISTS idx_game_score_user ON game_score(user_id, game);
    CREATE INDEX IF NOT EXISTS idx_daily_practice_user ON daily_practice(user_id, date DESC);
    "#,
    // Version 2: achievements and mood check-ins
    r#"
    CREATE TABLE IF NOT EXISTS achievement (
        user_id          TEXT NOT NULL,
        title            TEXT NOT NULL,
        description      TEXT NOT NULL,
        unlocked_at      DATETIME NOT NULL,

        PRIMARY KEY (user_id, title)
    );

    CREATE TABLE IF NOT EXISTS activity_pulse (
        id               TEXT PRIMARY KEY,
        user_id          TEXT NOT NULL,
        mood             TEXT NOT NULL,
        energy           INTEGER NOT NULL CHECK (energy BETWEEN 1 AND 5),
        note             TEXT,
        recorded_at      DATETIME NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_activity_pulse_user ON activity_pulse(user_id, recorded_at);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version = get_schema_version(conn)?;

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute_batch(&format!("PRAGMA user_version = {}", version))?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_tables_created() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let tables = [
            "user_profile",
            "daily_card",
            "daily_practice",
            "favorite_card",
            "game_score",
            "vibeagotchi_state",
            "evolution_event",
            "achievement",
            "activity_pulse",
        ];

        for table in tables {
            let exists: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
                    [table],
                    |r| r.get(0),
                )
                .unwrap();
            assert_eq!(exists, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_daily_card_is_unique_per_day() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let insert = "INSERT INTO daily_card (user_id, date, card_id, pulled_at) \
                      VALUES ('u', '2024-06-01', ?1, '2024-06-01T08:00:00Z')";
        conn.execute(insert, ["breath-1"]).unwrap();
        let err = conn.execute(insert, ["kindness-2"]).unwrap_err();
        assert_eq!(
            err.sqlite_error_code(),
            Some(rusqlite::ErrorCode::ConstraintViolation)
        );
    }
}
