//! Error types for vibeloop-core

use std::time::Duration;
use thiserror::Error;

use crate::pet::{BlockReason, PetAction};

/// Main error type for the vibeloop-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Record not found
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Unique constraint violation (row already exists)
    #[error("duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },

    /// Pet action rejected by its gating rules
    #[error("cannot {action} right now: {reason}")]
    ActionBlocked {
        action: PetAction,
        reason: BlockReason,
    },

    /// Pet action still cooling down
    #[error("{action} is cooling down, {}m {}s left", .remaining.as_secs() / 60, .remaining.as_secs() % 60)]
    Cooldown {
        action: PetAction,
        remaining: Duration,
    },

    /// Reflection not ready for submission
    #[error("reflection incomplete: {}", .0.join(", "))]
    Reflection(Vec<String>),

    /// Caller supplied something out of range
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Wallet address or connection error
    #[error("wallet error: {0}")]
    Wallet(String),

    /// Serverless function invocation error
    #[error("functions error: {0}")]
    Functions(String),
}

impl Error {
    /// Returns true for unique-constraint violations.
    ///
    /// Callers that treat a duplicate as "already done" match on this.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Error::Duplicate { .. })
    }

    /// Map a rusqlite error to [`Error::Duplicate`] for unique or primary-key
    /// violations and to [`Error::InvalidInput`] for CHECK failures. Anything
    /// else is wrapped as [`Error::Database`].
    pub(crate) fn from_insert(err: rusqlite::Error, entity: &'static str, key: String) -> Self {
        use rusqlite::ffi;

        let code = match &err {
            rusqlite::Error::SqliteFailure(e, _) => Some(e.extended_code),
            _ => None,
        };
        match code {
            Some(ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY) => {
                Error::Duplicate { entity, key }
            }
            Some(ffi::SQLITE_CONSTRAINT_CHECK) => {
                Error::InvalidInput(format!("{} {} is out of range", entity, key))
            }
            _ => Error::Database(err),
        }
    }
}

/// Result type alias for vibeloop-core
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_message() {
        let err = Error::Cooldown {
            action: PetAction::Feed,
            remaining: Duration::from_secs(125),
        };
        assert_eq!(err.to_string(), "feed is cooling down, 2m 5s left");
    }

    #[test]
    fn test_reflection_message_lists_missing() {
        let err = Error::Reflection(vec!["rating".to_string(), "mood after".to_string()]);
        assert_eq!(err.to_string(), "reflection incomplete: rating, mood after");
    }

    #[test]
    fn test_is_duplicate() {
        let dup = Error::Duplicate {
            entity: "daily card",
            key: "u/2024-01-01".to_string(),
        };
        assert!(dup.is_duplicate());
        assert!(!Error::Config("x".to_string()).is_duplicate());
    }
}
