//! Device-local key/value cache.
//!
//! Mirrors the browser's local storage: a flat JSON object written to
//! `cache.json` in the data dir. Each user's daily pull is remembered here
//! under `practice_card_{user}_{YYYY-MM-DD}` so a repeat pull works even when
//! the backend is unreachable.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Cache key for the card `user_id` pulled on `date`.
pub fn practice_card_key(user_id: &str, date: NaiveDate) -> String {
    format!("practice_card_{}_{}", user_id, date.format("%Y-%m-%d"))
}

#[derive(Debug, Default)]
pub struct LocalCache {
    entries: BTreeMap<String, serde_json::Value>,
    path: Option<PathBuf>,
}

impl LocalCache {
    /// Load the cache file; a missing or corrupt file starts empty.
    pub fn open(path: &Path) -> Self {
        let entries = match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable cache");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            entries,
            path: Some(path.to_path_buf()),
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Typed read; `None` if absent or of another shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.entries.get(key)?;
        serde_json::from_value(value.clone()).ok()
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        self.entries
            .insert(key.to_string(), serde_json::to_value(value)?);
        self.flush()
    }

    pub fn remove(&mut self, key: &str) -> Result<bool> {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.flush()?;
        }
        Ok(removed)
    }

    fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&self.entries)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}
