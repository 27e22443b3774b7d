//! # vibeloop-core
//!
//! Core library for vibeloop - daily practice cards, mood tracking,
//! mini-games and the VibeAGotchi virtual pet.
//!
//! This library provides:
//! - Domain types for profiles, cards, practices, moods and scores
//! - The pet decay/evolution state machine
//! - Chakra Blaster and Challenge Bubbles simulations
//! - Two storage backends behind the [`Store`] trait: SQLite and demo mode
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Time
//!
//! Nothing in this crate reads the wall clock on its own. Every operation that
//! depends on time takes `now` from the caller, so decay, cooldowns and streaks
//! are pure functions of stored state plus the supplied instant.
//!
//! ## Example
//!
//! ```rust,no_run
//! use vibeloop_core::pet::{PetAction, PetKeeper};
//! use vibeloop_core::{open_store, Config};
//!
//! let config = Config::load().expect("failed to load config");
//! let store = open_store(&config).expect("failed to open store");
//!
//! let keeper = PetKeeper::new(store.as_ref(), &config.pet);
//! let outcome = keeper
//!     .interact("local", PetAction::Feed, chrono::Utc::now())
//!     .expect("feeding failed");
//! println!("{} feels {}", outcome.state.name, outcome.state.current_emotion);
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::{open_store, Database, DemoStore, Store};
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod format;
pub mod games;
pub mod logging;
pub mod mood;
pub mod pet;
pub mod practice;
pub mod types;
pub mod wallet;
