//! Daily practice: one card per day, a reflection on it, and the streak.
//!
//! A pull is remembered in two places: the device-local [`LocalCache`] and
//! the backend's `daily_card` row. The backend write is optimistic. A
//! duplicate row means the card was already pulled today; any other failure
//! is logged and the pull still succeeds locally.

pub mod cache;
pub mod cards;
pub mod pull;
pub mod reflection;
pub mod streak;

pub use cache::{practice_card_key, LocalCache};
pub use cards::{fallback_card, CardDeck};
pub use pull::{PracticeService, PullOutcome};
pub use reflection::ReflectionDraft;
pub use streak::{advance_streak, live_streak};
