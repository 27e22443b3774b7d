//! VibeAGotchi: the per-user virtual pet.
//!
//! The pet is a single persisted record ([`PetState`]) driven by two forces:
//!
//! - **Decay**: gauges drift down (hunger up) with wall-clock time since the
//!   last interaction. Decay is computed on read and never written back on
//!   its own, so loading twice never double-counts.
//! - **Interactions**: care actions adjust gauges, stamp cooldowns and add
//!   growth XP. XP crossing a threshold evolves the pet exactly once per
//!   stage and may unlock an achievement.
//!
//! The free functions in the submodules are pure; [`PetKeeper`] wires them to
//! a [`Store`](crate::db::Store).

pub mod actions;
pub mod decay;
pub mod evolution;
pub mod items;
pub mod keeper;
pub mod state;

pub use actions::{apply_action, check_action, BlockReason, Cooldowns, PetAction};
pub use decay::apply_decay;
pub use evolution::{check_evolution, stage_for, stage_name, STAGE_NAMES, XP_THRESHOLDS};
pub use keeper::{InteractionOutcome, PetKeeper};
pub use state::{Emotion, EvolutionEvent, Gauge, GaugeSnapshot, PetState};
