//! Store-backed pet service.

use chrono::{DateTime, Utc};

use super::actions::{apply_action, check_action, Cooldowns, PetAction};
use super::decay::apply_decay;
use super::evolution::{check_evolution, stage_achievement};
use super::items;
use super::state::{EvolutionEvent, PetState};
use crate::config::PetConfig;
use crate::db::Store;
use crate::error::{Error, Result};
use crate::types::Achievement;

/// Result of a successful interaction.
#[derive(Debug, Clone)]
pub struct InteractionOutcome {
    /// State as persisted
    pub state: PetState,
    pub xp_gained: u32,
    pub evolution: Option<EvolutionEvent>,
    /// Set when the evolution unlocked an achievement not already held
    pub achievement: Option<Achievement>,
}

/// Loads, mutates and persists one user's pet.
pub struct PetKeeper<'a> {
    store: &'a dyn Store,
    config: &'a PetConfig,
    cooldowns: Cooldowns,
}

impl<'a> PetKeeper<'a> {
    pub fn new(store: &'a dyn Store, config: &'a PetConfig) -> Self {
        Self {
            store,
            config,
            cooldowns: Cooldowns::from_config(config),
        }
    }

    /// Replace the configured cooldowns.
    pub fn with_cooldowns(mut self, cooldowns: Cooldowns) -> Self {
        self.cooldowns = cooldowns;
        self
    }

    /// Stored record, hatching (and saving) a default one on first access.
    fn stored(&self, user_id: &str, now: DateTime<Utc>) -> Result<PetState> {
        if let Some(state) = self.store.get_pet_state(user_id)? {
            return Ok(state);
        }
        let state = PetState::hatch(self.config.default_name.clone(), now);
        self.store.save_pet_state(user_id, &state)?;
        tracing::info!(user_id, name = %state.name, "Hatched new pet");
        Ok(state)
    }

    /// Decayed view of the pet at `now`. Decay is not written back.
    pub fn load(&self, user_id: &str, now: DateTime<Utc>) -> Result<PetState> {
        let stored = self.stored(user_id, now)?;
        Ok(apply_decay(&stored, now))
    }

    /// Time left before `action` is allowed again.
    pub fn cooldown_remaining(
        &self,
        user_id: &str,
        action: PetAction,
        now: DateTime<Utc>,
    ) -> Result<Option<std::time::Duration>> {
        let state = self.load(user_id, now)?;
        Ok(self.cooldowns.remaining(action, &state, now))
    }

    /// Perform `action` at `now` and persist the result.
    ///
    /// A rejected action returns the gating error and leaves the stored
    /// record untouched.
    pub fn interact(
        &self,
        user_id: &str,
        action: PetAction,
        now: DateTime<Utc>,
    ) -> Result<InteractionOutcome> {
        let mut state = self.load(user_id, now)?;
        check_action(&state, action, &self.cooldowns, now)?;

        let xp_gained = apply_action(&mut state, action, now);
        state.record_harmony(now.date_naive());
        let evolution = check_evolution(&mut state, user_id, now);

        let mut achievement = None;
        if let Some(event) = &evolution {
            match self.store.append_evolution_event(event) {
                Ok(()) => {}
                // A stage is only ever recorded once.
                Err(e) if e.is_duplicate() => {
                    tracing::debug!(user_id, stage = event.stage, "Evolution already recorded")
                }
                Err(e) => return Err(e),
            }
            achievement = self.unlock_stage_achievement(user_id, event.stage, now)?;
        }

        self.store.save_pet_state(user_id, &state)?;
        tracing::debug!(
            user_id,
            action = %action,
            xp_gained,
            emotion = %state.current_emotion,
            "Pet interaction"
        );

        Ok(InteractionOutcome {
            state,
            xp_gained,
            evolution,
            achievement,
        })
    }

    fn unlock_stage_achievement(
        &self,
        user_id: &str,
        stage: u8,
        now: DateTime<Utc>,
    ) -> Result<Option<Achievement>> {
        let Some((title, description)) = stage_achievement(stage) else {
            return Ok(None);
        };
        if self.store.has_achievement(user_id, title)? {
            return Ok(None);
        }
        let achievement = Achievement {
            user_id: user_id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            unlocked_at: now,
        };
        match self.store.insert_achievement(&achievement) {
            Ok(()) => {
                tracing::info!(user_id, title, "Achievement unlocked");
                Ok(Some(achievement))
            }
            Err(e) if e.is_duplicate() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn rename(&self, user_id: &str, name: &str, now: DateTime<Utc>) -> Result<PetState> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("pet name cannot be empty".to_string()));
        }
        let mut stored = self.stored(user_id, now)?;
        stored.name = name.to_string();
        self.store.save_pet_state(user_id, &stored)?;
        Ok(apply_decay(&stored, now))
    }

    /// Evolution events, oldest first.
    pub fn history(&self, user_id: &str) -> Result<Vec<EvolutionEvent>> {
        self.store.list_evolution_events(user_id)
    }

    pub fn achievements(&self, user_id: &str) -> Result<Vec<Achievement>> {
        self.store.list_achievements(user_id)
    }

    /// Add a cosmetic to the collection. Returns false if already owned.
    pub fn grant_item(
        &self,
        user_id: &str,
        item_id: &str,
        holder_eligible: bool,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        self.update_stored(user_id, now, |state| {
            items::grant_item(state, item_id, holder_eligible)
        })
    }

    pub fn equip_item(&self, user_id: &str, item_id: &str, now: DateTime<Utc>) -> Result<()> {
        self.update_stored(user_id, now, |state| items::equip_item(state, item_id))
    }

    /// Clear the equipped slot, returning what was worn.
    pub fn unequip_item(&self, user_id: &str, now: DateTime<Utc>) -> Result<Option<String>> {
        self.update_stored(user_id, now, |state| Ok(items::unequip_item(state)))
    }

    /// Apply a non-interaction edit to the stored record (no decay, no XP).
    fn update_stored<T>(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        edit: impl FnOnce(&mut PetState) -> Result<T>,
    ) -> Result<T> {
        let mut stored = self.stored(user_id, now)?;
        let out = edit(&mut stored)?;
        self.store.save_pet_state(user_id, &stored)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DemoStore;
    use crate::pet::state::Emotion;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_load_hatches_once() {
        let store = DemoStore::in_memory();
        let config = PetConfig::default();
        let keeper = PetKeeper::new(&store, &config);

        let pet = keeper.load("u1", t0()).unwrap();
        assert_eq!(pet.name, "Vibe");
        assert_eq!(pet.current_emotion, Emotion::Happy);

        // Second load sees the stored record, not a new hatch
        let later = t0() + Duration::hours(5);
        let decayed = keeper.load("u1", later).unwrap();
        assert_eq!(decayed.energy, 70);
        assert_eq!(
            store.get_pet_state("u1").unwrap().unwrap().last_interaction,
            t0()
        );
    }

    #[test]
    fn test_decay_is_not_written_back() {
        let store = DemoStore::in_memory();
        let config = PetConfig::default();
        let keeper = PetKeeper::new(&store, &config);
        keeper.load("u1", t0()).unwrap();

        let later = t0() + Duration::hours(5);
        let first = keeper.load("u1", later).unwrap();
        let second = keeper.load("u1", later).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_blocked_action_leaves_store_untouched() {
        let store = DemoStore::in_memory();
        let config = PetConfig::default();
        let keeper = PetKeeper::new(&store, &config);

        keeper.interact("u1", PetAction::Sleep, t0()).unwrap();
        let before = store.get_pet_state("u1").unwrap().unwrap();

        let err = keeper
            .interact("u1", PetAction::Feed, t0() + Duration::minutes(1))
            .unwrap_err();
        assert!(matches!(err, Error::ActionBlocked { .. }));
        assert_eq!(store.get_pet_state("u1").unwrap().unwrap(), before);
    }

    #[test]
    fn test_cooldown_enforced() {
        let store = DemoStore::in_memory();
        let config = PetConfig::default();
        let keeper = PetKeeper::new(&store, &config);

        keeper.interact("u1", PetAction::Feed, t0()).unwrap();
        let err = keeper
            .interact("u1", PetAction::Feed, t0() + Duration::minutes(10))
            .unwrap_err();
        assert!(matches!(err, Error::Cooldown { .. }));

        keeper
            .interact("u1", PetAction::Feed, t0() + Duration::minutes(61))
            .unwrap();
    }

    #[test]
    fn test_evolution_persists_event_and_achievement() {
        let store = DemoStore::in_memory();
        let config = PetConfig::default();
        let keeper = PetKeeper::new(&store, &config).with_cooldowns(Cooldowns::none());

        let mut pet = PetState::hatch("Vibe", t0());
        pet.growth_xp = 99;
        store.save_pet_state("u1", &pet).unwrap();

        let outcome = keeper.interact("u1", PetAction::Tap, t0()).unwrap();
        let event = outcome.evolution.expect("should evolve");
        assert_eq!(event.stage, 1);
        assert_eq!(event.stage_name, "Ember");
        assert_eq!(
            outcome.achievement.map(|a| a.title),
            Some("Ember Awakened".to_string())
        );

        // No event with unchanged stage
        let outcome = keeper.interact("u1", PetAction::Tap, t0()).unwrap();
        assert!(outcome.evolution.is_none());
        assert!(outcome.achievement.is_none());

        assert_eq!(keeper.history("u1").unwrap().len(), 1);
        assert_eq!(keeper.achievements("u1").unwrap().len(), 1);
        assert_eq!(
            store.get_pet_state("u1").unwrap().unwrap().evolution_stage,
            1
        );
    }

    #[test]
    fn test_rename_and_items() {
        let store = DemoStore::in_memory();
        let config = PetConfig::default();
        let keeper = PetKeeper::new(&store, &config);

        assert!(keeper.rename("u1", "   ", t0()).is_err());
        assert_eq!(keeper.rename("u1", " Nova ", t0()).unwrap().name, "Nova");

        assert!(keeper.grant_item("u1", "halo", false, t0()).is_err());
        assert!(keeper.grant_item("u1", "cosmic_crown", true, t0()).unwrap());
        keeper.equip_item("u1", "cosmic_crown", t0()).unwrap();
        assert_eq!(
            keeper.load("u1", t0()).unwrap().equipped_item.as_deref(),
            Some("cosmic_crown")
        );
        assert_eq!(
            keeper.unequip_item("u1", t0()).unwrap().as_deref(),
            Some("cosmic_crown")
        );
    }
}
