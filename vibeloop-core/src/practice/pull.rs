//! The daily card pull and everything that hangs off it.

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::cache::{practice_card_key, LocalCache};
use super::cards::CardDeck;
use super::reflection::ReflectionDraft;
use super::streak::advance_streak;
use crate::config::PracticeConfig;
use crate::db::{profile_or_new, Store};
use crate::error::{Error, Result};
use crate::types::{DailyCard, DailyPractice, FavoriteCard, PracticeCard};

/// What the cache remembers about a pull.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CachedPull {
    user_id: String,
    card: PracticeCard,
}

/// Result of [`PracticeService::pull`].
#[derive(Debug, Clone, PartialEq)]
pub struct PullOutcome {
    pub card: PracticeCard,
    /// True if this was not the first pull of the day
    pub already_pulled: bool,
    /// False when the backend could not record the pull
    pub synced: bool,
}

/// Daily practice operations for one deck and store.
pub struct PracticeService<'a> {
    store: &'a dyn Store,
    deck: &'a CardDeck,
    config: &'a PracticeConfig,
}

impl<'a> PracticeService<'a> {
    pub fn new(store: &'a dyn Store, deck: &'a CardDeck, config: &'a PracticeConfig) -> Self {
        Self {
            store,
            deck,
            config,
        }
    }

    /// Pull today's card.
    ///
    /// Only the first pull of a day draws a card and touches the streak. Later
    /// pulls return the same card from the local cache or the backend.
    pub fn pull<R: Rng + ?Sized>(
        &self,
        cache: &mut LocalCache,
        rng: &mut R,
        user_id: &str,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<PullOutcome> {
        let key = practice_card_key(user_id, today);

        if let Some(cached) = cache.get::<CachedPull>(&key) {
            if cached.user_id == user_id {
                if self.backend_has_pull(user_id, today) {
                    return Ok(PullOutcome {
                        card: cached.card,
                        already_pulled: true,
                        synced: true,
                    });
                }
                // Pulled earlier but never recorded: try again with the same card.
                let mut outcome = self.sync(cache, &key, user_id, cached.card, today, now);
                outcome.already_pulled = true;
                return Ok(outcome);
            }
        }

        match self.store.get_daily_card(user_id, today) {
            Ok(Some(stored)) => {
                let card = self.resolve(&stored.card_id)?;
                remember(cache, &key, user_id, &card);
                return Ok(PullOutcome {
                    card,
                    already_pulled: true,
                    synced: true,
                });
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Could not check backend for today's card")
            }
        }

        let card = self.deck.draw(rng, today);
        remember(cache, &key, user_id, &card);
        Ok(self.sync(cache, &key, user_id, card, today, now))
    }

    /// Record `card` as today's pull on the backend.
    ///
    /// A failed write leaves the pull in the local cache only; the next pull
    /// of the day retries it.
    fn sync(
        &self,
        cache: &mut LocalCache,
        key: &str,
        user_id: &str,
        card: PracticeCard,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> PullOutcome {
        let daily = DailyCard {
            user_id: user_id.to_string(),
            date: today,
            card_id: card.id.clone(),
            pulled_at: now,
        };
        match self.record_pull(&daily, today, now) {
            Ok(()) => {
                tracing::info!(user_id, card = %card.id, %today, "Pulled daily card");
                PullOutcome {
                    card,
                    already_pulled: false,
                    synced: true,
                }
            }
            Err(e) if e.is_duplicate() => {
                // Another session got there first; its card wins.
                tracing::info!(user_id, %today, "Card already pulled today");
                let card = match self.store.get_daily_card(user_id, today) {
                    Ok(Some(stored)) => self.resolve(&stored.card_id).unwrap_or(card),
                    _ => card,
                };
                remember(cache, key, user_id, &card);
                PullOutcome {
                    card,
                    already_pulled: true,
                    synced: true,
                }
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to sync daily card, kept locally");
                PullOutcome {
                    card,
                    already_pulled: false,
                    synced: false,
                }
            }
        }
    }

    /// Streak first, then the card. Every step is safe to repeat, so a retry
    /// after a partial failure finishes the job without double counting.
    fn record_pull(&self, daily: &DailyCard, today: NaiveDate, now: DateTime<Utc>) -> Result<()> {
        let mut profile = profile_or_new(self.store, &daily.user_id, now)?;
        if advance_streak(&mut profile, today) {
            profile.updated_at = now;
            self.store.upsert_profile(&profile)?;
            tracing::debug!(
                user_id = %daily.user_id,
                streak = profile.current_streak,
                "Streak updated"
            );
        }

        self.store.insert_daily_card(daily)?;
        if self
            .store
            .get_daily_practice(&daily.user_id, daily.date)?
            .is_none()
        {
            self.store.upsert_daily_practice(&DailyPractice::open(daily))?;
        }
        Ok(())
    }

    fn backend_has_pull(&self, user_id: &str, today: NaiveDate) -> bool {
        match self.store.get_daily_card(user_id, today) {
            Ok(found) => found.is_some(),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Could not check backend for today's card");
                false
            }
        }
    }

    fn resolve(&self, card_id: &str) -> Result<PracticeCard> {
        self.deck.find(card_id).ok_or_else(|| Error::NotFound {
            entity: "card",
            key: card_id.to_string(),
        })
    }

    /// Submit the reflection for the card pulled on `date`.
    pub fn complete(
        &self,
        user_id: &str,
        date: NaiveDate,
        draft: &ReflectionDraft,
        now: DateTime<Utc>,
    ) -> Result<DailyPractice> {
        draft.validate(self.config.min_reflection_chars)?;

        let mut practice = match self.store.get_daily_practice(user_id, date)? {
            Some(practice) => practice,
            None => match self.store.get_daily_card(user_id, date)? {
                Some(card) => DailyPractice::open(&card),
                None => {
                    return Err(Error::NotFound {
                        entity: "daily card",
                        key: format!("{}/{}", user_id, date),
                    })
                }
            },
        };
        if practice.completed {
            return Err(Error::InvalidInput(format!(
                "practice for {} is already completed",
                date
            )));
        }

        practice.reflection = Some(draft.text.trim().to_string());
        practice.rating = draft.rating;
        practice.mood_before = draft.mood_before;
        practice.mood_after = draft.mood_after;
        practice.completed = true;
        practice.completed_at = Some(now);
        self.store.upsert_daily_practice(&practice)?;

        let mut profile = profile_or_new(self.store, user_id, now)?;
        profile.total_practices = profile.total_practices.saturating_add(1);
        profile.updated_at = now;
        self.store.upsert_profile(&profile)?;

        tracing::info!(
            user_id,
            %date,
            total = profile.total_practices,
            shift = ?practice.mood_shift(),
            "Practice completed"
        );
        Ok(practice)
    }

    /// Most recent practices, newest first.
    pub fn history(&self, user_id: &str, limit: usize) -> Result<Vec<DailyPractice>> {
        self.store.list_practices(user_id, None, limit)
    }

    /// Save a card. Returns false if it was already a favorite.
    pub fn add_favorite(&self, user_id: &str, card_id: &str, now: DateTime<Utc>) -> Result<bool> {
        let card = self.resolve(card_id)?;
        let favorite = FavoriteCard {
            user_id: user_id.to_string(),
            card_id: card.id,
            saved_at: now,
        };
        match self.store.insert_favorite(&favorite) {
            Ok(()) => Ok(true),
            Err(e) if e.is_duplicate() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn remove_favorite(&self, user_id: &str, card_id: &str) -> Result<bool> {
        self.store.delete_favorite(user_id, card_id)
    }

    /// Favorite cards, newest first. Cards no longer in the deck are skipped.
    pub fn favorites(&self, user_id: &str) -> Result<Vec<(FavoriteCard, PracticeCard)>> {
        Ok(self
            .store
            .list_favorites(user_id)?
            .into_iter()
            .filter_map(|fav| {
                let card = self.deck.find(&fav.card_id)?;
                Some((fav, card))
            })
            .collect())
    }
}

fn remember(cache: &mut LocalCache, key: &str, user_id: &str, card: &PracticeCard) {
    let entry = CachedPull {
        user_id: user_id.to_string(),
        card: card.clone(),
    };
    if let Err(e) = cache.set(key, &entry) {
        tracing::warn!(error = %e, "Failed to write local card cache");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DemoStore;
    use crate::pet::{EvolutionEvent, PetState};
    use crate::types::{Achievement, ActivityPulse, GameKind, GameScore, Mood, UserProfile};
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Delegates to a [`DemoStore`] but fails the next profile or card write on request.
    struct FlakyStore {
        inner: DemoStore,
        fail_profile: AtomicBool,
        fail_card: AtomicBool,
    }

    impl FlakyStore {
        fn new() -> Self {
            Self {
                inner: DemoStore::in_memory(),
                fail_profile: AtomicBool::new(false),
                fail_card: AtomicBool::new(false),
            }
        }
    }

    fn offline(flag: &AtomicBool) -> Result<()> {
        if flag.swap(false, Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "backend unreachable",
            )));
        }
        Ok(())
    }

    impl Store for FlakyStore {
        fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
            self.inner.get_profile(user_id)
        }
        fn upsert_profile(&self, profile: &UserProfile) -> Result<()> {
            offline(&self.fail_profile)?;
            self.inner.upsert_profile(profile)
        }
        fn insert_daily_card(&self, card: &DailyCard) -> Result<()> {
            offline(&self.fail_card)?;
            self.inner.insert_daily_card(card)
        }
        fn get_daily_card(&self, user_id: &str, date: NaiveDate) -> Result<Option<DailyCard>> {
            self.inner.get_daily_card(user_id, date)
        }
        fn upsert_daily_practice(&self, practice: &DailyPractice) -> Result<()> {
            self.inner.upsert_daily_practice(practice)
        }
        fn get_daily_practice(
            &self,
            user_id: &str,
            date: NaiveDate,
        ) -> Result<Option<DailyPractice>> {
            self.inner.get_daily_practice(user_id, date)
        }
        fn list_practices(
            &self,
            user_id: &str,
            since: Option<NaiveDate>,
            limit: usize,
        ) -> Result<Vec<DailyPractice>> {
            self.inner.list_practices(user_id, since, limit)
        }
        fn insert_favorite(&self, favorite: &FavoriteCard) -> Result<()> {
            self.inner.insert_favorite(favorite)
        }
        fn delete_favorite(&self, user_id: &str, card_id: &str) -> Result<bool> {
            self.inner.delete_favorite(user_id, card_id)
        }
        fn list_favorites(&self, user_id: &str) -> Result<Vec<FavoriteCard>> {
            self.inner.list_favorites(user_id)
        }
        fn insert_game_score(&self, score: &GameScore) -> Result<()> {
            self.inner.insert_game_score(score)
        }
        fn top_scores(&self, game: GameKind, limit: usize) -> Result<Vec<GameScore>> {
            self.inner.top_scores(game, limit)
        }
        fn best_score(&self, user_id: &str, game: GameKind) -> Result<Option<GameScore>> {
            self.inner.best_score(user_id, game)
        }
        fn get_pet_state(&self, user_id: &str) -> Result<Option<PetState>> {
            self.inner.get_pet_state(user_id)
        }
        fn save_pet_state(&self, user_id: &str, state: &PetState) -> Result<()> {
            self.inner.save_pet_state(user_id, state)
        }
        fn append_evolution_event(&self, event: &EvolutionEvent) -> Result<()> {
            self.inner.append_evolution_event(event)
        }
        fn list_evolution_events(&self, user_id: &str) -> Result<Vec<EvolutionEvent>> {
            self.inner.list_evolution_events(user_id)
        }
        fn insert_achievement(&self, achievement: &Achievement) -> Result<()> {
            self.inner.insert_achievement(achievement)
        }
        fn list_achievements(&self, user_id: &str) -> Result<Vec<Achievement>> {
            self.inner.list_achievements(user_id)
        }
        fn insert_pulse(&self, pulse: &ActivityPulse) -> Result<()> {
            self.inner.insert_pulse(pulse)
        }
        fn list_pulses(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<ActivityPulse>> {
            self.inner.list_pulses(user_id, since)
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn at(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, 8, 0, 0).unwrap()
    }

    fn draft() -> ReflectionDraft {
        ReflectionDraft {
            text: "Breathing slowly really helped me settle.".to_string(),
            rating: Some(5),
            mood_before: Some(Mood::Tired),
            mood_after: Some(Mood::Calm),
        }
    }

    #[test]
    fn test_repeat_pull_same_day() {
        let store = DemoStore::in_memory();
        let deck = CardDeck::standard();
        let config = PracticeConfig::default();
        let service = PracticeService::new(&store, &deck, &config);
        let mut cache = LocalCache::in_memory();
        let mut rng = StdRng::seed_from_u64(3);

        let first = service.pull(&mut cache, &mut rng, "u1", day(1), at(1)).unwrap();
        assert!(!first.already_pulled);
        assert!(first.synced);

        let second = service.pull(&mut cache, &mut rng, "u1", day(1), at(1)).unwrap();
        assert!(second.already_pulled);
        assert_eq!(second.card, first.card);

        // Fresh device, same day: backend remembers
        let mut other_cache = LocalCache::in_memory();
        let third = service
            .pull(&mut other_cache, &mut rng, "u1", day(1), at(1))
            .unwrap();
        assert!(third.already_pulled);
        assert_eq!(third.card, first.card);

        let profile = store.get_profile("u1").unwrap().unwrap();
        assert_eq!(profile.current_streak, 1);
    }

    #[test]
    fn test_failed_pull_is_retried_from_cache() {
        let store = FlakyStore::new();
        store.fail_card.store(true, Ordering::SeqCst);
        let deck = CardDeck::standard();
        let config = PracticeConfig::default();
        let service = PracticeService::new(&store, &deck, &config);
        let mut cache = LocalCache::in_memory();
        let mut rng = StdRng::seed_from_u64(3);

        let first = service.pull(&mut cache, &mut rng, "u1", day(1), at(1)).unwrap();
        assert!(!first.synced);
        assert!(store.get_daily_card("u1", day(1)).unwrap().is_none());

        let second = service.pull(&mut cache, &mut rng, "u1", day(1), at(1)).unwrap();
        assert!(second.synced);
        assert!(second.already_pulled);
        assert_eq!(second.card, first.card);

        let stored = store.get_daily_card("u1", day(1)).unwrap().unwrap();
        assert_eq!(stored.card_id, first.card.id);
        assert!(store.get_daily_practice("u1", day(1)).unwrap().is_some());
        let profile = store.get_profile("u1").unwrap().unwrap();
        assert_eq!(profile.current_streak, 1);
    }

    #[test]
    fn test_failed_streak_write_keeps_the_day_open() {
        let store = FlakyStore::new();
        store.fail_profile.store(true, Ordering::SeqCst);
        let deck = CardDeck::standard();
        let config = PracticeConfig::default();
        let service = PracticeService::new(&store, &deck, &config);
        let mut cache = LocalCache::in_memory();
        let mut rng = StdRng::seed_from_u64(3);

        let first = service.pull(&mut cache, &mut rng, "u1", day(1), at(1)).unwrap();
        assert!(!first.synced);
        // Nothing half-written: the card waits for the streak
        assert!(store.get_daily_card("u1", day(1)).unwrap().is_none());
        assert!(store.get_profile("u1").unwrap().is_none());

        let second = service.pull(&mut cache, &mut rng, "u1", day(1), at(1)).unwrap();
        assert!(second.synced);
        assert!(store.get_daily_card("u1", day(1)).unwrap().is_some());
        let profile = store.get_profile("u1").unwrap().unwrap();
        assert_eq!(profile.current_streak, 1);
        assert_eq!(profile.last_pull_date, Some(day(1)));
    }

    #[test]
    fn test_users_sharing_a_device_keep_their_own_pull() {
        let store = FlakyStore::new();
        let deck = CardDeck::standard();
        let config = PracticeConfig::default();
        let service = PracticeService::new(&store, &deck, &config);
        let mut cache = LocalCache::in_memory();
        let mut rng = StdRng::seed_from_u64(3);

        store.fail_card.store(true, Ordering::SeqCst);
        let first = service.pull(&mut cache, &mut rng, "u1", day(1), at(1)).unwrap();
        assert!(!first.synced);
        service.pull(&mut cache, &mut rng, "u2", day(1), at(1)).unwrap();

        let again = service.pull(&mut cache, &mut rng, "u1", day(1), at(1)).unwrap();
        assert!(again.synced);
        assert_eq!(again.card, first.card);
        assert_eq!(
            store.get_daily_card("u1", day(1)).unwrap().unwrap().card_id,
            first.card.id
        );
    }

    #[test]
    fn test_streak_over_days() {
        let store = DemoStore::in_memory();
        let deck = CardDeck::standard();
        let config = PracticeConfig::default();
        let service = PracticeService::new(&store, &deck, &config);
        let mut cache = LocalCache::in_memory();
        let mut rng = StdRng::seed_from_u64(3);

        for d in [1, 2, 3, 5] {
            service.pull(&mut cache, &mut rng, "u1", day(d), at(d)).unwrap();
        }
        let profile = store.get_profile("u1").unwrap().unwrap();
        assert_eq!(profile.current_streak, 1);
        assert_eq!(profile.longest_streak, 3);
        assert_eq!(profile.last_pull_date, Some(day(5)));
    }

    #[test]
    fn test_complete_once() {
        let store = DemoStore::in_memory();
        let deck = CardDeck::standard();
        let config = PracticeConfig::default();
        let service = PracticeService::new(&store, &deck, &config);
        let mut cache = LocalCache::in_memory();
        let mut rng = StdRng::seed_from_u64(3);

        assert!(matches!(
            service.complete("u1", day(1), &draft(), at(1)),
            Err(Error::NotFound { .. })
        ));

        service.pull(&mut cache, &mut rng, "u1", day(1), at(1)).unwrap();
        let mut short = draft();
        short.text = "too short".to_string();
        assert!(matches!(
            service.complete("u1", day(1), &short, at(1)),
            Err(Error::Reflection(_))
        ));

        let practice = service.complete("u1", day(1), &draft(), at(1)).unwrap();
        assert!(practice.completed);
        assert_eq!(practice.mood_shift(), Some(2));
        assert!(service.complete("u1", day(1), &draft(), at(1)).is_err());

        let profile = store.get_profile("u1").unwrap().unwrap();
        assert_eq!(profile.total_practices, 1);
        assert_eq!(service.history("u1", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_favorites() {
        let store = DemoStore::in_memory();
        let deck = CardDeck::standard();
        let config = PracticeConfig::default();
        let service = PracticeService::new(&store, &deck, &config);

        assert!(service.add_favorite("u1", "breath-2", at(1)).unwrap());
        assert!(!service.add_favorite("u1", "breath-2", at(2)).unwrap());
        assert!(service.add_favorite("u1", "missing-card", at(1)).is_err());

        let favorites = service.favorites("u1").unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].1.title, "Long Exhale");

        assert!(service.remove_favorite("u1", "breath-2").unwrap());
        assert!(service.favorites("u1").unwrap().is_empty());
    }
}
