//! Read-only overview of one user's day.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::db::Store;
use crate::error::Result;
use crate::format::format_relative_time;
use crate::mood::{self, MoodSummary};
use crate::pet::{apply_decay, evolution, PetState};
use crate::practice::{live_streak, CardDeck};
use crate::types::{GameKind, GameScore, PracticeCard};

/// Days covered by the dashboard's mood summary.
pub const MOOD_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize)]
pub struct StreakSummary {
    /// Zero once a day has been skipped
    pub current: u32,
    pub longest: u32,
    pub total_practices: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TodaySummary {
    pub card: Option<PracticeCard>,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PetSummary {
    pub name: String,
    pub stage: u8,
    pub stage_name: &'static str,
    pub emotion: String,
    pub harmony: u8,
    pub harmony_streak: u32,
    pub growth_xp: u32,
    pub xp_to_next: Option<u32>,
    pub is_sick: bool,
    pub is_sleeping: bool,
    pub last_interaction: String,
}

impl PetSummary {
    fn from_state(state: &PetState, now: DateTime<Utc>) -> Self {
        Self {
            name: state.name.clone(),
            stage: state.evolution_stage,
            stage_name: evolution::stage_name(state.evolution_stage),
            emotion: state.current_emotion.to_string(),
            harmony: state.harmony(),
            harmony_streak: state.harmony_streak,
            growth_xp: state.growth_xp,
            xp_to_next: evolution::xp_to_next(state.growth_xp),
            is_sick: state.is_sick,
            is_sleeping: state.is_sleeping,
            last_interaction: format_relative_time(state.last_interaction, now),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub user_id: String,
    pub display_name: Option<String>,
    pub streak: StreakSummary,
    pub today: TodaySummary,
    /// `None` until the pet has hatched
    pub pet: Option<PetSummary>,
    pub best_scores: Vec<(GameKind, Option<GameScore>)>,
    pub mood: MoodSummary,
    pub wallet: Option<String>,
}

impl Dashboard {
    /// Gather everything for `user_id` as of `now`. Nothing is written.
    pub fn build(store: &dyn Store, user_id: &str, now: DateTime<Utc>) -> Result<Self> {
        let deck = CardDeck::standard();
        let today = now.date_naive();
        let profile = store.get_profile(user_id)?;

        let streak = match &profile {
            Some(p) => StreakSummary {
                current: live_streak(p, today),
                longest: p.longest_streak,
                total_practices: p.total_practices,
            },
            None => StreakSummary {
                current: 0,
                longest: 0,
                total_practices: 0,
            },
        };

        let card = store
            .get_daily_card(user_id, today)?
            .and_then(|c| deck.find(&c.card_id));
        let completed = store
            .get_daily_practice(user_id, today)?
            .is_some_and(|p| p.completed);

        let pet = store
            .get_pet_state(user_id)?
            .map(|stored| PetSummary::from_state(&apply_decay(&stored, now), now));

        let best_scores = GameKind::ALL
            .into_iter()
            .map(|game| Ok((game, store.best_score(user_id, game)?)))
            .collect::<Result<Vec<_>>>()?;

        let mood = mood::summary(store, user_id, now - Duration::days(MOOD_WINDOW_DAYS))?;

        Ok(Self {
            user_id: user_id.to_string(),
            display_name: profile.as_ref().and_then(|p| p.display_name.clone()),
            streak,
            today: TodaySummary { card, completed },
            pet,
            best_scores,
            mood,
            wallet: profile
                .as_ref()
                .and_then(|p| p.wallet_address.as_deref())
                .map(crate::wallet::format_address),
        })
    }
}
