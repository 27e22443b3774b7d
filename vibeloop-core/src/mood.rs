//! Mood check-ins ("activity pulses") and summaries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::db::Store;
use crate::error::{Error, Result};
use crate::types::{ActivityPulse, Mood};

/// Aggregate over a window of check-ins and completed practices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodSummary {
    pub since: DateTime<Utc>,
    pub pulses: usize,
    /// Check-ins per mood; moods never reported are absent
    pub counts: BTreeMap<Mood, usize>,
    /// Most frequent mood; ties go to the more positive one
    pub dominant: Option<Mood>,
    pub average_valence: Option<f64>,
    pub average_energy: Option<f64>,
    /// Mean before-to-after valence change across completed practices
    pub average_shift: Option<f64>,
    pub practices: usize,
}

/// Record a check-in at `now`.
pub fn record_pulse(
    store: &dyn Store,
    user_id: &str,
    mood: Mood,
    energy: u8,
    note: Option<&str>,
    now: DateTime<Utc>,
) -> Result<ActivityPulse> {
    if !(1..=5).contains(&energy) {
        return Err(Error::InvalidInput(format!(
            "energy must be between 1 and 5, got {}",
            energy
        )));
    }
    let note = note.map(str::trim).filter(|n| !n.is_empty());
    let pulse = ActivityPulse {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        mood,
        energy,
        note: note.map(str::to_string),
        recorded_at: now,
    };
    store.insert_pulse(&pulse)?;
    tracing::info!(user_id, mood = %mood, energy, "Recorded mood pulse");
    Ok(pulse)
}

/// Check-ins at or after `since`, oldest first.
pub fn recent(
    store: &dyn Store,
    user_id: &str,
    since: DateTime<Utc>,
) -> Result<Vec<ActivityPulse>> {
    store.list_pulses(user_id, since)
}

/// Summarize check-ins and completed practices since `since`.
pub fn summary(store: &dyn Store, user_id: &str, since: DateTime<Utc>) -> Result<MoodSummary> {
    let pulses = store.list_pulses(user_id, since)?;

    let mut counts = BTreeMap::new();
    for pulse in &pulses {
        *counts.entry(pulse.mood).or_insert(0usize) += 1;
    }
    // Mood::ALL runs from most to least positive, so the first max wins ties.
    let dominant = Mood::ALL
        .into_iter()
        .filter_map(|m| counts.get(&m).map(|&c| (m, c)))
        .fold(None, |best: Option<(Mood, usize)>, (m, c)| match best {
            Some((_, best_count)) if best_count >= c => best,
            _ => Some((m, c)),
        })
        .map(|(m, _)| m);

    let average_valence = mean(pulses.iter().map(|p| f64::from(p.mood.valence())));
    let average_energy = mean(pulses.iter().map(|p| f64::from(p.energy)));

    let since_date = since.date_naive();
    let shifts: Vec<f64> = store
        .list_practices(user_id, Some(since_date), usize::MAX)?
        .iter()
        .filter(|p| p.completed)
        .filter_map(|p| p.mood_shift())
        .map(f64::from)
        .collect();

    Ok(MoodSummary {
        since,
        pulses: pulses.len(),
        counts,
        dominant,
        average_valence,
        average_energy,
        average_shift: mean(shifts.iter().copied()),
        practices: shifts.len(),
    })
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
