//! Daily pull streaks.

use chrono::NaiveDate;

use crate::types::UserProfile;

/// Record a pull on `today`. Returns false if today was already counted.
///
/// Consecutive days extend the streak, any gap restarts it at 1, and the
/// longest streak only ever grows.
pub fn advance_streak(profile: &mut UserProfile, today: NaiveDate) -> bool {
    if profile.last_pull_date == Some(today) {
        return false;
    }
    let continues = profile.last_pull_date.is_some() && profile.last_pull_date == today.pred_opt();
    profile.current_streak = if continues {
        profile.current_streak.saturating_add(1)
    } else {
        1
    };
    profile.longest_streak = profile.longest_streak.max(profile.current_streak);
    profile.last_pull_date = Some(today);
    true
}

/// Streak as seen on `today`: still alive if the last pull was today or yesterday.
pub fn live_streak(profile: &UserProfile, today: NaiveDate) -> u32 {
    match profile.last_pull_date {
        Some(last) if last == today || Some(last) == today.pred_opt() => profile.current_streak,
        _ => 0,
    }
}
