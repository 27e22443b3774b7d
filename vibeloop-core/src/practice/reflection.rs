//! Reflection drafts and their submission requirements.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Mood;

/// What the user has filled in so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReflectionDraft {
    pub text: String,
    pub rating: Option<u8>,
    pub mood_before: Option<Mood>,
    pub mood_after: Option<Mood>,
}

impl ReflectionDraft {
    /// Every requirement not yet met, in form order.
    pub fn missing(&self, min_chars: usize) -> Vec<String> {
        let mut missing = Vec::new();
        let len = self.text.trim().chars().count();
        if len < min_chars {
            missing.push(format!(
                "reflection needs at least {} characters ({} so far)",
                min_chars, len
            ));
        }
        match self.rating {
            None => missing.push("rating".to_string()),
            Some(r) if !(1..=5).contains(&r) => {
                missing.push(format!("rating between 1 and 5 (got {})", r))
            }
            Some(_) => {}
        }
        if self.mood_before.is_none() {
            missing.push("mood before".to_string());
        }
        if self.mood_after.is_none() {
            missing.push("mood after".to_string());
        }
        missing
    }

    pub fn can_submit(&self, min_chars: usize) -> bool {
        self.missing(min_chars).is_empty()
    }

    pub fn validate(&self, min_chars: usize) -> Result<()> {
        let missing = self.missing(min_chars);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Reflection(missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> ReflectionDraft {
        ReflectionDraft {
            text: "I noticed how much calmer I felt after the walk.".to_string(),
            rating: Some(4),
            mood_before: Some(Mood::Anxious),
            mood_after: Some(Mood::Calm),
        }
    }

    #[test]
    fn test_complete_draft_submits() {
        assert!(complete().can_submit(20));
        assert!(complete().validate(20).is_ok());
    }

    #[test]
    fn test_short_text_counts_trimmed_chars() {
        let mut draft = complete();
        draft.text = format!("   {}   ", "a".repeat(19));
        assert!(!draft.can_submit(20));

        draft.text = "a".repeat(20);
        assert!(draft.can_submit(20));
    }

    #[test]
    fn test_validate_reports_everything_missing() {
        let err = ReflectionDraft::default().validate(20).unwrap_err();
        match err {
            Error::Reflection(missing) => assert_eq!(missing.len(), 4),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rating_out_of_range() {
        let mut draft = complete();
        draft.rating = Some(6);
        assert_eq!(draft.missing(20), vec!["rating between 1 and 5 (got 6)"]);
    }
}
