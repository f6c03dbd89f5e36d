use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Difficulty;
use crate::error::{Result, TrackerError};
use crate::store::ItemKey;

/// Platform recorded when the caller does not name one.
pub const DEFAULT_PLATFORM: &str = "question-bank";

/// One user completing one problem. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveEvent {
    pub user_id: String,
    pub problem_id: String,
    pub problem_title: String,
    pub difficulty: Difficulty,
    pub solved_at: DateTime<Utc>,
    pub xp_earned: u64,
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_url: Option<String>,
}

impl SolveEvent {
    /// Ledger key: partition by user, sort by problem.
    #[must_use]
    pub fn key(&self) -> ItemKey {
        ItemKey::new(&self.user_id, &self.problem_id)
    }

    /// Calendar day (UTC) the solve counts towards.
    #[must_use]
    pub fn solved_on(&self) -> NaiveDate {
        self.solved_at.date_naive()
    }

    /// Reject events missing an identifier or carrying no XP.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Validation`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        require_id("user_id", &self.user_id)?;
        require_id("problem_id", &self.problem_id)?;
        if self.xp_earned == 0 {
            return Err(TrackerError::validation("xp_earned", "must be positive"));
        }
        Ok(())
    }
}

/// Identifiers must be non-blank and free of surrounding whitespace.
pub(crate) fn require_id(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TrackerError::validation(field, "must not be empty"));
    }
    if value.trim() != value {
        return Err(TrackerError::validation(
            field,
            "must not have leading or trailing whitespace",
        ));
    }
    Ok(())
}
