use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};
use crate::store::ItemKey;

/// Consecutive-day counters for one user.
///
/// `best_streak >= current_streak` holds for every state produced by
/// [`StreakState::touch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub user_id: String,
    pub current_streak: u32,
    pub best_streak: u32,
    #[serde(default)]
    pub last_activity_date: Option<NaiveDate>,
    #[serde(default)]
    pub total_solved: u64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// What a `touch` did to the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Touch {
    /// No earlier activity; the streak starts at 1.
    FirstActivity,
    /// Activity on the day after the last one.
    Extended,
    /// A gap of more than one day; the streak restarts at 1.
    Reset,
    /// Already active today. Nothing changed.
    SameDay,
}

impl Touch {
    #[must_use]
    pub const fn changed(self) -> bool {
        !matches!(self, Self::SameDay)
    }
}

impl StreakState {
    /// Zeroed state for a user with no recorded activity.
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            current_streak: 0,
            best_streak: 0,
            last_activity_date: None,
            total_solved: 0,
            updated_at: None,
        }
    }

    #[must_use]
    pub fn key_for(user_id: &str) -> ItemKey {
        ItemKey::single(user_id)
    }

    #[must_use]
    pub fn key(&self) -> ItemKey {
        Self::key_for(&self.user_id)
    }

    /// Apply activity on `date`.
    ///
    /// The gap to the last activity decides the transition: 0 days is a no-op,
    /// 1 day extends the streak, more than 1 restarts it at 1. Every change
    /// also bumps `total_solved`. On error or [`Touch::SameDay`] the state is
    /// left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::OutOfOrderActivity`] when `date` is earlier than
    /// the last recorded activity.
    pub fn touch(&mut self, date: NaiveDate) -> Result<Touch> {
        let outcome = match self.last_activity_date {
            None => Touch::FirstActivity,
            Some(last) => match (date - last).num_days() {
                0 => return Ok(Touch::SameDay),
                1 => Touch::Extended,
                gap if gap > 1 => Touch::Reset,
                _ => {
                    return Err(TrackerError::OutOfOrderActivity {
                        user_id: self.user_id.clone(),
                        last,
                        attempted: date,
                    });
                }
            },
        };

        self.current_streak = match outcome {
            Touch::Extended => self.current_streak.saturating_add(1),
            _ => 1,
        };
        self.best_streak = self.best_streak.max(self.current_streak);
        self.last_activity_date = Some(date);
        self.total_solved = self.total_solved.saturating_add(1);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, n).expect("valid date")
    }

    #[test]
    fn first_touch_starts_streak() {
        let mut state = StreakState::new("alice");
        assert_eq!(state.touch(day(1)).expect("touch"), Touch::FirstActivity);
        assert_eq!((state.current_streak, state.best_streak), (1, 1));
        assert_eq!(state.last_activity_date, Some(day(1)));
        assert_eq!(state.total_solved, 1);
    }

    #[test]
    fn consecutive_gap_and_same_day_transitions() {
        let mut state = StreakState::new("alice");
        state.touch(day(1)).expect("day 1");
        assert_eq!(state.touch(day(2)).expect("day 2"), Touch::Extended);
        assert_eq!((state.current_streak, state.best_streak), (2, 2));

        assert_eq!(state.touch(day(4)).expect("day 4"), Touch::Reset);
        assert_eq!((state.current_streak, state.best_streak), (1, 2));

        let before = state.clone();
        assert_eq!(state.touch(day(4)).expect("day 4 again"), Touch::SameDay);
        assert_eq!(state, before);
        assert_eq!(state.total_solved, 3);
    }

    #[test]
    fn earlier_date_is_rejected_without_mutation() {
        let mut state = StreakState::new("alice");
        state.touch(day(5)).expect("day 5");
        let before = state.clone();

        let err = state.touch(day(3)).expect_err("out of order");
        assert_eq!(err.code(), ErrorCode::OutOfOrderActivity);
        assert_eq!(state, before);
    }

    #[test]
    fn restart_never_lowers_best() {
        let mut state = StreakState {
            current_streak: 4,
            best_streak: 4,
            last_activity_date: Some(day(10)),
            ..StreakState::new("alice")
        };
        state.touch(day(20)).expect("gap");
        assert_eq!((state.current_streak, state.best_streak), (1, 4));
    }

    #[test]
    fn streak_crosses_month_boundary() {
        let mut state = StreakState::new("alice");
        state
            .touch(NaiveDate::from_ymd_opt(2024, 2, 29).expect("leap day"))
            .expect("feb");
        assert_eq!(state.touch(day(1)).expect("mar"), Touch::Extended);
        assert_eq!(state.current_streak, 2);
    }
}
