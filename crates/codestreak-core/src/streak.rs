//! Streak tracker: owns [`StreakState`] and applies day-level transitions.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::Result;
use crate::model::solve::require_id;
use crate::model::{StreakState, Touch};
use crate::store::{self, KvStore, Table, WriteOp};

#[derive(Debug, Clone, PartialEq)]
pub struct StreakPlan {
    pub state: StreakState,
    pub touch: Touch,
    /// `None` for a same-day touch.
    pub write: Option<WriteOp>,
}

pub struct StreakTracker<'s> {
    store: &'s dyn KvStore,
    clock: &'s dyn Clock,
}

impl<'s> StreakTracker<'s> {
    #[must_use]
    pub const fn new(store: &'s dyn KvStore, clock: &'s dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Stored state, or a zeroed one for users without activity. Reading never
    /// writes.
    ///
    /// # Errors
    ///
    /// Propagates storage and decode failures.
    pub fn get(&self, user_id: &str) -> Result<StreakState> {
        Ok(
            store::load(self.store, Table::Streaks, &StreakState::key_for(user_id))?
                .unwrap_or_else(|| StreakState::new(user_id)),
        )
    }

    /// Compute the transition for activity on `date` without writing it.
    ///
    /// # Errors
    ///
    /// [`crate::TrackerError::OutOfOrderActivity`] for a date before the last
    /// activity, plus validation and storage failures.
    pub fn plan(&self, user_id: &str, date: NaiveDate) -> Result<StreakPlan> {
        require_id("user_id", user_id)?;
        let mut state = self.get(user_id)?;
        let touch = match state.touch(date) {
            Ok(touch) => touch,
            Err(err) => {
                warn!(user_id, %date, "out-of-order activity rejected");
                return Err(err);
            }
        };
        if !touch.changed() {
            return Ok(StreakPlan {
                state,
                touch,
                write: None,
            });
        }
        state.updated_at = Some(self.clock.now());
        let write = WriteOp::put(Table::Streaks, state.key(), &state)?;
        Ok(StreakPlan {
            state,
            touch,
            write: Some(write),
        })
    }

    /// Record activity on `date` and return the resulting state.
    ///
    /// # Errors
    ///
    /// See [`StreakTracker::plan`].
    pub fn touch(&self, user_id: &str, date: NaiveDate) -> Result<StreakState> {
        let plan = self.plan(user_id, date)?;
        if let Some(op) = &plan.write {
            self.store.transact(std::slice::from_ref(op))?;
        }
        log_touch(&plan);
        Ok(plan.state)
    }

    /// Record activity today.
    ///
    /// # Errors
    ///
    /// See [`StreakTracker::plan`].
    pub fn touch_today(&self, user_id: &str) -> Result<StreakState> {
        self.touch(user_id, self.clock.today())
    }
}

pub(crate) fn log_touch(plan: &StreakPlan) {
    let state = &plan.state;
    match plan.touch {
        Touch::SameDay => debug!(user_id = %state.user_id, "already active today"),
        touch => info!(
            user_id = %state.user_id,
            ?touch,
            current = state.current_streak,
            best = state.best_streak,
            "streak updated"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::ErrorCode;
    use crate::store::MemoryStore;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, n).expect("valid date")
    }

    #[test]
    fn get_is_lazy_and_zeroed() {
        let store = MemoryStore::new();
        let clock = FixedClock::on(day(1));
        let tracker = StreakTracker::new(&store, &clock);

        let state = tracker.get("alice").expect("get");
        assert_eq!(state, StreakState::new("alice"));
        assert_eq!(store.len(Table::Streaks).expect("len"), 0);
    }

    #[test]
    fn skip_day_scenario() {
        let store = MemoryStore::new();
        let clock = FixedClock::on(day(1));
        let tracker = StreakTracker::new(&store, &clock);

        let s = tracker.touch("alice", day(1)).expect("day 1");
        assert_eq!((s.current_streak, s.best_streak), (1, 1));
        let s = tracker.touch("alice", day(2)).expect("day 2");
        assert_eq!((s.current_streak, s.best_streak), (2, 2));
        let s = tracker.touch("alice", day(4)).expect("day 4");
        assert_eq!((s.current_streak, s.best_streak), (1, 2));
        let s = tracker.touch("alice", day(4)).expect("day 4 again");
        assert_eq!((s.current_streak, s.best_streak), (1, 2));
        assert_eq!(s.total_solved, 3);

        assert_eq!(tracker.get("alice").expect("get"), s);
    }

    #[test]
    fn out_of_order_touch_leaves_state_alone() {
        let store = MemoryStore::new();
        let clock = FixedClock::on(day(5));
        let tracker = StreakTracker::new(&store, &clock);
        let before = tracker.touch_today("alice").expect("today");

        let err = tracker.touch("alice", day(2)).expect_err("earlier date");
        assert_eq!(err.code(), ErrorCode::OutOfOrderActivity);
        assert_eq!(tracker.get("alice").expect("get"), before);
    }

    #[test]
    fn same_day_plan_carries_no_write() {
        let store = MemoryStore::new();
        let clock = FixedClock::on(day(2));
        let tracker = StreakTracker::new(&store, &clock);
        let first = tracker.plan("alice", day(2)).expect("plan");
        assert_eq!(first, tracker.plan("alice", day(2)).expect("plan again"));
        assert!(first.write.is_some());

        tracker.touch("alice", day(2)).expect("touch");
        let repeat = tracker.plan("alice", day(2)).expect("same day");
        assert_eq!(repeat.touch, Touch::SameDay);
        assert_eq!(repeat.write, None);
    }

    #[test]
    fn touch_stamps_updated_at_from_clock() {
        let store = MemoryStore::new();
        let clock = FixedClock::on(day(3));
        let tracker = StreakTracker::new(&store, &clock);
        let state = tracker.touch_today("alice").expect("touch");
        assert_eq!(state.updated_at, Some(clock.now()));
    }
}
