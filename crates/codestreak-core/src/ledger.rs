//! Solve ledger: at most one [`SolveEvent`] per (user, problem).
//!
//! Uniqueness rides on the store's conditional insert, so two concurrent
//! recordings of the same pair cannot both succeed.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Result, TrackerError};
use crate::model::{Difficulty, DifficultyCounts, SolveEvent};
use crate::store::{self, ItemKey, KvStore, Query, Table, WriteOp};

/// Totals derived from a user's ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SolveStats {
    pub total: u64,
    pub counts: DifficultyCounts,
    pub total_xp: u64,
}

pub struct SolveLedger<'s> {
    store: &'s dyn KvStore,
}

impl<'s> SolveLedger<'s> {
    #[must_use]
    pub const fn new(store: &'s dyn KvStore) -> Self {
        Self { store }
    }

    /// Persist `event` unless the pair is already recorded.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::Validation`] for a malformed event (nothing written)
    /// - [`TrackerError::DuplicateSolve`] if the pair exists (nothing written)
    /// - [`TrackerError::Storage`] if the backend fails
    pub fn record_solve(&self, event: SolveEvent) -> Result<SolveEvent> {
        event.validate()?;
        let key = event.key();
        let body = store::encode(Table::Solves, &key, &event)?;

        if !self.store.insert_if_absent(Table::Solves, &key, &body)? {
            warn!(
                user_id = %event.user_id,
                problem_id = %event.problem_id,
                "duplicate solve rejected"
            );
            return Err(duplicate(&event));
        }

        info!(
            user_id = %event.user_id,
            problem_id = %event.problem_id,
            difficulty = %event.difficulty,
            xp = event.xp_earned,
            "solve recorded"
        );
        Ok(event)
    }

    /// Conditional insert of `event` for use inside a larger batch.
    ///
    /// # Errors
    ///
    /// Returns a validation or encode error; the collision check happens when
    /// the batch runs.
    pub fn insert_op(event: &SolveEvent) -> Result<WriteOp> {
        event.validate()?;
        Ok(WriteOp::insert(Table::Solves, event.key(), event)?)
    }

    /// # Errors
    ///
    /// Propagates storage and decode failures.
    pub fn get(&self, user_id: &str, problem_id: &str) -> Result<Option<SolveEvent>> {
        Ok(store::load(
            self.store,
            Table::Solves,
            &ItemKey::new(user_id, problem_id),
        )?)
    }

    /// # Errors
    ///
    /// Propagates storage failures.
    pub fn has_solved(&self, user_id: &str, problem_id: &str) -> Result<bool> {
        Ok(self
            .store
            .get(Table::Solves, &ItemKey::new(user_id, problem_id))?
            .is_some())
    }

    /// A user's solves, most recent first, optionally restricted to one level.
    ///
    /// Ties on `solved_at` fall back to problem id so the order is stable
    /// across calls.
    ///
    /// # Errors
    ///
    /// Propagates storage and decode failures.
    pub fn list_solves(
        &self,
        user_id: &str,
        difficulty: Option<Difficulty>,
    ) -> Result<Vec<SolveEvent>> {
        let mut solves: Vec<SolveEvent> =
            store::load_partition(self.store, Table::Solves, user_id, &Query::all())?;
        if let Some(wanted) = difficulty {
            solves.retain(|s| s.difficulty == wanted);
        }
        solves.sort_by(|a, b| {
            b.solved_at
                .cmp(&a.solved_at)
                .then_with(|| a.problem_id.cmp(&b.problem_id))
        });
        Ok(solves)
    }

    /// # Errors
    ///
    /// Propagates storage and decode failures.
    pub fn solve_stats(&self, user_id: &str) -> Result<SolveStats> {
        let solves = self.list_solves(user_id, None)?;
        Ok(solves.iter().fold(SolveStats::default(), |mut stats, s| {
            stats.total += 1;
            stats.counts.increment(s.difficulty);
            stats.total_xp = stats.total_xp.saturating_add(s.xp_earned);
            stats
        }))
    }
}

pub(crate) fn duplicate(event: &SolveEvent) -> TrackerError {
    TrackerError::DuplicateSolve {
        user_id: event.user_id.clone(),
        problem_id: event.problem_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::model::DEFAULT_PLATFORM;
    use crate::reward::xp_for;
    use crate::store::MemoryStore;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn solve(problem: &str, difficulty: Difficulty, solved_at: DateTime<Utc>) -> SolveEvent {
        SolveEvent {
            user_id: "alice".into(),
            problem_id: problem.into(),
            problem_title: format!("Problem {problem}"),
            difficulty,
            solved_at,
            xp_earned: xp_for(difficulty),
            platform: DEFAULT_PLATFORM.into(),
            submission_url: None,
        }
    }

    #[test]
    fn second_record_of_same_pair_is_duplicate() {
        let store = MemoryStore::new();
        let ledger = SolveLedger::new(&store);

        ledger
            .record_solve(solve("p1", Difficulty::Easy, at(1, 9)))
            .expect("first record");
        let err = ledger
            .record_solve(solve("p1", Difficulty::Hard, at(2, 9)))
            .expect_err("duplicate");

        assert_eq!(err.code(), ErrorCode::DuplicateSolve);
        assert_eq!(store.len(Table::Solves).expect("len"), 1);
        let kept = ledger.get("alice", "p1").expect("get").expect("present");
        assert_eq!(kept.difficulty, Difficulty::Easy);
    }

    #[test]
    fn invalid_event_writes_nothing() {
        let store = MemoryStore::new();
        let ledger = SolveLedger::new(&store);
        let mut bad = solve("p1", Difficulty::Easy, at(1, 9));
        bad.user_id = String::new();

        let err = ledger.record_solve(bad).expect_err("invalid");
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert_eq!(store.len(Table::Solves).expect("len"), 0);
    }

    #[test]
    fn list_is_newest_first_with_filter() {
        let store = MemoryStore::new();
        let ledger = SolveLedger::new(&store);
        ledger.record_solve(solve("a", Difficulty::Easy, at(1, 9))).expect("a");
        ledger.record_solve(solve("b", Difficulty::Hard, at(3, 9))).expect("b");
        ledger.record_solve(solve("c", Difficulty::Easy, at(2, 9))).expect("c");

        let all: Vec<_> = ledger
            .list_solves("alice", None)
            .expect("list")
            .into_iter()
            .map(|s| s.problem_id)
            .collect();
        assert_eq!(all, ["b", "c", "a"]);

        let easy = ledger
            .list_solves("alice", Some(Difficulty::Easy))
            .expect("list");
        assert_eq!(easy.len(), 2);
        assert!(ledger.list_solves("bob", None).expect("list").is_empty());
    }

    #[test]
    fn stats_and_has_solved_follow_ledger() {
        let store = MemoryStore::new();
        let ledger = SolveLedger::new(&store);
        ledger.record_solve(solve("a", Difficulty::Easy, at(1, 9))).expect("a");
        ledger.record_solve(solve("b", Difficulty::Difficult, at(1, 10))).expect("b");

        let stats = ledger.solve_stats("alice").expect("stats");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.counts.difficult, 1);
        assert_eq!(stats.total_xp, 250);

        assert!(ledger.has_solved("alice", "a").expect("check"));
        assert!(!ledger.has_solved("alice", "z").expect("check"));
    }
}
