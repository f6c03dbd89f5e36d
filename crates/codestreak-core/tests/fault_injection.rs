//! Fault-injection tests for the solve outbox.
//!
//! A wrapper store fails one chosen `transact` call, simulating a crash or a
//! storage outage between orchestrator steps. Recovery must finish the owed
//! steps without awarding XP twice:
//! - failure of the initial batch leaves nothing behind
//! - failure of any later step leaves a pending record
//! - `resume_pending` or a retried solve completes it exactly once
//! - owed streak steps run in activity-date order, whatever the problem ids

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;
use codestreak_core::store::{ItemKey, Query, Record, StoreError, Table, WriteOp};
use codestreak_core::{
    CompleteSolve, Completion, Difficulty, ErrorCode, FixedClock, KvStore, MemoryStore,
    ProgressOrchestrator,
};
use serde_json::Value;

/// Number of `transact` calls one fresh solve makes: the initial batch, four
/// effect steps and the pending-record delete.
const TRANSACTS_PER_SOLVE: usize = 6;

struct FlakyStore {
    inner: MemoryStore,
    calls: AtomicUsize,
    fail_at: AtomicUsize,
}

impl FlakyStore {
    /// Fail the `n`th `transact` call (1-based); 0 never fails.
    fn failing_at(n: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            calls: AtomicUsize::new(0),
            fail_at: AtomicUsize::new(n),
        }
    }

    /// Fail the `n`th `transact` call from now (1-based).
    fn fail_after(&self, n: usize) {
        let made = self.calls.load(Ordering::SeqCst);
        self.fail_at.store(made + n, Ordering::SeqCst);
    }

    fn heal(&self) {
        self.fail_at.store(0, Ordering::SeqCst);
    }
}

impl KvStore for FlakyStore {
    fn get(&self, table: Table, key: &ItemKey) -> Result<Option<Value>, StoreError> {
        self.inner.get(table, key)
    }

    fn query(
        &self,
        table: Table,
        partition: &str,
        query: &Query,
    ) -> Result<Vec<Record>, StoreError> {
        self.inner.query(table, partition, query)
    }

    fn scan(&self, table: Table, limit: Option<usize>) -> Result<Vec<Record>, StoreError> {
        self.inner.scan(table, limit)
    }

    fn put(&self, table: Table, key: &ItemKey, body: &Value) -> Result<(), StoreError> {
        self.inner.put(table, key, body)
    }

    fn insert_if_absent(
        &self,
        table: Table,
        key: &ItemKey,
        body: &Value,
    ) -> Result<bool, StoreError> {
        self.inner.insert_if_absent(table, key, body)
    }

    fn delete(&self, table: Table, key: &ItemKey) -> Result<(), StoreError> {
        self.inner.delete(table, key)
    }

    fn transact(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_at.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("injected failure on call {call}")));
        }
        self.inner.transact(ops)
    }
}

fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, n).expect("valid date")
}

fn medium(problem: &str) -> CompleteSolve {
    CompleteSolve::new("u1", problem, "Fixture", Difficulty::Moderate)
}

fn assert_settled(engine: &ProgressOrchestrator<'_>, xp: u64, streak: u32) {
    let profile = engine.profiles().require("u1").expect("profile");
    assert_eq!(profile.xp, xp, "xp");
    assert_eq!(profile.current_streak, streak, "mirrored streak");
    assert_eq!(engine.streaks().get("u1").expect("streak").current_streak, streak);
    assert!(engine.pending(None).expect("pending").is_empty());
}

#[test]
fn failed_initial_batch_writes_nothing() {
    let store = FlakyStore::failing_at(1);
    let clock = FixedClock::on(day(1));
    let engine = ProgressOrchestrator::new(&store, &clock);

    let err = engine.complete_solve(medium("p1")).expect_err("injected");
    assert_eq!(err.code(), ErrorCode::StorageUnavailable);
    for table in Table::ALL {
        assert_eq!(store.inner.len(table).expect("len"), 0, "{table} written");
    }

    store.heal();
    let done = engine.complete_solve(medium("p1")).expect("retry");
    assert_eq!(done.status(), "completed");
    assert_settled(&engine, 100, 1);
}

#[test]
fn resume_finishes_every_interrupted_step_once() {
    for fail_at in 2..=TRANSACTS_PER_SOLVE {
        let store = FlakyStore::failing_at(fail_at);
        let clock = FixedClock::on(day(1));
        let engine = ProgressOrchestrator::new(&store, &clock);

        let err = engine.complete_solve(medium("p1")).expect_err("injected");
        assert_eq!(err.code(), ErrorCode::StorageUnavailable, "step {fail_at}");
        assert!(engine.ledger().has_solved("u1", "p1").expect("ledger"));
        assert_eq!(engine.pending(Some("u1")).expect("pending").len(), 1);

        store.heal();
        let resumed = engine.resume_pending(None).expect("resume");
        assert_eq!(resumed.len(), 1, "step {fail_at}");
        assert_eq!(resumed[0].summary.xp_earned, 100);
        assert!(!resumed[0].streak_rejected);

        assert_settled(&engine, 100, 1);
        let today = engine.daily().day("u1", day(1)).expect("daily");
        assert_eq!(today.total_count, 1, "step {fail_at}");
        assert_eq!(engine.streaks().get("u1").expect("streak").total_solved, 1);
    }
}

#[test]
fn retried_solve_finishes_pending_effects() {
    for fail_at in 2..=TRANSACTS_PER_SOLVE {
        let store = FlakyStore::failing_at(fail_at);
        let clock = FixedClock::on(day(1));
        let engine = ProgressOrchestrator::new(&store, &clock);

        engine.complete_solve(medium("p1")).expect_err("injected");
        store.heal();

        let retried = engine.complete_solve(medium("p1")).expect("retry");
        assert!(matches!(retried, Completion::Completed(_)), "step {fail_at}");
        assert_eq!(retried.summary().xp_earned, 100);
        assert_settled(&engine, 100, 1);

        let third = engine.complete_solve(medium("p1")).expect("third");
        assert_eq!(third.status(), "already_completed");
        assert_settled(&engine, 100, 1);
    }
}

#[test]
fn resume_after_interruption_keeps_later_solves_consistent() {
    let store = FlakyStore::failing_at(3);
    let clock = FixedClock::on(day(1));
    let engine = ProgressOrchestrator::new(&store, &clock);

    engine.complete_solve(medium("p1")).expect_err("streak step fails");
    store.heal();
    engine.resume_pending(Some("u1")).expect("resume");

    clock.set_date(day(2));
    let next = engine.complete_solve(medium("p2")).expect("day 2");
    assert_eq!(next.summary().current_streak, 2);
    assert_settled(&engine, 200, 2);
}

#[test]
fn resume_with_nothing_pending_is_empty() {
    let store = MemoryStore::new();
    let clock = FixedClock::on(day(1));
    let engine = ProgressOrchestrator::new(&store, &clock);
    engine.complete_solve(medium("p1")).expect("complete");

    assert!(engine.resume_pending(None).expect("resume").is_empty());
    assert_eq!(engine.profiles().require("u1").expect("profile").xp, 100);
}

/// Third call of a solve's saga: its streak step.
const STREAK_STEP: usize = 3;

#[test]
fn next_solve_finishes_earlier_pending_streak_first() {
    let store = FlakyStore::failing_at(0);
    let clock = FixedClock::on(day(1));
    let engine = ProgressOrchestrator::new(&store, &clock);
    engine.complete_solve(medium("p-mid")).expect("day 1");

    clock.set_date(day(2));
    store.fail_after(STREAK_STEP);
    engine.complete_solve(medium("zigzag")).expect_err("streak step fails");
    store.heal();
    assert_eq!(engine.streaks().get("u1").expect("streak").current_streak, 1);

    clock.set_date(day(3));
    let next = engine.complete_solve(medium("arrays")).expect("day 3");
    assert_eq!(next.summary().current_streak, 3);
    assert_eq!(next.summary().best_streak, 3);

    assert!(engine.resume_pending(None).expect("resume").is_empty());
    assert_settled(&engine, 300, 3);
    assert_eq!(engine.streaks().get("u1").expect("streak").total_solved, 3);
}

#[test]
fn resume_applies_pending_records_by_activity_date() {
    let store = FlakyStore::failing_at(0);
    let clock = FixedClock::on(day(1));
    let engine = ProgressOrchestrator::new(&store, &clock);
    engine.complete_solve(medium("p-mid")).expect("day 1");

    clock.set_date(day(2));
    store.fail_after(STREAK_STEP);
    engine.complete_solve(medium("zigzag")).expect_err("day 2 interrupted");

    // Day 3: the initial batch lands, then finishing day 2's streak step fails.
    clock.set_date(day(3));
    store.fail_after(2);
    engine.complete_solve(medium("arrays")).expect_err("day 3 interrupted");
    store.heal();

    let owed: Vec<_> = engine
        .pending(Some("u1"))
        .expect("pending")
        .into_iter()
        .map(|p| p.problem_id)
        .collect();
    assert_eq!(owed, ["zigzag", "arrays"]);

    let resumed = engine.resume_pending(None).expect("resume");
    let order: Vec<_> = resumed.iter().map(|r| r.problem_id.as_str()).collect();
    assert_eq!(order, ["zigzag", "arrays"]);
    assert!(resumed.iter().all(|r| !r.streak_rejected));
    assert_eq!(resumed[1].summary.current_streak, 3);

    assert_settled(&engine, 300, 3);
}
