//! Progress orchestrator: turns one verified solve into ledger, profile,
//! streak and daily-activity updates.
//!
//! # Outbox
//!
//! The solve event and a [`PendingEffects`] record are written in one atomic
//! batch. The remaining effects are then applied one step at a time, and each
//! step commits its component write together with the updated step flags of
//! the pending record. A crash between steps therefore leaves a pending record
//! that says exactly which steps are still owed; [`ProgressOrchestrator::resume_pending`]
//! (or a retry of the same solve) finishes them without applying any step twice.
//! The pending record is deleted once every step has run.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregator::DailyAggregator;
use crate::clock::Clock;
use crate::error::{Result, TrackerError};
use crate::ledger::{self, SolveLedger};
use crate::model::solve::require_id;
use crate::model::{DEFAULT_PLATFORM, Difficulty, SolveEvent};
use crate::profile::ProfileBook;
use crate::reward::xp_for;
use crate::store::{self, ItemKey, KvStore, Query, StoreError, Table, WriteOp};
use crate::streak::{self, StreakTracker};

/// Inbound "user solved problem" request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteSolve {
    pub user_id: String,
    pub problem_id: String,
    pub problem_title: String,
    pub difficulty: Difficulty,
    pub platform: Option<String>,
    pub submission_url: Option<String>,
}

impl CompleteSolve {
    pub fn new(
        user_id: impl Into<String>,
        problem_id: impl Into<String>,
        problem_title: impl Into<String>,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            problem_id: problem_id.into(),
            problem_title: problem_title.into(),
            difficulty,
            platform: None,
            submission_url: None,
        }
    }

    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    #[must_use]
    pub fn with_submission_url(mut self, url: impl Into<String>) -> Self {
        self.submission_url = Some(url.into());
        self
    }

    fn validate(&self) -> Result<()> {
        require_id("user_id", &self.user_id)?;
        require_id("problem_id", &self.problem_id)?;
        if self.problem_title.trim().is_empty() {
            return Err(TrackerError::validation("problem_title", "must not be empty"));
        }
        if let Some(url) = &self.submission_url
            && url.trim().is_empty()
        {
            return Err(TrackerError::validation("submission_url", "must not be blank"));
        }
        Ok(())
    }
}

/// Net effect reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SolveSummary {
    pub xp_earned: u64,
    pub current_streak: u32,
    pub best_streak: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The solve was new (or a pending one was finished) and XP was awarded.
    Completed(SolveSummary),
    /// The pair was already recorded; nothing changed and no XP was awarded.
    AlreadyCompleted(SolveSummary),
}

impl Completion {
    #[must_use]
    pub const fn summary(&self) -> SolveSummary {
        match self {
            Self::Completed(summary) | Self::AlreadyCompleted(summary) => *summary,
        }
    }

    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Completed(_) => "completed",
            Self::AlreadyCompleted(_) => "already_completed",
        }
    }
}

/// Outcome of the streak step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StreakStep {
    #[default]
    Pending,
    Applied { current_streak: u32, best_streak: u32 },
    /// The activity date preceded the last recorded activity.
    Rejected { last_activity: NaiveDate },
}

/// Which effects of a solve have been applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSteps {
    pub profile_credited: bool,
    pub streak: StreakStep,
    pub streak_mirrored: bool,
    pub daily_recorded: bool,
}

/// Outbox record for one recorded solve whose effects are still owed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEffects {
    pub user_id: String,
    pub problem_id: String,
    pub difficulty: Difficulty,
    pub xp: u64,
    pub activity_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub steps: EffectSteps,
}

impl PendingEffects {
    fn for_event(event: &SolveEvent) -> Self {
        Self {
            user_id: event.user_id.clone(),
            problem_id: event.problem_id.clone(),
            difficulty: event.difficulty,
            xp: event.xp_earned,
            activity_date: event.solved_on(),
            created_at: event.solved_at,
            steps: EffectSteps::default(),
        }
    }

    #[must_use]
    pub fn key_for(user_id: &str, problem_id: &str) -> ItemKey {
        ItemKey::new(user_id, problem_id)
    }

    #[must_use]
    pub fn key(&self) -> ItemKey {
        Self::key_for(&self.user_id, &self.problem_id)
    }
}

/// A pending record finished by [`ProgressOrchestrator::resume_pending`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resumed {
    pub user_id: String,
    pub problem_id: String,
    pub summary: SolveSummary,
    pub streak_rejected: bool,
}

struct Applied {
    summary: SolveSummary,
    rejected: Option<NaiveDate>,
}

pub struct ProgressOrchestrator<'s> {
    store: &'s dyn KvStore,
    clock: &'s dyn Clock,
}

impl<'s> ProgressOrchestrator<'s> {
    #[must_use]
    pub const fn new(store: &'s dyn KvStore, clock: &'s dyn Clock) -> Self {
        Self { store, clock }
    }

    #[must_use]
    pub const fn ledger(&self) -> SolveLedger<'s> {
        SolveLedger::new(self.store)
    }

    #[must_use]
    pub const fn daily(&self) -> DailyAggregator<'s> {
        DailyAggregator::new(self.store)
    }

    #[must_use]
    pub const fn streaks(&self) -> StreakTracker<'s> {
        StreakTracker::new(self.store, self.clock)
    }

    #[must_use]
    pub const fn profiles(&self) -> ProfileBook<'s> {
        ProfileBook::new(self.store, self.clock)
    }

    /// Record a solve and apply its XP, streak and daily-activity effects.
    ///
    /// A repeat of an already recorded (user, problem) pair is not an error:
    /// it returns [`Completion::AlreadyCompleted`] with zero XP, unless the
    /// earlier attempt left effects pending, in which case those are finished
    /// and reported as [`Completion::Completed`].
    ///
    /// # Errors
    ///
    /// - [`TrackerError::Validation`] before anything is written
    /// - [`TrackerError::Storage`] if the initial batch fails (nothing written)
    ///   or a later step fails (the pending record keeps the remaining steps)
    /// - [`TrackerError::OutOfOrderActivity`] if today precedes the user's last
    ///   activity; the solve, XP and daily activity are still recorded but the
    ///   streak is left untouched
    pub fn complete_solve(&self, request: CompleteSolve) -> Result<Completion> {
        request.validate()?;

        let xp = xp_for(request.difficulty);
        let event = SolveEvent {
            user_id: request.user_id,
            problem_id: request.problem_id,
            problem_title: request.problem_title.trim().to_string(),
            difficulty: request.difficulty,
            solved_at: self.clock.now(),
            xp_earned: xp,
            platform: request
                .platform
                .unwrap_or_else(|| DEFAULT_PLATFORM.to_string()),
            submission_url: request.submission_url,
        };
        let pending = PendingEffects::for_event(&event);

        let batch = [
            SolveLedger::insert_op(&event)?,
            WriteOp::put(Table::PendingEffects, pending.key(), &pending)?,
        ];
        match self.store.transact(&batch) {
            Ok(()) => {
                info!(
                    user_id = %event.user_id,
                    problem_id = %event.problem_id,
                    difficulty = %event.difficulty,
                    xp,
                    "solve recorded"
                );
            }
            Err(StoreError::ConditionFailed { .. }) => return self.retry_duplicate(&event),
            Err(err) => return Err(err.into()),
        }

        let applied = self.settle_through(pending)?;
        match applied.rejected {
            Some(last) => Err(out_of_order(&event.user_id, last, event.solved_on())),
            None => Ok(Completion::Completed(applied.summary)),
        }
    }

    fn retry_duplicate(&self, event: &SolveEvent) -> Result<Completion> {
        let key = PendingEffects::key_for(&event.user_id, &event.problem_id);
        if let Some(pending) =
            store::load::<PendingEffects>(self.store, Table::PendingEffects, &key)?
        {
            warn!(
                user_id = %event.user_id,
                problem_id = %event.problem_id,
                "finishing effects left pending by an earlier attempt"
            );
            let attempted = pending.activity_date;
            let applied = self.settle_through(pending)?;
            return match applied.rejected {
                Some(last) => Err(out_of_order(&event.user_id, last, attempted)),
                None => Ok(Completion::Completed(applied.summary)),
            };
        }

        warn!(
            user_id = %event.user_id,
            problem_id = %event.problem_id,
            error = %ledger::duplicate(event),
            "no XP awarded"
        );
        let streak = self.streaks().get(&event.user_id)?;
        Ok(Completion::AlreadyCompleted(SolveSummary {
            xp_earned: 0,
            current_streak: streak.current_streak,
            best_streak: streak.best_streak,
        }))
    }

    /// Finish every pending record, for one user or for all users, oldest
    /// activity date first.
    ///
    /// # Errors
    ///
    /// Stops at the first storage failure; records not yet finished stay
    /// pending.
    pub fn resume_pending(&self, user_id: Option<&str>) -> Result<Vec<Resumed>> {
        let pending = self.pending(user_id)?;
        let mut resumed = Vec::with_capacity(pending.len());
        for record in pending {
            warn!(
                user_id = %record.user_id,
                problem_id = %record.problem_id,
                "resuming pending effects"
            );
            let (user_id, problem_id) = (record.user_id.clone(), record.problem_id.clone());
            let applied = self.apply_effects(record)?;
            resumed.push(Resumed {
                user_id,
                problem_id,
                summary: applied.summary,
                streak_rejected: applied.rejected.is_some(),
            });
        }
        Ok(resumed)
    }

    /// Pending records, for one user or for all users, in the order their
    /// streak steps must run: activity date, then creation time.
    ///
    /// # Errors
    ///
    /// Propagates storage and decode failures.
    pub fn pending(&self, user_id: Option<&str>) -> Result<Vec<PendingEffects>> {
        let mut records: Vec<PendingEffects> = match user_id {
            Some(user_id) => {
                store::load_partition(self.store, Table::PendingEffects, user_id, &Query::all())?
            }
            None => store::load_all(self.store, Table::PendingEffects, None)?,
        };
        records.sort_by(|a, b| {
            (a.activity_date, a.created_at, &a.user_id, &a.problem_id).cmp(&(
                b.activity_date,
                b.created_at,
                &b.user_id,
                &b.problem_id,
            ))
        });
        Ok(records)
    }

    /// Apply `target` after every record of the same user that precedes it,
    /// so streak steps always see activity dates in order.
    fn settle_through(&self, target: PendingEffects) -> Result<Applied> {
        let key = target.key();
        for record in self.pending(Some(&target.user_id))? {
            if record.key() == key {
                return self.apply_effects(record);
            }
            let order = (record.activity_date, record.created_at);
            if order > (target.activity_date, target.created_at) {
                break;
            }
            warn!(
                user_id = %record.user_id,
                problem_id = %record.problem_id,
                "finishing earlier pending effects first"
            );
            self.apply_effects(record)?;
        }
        self.apply_effects(target)
    }

    fn apply_effects(&self, mut pending: PendingEffects) -> Result<Applied> {
        let user_id = pending.user_id.clone();

        if !pending.steps.profile_credited {
            let (_, op) = self.profiles().plan_credit(&user_id, pending.xp)?;
            pending.steps.profile_credited = true;
            self.commit_step(vec![op], &pending)?;
        }

        if pending.steps.streak == StreakStep::Pending {
            let ops = match self.streaks().plan(&user_id, pending.activity_date) {
                Ok(plan) => {
                    streak::log_touch(&plan);
                    pending.steps.streak = StreakStep::Applied {
                        current_streak: plan.state.current_streak,
                        best_streak: plan.state.best_streak,
                    };
                    plan.write.into_iter().collect()
                }
                Err(TrackerError::OutOfOrderActivity { last, .. }) => {
                    pending.steps.streak = StreakStep::Rejected {
                        last_activity: last,
                    };
                    Vec::new()
                }
                Err(err) => return Err(err),
            };
            self.commit_step(ops, &pending)?;
        }

        if let StreakStep::Applied {
            current_streak,
            best_streak,
        } = pending.steps.streak
            && !pending.steps.streak_mirrored
        {
            let (_, op) = self
                .profiles()
                .plan_mirror(&user_id, current_streak, best_streak)?;
            pending.steps.streak_mirrored = true;
            self.commit_step(vec![op], &pending)?;
        }

        if !pending.steps.daily_recorded {
            let plan = self.daily().plan(
                &user_id,
                pending.activity_date,
                &pending.problem_id,
                pending.difficulty,
            )?;
            pending.steps.daily_recorded = true;
            self.commit_step(plan.write.into_iter().collect(), &pending)?;
        }

        self.store
            .transact(&[WriteOp::delete(Table::PendingEffects, pending.key())])?;

        let rejected = match pending.steps.streak {
            StreakStep::Rejected { last_activity } => Some(last_activity),
            StreakStep::Pending | StreakStep::Applied { .. } => None,
        };
        let (current_streak, best_streak) = if let StreakStep::Applied {
            current_streak,
            best_streak,
        } = pending.steps.streak
        {
            (current_streak, best_streak)
        } else {
            let state = self.streaks().get(&user_id)?;
            (state.current_streak, state.best_streak)
        };
        let summary = SolveSummary {
            xp_earned: pending.xp,
            current_streak,
            best_streak,
        };
        Ok(Applied { summary, rejected })
    }

    fn commit_step(&self, mut ops: Vec<WriteOp>, pending: &PendingEffects) -> Result<()> {
        ops.push(WriteOp::put(Table::PendingEffects, pending.key(), pending)?);
        self.store.transact(&ops)?;
        Ok(())
    }
}

fn out_of_order(user_id: &str, last: NaiveDate, attempted: NaiveDate) -> TrackerError {
    TrackerError::OutOfOrderActivity {
        user_id: user_id.to_string(),
        last,
        attempted,
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

    fn easy(problem: &str) -> CompleteSolve {
        CompleteSolve::new("alice", problem, "Title", Difficulty::Easy)
    }

    #[test]
    fn completion_awards_xp_once() {
        let store = MemoryStore::new();
        let clock = FixedClock::on(day(1));
        let engine = ProgressOrchestrator::new(&store, &clock);

        let first = engine.complete_solve(easy("p1")).expect("first");
        assert_eq!(
            first,
            Completion::Completed(SolveSummary {
                xp_earned: 50,
                current_streak: 1,
                best_streak: 1,
            })
        );

        let again = engine.complete_solve(easy("p1")).expect("again");
        assert_eq!(again.status(), "already_completed");
        assert_eq!(again.summary().xp_earned, 0);
        assert_eq!(again.summary().current_streak, 1);

        let profile = engine.profiles().require("alice").expect("profile");
        assert_eq!((profile.xp, profile.total_problems_solved), (50, 1));
        assert_eq!(store.len(Table::PendingEffects).expect("len"), 0);
    }

    #[test]
    fn effects_reach_every_component() {
        let store = MemoryStore::new();
        let clock = FixedClock::on(day(1));
        let engine = ProgressOrchestrator::new(&store, &clock);
        engine
            .complete_solve(
                CompleteSolve::new("alice", "p9", "Graphs", Difficulty::Difficult)
                    .with_platform("codeforces")
                    .with_submission_url("https://example.test/s/1"),
            )
            .expect("complete");

        let event = engine.ledger().get("alice", "p9").expect("get").expect("stored");
        assert_eq!(event.platform, "codeforces");
        assert_eq!(event.xp_earned, 200);

        let today = engine.daily().day("alice", day(1)).expect("daily");
        assert_eq!(today.counts.difficult, 1);

        let profile = engine.profiles().require("alice").expect("profile");
        assert_eq!((profile.xp, profile.current_streak), (200, 1));
        assert_eq!(engine.streaks().get("alice").expect("streak").total_solved, 1);
    }

    #[test]
    fn invalid_request_writes_nothing() {
        let store = MemoryStore::new();
        let clock = FixedClock::on(day(1));
        let engine = ProgressOrchestrator::new(&store, &clock);

        let err = engine
            .complete_solve(CompleteSolve::new("alice", "p1", "  ", Difficulty::Easy))
            .expect_err("blank title");
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        for table in Table::ALL {
            assert_eq!(store.len(table).expect("len"), 0, "{table} written");
        }
    }

    #[test]
    fn clock_regression_keeps_streak_but_records_the_rest() {
        let store = MemoryStore::new();
        let clock = FixedClock::on(day(5));
        let engine = ProgressOrchestrator::new(&store, &clock);
        engine.complete_solve(easy("p1")).expect("day 5");

        clock.set_date(day(3));
        let err = engine.complete_solve(easy("p2")).expect_err("earlier day");
        assert_eq!(err.code(), ErrorCode::OutOfOrderActivity);

        let streak = engine.streaks().get("alice").expect("streak");
        assert_eq!(streak.last_activity_date, Some(day(5)));
        assert_eq!(streak.total_solved, 1);

        assert!(engine.ledger().has_solved("alice", "p2").expect("ledger"));
        assert_eq!(engine.profiles().require("alice").expect("profile").xp, 100);
        assert_eq!(engine.daily().day("alice", day(3)).expect("daily").total_count, 1);
        assert!(engine.pending(None).expect("pending").is_empty());
    }

    #[test]
    fn pending_records_round_trip_step_flags() {
        let pending = PendingEffects {
            user_id: "alice".into(),
            problem_id: "p1".into(),
            difficulty: Difficulty::Hard,
            xp: 150,
            activity_date: day(1),
            created_at: FixedClock::on(day(1)).now(),
            steps: EffectSteps {
                profile_credited: true,
                streak: StreakStep::Applied {
                    current_streak: 2,
                    best_streak: 3,
                },
                streak_mirrored: false,
                daily_recorded: false,
            },
        };
        let json = serde_json::to_value(&pending).expect("serialize");
        assert_eq!(json["steps"]["streak"]["status"], "applied");
        let back: PendingEffects = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, pending);
    }
}
