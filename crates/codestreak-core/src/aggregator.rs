//! Daily aggregator: one [`DailyAggregate`] per user per calendar day.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::Result;
use crate::model::solve::require_id;
use crate::model::{DailyAggregate, Difficulty};
use crate::store::{self, KvStore, Query, Table, WriteOp};

/// Result of planning a daily update without writing it.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPlan {
    pub aggregate: DailyAggregate,
    /// `None` when the problem was already counted for that day.
    pub write: Option<WriteOp>,
}

pub struct DailyAggregator<'s> {
    store: &'s dyn KvStore,
}

impl<'s> DailyAggregator<'s> {
    #[must_use]
    pub const fn new(store: &'s dyn KvStore) -> Self {
        Self { store }
    }

    /// Stored aggregate for the day, or an empty one.
    ///
    /// # Errors
    ///
    /// Propagates storage and decode failures.
    pub fn day(&self, user_id: &str, date: NaiveDate) -> Result<DailyAggregate> {
        let key = DailyAggregate::key_for(user_id, date);
        Ok(store::load(self.store, Table::DailyActivity, &key)?
            .unwrap_or_else(|| DailyAggregate::new(user_id, date)))
    }

    /// Compute the aggregate after counting `problem_id`, plus the write that
    /// would persist it.
    ///
    /// # Errors
    ///
    /// Validation, storage and encode failures.
    pub fn plan(
        &self,
        user_id: &str,
        date: NaiveDate,
        problem_id: &str,
        difficulty: Difficulty,
    ) -> Result<DailyPlan> {
        require_id("user_id", user_id)?;
        require_id("problem_id", problem_id)?;

        let mut aggregate = self.day(user_id, date)?;
        if !aggregate.record(problem_id, difficulty) {
            return Ok(DailyPlan {
                aggregate,
                write: None,
            });
        }
        let write = WriteOp::put(Table::DailyActivity, aggregate.key(), &aggregate)?;
        Ok(DailyPlan {
            aggregate,
            write: Some(write),
        })
    }

    /// Count `problem_id` towards the user's day. Idempotent per problem.
    ///
    /// # Errors
    ///
    /// Validation, storage and encode failures.
    pub fn record_daily_solve(
        &self,
        user_id: &str,
        date: NaiveDate,
        problem_id: &str,
        difficulty: Difficulty,
    ) -> Result<DailyAggregate> {
        let plan = self.plan(user_id, date, problem_id, difficulty)?;
        match plan.write {
            Some(op) => {
                self.store.transact(std::slice::from_ref(&op))?;
                info!(
                    user_id,
                    %date,
                    problem_id,
                    total = plan.aggregate.total_count,
                    "daily activity recorded"
                );
            }
            None => debug!(user_id, %date, problem_id, "problem already counted for the day"),
        }
        Ok(plan.aggregate)
    }

    /// Up to `max_days` aggregate rows, newest first.
    ///
    /// The cap counts stored rows, not calendar days: days without activity
    /// have no row, so the result may reach further back than `max_days`.
    ///
    /// # Errors
    ///
    /// Propagates storage and decode failures.
    pub fn recent_activity(&self, user_id: &str, max_days: usize) -> Result<Vec<DailyAggregate>> {
        if max_days == 0 {
            return Ok(Vec::new());
        }
        Ok(store::load_partition(
            self.store,
            Table::DailyActivity,
            user_id,
            &Query::newest_first(max_days),
        )?)
    }

    /// Every aggregate row for the user, oldest first.
    ///
    /// # Errors
    ///
    /// Propagates storage and decode failures.
    pub fn full_history(&self, user_id: &str) -> Result<Vec<DailyAggregate>> {
        Ok(store::load_partition(
            self.store,
            Table::DailyActivity,
            user_id,
            &Query::all(),
        )?)
    }
}
