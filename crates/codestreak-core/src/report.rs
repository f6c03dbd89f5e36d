//! Read-only reports built from the ledger, daily aggregates and profiles.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregator::DailyAggregator;
use crate::clock::Clock;
use crate::error::Result;
use crate::ledger::SolveLedger;
use crate::model::{DailyAggregate, DifficultyCounts};
use crate::profile::ProfileBook;
use crate::store::KvStore;

pub const DEFAULT_ACTIVITY_DAYS: usize = 30;
pub const WEEKLY_DAYS: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityDay {
    pub date: NaiveDate,
    pub problems_completed: u32,
    pub xp_earned: u64,
}

impl From<&DailyAggregate> for ActivityDay {
    fn from(agg: &DailyAggregate) -> Self {
        Self {
            date: agg.date,
            problems_completed: agg.total_count,
            xp_earned: agg.xp_earned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DifficultyDay {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub counts: DifficultyCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyReport {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub problems_solved: u64,
    pub xp_earned: u64,
    pub current_streak: u32,
    pub best_streak: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformCount {
    pub platform: String,
    pub solved: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryOverview {
    pub total_completed: u64,
    pub days_active: usize,
    pub total_xp_earned: u64,
    pub counts: DifficultyCounts,
    pub by_platform: Vec<PlatformCount>,
    pub recent_activity: Vec<ActivityDay>,
}

/// Totals across every profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformStats {
    pub total_users: usize,
    pub total_xp: u64,
    pub total_problems_solved: u64,
    pub active_streaks: usize,
}

pub struct Reports<'s> {
    store: &'s dyn KvStore,
    clock: &'s dyn Clock,
}

impl<'s> Reports<'s> {
    #[must_use]
    pub const fn new(store: &'s dyn KvStore, clock: &'s dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Per-day problem and XP totals for the newest `days` activity rows.
    ///
    /// # Errors
    ///
    /// Propagates storage and decode failures.
    pub fn activity_history(&self, user_id: &str, days: usize) -> Result<Vec<ActivityDay>> {
        let recent = DailyAggregator::new(self.store).recent_activity(user_id, days)?;
        Ok(recent.iter().map(ActivityDay::from).collect())
    }

    /// Per-day counts by difficulty for the newest `days` activity rows.
    ///
    /// # Errors
    ///
    /// Propagates storage and decode failures.
    pub fn difficulty_progress(&self, user_id: &str, days: usize) -> Result<Vec<DifficultyDay>> {
        let recent = DailyAggregator::new(self.store).recent_activity(user_id, days)?;
        Ok(recent
            .into_iter()
            .map(|agg| DifficultyDay {
                date: agg.date,
                counts: agg.counts,
            })
            .collect())
    }

    /// Totals over the newest `days` activity rows (normally [`WEEKLY_DAYS`])
    /// plus the profile's streak counters. With no activity the week
    /// collapses to today.
    ///
    /// # Errors
    ///
    /// [`crate::TrackerError::UserNotFound`] for a user without a profile,
    /// plus storage failures.
    pub fn weekly_report(&self, user_id: &str, days: usize) -> Result<WeeklyReport> {
        let profile = ProfileBook::new(self.store, self.clock).require(user_id)?;
        let recent = DailyAggregator::new(self.store).recent_activity(user_id, days)?;

        let today = self.clock.today();
        let newest = recent.first().map_or(today, |a| a.date);
        let oldest = recent.last().map_or(today, |a| a.date);

        Ok(WeeklyReport {
            week_start: oldest,
            week_end: newest,
            problems_solved: recent.iter().map(|a| u64::from(a.total_count)).sum(),
            xp_earned: recent.iter().map(DailyAggregate::xp_earned).sum(),
            current_streak: profile.current_streak,
            best_streak: profile.best_streak,
        })
    }

    /// Lifetime totals from the ledger and the newest `recent_days` activity
    /// rows.
    ///
    /// # Errors
    ///
    /// Propagates storage and decode failures.
    pub fn history_overview(&self, user_id: &str, recent_days: usize) -> Result<HistoryOverview> {
        let solves = SolveLedger::new(self.store).list_solves(user_id, None)?;

        let mut counts = DifficultyCounts::default();
        let mut days = BTreeSet::new();
        let mut platforms: BTreeMap<&str, u64> = BTreeMap::new();
        let mut total_xp: u64 = 0;
        for solve in &solves {
            counts.increment(solve.difficulty);
            days.insert(solve.solved_on());
            *platforms.entry(solve.platform.as_str()).or_default() += 1;
            total_xp = total_xp.saturating_add(solve.xp_earned);
        }

        let mut by_platform: Vec<PlatformCount> = platforms
            .into_iter()
            .map(|(platform, solved)| PlatformCount {
                platform: platform.to_string(),
                solved,
            })
            .collect();
        by_platform.sort_by(|a, b| {
            b.solved
                .cmp(&a.solved)
                .then_with(|| a.platform.cmp(&b.platform))
        });

        Ok(HistoryOverview {
            total_completed: solves.len() as u64,
            days_active: days.len(),
            total_xp_earned: total_xp,
            counts,
            by_platform,
            recent_activity: self.activity_history(user_id, recent_days)?,
        })
    }

    /// User count plus XP and solve totals over all profiles. A streak counts
    /// as active while the profile's current streak is above zero.
    ///
    /// # Errors
    ///
    /// Propagates storage and decode failures.
    pub fn platform_stats(&self) -> Result<PlatformStats> {
        let profiles = ProfileBook::new(self.store, self.clock).list(None)?;
        Ok(profiles
            .iter()
            .fold(PlatformStats::default(), |mut stats, p| {
                stats.total_users += 1;
                stats.total_xp = stats.total_xp.saturating_add(p.xp);
                stats.total_problems_solved = stats
                    .total_problems_solved
                    .saturating_add(p.total_problems_solved);
                if p.current_streak > 0 {
                    stats.active_streaks += 1;
                }
                stats
            }))
    }
}
