//! Ranked views over profiles and streak states.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::model::{Level, StreakState, UserProfile};
use crate::store::{self, KvStore, Table};

pub const DEFAULT_XP_LIMIT: usize = 100;
pub const DEFAULT_STREAK_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XpStanding {
    pub rank: usize,
    pub user_id: String,
    pub display_name: String,
    pub level: Level,
    pub xp: u64,
    pub total_problems_solved: u64,
    pub current_streak: u32,
    pub best_streak: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreakStanding {
    pub rank: usize,
    pub user_id: String,
    pub current_streak: u32,
    pub best_streak: u32,
    pub last_activity_date: Option<NaiveDate>,
}

/// All-time XP ranking: highest XP first, ties broken by user id.
///
/// # Errors
///
/// Propagates storage and decode failures.
pub fn xp_leaderboard(store: &dyn KvStore, limit: usize) -> Result<Vec<XpStanding>> {
    let mut profiles: Vec<UserProfile> = store::load_all(store, Table::Profiles, None)?;
    profiles.sort_by(|a, b| b.xp.cmp(&a.xp).then_with(|| a.user_id.cmp(&b.user_id)));

    Ok(profiles
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, p)| XpStanding {
            rank: i + 1,
            level: p.level(),
            user_id: p.user_id,
            display_name: p.display_name,
            xp: p.xp,
            total_problems_solved: p.total_problems_solved,
            current_streak: p.current_streak,
            best_streak: p.best_streak,
        })
        .collect())
}

/// Longest running streaks first; ties go to the better best streak, then
/// user id. Users who never solved anything are left out.
///
/// # Errors
///
/// Propagates storage and decode failures.
pub fn streak_leaderboard(store: &dyn KvStore, limit: usize) -> Result<Vec<StreakStanding>> {
    let mut states: Vec<StreakState> = store::load_all(store, Table::Streaks, None)?;
    states.retain(|s| s.last_activity_date.is_some());
    states.sort_by(|a, b| {
        b.current_streak
            .cmp(&a.current_streak)
            .then_with(|| b.best_streak.cmp(&a.best_streak))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    Ok(states
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, s)| StreakStanding {
            rank: i + 1,
            user_id: s.user_id,
            current_streak: s.current_streak,
            best_streak: s.best_streak,
            last_activity_date: s.last_activity_date,
        })
        .collect())
}
