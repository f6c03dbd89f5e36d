use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Difficulty;
use crate::reward::xp_for;
use crate::store::ItemKey;

/// Per-difficulty solve counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyCounts {
    pub easy: u32,
    pub moderate: u32,
    pub hard: u32,
    pub difficult: u32,
}

impl DifficultyCounts {
    #[must_use]
    pub const fn get(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Moderate => self.moderate,
            Difficulty::Hard => self.hard,
            Difficulty::Difficult => self.difficult,
        }
    }

    pub const fn increment(&mut self, difficulty: Difficulty) {
        let slot = match difficulty {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Moderate => &mut self.moderate,
            Difficulty::Hard => &mut self.hard,
            Difficulty::Difficult => &mut self.difficult,
        };
        *slot = slot.saturating_add(1);
    }

    /// Element-wise sum.
    #[must_use]
    pub const fn merged(self, other: Self) -> Self {
        Self {
            easy: self.easy.saturating_add(other.easy),
            moderate: self.moderate.saturating_add(other.moderate),
            hard: self.hard.saturating_add(other.hard),
            difficult: self.difficult.saturating_add(other.difficult),
        }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        Difficulty::ALL
            .iter()
            .map(|d| u64::from(self.get(*d)))
            .sum()
    }

    /// XP these counts are worth at the standard tiers.
    #[must_use]
    pub fn xp(&self) -> u64 {
        Difficulty::ALL
            .iter()
            .map(|d| u64::from(self.get(*d)) * xp_for(*d))
            .sum()
    }
}

/// One user's solves on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub user_id: String,
    pub date: NaiveDate,
    pub solved_problem_ids: Vec<String>,
    pub total_count: u32,
    pub counts: DifficultyCounts,
}

impl DailyAggregate {
    #[must_use]
    pub fn new(user_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            user_id: user_id.into(),
            date,
            solved_problem_ids: Vec::new(),
            total_count: 0,
            counts: DifficultyCounts::default(),
        }
    }

    /// Store key. ISO dates sort chronologically as text.
    #[must_use]
    pub fn key_for(user_id: &str, date: NaiveDate) -> ItemKey {
        ItemKey::new(user_id, date.to_string())
    }

    #[must_use]
    pub fn key(&self) -> ItemKey {
        Self::key_for(&self.user_id, self.date)
    }

    #[must_use]
    pub fn contains(&self, problem_id: &str) -> bool {
        self.solved_problem_ids.iter().any(|id| id == problem_id)
    }

    /// Count a solve once. Returns `false` when the problem was already counted.
    pub fn record(&mut self, problem_id: &str, difficulty: Difficulty) -> bool {
        if self.contains(problem_id) {
            return false;
        }
        self.solved_problem_ids.push(problem_id.to_string());
        self.total_count = self.total_count.saturating_add(1);
        self.counts.increment(difficulty);
        true
    }

    #[must_use]
    pub fn xp_earned(&self) -> u64 {
        self.counts.xp()
    }
}
