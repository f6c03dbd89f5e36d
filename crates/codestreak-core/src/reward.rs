//! XP tiers and achievement badges.
//!
//! Everything here is pure: the orchestrator and the profile book decide when
//! to apply the values.

use serde::Serialize;

use crate::model::{ClassicTier, Difficulty, UserProfile};

/// XP awarded for one solve.
#[must_use]
pub const fn xp_for(difficulty: Difficulty) -> u64 {
    match difficulty {
        Difficulty::Easy => 50,
        Difficulty::Moderate => 100,
        Difficulty::Hard => 150,
        Difficulty::Difficult => 200,
    }
}

/// XP for a problem graded on the three-level scale.
#[must_use]
pub fn xp_for_tier(tier: ClassicTier) -> u64 {
    xp_for(Difficulty::from(tier))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub earned: bool,
}

struct Rule {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    earned: fn(&UserProfile) -> bool,
}

const RULES: &[Rule] = &[
    Rule {
        id: "first_problem",
        title: "First Problem",
        description: "Solved your first problem",
        earned: |p| p.total_problems_solved >= 1,
    },
    Rule {
        id: "streak_3",
        title: "3-Day Streak",
        description: "Maintained a 3-day streak",
        earned: |p| p.current_streak >= 3,
    },
    Rule {
        id: "ten_problems",
        title: "10 Problems",
        description: "Solved 10 problems",
        earned: |p| p.total_problems_solved >= 10,
    },
];

/// Every achievement with its earned flag for `profile`.
#[must_use]
pub fn achievements(profile: &UserProfile) -> Vec<Achievement> {
    RULES
        .iter()
        .map(|rule| Achievement {
            id: rule.id,
            title: rule.title,
            description: rule.description,
            earned: (rule.earned)(profile),
        })
        .collect()
}

/// Only the achievements `profile` has earned.
#[must_use]
pub fn earned_achievements(profile: &UserProfile) -> Vec<Achievement> {
    achievements(profile)
        .into_iter()
        .filter(|a| a.earned)
        .collect()
}
