use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::store::ItemKey;

/// XP needed to advance one division.
pub const XP_PER_DIVISION: u64 = 500;

/// Public-facing user record: display name, cumulative XP and mirrored streaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: String,
    pub xp: u64,
    pub total_problems_solved: u64,
    pub current_streak: u32,
    pub best_streak: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    #[must_use]
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        let user_id = user_id.into();
        Self {
            display_name: user_id.clone(),
            user_id,
            xp: 0,
            total_problems_solved: 0,
            current_streak: 0,
            best_streak: 0,
            created_at: now,
            updated_at: now,
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

    #[must_use]
    pub const fn level(&self) -> Level {
        Level::from_xp(self.xp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl Tier {
    const ALL: [Self; 5] = [
        Self::Bronze,
        Self::Silver,
        Self::Gold,
        Self::Platinum,
        Self::Diamond,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
            Self::Diamond => "Diamond",
        }
    }
}

/// Display rank derived from XP, e.g. `Gold II`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Level {
    pub tier: Tier,
    /// 1..=3
    pub division: u8,
}

impl Level {
    const DIVISIONS: u64 = 3;

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_xp(xp: u64) -> Self {
        let last = (Tier::ALL.len() as u64) * Self::DIVISIONS - 1;
        let step = xp / XP_PER_DIVISION;
        let step = if step > last { last } else { step };
        Self {
            tier: Tier::ALL[(step / Self::DIVISIONS) as usize],
            division: (step % Self::DIVISIONS) as u8 + 1,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let numeral = match self.division {
            1 => "I",
            2 => "II",
            _ => "III",
        };
        write!(f, "{} {numeral}", self.tier.as_str())
    }
}

impl Serialize for Level {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
