use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Internal four-level difficulty scale.
///
/// Every XP computation and every stored record uses this scale. Sources that
/// grade on the three-level scale go through [`ClassicTier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Moderate,
    Hard,
    Difficult,
}

impl Difficulty {
    pub const ALL: [Self; 4] = [Self::Easy, Self::Moderate, Self::Hard, Self::Difficult];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Moderate => "moderate",
            Self::Hard => "hard",
            Self::Difficult => "difficult",
        }
    }

    /// Accept either vocabulary, case-insensitively.
    ///
    /// `medium` maps to [`Difficulty::Moderate`]; everything else must name a
    /// level of the internal scale.
    ///
    /// # Errors
    ///
    /// Returns [`ParseDifficultyError`] for any other input.
    pub fn parse_any(raw: &str) -> Result<Self, ParseDifficultyError> {
        raw.parse::<Self>()
            .or_else(|_| raw.parse::<ClassicTier>().map(Self::from))
            .map_err(|_| ParseDifficultyError::new("difficulty", raw))
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "moderate" => Ok(Self::Moderate),
            "hard" => Ok(Self::Hard),
            "difficult" => Ok(Self::Difficult),
            _ => Err(ParseDifficultyError::new("difficulty", s)),
        }
    }
}

/// Three-level scale used by judge problemsets (`Easy`/`Medium`/`Hard`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClassicTier {
    Easy,
    Medium,
    Hard,
}

impl ClassicTier {
    pub const ALL: [Self; 3] = [Self::Easy, Self::Medium, Self::Hard];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

impl fmt::Display for ClassicTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassicTier {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(ParseDifficultyError::new("tier", s)),
        }
    }
}

impl From<ClassicTier> for Difficulty {
    fn from(tier: ClassicTier) -> Self {
        match tier {
            ClassicTier::Easy => Self::Easy,
            ClassicTier::Medium => Self::Moderate,
            ClassicTier::Hard => Self::Hard,
        }
    }
}

/// Projection onto the three-level scale. `Difficult` folds into `Hard`.
impl From<Difficulty> for ClassicTier {
    fn from(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self::Easy,
            Difficulty::Moderate => Self::Medium,
            Difficulty::Hard | Difficulty::Difficult => Self::Hard,
        }
    }
}

/// Error returned when difficulty text matches no known level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {expected}: '{got}'")]
pub struct ParseDifficultyError {
    pub expected: &'static str,
    pub got: String,
}

impl ParseDifficultyError {
    fn new(expected: &'static str, got: &str) -> Self {
        Self {
            expected,
            got: got.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_scale_parses_case_insensitively() {
        assert_eq!("Easy".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert_eq!(" DIFFICULT ".parse::<Difficulty>(), Ok(Difficulty::Difficult));
        assert!("medium".parse::<Difficulty>().is_err());
    }

    #[test]
    fn classic_scale_rejects_internal_only_levels() {
        assert_eq!("Medium".parse::<ClassicTier>(), Ok(ClassicTier::Medium));
        assert!("moderate".parse::<ClassicTier>().is_err());
        assert!("difficult".parse::<ClassicTier>().is_err());
    }

    #[test]
    fn parse_any_accepts_both_vocabularies() {
        assert_eq!(Difficulty::parse_any("medium"), Ok(Difficulty::Moderate));
        assert_eq!(Difficulty::parse_any("Moderate"), Ok(Difficulty::Moderate));
        assert_eq!(Difficulty::parse_any("HARD"), Ok(Difficulty::Hard));
        let err = Difficulty::parse_any("insane").expect_err("unknown level");
        assert_eq!(err.to_string(), "invalid difficulty: 'insane'");
    }

    #[test]
    fn classic_projection_folds_difficult_into_hard() {
        for tier in ClassicTier::ALL {
            assert_eq!(ClassicTier::from(Difficulty::from(tier)), tier);
        }
        assert_eq!(ClassicTier::from(Difficulty::Difficult), ClassicTier::Hard);
    }

    #[test]
    fn serde_uses_each_scale_spelling() {
        let json = serde_json::to_string(&Difficulty::Moderate).expect("serialize");
        assert_eq!(json, "\"moderate\"");
        let tier: ClassicTier = serde_json::from_str("\"Medium\"").expect("deserialize");
        assert_eq!(tier, ClassicTier::Medium);
    }
}
