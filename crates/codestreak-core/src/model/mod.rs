//! Records owned by the progress components.

pub mod daily;
pub mod difficulty;
pub mod profile;
pub mod solve;
pub mod streak;

pub use daily::{DailyAggregate, DifficultyCounts};
pub use difficulty::{ClassicTier, Difficulty, ParseDifficultyError};
pub use profile::{Level, Tier, UserProfile};
pub use solve::{DEFAULT_PLATFORM, SolveEvent};
pub use streak::{StreakState, Touch};
