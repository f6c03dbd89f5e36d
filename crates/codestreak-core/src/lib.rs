//! codestreak-core library.
//!
//! Tracks solved coding problems per user and derives everything else from
//! that ledger: daily activity, streaks, XP, levels and leaderboards.
//!
//! [`ProgressOrchestrator::complete_solve`] is the entry point for recording
//! a solve. It claims the solve in the ledger together with a pending-effects
//! record, then applies the profile, streak and daily-aggregate steps one at a
//! time so an interrupted request can be resumed without awarding XP twice.
//!
//! # Conventions
//!
//! - **Errors**: component operations return [`Result`] with a
//!   [`TrackerError`]; file loading returns `anyhow::Result`.
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `debug!`) with
//!   structured fields.
//! - **Time**: components read "now" through a [`Clock`], never directly.

pub mod aggregator;
pub mod cache;
pub mod catalog;
pub mod challenge;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod leaderboard;
pub mod ledger;
pub mod model;
pub mod profile;
pub mod progress;
pub mod report;
pub mod reward;
pub mod store;
pub mod streak;

pub use aggregator::DailyAggregator;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ErrorCode, Result, TrackerError};
pub use ledger::SolveLedger;
pub use model::{Difficulty, Level, SolveEvent, StreakState, UserProfile};
pub use profile::ProfileBook;
pub use progress::{CompleteSolve, Completion, ProgressOrchestrator, SolveSummary};
pub use report::Reports;
pub use store::{KvStore, MemoryStore};
pub use streak::StreakTracker;
