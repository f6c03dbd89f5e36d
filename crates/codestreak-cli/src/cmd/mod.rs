pub mod activity;
pub mod completions;
pub mod daily;
pub mod history;
pub mod init;
pub mod leaderboard;
pub mod platform;
pub mod profile;
pub mod questions;
pub mod resume;
pub mod solve;
pub mod stats;
pub mod streak;

use std::path::Path;

use anyhow::Result;
use codestreak_core::config::{self, DB_ENV, ProjectConfig};
use codestreak_core::db::{self, SqliteStore};
use codestreak_core::report::Reports;
use codestreak_core::{ErrorCode, ProgressOrchestrator, SystemClock};

use crate::identity;
use crate::output::{OutputMode, fail_with};

/// Per-invocation settings shared by every command.
pub struct Context<'a> {
    pub project_root: &'a Path,
    pub output: OutputMode,
    pub user_flag: Option<&'a str>,
    pub configured_user: Option<&'a str>,
}

impl Context<'_> {
    pub fn resolve_user(&self) -> Option<String> {
        identity::resolve_user(self.user_flag, self.configured_user)
    }

    pub fn require_user(&self) -> Result<String> {
        identity::require_user(self.user_flag, self.configured_user, self.output)
    }

    pub fn project_config(&self) -> Result<ProjectConfig> {
        config::load_project_config(self.project_root)
            .map_err(|err| fail_with(self.output, ErrorCode::ConfigParseError, format!("{err:#}")))
    }

    /// Load the project config and open the existing store.
    pub fn open(&self) -> Result<Session> {
        let config = self.project_config()?;
        let db_path = config::resolve_db_path(
            self.project_root,
            &config,
            std::env::var(DB_ENV).ok().as_deref(),
        );

        let store = match db::try_open_store(&db_path) {
            Ok(Some(store)) => store,
            Ok(None) => {
                return Err(fail_with(
                    self.output,
                    ErrorCode::NotInitialized,
                    format!("no tracker database at {}", db_path.display()),
                ));
            }
            Err(err) => {
                return Err(fail_with(
                    self.output,
                    ErrorCode::StorageUnavailable,
                    format!("{err:#}"),
                ));
            }
        };

        Ok(Session {
            config,
            store,
            clock: SystemClock,
        })
    }
}

/// An opened project: config, store and wall clock.
pub struct Session {
    pub config: ProjectConfig,
    pub store: SqliteStore,
    pub clock: SystemClock,
}

impl Session {
    pub const fn engine(&self) -> ProgressOrchestrator<'_> {
        ProgressOrchestrator::new(&self.store, &self.clock)
    }

    pub const fn reports(&self) -> Reports<'_> {
        Reports::new(&self.store, &self.clock)
    }
}
