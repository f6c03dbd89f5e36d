use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::challenge::ChallengeMix;
use crate::leaderboard::{DEFAULT_STREAK_LIMIT, DEFAULT_XP_LIMIT};
use crate::report::{DEFAULT_ACTIVITY_DAYS, WEEKLY_DAYS};

/// Directory under the project root holding config and the database.
pub const PROJECT_DIR: &str = ".codestreak";
/// Overrides `[storage] path`.
pub const DB_ENV: &str = "CODESTREAK_DB";
/// Supplies the user identity when no flag is given.
pub const USER_ENV: &str = "CODESTREAK_USER";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub activity: ActivityConfig,
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
    #[serde(default)]
    pub challenge: ChallengeConfig,
    #[serde(default)]
    pub solve: SolveConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Relative paths resolve against the project root.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityConfig {
    #[serde(default = "default_activity_days")]
    pub default_days: usize,
    #[serde(default = "default_weekly_days")]
    pub weekly_days: usize,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            default_days: default_activity_days(),
            weekly_days: default_weekly_days(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    #[serde(default = "default_xp_limit")]
    pub limit: usize,
    #[serde(default = "default_streak_limit")]
    pub streak_limit: usize,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            limit: default_xp_limit(),
            streak_limit: default_streak_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeConfig {
    /// Judge problemset snapshot the daily challenges are drawn from.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    #[serde(default = "default_easy")]
    pub easy: usize,
    #[serde(default = "default_medium")]
    pub medium: usize,
    #[serde(default = "default_hard")]
    pub hard: usize,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            easy: default_easy(),
            medium: default_medium(),
            hard: default_hard(),
        }
    }
}

impl ChallengeConfig {
    #[must_use]
    pub const fn mix(&self) -> ChallengeMix {
        ChallengeMix {
            easy: self.easy,
            medium: self.medium,
            hard: self.hard,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveConfig {
    /// Question-bank catalog used to look up titles and difficulties.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Identity used when neither `--user` nor `CODESTREAK_USER` is set.
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
}

/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(PROJECT_DIR).join("config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };
    load_user_config_from(&config_dir.join("codestreak/config.toml"))
}

fn load_user_config_from(path: &Path) -> Result<UserConfig> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Database location: `CODESTREAK_DB` if set, then `[storage] path`, then
/// `.codestreak/codestreak.db`. Relative paths resolve against the project
/// root.
#[must_use]
pub fn resolve_db_path(
    project_root: &Path,
    config: &ProjectConfig,
    env_override: Option<&str>,
) -> PathBuf {
    let chosen = env_override
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| config.storage.path.clone())
        .unwrap_or_else(|| PathBuf::from(PROJECT_DIR).join("codestreak.db"));

    if chosen.is_absolute() {
        chosen
    } else {
        project_root.join(chosen)
    }
}

/// Resolve a config-relative path against the project root.
#[must_use]
pub fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}

/// Default config file written by `cstreak init`.
#[must_use]
pub fn default_config_toml() -> String {
    format!(
        "[storage]\n\
         # path = \"{PROJECT_DIR}/codestreak.db\"\n\
         \n\
         [activity]\n\
         default_days = {DEFAULT_ACTIVITY_DAYS}\n\
         weekly_days = {WEEKLY_DAYS}\n\
         \n\
         [leaderboard]\n\
         limit = {DEFAULT_XP_LIMIT}\n\
         streak_limit = {DEFAULT_STREAK_LIMIT}\n\
         \n\
         [challenge]\n\
         # catalog = \"problemset.json\"\n\
         easy = 2\n\
         medium = 2\n\
         hard = 1\n\
         \n\
         [solve]\n\
         # catalog = \"questions.json\"\n"
    )
}

const fn default_activity_days() -> usize {
    DEFAULT_ACTIVITY_DAYS
}

const fn default_weekly_days() -> usize {
    WEEKLY_DAYS
}

const fn default_xp_limit() -> usize {
    DEFAULT_XP_LIMIT
}

const fn default_streak_limit() -> usize {
    DEFAULT_STREAK_LIMIT
}

const fn default_easy() -> usize {
    2
}

const fn default_medium() -> usize {
    2
}

const fn default_hard() -> usize {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = tempfile::tempdir().expect("temp dir");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.activity.default_days, 30);
        assert_eq!(cfg.activity.weekly_days, 7);
        assert_eq!(cfg.leaderboard.limit, 100);
        assert_eq!(cfg.challenge.mix(), ChallengeMix::default());
        assert!(cfg.storage.path.is_none());
    }

    #[test]
    fn partial_sections_keep_field_defaults() {
        let root = tempfile::tempdir().expect("temp dir");
        let dir = root.path().join(PROJECT_DIR);
        std::fs::create_dir_all(&dir).expect("create dir");
        std::fs::write(
            dir.join("config.toml"),
            "[activity]\ndefault_days = 14\n\n[challenge]\nhard = 3\n",
        )
        .expect("write config");

        let cfg = load_project_config(root.path()).expect("load");
        assert_eq!(cfg.activity.default_days, 14);
        assert_eq!(cfg.activity.weekly_days, 7);
        assert_eq!(cfg.challenge.mix().hard, 3);
        assert_eq!(cfg.challenge.mix().easy, 2);
    }

    #[test]
    fn malformed_project_config_is_an_error() {
        let root = tempfile::tempdir().expect("temp dir");
        let dir = root.path().join(PROJECT_DIR);
        std::fs::create_dir_all(&dir).expect("create dir");
        std::fs::write(dir.join("config.toml"), "[activity\n").expect("write config");

        let err = load_project_config(root.path()).expect_err("parse failure");
        assert!(format!("{err:#}").contains("Failed to parse"));
    }

    #[test]
    fn generated_config_parses_to_defaults() {
        let cfg: ProjectConfig = toml::from_str(&default_config_toml()).expect("parse");
        assert_eq!(cfg, ProjectConfig::default());
    }

    #[test]
    fn db_path_prefers_env_then_config_then_default() {
        let root = Path::new("/work/repo");
        let mut cfg = ProjectConfig::default();
        assert_eq!(
            resolve_db_path(root, &cfg, None),
            PathBuf::from("/work/repo/.codestreak/codestreak.db")
        );

        cfg.storage.path = Some(PathBuf::from("data/progress.db"));
        assert_eq!(
            resolve_db_path(root, &cfg, None),
            PathBuf::from("/work/repo/data/progress.db")
        );
        assert_eq!(
            resolve_db_path(root, &cfg, Some("/tmp/other.db")),
            PathBuf::from("/tmp/other.db")
        );
        assert_eq!(
            resolve_db_path(root, &cfg, Some("  ")),
            PathBuf::from("/work/repo/data/progress.db")
        );
    }

    #[test]
    fn user_config_parses_identity() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "user = \"alice\"\noutput = \"json\"\n").expect("write");

        let cfg = load_user_config_from(&path).expect("load");
        assert_eq!(cfg.user.as_deref(), Some("alice"));
        assert_eq!(cfg.output.as_deref(), Some("json"));
        assert_eq!(
            load_user_config_from(&dir.path().join("missing.toml")).expect("default"),
            UserConfig::default()
        );
    }
}
