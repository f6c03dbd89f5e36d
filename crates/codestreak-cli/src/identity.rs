//! User identity resolution for CLI commands.
//!
//! The resolution chain: `--user` flag > `CODESTREAK_USER` env > `user` in the
//! user config > `USER` env (TTY only). Commands that read or write one
//! user's progress require an identity; leaderboards and `daily` work without
//! one.

use std::env;

use codestreak_core::ErrorCode;
use codestreak_core::config::USER_ENV;

use crate::output::{OutputMode, fail_with};

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
    fn is_tty(&self) -> bool;
}

struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    fn is_tty(&self) -> bool {
        use std::io::IsTerminal;
        std::io::stdin().is_terminal()
    }
}

fn resolve_user_with(
    cli_flag: Option<&str>,
    configured: Option<&str>,
    env: &dyn EnvReader,
) -> Option<String> {
    if let Some(user) = cli_flag.map(str::trim).filter(|u| !u.is_empty()) {
        return Some(user.to_string());
    }

    if let Some(val) = env.get(USER_ENV) {
        return Some(val.trim().to_string());
    }

    if let Some(user) = configured.map(str::trim).filter(|u| !u.is_empty()) {
        return Some(user.to_string());
    }

    if env.is_tty()
        && let Some(val) = env.get("USER")
    {
        return Some(val.trim().to_string());
    }

    None
}

/// Resolve the user identity, or `None` when nothing in the chain is set.
pub fn resolve_user(cli_flag: Option<&str>, configured: Option<&str>) -> Option<String> {
    resolve_user_with(cli_flag, configured, &RealEnv)
}

/// Resolve the user identity, rendering the unauthenticated error when it is
/// missing.
pub fn require_user(
    cli_flag: Option<&str>,
    configured: Option<&str>,
    output: OutputMode,
) -> anyhow::Result<String> {
    resolve_user(cli_flag, configured).ok_or_else(|| {
        fail_with(
            output,
            ErrorCode::Unauthenticated,
            "User identity required for this command.",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockEnv {
        vars: HashMap<String, String>,
        tty: bool,
    }

    impl MockEnv {
        fn new() -> Self {
            Self {
                vars: HashMap::new(),
                tty: false,
            }
        }

        fn var(mut self, key: &str, val: &str) -> Self {
            self.vars.insert(key.to_string(), val.to_string());
            self
        }

        fn tty(mut self) -> Self {
            self.tty = true;
            self
        }
    }

    impl EnvReader for MockEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.vars.get(key).filter(|v| !v.trim().is_empty()).cloned()
        }

        fn is_tty(&self) -> bool {
            self.tty
        }
    }

    #[test]
    fn flag_wins_over_everything() {
        let env = MockEnv::new().var(USER_ENV, "env-user").var("USER", "shell").tty();
        assert_eq!(
            resolve_user_with(Some("flag-user"), Some("cfg"), &env),
            Some("flag-user".to_string())
        );
    }

    #[test]
    fn blank_flag_falls_through() {
        let env = MockEnv::new().var(USER_ENV, "env-user");
        assert_eq!(
            resolve_user_with(Some("  "), None, &env),
            Some("env-user".to_string())
        );
    }

    #[test]
    fn env_wins_over_config() {
        let env = MockEnv::new().var(USER_ENV, "env-user");
        assert_eq!(
            resolve_user_with(None, Some("cfg"), &env),
            Some("env-user".to_string())
        );
    }

    #[test]
    fn config_wins_over_shell_user() {
        let env = MockEnv::new().var("USER", "shell").tty();
        assert_eq!(resolve_user_with(None, Some("cfg"), &env), Some("cfg".to_string()));
    }

    #[test]
    fn shell_user_only_on_tty() {
        let piped = MockEnv::new().var("USER", "shell");
        assert_eq!(resolve_user_with(None, None, &piped), None);

        let tty = MockEnv::new().var("USER", "shell").tty();
        assert_eq!(resolve_user_with(None, None, &tty), Some("shell".to_string()));
    }

    #[test]
    fn nothing_set_is_unauthenticated() {
        assert_eq!(resolve_user_with(None, None, &MockEnv::new().tty()), None);
    }
}
