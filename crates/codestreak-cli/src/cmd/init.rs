//! `cstreak init`: create the project directory, config and database.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use codestreak_core::config::{self, DB_ENV, PROJECT_DIR};
use codestreak_core::{ErrorCode, db};
use serde::Serialize;

use super::Context;
use crate::output::{fail_with, pretty_kv, render};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Rewrite the default config even if `.codestreak/` already exists.
    /// Recorded progress is kept.
    #[arg(long)]
    pub force: bool,
}

const GITIGNORE: &str = "codestreak.db\ncodestreak.db-wal\ncodestreak.db-shm\n";

#[derive(Debug, Serialize)]
struct InitReport {
    ok: bool,
    project_dir: PathBuf,
    config: PathBuf,
    database: PathBuf,
}

/// Execute `cstreak init`. Creates:
///
/// ```text
/// .codestreak/
///   config.toml     (default project config)
///   .gitignore      (database files)
///   codestreak.db   (unless [storage] path or CODESTREAK_DB points elsewhere)
/// ```
///
/// # Errors
///
/// Returns an error if `.codestreak/config.toml` exists and `--force` is not
/// set, or if any filesystem or database operation fails.
pub fn run_init(args: &InitArgs, ctx: &Context<'_>) -> Result<()> {
    let project_dir = ctx.project_root.join(PROJECT_DIR);
    let config_path = project_dir.join("config.toml");

    if config_path.exists() && !args.force {
        return Err(fail_with(
            ctx.output,
            ErrorCode::ValidationFailed,
            format!(
                "{PROJECT_DIR}/ already exists. Use `cstreak init --force` to rewrite the config."
            ),
        ));
    }

    std::fs::create_dir_all(&project_dir)
        .with_context(|| format!("Failed to create {}", project_dir.display()))?;
    std::fs::write(&config_path, config::default_config_toml())
        .with_context(|| format!("Failed to write config: {}", config_path.display()))?;

    let gitignore_path = project_dir.join(".gitignore");
    std::fs::write(&gitignore_path, GITIGNORE)
        .with_context(|| format!("Failed to write .gitignore: {}", gitignore_path.display()))?;

    let config = ctx.project_config()?;
    let database = config::resolve_db_path(
        ctx.project_root,
        &config,
        std::env::var(DB_ENV).ok().as_deref(),
    );
    db::open_store(&database)
        .map_err(|err| fail_with(ctx.output, ErrorCode::StorageUnavailable, format!("{err:#}")))?;
    tracing::info!(path = %database.display(), "tracker initialized");

    let report = InitReport {
        ok: true,
        project_dir,
        config: config_path,
        database,
    };
    render(ctx.output, &report, |r, w| {
        writeln!(w, "✓ Initialized {PROJECT_DIR}/")?;
        writeln!(w)?;
        pretty_kv(w, "Config", r.config.display().to_string())?;
        pretty_kv(w, "Database", r.database.display().to_string())?;
        writeln!(w)?;
        writeln!(w, "Next steps:")?;
        writeln!(w, "  export CODESTREAK_USER=your-name")?;
        writeln!(w, "  cstreak solve two-sum --title \"Two Sum\" --difficulty easy")
    })
}
