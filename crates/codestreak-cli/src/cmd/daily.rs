//! `cstreak daily`: today's challenge problems.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use codestreak_core::cache::DailyCache;
use codestreak_core::challenge::{self, BoardEntry, ChallengeProblem};
use codestreak_core::clock::Clock;
use codestreak_core::config;
use serde::Serialize;

use super::{Context, Session};
use crate::output::{fail, fail_plain, pretty_section, render};

#[derive(Args, Debug)]
pub struct DailyArgs {
    /// Judge problemset snapshot (JSON). Overrides `[challenge] catalog`.
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct DailyBoard {
    date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    challenges: Vec<BoardEntry>,
}

/// The day's challenge list, loaded through `cache`.
///
/// # Errors
///
/// Fails when no problemset is configured or the snapshot cannot be loaded.
pub fn todays_challenges(
    ctx: &Context<'_>,
    session: &Session,
    catalog_flag: Option<&Path>,
    cache: &DailyCache<ChallengeProblem>,
) -> Result<Arc<Vec<ChallengeProblem>>> {
    let Some(path) = catalog_flag.or(session.config.challenge.catalog.as_deref()) else {
        return Err(fail_plain(
            ctx.output,
            "no problemset snapshot configured",
            "Pass --catalog or set [challenge] catalog in .codestreak/config.toml.",
        ));
    };
    let path = config::resolve_path(ctx.project_root, path);
    let today = session.clock.today();
    let mix = session.config.challenge.mix();

    cache
        .get_or_refresh(today, || {
            let problems = challenge::load_problemset(&path)?;
            Ok::<_, anyhow::Error>(challenge::select_daily(&problems, today, &mix))
        })
        .map_err(|err| {
            fail_plain(
                ctx.output,
                format!("{err:#}"),
                "Check the problemset snapshot path and format.",
            )
        })
}

/// Execute `cstreak daily`.
///
/// # Errors
///
/// Returns an error if the project is not initialized, the problemset cannot
/// be loaded, or storage fails.
pub fn run_daily(
    args: &DailyArgs,
    ctx: &Context<'_>,
    cache: &DailyCache<ChallengeProblem>,
) -> Result<()> {
    let session = ctx.open()?;
    let challenges = todays_challenges(ctx, &session, args.catalog.as_deref(), cache)?;
    let today = session.clock.today();
    let user_id = ctx.resolve_user();

    let entries = match &user_id {
        Some(user) => challenge::daily_board(&challenges, &session.engine().ledger(), user, today)
            .map_err(|err| fail(ctx.output, err))?,
        None => challenges
            .iter()
            .map(|problem| BoardEntry {
                problem: problem.clone(),
                completed: false,
            })
            .collect(),
    };

    let board = DailyBoard {
        date: today,
        user_id,
        challenges: entries,
    };
    render(ctx.output, &board, |b, w| {
        pretty_section(w, &format!("Daily challenges for {}", b.date))?;
        if b.challenges.is_empty() {
            return writeln!(w, "No problems in the configured rating bands.");
        }
        for entry in &b.challenges {
            let mark = if entry.completed { "✓" } else { " " };
            let p = &entry.problem;
            writeln!(
                w,
                "[{mark}] {:<12} {:<6} {:>4}xp  {}",
                p.problem_id,
                p.tier.as_str(),
                p.xp_reward,
                p.title
            )?;
            writeln!(w, "    {}", p.problem_url)?;
        }
        Ok(())
    })
}
