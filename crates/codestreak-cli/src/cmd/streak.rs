//! `cstreak streak`: current and best streak.

use anyhow::Result;
use clap::Args;
use codestreak_core::StreakState;
use codestreak_core::clock::Clock;

use super::Context;
use crate::output::{fail, pretty_kv, pretty_section, render};

#[derive(Args, Debug, Default)]
pub struct StreakArgs {}

/// Execute `cstreak streak`. Users without activity get a zeroed state.
///
/// # Errors
///
/// Returns an error for a missing identity, an uninitialized project or a
/// storage failure.
pub fn run_streak(_args: &StreakArgs, ctx: &Context<'_>) -> Result<()> {
    let user_id = ctx.require_user()?;
    let session = ctx.open()?;
    let state = session
        .engine()
        .streaks()
        .get(&user_id)
        .map_err(|err| fail(ctx.output, err))?;
    let today = session.clock.today();

    render(ctx.output, &state, |s: &StreakState, w| {
        pretty_section(w, &format!("Streak for {}", s.user_id))?;
        pretty_kv(w, "Current", format!("{} day(s)", s.current_streak))?;
        pretty_kv(w, "Best", format!("{} day(s)", s.best_streak))?;
        pretty_kv(w, "Days active", s.total_solved.to_string())?;
        match s.last_activity_date {
            Some(last) if last == today => pretty_kv(w, "Last activity", "today"),
            Some(last) => pretty_kv(w, "Last activity", last.to_string()),
            None => writeln!(w, "No activity yet. Solve a problem to start a streak."),
        }
    })
}
