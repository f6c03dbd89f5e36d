//! `cstreak platform-stats`: totals across every user.

use anyhow::Result;
use clap::Args;

use super::Context;
use crate::output::{fail, pretty_kv, pretty_section, render};

#[derive(Args, Debug, Default)]
pub struct PlatformStatsArgs {}

/// Execute `cstreak platform-stats`. No identity needed.
///
/// # Errors
///
/// Returns an error for an uninitialized project or a storage failure.
pub fn run_platform_stats(_args: &PlatformStatsArgs, ctx: &Context<'_>) -> Result<()> {
    let session = ctx.open()?;
    let stats = session
        .reports()
        .platform_stats()
        .map_err(|err| fail(ctx.output, err))?;

    render(ctx.output, &stats, |s, w| {
        pretty_section(w, "Platform totals")?;
        pretty_kv(w, "Users", s.total_users.to_string())?;
        pretty_kv(w, "XP awarded", s.total_xp.to_string())?;
        pretty_kv(w, "Problems solved", s.total_problems_solved.to_string())?;
        pretty_kv(w, "Active streaks", s.active_streaks.to_string())
    })
}
