//! `cstreak resume`: finish solves whose effects were interrupted.

use anyhow::Result;
use clap::Args;
use codestreak_core::progress::Resumed;
use serde::Serialize;

use super::Context;
use crate::output::{fail, render};

#[derive(Args, Debug)]
pub struct ResumeArgs {
    /// Resume pending solves of every user, not just the current one.
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
struct ResumeReport {
    resumed: Vec<Resumed>,
}

/// Execute `cstreak resume`.
///
/// # Errors
///
/// Returns an error for a missing identity (without `--all`), an
/// uninitialized project or a storage failure.
pub fn run_resume(args: &ResumeArgs, ctx: &Context<'_>) -> Result<()> {
    let user_id = if args.all {
        None
    } else {
        Some(ctx.require_user()?)
    };
    let session = ctx.open()?;

    let resumed = session
        .engine()
        .resume_pending(user_id.as_deref())
        .map_err(|err| fail(ctx.output, err))?;

    render(ctx.output, &ResumeReport { resumed }, |r, w| {
        if r.resumed.is_empty() {
            return writeln!(w, "✓ Nothing pending.");
        }
        for item in &r.resumed {
            let note = if item.streak_rejected {
                " (streak unchanged: activity date out of order)"
            } else {
                ""
            };
            writeln!(
                w,
                "✓ {} / {}: +{} XP{note}",
                item.user_id, item.problem_id, item.summary.xp_earned
            )?;
        }
        Ok(())
    })
}
