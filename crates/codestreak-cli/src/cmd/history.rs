//! `cstreak history`: the user's solved problems, newest first.

use anyhow::Result;
use clap::Args;
use codestreak_core::Difficulty;
use codestreak_core::model::SolveEvent;
use serde::Serialize;

use super::Context;
use crate::output::{fail, pretty_section, render};

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Only show solves of this difficulty.
    #[arg(long, value_parser = Difficulty::parse_any)]
    pub difficulty: Option<Difficulty>,

    /// Show at most this many solves.
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct History {
    user_id: String,
    total: usize,
    solves: Vec<SolveEvent>,
}

/// Execute `cstreak history`.
///
/// # Errors
///
/// Returns an error for a missing identity, an uninitialized project or a
/// storage failure.
pub fn run_history(args: &HistoryArgs, ctx: &Context<'_>) -> Result<()> {
    let user_id = ctx.require_user()?;
    let session = ctx.open()?;

    let mut solves = session
        .engine()
        .ledger()
        .list_solves(&user_id, args.difficulty)
        .map_err(|err| fail(ctx.output, err))?;
    let total = solves.len();
    if let Some(limit) = args.limit {
        solves.truncate(limit);
    }

    let history = History {
        user_id,
        total,
        solves,
    };
    render(ctx.output, &history, |h, w| {
        pretty_section(w, &format!("Solved problems for {} ({})", h.user_id, h.total))?;
        if h.solves.is_empty() {
            return writeln!(w, "Nothing solved yet.");
        }
        for s in &h.solves {
            writeln!(
                w,
                "{}  {:<10} {:>4}xp  {:<24} {}",
                s.solved_at.format("%Y-%m-%d %H:%M"),
                s.difficulty.as_str(),
                s.xp_earned,
                s.problem_id,
                s.problem_title
            )?;
        }
        Ok(())
    })
}
