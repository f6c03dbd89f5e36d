//! `cstreak leaderboard`: rankings by XP or by running streak.

use anyhow::Result;
use clap::{Args, ValueEnum};
use codestreak_core::leaderboard::{self, StreakStanding, XpStanding};
use serde::Serialize;

use super::Context;
use crate::output::{fail, pretty_section, render};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Board {
    Xp,
    Streak,
}

#[derive(Args, Debug)]
pub struct LeaderboardArgs {
    /// Ranking to show.
    #[arg(long, value_enum, default_value_t = Board::Xp)]
    pub by: Board,

    /// Number of entries. Defaults to `[leaderboard] limit` / `streak_limit`.
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Standings {
    Xp(Vec<XpStanding>),
    Streak(Vec<StreakStanding>),
}

#[derive(Debug, Serialize)]
struct Leaderboard {
    board: &'static str,
    standings: Standings,
}

/// Execute `cstreak leaderboard`. No identity needed.
///
/// # Errors
///
/// Returns an error for an uninitialized project or a storage failure.
pub fn run_leaderboard(args: &LeaderboardArgs, ctx: &Context<'_>) -> Result<()> {
    let session = ctx.open()?;
    let limits = &session.config.leaderboard;

    let (board, standings) = match args.by {
        Board::Xp => (
            "xp",
            Standings::Xp(
                leaderboard::xp_leaderboard(&session.store, args.limit.unwrap_or(limits.limit))
                    .map_err(|err| fail(ctx.output, err))?,
            ),
        ),
        Board::Streak => (
            "streak",
            Standings::Streak(
                leaderboard::streak_leaderboard(
                    &session.store,
                    args.limit.unwrap_or(limits.streak_limit),
                )
                .map_err(|err| fail(ctx.output, err))?,
            ),
        ),
    };

    render(ctx.output, &Leaderboard { board, standings }, |l, w| {
        match &l.standings {
            Standings::Xp(rows) => {
                pretty_section(w, "XP leaderboard")?;
                for s in rows {
                    writeln!(
                        w,
                        "{:>3}. {:<20} {:>7}xp  {:<13} {} solved",
                        s.rank,
                        s.display_name,
                        s.xp,
                        s.level.to_string(),
                        s.total_problems_solved
                    )?;
                }
                if rows.is_empty() {
                    writeln!(w, "No profiles yet.")?;
                }
            }
            Standings::Streak(rows) => {
                pretty_section(w, "Streak leaderboard")?;
                for s in rows {
                    writeln!(
                        w,
                        "{:>3}. {:<20} {:>4} day(s)  best {}",
                        s.rank, s.user_id, s.current_streak, s.best_streak
                    )?;
                }
                if rows.is_empty() {
                    writeln!(w, "No streaks yet.")?;
                }
            }
        }
        Ok(())
    })
}
