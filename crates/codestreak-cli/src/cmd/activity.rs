//! `cstreak activity`: per-day activity history.

use anyhow::Result;
use clap::Args;
use codestreak_core::report::{ActivityDay, DifficultyDay};
use serde::Serialize;

use super::Context;
use crate::output::{fail, pretty_section, render};

#[derive(Args, Debug)]
pub struct ActivityArgs {
    /// Number of active days to show. Defaults to `[activity] default_days`.
    #[arg(long)]
    pub days: Option<usize>,

    /// Break each day down by difficulty instead of XP.
    #[arg(long)]
    pub by_difficulty: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Rows {
    Activity(Vec<ActivityDay>),
    Difficulty(Vec<DifficultyDay>),
}

impl Rows {
    fn is_empty(&self) -> bool {
        match self {
            Self::Activity(rows) => rows.is_empty(),
            Self::Difficulty(rows) => rows.is_empty(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ActivityReport {
    user_id: String,
    days: usize,
    activity: Rows,
}

/// Execute `cstreak activity`.
///
/// # Errors
///
/// Returns an error for a missing identity, an uninitialized project or a
/// storage failure.
pub fn run_activity(args: &ActivityArgs, ctx: &Context<'_>) -> Result<()> {
    let user_id = ctx.require_user()?;
    let session = ctx.open()?;
    let days = args.days.unwrap_or(session.config.activity.default_days);
    let reports = session.reports();

    let activity = if args.by_difficulty {
        Rows::Difficulty(
            reports
                .difficulty_progress(&user_id, days)
                .map_err(|err| fail(ctx.output, err))?,
        )
    } else {
        Rows::Activity(
            reports
                .activity_history(&user_id, days)
                .map_err(|err| fail(ctx.output, err))?,
        )
    };

    let report = ActivityReport {
        user_id,
        days,
        activity,
    };
    render(ctx.output, &report, |r, w| {
        pretty_section(w, &format!("Activity for {} (last {} active days)", r.user_id, r.days))?;
        if r.activity.is_empty() {
            return writeln!(w, "No activity yet.");
        }
        match &r.activity {
            Rows::Activity(rows) => {
                for day in rows {
                    writeln!(
                        w,
                        "{}  {:>3} solved  {:>5}xp",
                        day.date, day.problems_completed, day.xp_earned
                    )?;
                }
                Ok(())
            }
            Rows::Difficulty(rows) => {
                writeln!(w, "{:<10}  easy  moderate  hard  difficult", "date")?;
                for day in rows {
                    let c = &day.counts;
                    writeln!(
                        w,
                        "{}  {:>4}  {:>8}  {:>4}  {:>9}",
                        day.date, c.easy, c.moderate, c.hard, c.difficult
                    )?;
                }
                Ok(())
            }
        }
    })
}
