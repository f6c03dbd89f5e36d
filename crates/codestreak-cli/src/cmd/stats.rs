//! `cstreak stats`: lifetime totals and the weekly report.

use anyhow::Result;
use clap::Args;
use codestreak_core::TrackerError;
use codestreak_core::report::{HistoryOverview, WeeklyReport};
use serde::Serialize;

use super::Context;
use crate::output::{fail, pretty_kv, pretty_section, render};

#[derive(Args, Debug, Default)]
pub struct StatsArgs {}

#[derive(Debug, Serialize)]
struct Stats {
    user_id: String,
    overview: HistoryOverview,
    /// `None` until the user has a profile.
    weekly: Option<WeeklyReport>,
}

/// Execute `cstreak stats`.
///
/// # Errors
///
/// Returns an error for a missing identity, an uninitialized project or a
/// storage failure.
pub fn run_stats(_args: &StatsArgs, ctx: &Context<'_>) -> Result<()> {
    let user_id = ctx.require_user()?;
    let session = ctx.open()?;
    let reports = session.reports();

    let overview = reports
        .history_overview(&user_id, session.config.activity.default_days)
        .map_err(|err| fail(ctx.output, err))?;
    let weekly = match reports.weekly_report(&user_id, session.config.activity.weekly_days) {
        Ok(report) => Some(report),
        Err(TrackerError::UserNotFound(_)) => None,
        Err(err) => return Err(fail(ctx.output, err)),
    };

    let stats = Stats {
        user_id,
        overview,
        weekly,
    };
    render(ctx.output, &stats, |s, w| {
        let o = &s.overview;
        pretty_section(w, &format!("Stats for {}", s.user_id))?;
        pretty_kv(w, "Solved", o.total_completed.to_string())?;
        pretty_kv(w, "Days active", o.days_active.to_string())?;
        pretty_kv(w, "XP earned", o.total_xp_earned.to_string())?;
        pretty_kv(
            w,
            "By difficulty",
            format!(
                "easy {}, moderate {}, hard {}, difficult {}",
                o.counts.easy, o.counts.moderate, o.counts.hard, o.counts.difficult
            ),
        )?;
        for platform in &o.by_platform {
            pretty_kv(w, &platform.platform, platform.solved.to_string())?;
        }

        if let Some(week) = &s.weekly {
            writeln!(w)?;
            pretty_section(w, &format!("Week {} .. {}", week.week_start, week.week_end))?;
            pretty_kv(w, "Solved", week.problems_solved.to_string())?;
            pretty_kv(w, "XP earned", week.xp_earned.to_string())?;
            pretty_kv(
                w,
                "Streak",
                format!("{} (best {})", week.current_streak, week.best_streak),
            )?;
        }
        Ok(())
    })
}
