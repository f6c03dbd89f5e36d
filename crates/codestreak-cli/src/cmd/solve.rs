//! `cstreak solve`: record a solved problem and award XP.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use codestreak_core::cache::DailyCache;
use codestreak_core::catalog::{self, CatalogEntry};
use codestreak_core::challenge::{self, ChallengeProblem};
use codestreak_core::{CompleteSolve, Difficulty, TrackerError};
use serde::Serialize;

use super::daily::todays_challenges;
use super::questions::load_question_bank;
use super::{Context, Session};
use crate::output::{fail, pretty_kv, render};

#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Problem id (catalog id, or `CF-<contest>-<index>` for a daily challenge).
    pub problem_id: String,

    /// Problem title. Looked up in the catalog when omitted.
    #[arg(long)]
    pub title: Option<String>,

    /// easy, moderate, hard or difficult (Easy/Medium/Hard also accepted).
    #[arg(long, value_parser = Difficulty::parse_any)]
    pub difficulty: Option<Difficulty>,

    /// Where the problem was solved.
    #[arg(long)]
    pub platform: Option<String>,

    /// Link to the accepted submission.
    #[arg(long)]
    pub url: Option<String>,

    /// Problem catalog (JSON) or, for challenge ids, a problemset snapshot.
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct SolveOutput<'a> {
    status: &'static str,
    problem_id: &'a str,
    xp_earned: u64,
    current_streak: u32,
    best_streak: u32,
}

/// Execute `cstreak solve`.
///
/// Both a new solve and a repeat of a recorded one succeed; a repeat reports
/// `already_completed` with zero XP.
///
/// # Errors
///
/// Returns an error for a missing identity, invalid input, an unknown
/// problem, out-of-order activity or a storage failure.
pub fn run_solve(
    args: &SolveArgs,
    ctx: &Context<'_>,
    challenges: &DailyCache<ChallengeProblem>,
) -> Result<()> {
    let user_id = ctx.require_user()?;
    let session = ctx.open()?;

    let entry = if args.title.is_some() && args.difficulty.is_some() {
        None
    } else {
        Some(lookup(args, ctx, &session, challenges)?)
    };

    let request = build_request(args, &user_id, entry).map_err(|err| fail(ctx.output, err))?;
    let completion = session
        .engine()
        .complete_solve(request)
        .map_err(|err| fail(ctx.output, err))?;

    let summary = completion.summary();
    let out = SolveOutput {
        status: completion.status(),
        problem_id: &args.problem_id,
        xp_earned: summary.xp_earned,
        current_streak: summary.current_streak,
        best_streak: summary.best_streak,
    };
    render(ctx.output, &out, |o, w| {
        if o.status == "completed" {
            writeln!(w, "✓ Solved {} (+{} XP)", o.problem_id, o.xp_earned)?;
        } else {
            writeln!(w, "{} was already completed; no XP awarded", o.problem_id)?;
        }
        pretty_kv(
            w,
            "Streak",
            format!("{} day(s), best {}", o.current_streak, o.best_streak),
        )
    })
}

fn lookup(
    args: &SolveArgs,
    ctx: &Context<'_>,
    session: &Session,
    challenges: &DailyCache<ChallengeProblem>,
) -> Result<CatalogEntry> {
    if challenge::parse_challenge_id(&args.problem_id).is_ok() {
        let today = todays_challenges(ctx, session, args.catalog.as_deref(), challenges)?;
        return catalog::resolve(&*today, &args.problem_id).map_err(|err| fail(ctx.output, err));
    }

    let Some(path) = args
        .catalog
        .as_deref()
        .or(session.config.solve.catalog.as_deref())
    else {
        let missing = if args.title.is_none() { "problem_title" } else { "difficulty" };
        return Err(fail(
            ctx.output,
            TrackerError::Validation {
                field: missing,
                reason: "required when no problem catalog is configured".to_string(),
            },
        ));
    };

    let bank = load_question_bank(ctx, session, Some(path))?;
    catalog::resolve(&bank, &args.problem_id).map_err(|err| fail(ctx.output, err))
}

/// Explicit flags win over catalog metadata.
fn build_request(
    args: &SolveArgs,
    user_id: &str,
    entry: Option<CatalogEntry>,
) -> codestreak_core::Result<CompleteSolve> {
    let (title, difficulty, platform) = match entry {
        Some(entry) => (
            args.title.clone().unwrap_or(entry.title),
            args.difficulty.unwrap_or(entry.difficulty),
            args.platform.clone().or(entry.platform),
        ),
        None => match (&args.title, args.difficulty) {
            (Some(title), Some(difficulty)) => (title.clone(), difficulty, args.platform.clone()),
            _ => {
                return Err(TrackerError::Validation {
                    field: "difficulty",
                    reason: "title and difficulty are required".to_string(),
                });
            }
        },
    };

    let mut request = CompleteSolve::new(user_id, &args.problem_id, title, difficulty);
    request.platform = platform;
    request.submission_url.clone_from(&args.url);
    Ok(request)
}
