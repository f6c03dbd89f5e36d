//! `cstreak questions` and `cstreak today`: the static question bank.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use codestreak_core::Difficulty;
use codestreak_core::catalog::{QuestionStatus, StaticCatalog, TODAYS_QUESTIONS};
use codestreak_core::clock::Clock;
use codestreak_core::config;
use serde::Serialize;

use super::{Context, Session};
use crate::output::{fail, fail_plain, pretty_kv, pretty_section, render};

#[derive(Args, Debug)]
pub struct QuestionsArgs {
    /// Show a single question instead of the list.
    pub problem_id: Option<String>,

    /// Only list questions of this difficulty.
    #[arg(long, value_parser = Difficulty::parse_any)]
    pub difficulty: Option<Difficulty>,

    /// Problem catalog (JSON). Overrides `[solve] catalog`.
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct TodayArgs {
    /// Problem catalog (JSON). Overrides `[solve] catalog`.
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct QuestionList {
    user_id: String,
    total: usize,
    completed: usize,
    questions: Vec<QuestionStatus>,
}

#[derive(Debug, Serialize)]
struct TodayList {
    date: NaiveDate,
    user_id: String,
    completed_today: usize,
    questions: Vec<QuestionStatus>,
}

/// Load the question bank named by `catalog_flag` or `[solve] catalog`.
///
/// # Errors
///
/// Fails when no catalog is configured or the file cannot be parsed.
pub fn load_question_bank(
    ctx: &Context<'_>,
    session: &Session,
    catalog_flag: Option<&Path>,
) -> Result<StaticCatalog> {
    let Some(path) = catalog_flag.or(session.config.solve.catalog.as_deref()) else {
        return Err(fail_plain(
            ctx.output,
            "no problem catalog configured",
            "Pass --catalog or set [solve] catalog in .codestreak/config.toml.",
        ));
    };
    StaticCatalog::load(&config::resolve_path(ctx.project_root, path)).map_err(|err| {
        fail_plain(
            ctx.output,
            format!("{err:#}"),
            "Check the catalog path and its JSON format.",
        )
    })
}

fn question_line(w: &mut dyn std::io::Write, q: &QuestionStatus) -> std::io::Result<()> {
    let mark = if q.completed { "✓" } else { " " };
    writeln!(
        w,
        "[{mark}] {:<24} {:<10} {:>4}xp  {}",
        q.entry.id,
        q.entry.difficulty.as_str(),
        q.xp_reward,
        q.entry.title
    )
}

/// Execute `cstreak questions`.
///
/// # Errors
///
/// Returns an error for a missing identity or catalog, an unknown problem id,
/// an uninitialized project or a storage failure.
pub fn run_questions(args: &QuestionsArgs, ctx: &Context<'_>) -> Result<()> {
    let user_id = ctx.require_user()?;
    let session = ctx.open()?;
    let bank = load_question_bank(ctx, &session, args.catalog.as_deref())?;
    let ledger = session.engine().ledger();

    if let Some(problem_id) = &args.problem_id {
        let question = bank
            .question(&ledger, &user_id, problem_id)
            .map_err(|err| fail(ctx.output, err))?;
        return render(ctx.output, &question, |q, w| {
            pretty_section(w, &q.entry.title)?;
            pretty_kv(w, "ID", &q.entry.id)?;
            pretty_kv(w, "Difficulty", q.entry.difficulty.as_str())?;
            pretty_kv(w, "XP", q.xp_reward.to_string())?;
            if let Some(platform) = &q.entry.platform {
                pretty_kv(w, "Platform", platform)?;
            }
            if let Some(url) = &q.entry.url {
                pretty_kv(w, "URL", url)?;
            }
            match q.completed_at {
                Some(at) => pretty_kv(w, "Completed", at.format("%Y-%m-%d %H:%M").to_string()),
                None => pretty_kv(w, "Completed", "no"),
            }
        });
    }

    let questions = bank
        .browse(&ledger, &user_id, args.difficulty)
        .map_err(|err| fail(ctx.output, err))?;
    let list = QuestionList {
        user_id,
        total: questions.len(),
        completed: questions.iter().filter(|q| q.completed).count(),
        questions,
    };
    render(ctx.output, &list, |l, w| {
        pretty_section(
            w,
            &format!("Questions for {} ({}/{} done)", l.user_id, l.completed, l.total),
        )?;
        if l.questions.is_empty() {
            return writeln!(w, "No questions match.");
        }
        for q in &l.questions {
            question_line(w, q)?;
        }
        Ok(())
    })
}

/// Execute `cstreak today`.
///
/// # Errors
///
/// Returns an error for a missing identity or catalog, an uninitialized
/// project or a storage failure.
pub fn run_today(args: &TodayArgs, ctx: &Context<'_>) -> Result<()> {
    let user_id = ctx.require_user()?;
    let session = ctx.open()?;
    let bank = load_question_bank(ctx, &session, args.catalog.as_deref())?;
    let today = session.clock.today();

    let questions = bank
        .todays_questions(&session.engine().ledger(), &user_id, today, TODAYS_QUESTIONS)
        .map_err(|err| fail(ctx.output, err))?;
    let list = TodayList {
        date: today,
        user_id,
        completed_today: questions.iter().filter(|q| q.completed).count(),
        questions,
    };
    render(ctx.output, &list, |l, w| {
        pretty_section(w, &format!("Questions for {}", l.date))?;
        if l.questions.is_empty() {
            return writeln!(w, "Every question in the bank is solved.");
        }
        for q in &l.questions {
            question_line(w, q)?;
        }
        writeln!(w, "{}/{} done today", l.completed_today, l.questions.len())
    })
}
