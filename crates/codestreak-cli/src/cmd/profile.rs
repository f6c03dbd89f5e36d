//! `cstreak profile`: show or rename the user's profile.

use anyhow::Result;
use clap::Args;
use codestreak_core::reward::{self, Achievement};
use codestreak_core::{Level, UserProfile};
use serde::Serialize;

use super::Context;
use crate::output::{fail, pretty_kv, pretty_section, render};

#[derive(Args, Debug)]
pub struct ProfileArgs {
    /// Set the display name.
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
struct ProfileView {
    #[serde(flatten)]
    profile: UserProfile,
    level: Level,
    achievements: Vec<Achievement>,
}

/// Execute `cstreak profile`.
///
/// # Errors
///
/// Returns an error for a missing identity, a user without a profile (unless
/// `--name` enrolls them), an invalid name or a storage failure.
pub fn run_profile(args: &ProfileArgs, ctx: &Context<'_>) -> Result<()> {
    let user_id = ctx.require_user()?;
    let session = ctx.open()?;
    let book = session.engine().profiles();

    let profile = match &args.name {
        Some(name) => book.rename(&user_id, name),
        None => book.require(&user_id),
    }
    .map_err(|err| fail(ctx.output, err))?;

    let view = ProfileView {
        level: profile.level(),
        achievements: reward::achievements(&profile),
        profile,
    };
    render(ctx.output, &view, |v, w| {
        let p = &v.profile;
        pretty_section(w, &format!("{} ({})", p.display_name, p.user_id))?;
        pretty_kv(w, "Level", v.level.to_string())?;
        pretty_kv(w, "XP", p.xp.to_string())?;
        pretty_kv(w, "Solved", p.total_problems_solved.to_string())?;
        pretty_kv(
            w,
            "Streak",
            format!("{} (best {})", p.current_streak, p.best_streak),
        )?;
        writeln!(w)?;
        writeln!(w, "Achievements")?;
        for a in &v.achievements {
            let mark = if a.earned { "✓" } else { "·" };
            writeln!(w, "  {mark} {:<14} {}", a.title, a.description)?;
        }
        Ok(())
    })
}
