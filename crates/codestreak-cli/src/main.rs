#![forbid(unsafe_code)]

mod cmd;
mod identity;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use codestreak_core::cache::DailyCache;
use codestreak_core::challenge::ChallengeProblem;
use codestreak_core::config::{self, UserConfig};
use std::env;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "cstreak: track solved problems, streaks and XP",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Override user identity (skips env resolution).
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize a codestreak project",
        long_about = "Create .codestreak/ with a default config and an empty tracker database.",
        after_help = "EXAMPLES:\n    # Initialize in the current directory\n    cstreak init\n\n    # Emit machine-readable output\n    cstreak init --json"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Progress",
        about = "Record a solved problem",
        long_about = "Record a solved problem, award XP and advance the daily streak.",
        after_help = "EXAMPLES:\n    # Record a solve with explicit metadata\n    cstreak solve two-sum --title \"Two Sum\" --difficulty easy\n\n    # Look the problem up in a catalog\n    cstreak solve two-sum --catalog questions.json\n\n    # Complete one of today's challenges\n    cstreak solve CF-1520-A --catalog problemset.json --json"
    )]
    Solve(cmd::solve::SolveArgs),

    #[command(
        next_help_heading = "Progress",
        about = "Finish interrupted solves",
        long_about = "Apply the XP, streak and activity updates of solves that were interrupted.",
        after_help = "EXAMPLES:\n    # Resume your own pending solves\n    cstreak resume\n\n    # Resume for every user\n    cstreak resume --all"
    )]
    Resume(cmd::resume::ResumeArgs),

    #[command(
        next_help_heading = "Read",
        about = "List solved problems",
        after_help = "EXAMPLES:\n    # All solves, newest first\n    cstreak history\n\n    # Only hard problems\n    cstreak history --difficulty hard --json"
    )]
    History(cmd::history::HistoryArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show the current streak",
        after_help = "EXAMPLES:\n    cstreak streak\n    cstreak streak --json"
    )]
    Streak(cmd::streak::StreakArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show per-day activity",
        after_help = "EXAMPLES:\n    # Last 30 active days\n    cstreak activity\n\n    # Last week by difficulty\n    cstreak activity --days 7 --by-difficulty"
    )]
    Activity(cmd::activity::ActivityArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show lifetime totals and the weekly report",
        after_help = "EXAMPLES:\n    cstreak stats\n    cstreak stats --json"
    )]
    Stats(cmd::stats::StatsArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show or rename your profile",
        after_help = "EXAMPLES:\n    # Level, XP and achievements\n    cstreak profile\n\n    # Change the display name\n    cstreak profile --name \"Ada L.\""
    )]
    Profile(cmd::profile::ProfileArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show the leaderboard",
        after_help = "EXAMPLES:\n    # Top XP\n    cstreak leaderboard\n\n    # Longest running streaks\n    cstreak leaderboard --by streak --limit 5"
    )]
    Leaderboard(cmd::leaderboard::LeaderboardArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show today's challenge problems",
        after_help = "EXAMPLES:\n    cstreak daily --catalog problemset.json\n    cstreak daily --json"
    )]
    Daily(cmd::daily::DailyArgs),

    #[command(
        next_help_heading = "Read",
        about = "Browse the question bank",
        long_about = "List catalog questions with your completion status, or show one question.",
        after_help = "EXAMPLES:\n    # Every question, solved ones marked\n    cstreak questions --catalog questions.json\n\n    # Only hard questions\n    cstreak questions --difficulty hard\n\n    # One question\n    cstreak questions two-sum --json"
    )]
    Questions(cmd::questions::QuestionsArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show today's question-bank picks",
        long_about = "Pick five questions you have not solved yet, fixed for the day.",
        after_help = "EXAMPLES:\n    cstreak today --catalog questions.json\n    cstreak today --json"
    )]
    Today(cmd::questions::TodayArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show totals across all users",
        after_help = "EXAMPLES:\n    cstreak platform-stats\n    cstreak platform-stats --json"
    )]
    PlatformStats(cmd::platform::PlatformStatsArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    cstreak completions bash\n\n    # Generate zsh completions\n    cstreak completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CODESTREAK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "codestreak=debug,info"
        } else {
            "codestreak=info,warn"
        })
    });

    let format = env::var("CODESTREAK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    match run(&Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if err.downcast_ref::<output::Reported>().is_none() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let user_config = config::load_user_config().unwrap_or_else(|err| {
        warn!(error = %format!("{err:#}"), "ignoring unreadable user config");
        UserConfig::default()
    });

    let project_root = env::current_dir()?;
    let ctx = cmd::Context {
        project_root: &project_root,
        output: output::resolve_output_mode(cli.json, user_config.output.as_deref()),
        user_flag: cli.user.as_deref(),
        configured_user: user_config.user.as_deref(),
    };
    let challenges: DailyCache<ChallengeProblem> = DailyCache::new();

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, &ctx),
        Commands::Solve(args) => cmd::solve::run_solve(args, &ctx, &challenges),
        Commands::Resume(args) => cmd::resume::run_resume(args, &ctx),
        Commands::History(args) => cmd::history::run_history(args, &ctx),
        Commands::Streak(args) => cmd::streak::run_streak(args, &ctx),
        Commands::Activity(args) => cmd::activity::run_activity(args, &ctx),
        Commands::Stats(args) => cmd::stats::run_stats(args, &ctx),
        Commands::Profile(args) => cmd::profile::run_profile(args, &ctx),
        Commands::Leaderboard(args) => cmd::leaderboard::run_leaderboard(args, &ctx),
        Commands::Daily(args) => cmd::daily::run_daily(args, &ctx, &challenges),
        Commands::Questions(args) => cmd::questions::run_questions(args, &ctx),
        Commands::Today(args) => cmd::questions::run_today(args, &ctx),
        Commands::PlatformStats(args) => cmd::platform::run_platform_stats(args, &ctx),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}
