//! Daily challenge selection from a judge problemset snapshot.
//!
//! Selection is deterministic per calendar day: the RNG is seeded from the
//! date, so every process picks the same problems on the same day.

use std::path::Path;

use anyhow::{Context, bail};
use chrono::{Datelike, NaiveDate};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogEntry, ProblemCatalog};
use crate::error::{Result, TrackerError};
use crate::ledger::SolveLedger;
use crate::model::{ClassicTier, Difficulty};
use crate::reward::xp_for_tier;

pub const CHALLENGE_PLATFORM: &str = "codeforces";
const PROBLEM_URL_BASE: &str = "https://codeforces.com/problemset/problem";

/// One problem as listed by the judge's problemset API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeProblem {
    #[serde(default)]
    pub contest_id: Option<u32>,
    pub index: String,
    pub name: String,
    #[serde(default)]
    pub rating: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Snapshot {
    Wrapped { problems: Vec<JudgeProblem> },
    Result { result: Problemset },
    Bare(Vec<JudgeProblem>),
}

#[derive(Deserialize)]
struct Problemset {
    problems: Vec<JudgeProblem>,
}

/// Parse a problemset snapshot: a bare array, `{"problems": [...]}`, or the
/// full API envelope `{"result": {"problems": [...]}}`.
///
/// # Errors
///
/// Returns an error if the text matches none of those shapes.
pub fn parse_problemset(text: &str) -> anyhow::Result<Vec<JudgeProblem>> {
    let snapshot: Snapshot =
        serde_json::from_str(text).context("problemset snapshot is not valid JSON")?;
    Ok(match snapshot {
        Snapshot::Wrapped { problems } | Snapshot::Result { result: Problemset { problems } } => {
            problems
        }
        Snapshot::Bare(problems) => problems,
    })
}

/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_problemset(path: &Path) -> anyhow::Result<Vec<JudgeProblem>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let problems =
        parse_problemset(&text).with_context(|| format!("Failed to parse {}", path.display()))?;
    if problems.is_empty() {
        bail!("{} lists no problems", path.display());
    }
    Ok(problems)
}

/// Rating band for each tier, half-open.
#[must_use]
pub const fn tier_for_rating(rating: u32) -> Option<ClassicTier> {
    match rating {
        800..1000 => Some(ClassicTier::Easy),
        1000..1300 => Some(ClassicTier::Medium),
        1300..1600 => Some(ClassicTier::Hard),
        _ => None,
    }
}

/// How many problems of each tier a day gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeMix {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

impl Default for ChallengeMix {
    fn default() -> Self {
        Self {
            easy: 2,
            medium: 2,
            hard: 1,
        }
    }
}

impl ChallengeMix {
    const fn count(&self, tier: ClassicTier) -> usize {
        match tier {
            ClassicTier::Easy => self.easy,
            ClassicTier::Medium => self.medium,
            ClassicTier::Hard => self.hard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChallengeProblem {
    pub problem_id: String,
    pub contest_id: u32,
    pub problem_index: String,
    pub title: String,
    pub tier: ClassicTier,
    pub platform: &'static str,
    pub problem_url: String,
    pub xp_reward: u64,
    pub rating: u32,
    pub tags: Vec<String>,
}

impl ChallengeProblem {
    fn from_judge(problem: &JudgeProblem, contest_id: u32, rating: u32, tier: ClassicTier) -> Self {
        Self {
            problem_id: challenge_id(contest_id, &problem.index),
            contest_id,
            problem_index: problem.index.clone(),
            title: problem.name.clone(),
            tier,
            platform: CHALLENGE_PLATFORM,
            problem_url: format!("{PROBLEM_URL_BASE}/{contest_id}/{}", problem.index),
            xp_reward: xp_for_tier(tier),
            rating,
            tags: problem.tags.clone(),
        }
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        Difficulty::from(self.tier)
    }
}

#[must_use]
pub fn challenge_id(contest_id: u32, index: &str) -> String {
    format!("CF-{contest_id}-{index}")
}

/// Split a `CF-<contest>-<index>` id into its parts.
///
/// # Errors
///
/// [`TrackerError::Validation`] when the id does not have that shape.
pub fn parse_challenge_id(id: &str) -> Result<(u32, String)> {
    let invalid = || {
        TrackerError::validation("problem_id", format!("'{id}' is not CF-<contest>-<index>"))
    };

    let mut parts = id.split('-');
    let (Some("CF"), Some(contest), Some(index), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    let contest: u32 = contest.parse().map_err(|_| invalid())?;
    if index.is_empty() || !index.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid());
    }
    Ok((contest, index.to_string()))
}

/// RNG seeded from the calendar day, shared by every daily draw.
pub(crate) fn day_rng(date: NaiveDate) -> StdRng {
    StdRng::seed_from_u64(u64::from(date.num_days_from_ce().unsigned_abs()))
}

/// Pick the day's challenges: tiers in easy, medium, hard order, each drawn
/// from its rating band with an RNG seeded from `date`.
///
/// Problems without a contest id or rating are never picked. A band with
/// fewer candidates than requested contributes what it has.
#[must_use]
pub fn select_daily(
    problems: &[JudgeProblem],
    date: NaiveDate,
    mix: &ChallengeMix,
) -> Vec<ChallengeProblem> {
    let mut rng = day_rng(date);

    let mut picked = Vec::with_capacity(mix.easy + mix.medium + mix.hard);
    for tier in ClassicTier::ALL {
        let mut band: Vec<(u32, u32, &JudgeProblem)> = problems
            .iter()
            .filter_map(|p| {
                let contest = p.contest_id?;
                let rating = p.rating?;
                (tier_for_rating(rating) == Some(tier)).then_some((contest, rating, p))
            })
            .collect();
        // Input order must not influence the draw.
        band.sort_by(|a, b| (a.0, &a.2.index).cmp(&(b.0, &b.2.index)));
        band.dedup_by(|a, b| a.0 == b.0 && a.2.index == b.2.index);

        picked.extend(
            band.choose_multiple(&mut rng, mix.count(tier))
                .map(|(contest, rating, p)| {
                    ChallengeProblem::from_judge(p, *contest, *rating, tier)
                }),
        );
    }
    picked
}

impl ProblemCatalog for Vec<ChallengeProblem> {
    fn lookup(&self, problem_id: &str) -> Option<CatalogEntry> {
        self.iter()
            .find(|c| c.problem_id == problem_id)
            .map(|c| CatalogEntry {
                id: c.problem_id.clone(),
                title: c.title.clone(),
                difficulty: c.difficulty(),
                url: Some(c.problem_url.clone()),
                platform: Some(c.platform.to_string()),
            })
    }
}

/// A challenge plus whether the user solved it today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardEntry {
    #[serde(flatten)]
    pub problem: ChallengeProblem,
    pub completed: bool,
}

/// Mark each challenge completed when the user's ledger holds a solve of it
/// dated `today`.
///
/// # Errors
///
/// Propagates storage and decode failures.
pub fn daily_board(
    challenges: &[ChallengeProblem],
    ledger: &SolveLedger<'_>,
    user_id: &str,
    today: NaiveDate,
) -> Result<Vec<BoardEntry>> {
    challenges
        .iter()
        .map(|problem| {
            let completed = ledger
                .get(user_id, &problem.problem_id)?
                .is_some_and(|s| s.solved_on() == today);
            Ok(BoardEntry {
                problem: problem.clone(),
                completed,
            })
        })
        .collect()
}
