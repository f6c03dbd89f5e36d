//! Problem metadata lookup.
//!
//! The engine treats catalog data as immutable input: a solve request carries
//! the title and difficulty the catalog reported.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Deserializer, Serialize};

use crate::challenge::day_rng;
use crate::error::{Result, TrackerError};
use crate::ledger::SolveLedger;
use crate::model::{Difficulty, SolveEvent};
use crate::progress::CompleteSolve;
use crate::reward::xp_for;

/// Size of the question bank's daily list.
pub const TODAYS_QUESTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    /// Either vocabulary is accepted on input.
    #[serde(deserialize_with = "lenient_difficulty")]
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl CatalogEntry {
    /// Solve request for `user_id` carrying this entry's metadata.
    #[must_use]
    pub fn solve_request(&self, user_id: &str) -> CompleteSolve {
        let mut request = CompleteSolve::new(user_id, &self.id, &self.title, self.difficulty);
        request.platform.clone_from(&self.platform);
        request
    }
}

fn lenient_difficulty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Difficulty, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Difficulty::parse_any(&raw).map_err(serde::de::Error::custom)
}

/// A catalog entry plus the user's solve of it, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionStatus {
    #[serde(flatten)]
    pub entry: CatalogEntry,
    pub xp_reward: u64,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_url: Option<String>,
}

impl QuestionStatus {
    fn new(entry: &CatalogEntry, solve: Option<&SolveEvent>) -> Self {
        Self {
            entry: entry.clone(),
            xp_reward: xp_for(entry.difficulty),
            completed: solve.is_some(),
            completed_at: solve.map(|s| s.solved_at),
            submission_url: solve.and_then(|s| s.submission_url.clone()),
        }
    }
}

pub trait ProblemCatalog {
    fn lookup(&self, problem_id: &str) -> Option<CatalogEntry>;
}

/// Catalog lookup that fails for unknown ids.
///
/// # Errors
///
/// [`TrackerError::UnknownProblem`] when the catalog has no such id.
pub fn resolve(catalog: &dyn ProblemCatalog, problem_id: &str) -> Result<CatalogEntry> {
    catalog
        .lookup(problem_id)
        .ok_or_else(|| TrackerError::UnknownProblem(problem_id.to_string()))
}

/// Fixed set of problems, typically loaded from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl StaticCatalog {
    /// Later entries with the same id replace earlier ones.
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.id.clone(), e)).collect(),
        }
    }

    /// Parse a JSON array of entries.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON or an unknown difficulty.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let entries: Vec<CatalogEntry> =
            serde_json::from_str(text).context("catalog is not a JSON array of problems")?;
        Ok(Self::from_entries(entries))
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    /// Every entry in id order with the user's completion status, optionally
    /// narrowed to one difficulty.
    ///
    /// # Errors
    ///
    /// Propagates storage and decode failures.
    pub fn browse(
        &self,
        ledger: &SolveLedger<'_>,
        user_id: &str,
        difficulty: Option<Difficulty>,
    ) -> Result<Vec<QuestionStatus>> {
        let solved = solves_by_problem(ledger, user_id)?;
        Ok(self
            .entries()
            .filter(|e| difficulty.is_none_or(|d| e.difficulty == d))
            .map(|e| QuestionStatus::new(e, solved.get(&e.id)))
            .collect())
    }

    /// One entry with the user's completion status.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownProblem`] for an id outside the catalog, plus
    /// storage failures.
    pub fn question(
        &self,
        ledger: &SolveLedger<'_>,
        user_id: &str,
        problem_id: &str,
    ) -> Result<QuestionStatus> {
        let entry = self
            .entries
            .get(problem_id)
            .ok_or_else(|| TrackerError::UnknownProblem(problem_id.to_string()))?;
        let solve = ledger.get(user_id, problem_id)?;
        Ok(QuestionStatus::new(entry, solve.as_ref()))
    }

    /// Up to `count` entries the user had not solved before `today`, drawn
    /// with the day's RNG. Entries solved on `today` stay in the draw and come
    /// back marked completed, so the list holds still for the whole day.
    ///
    /// # Errors
    ///
    /// Propagates storage and decode failures.
    pub fn todays_questions(
        &self,
        ledger: &SolveLedger<'_>,
        user_id: &str,
        today: NaiveDate,
        count: usize,
    ) -> Result<Vec<QuestionStatus>> {
        let solved = solves_by_problem(ledger, user_id)?;
        let open: Vec<&CatalogEntry> = self
            .entries()
            .filter(|e| solved.get(&e.id).is_none_or(|s| s.solved_on() == today))
            .collect();

        let mut rng = day_rng(today);
        Ok(open
            .choose_multiple(&mut rng, count)
            .map(|e| QuestionStatus::new(e, solved.get(&e.id)))
            .collect())
    }
}

fn solves_by_problem(
    ledger: &SolveLedger<'_>,
    user_id: &str,
) -> Result<HashMap<String, SolveEvent>> {
    Ok(ledger
        .list_solves(user_id, None)?
        .into_iter()
        .map(|s| (s.problem_id.clone(), s))
        .collect())
}

impl ProblemCatalog for StaticCatalog {
    fn lookup(&self, problem_id: &str) -> Option<CatalogEntry> {
        self.entries.get(problem_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::ErrorCode;
    use crate::progress::ProgressOrchestrator;
    use crate::store::MemoryStore;

    const CATALOG: &str = r#"[
        {"id": "two-sum", "title": "Two Sum", "difficulty": "easy",
         "url": "https://example.test/two-sum"},
        {"id": "lru", "title": "LRU Cache", "difficulty": "Medium", "platform": "question-bank"},
        {"id": "median", "title": "Median of Two Arrays", "difficulty": "DIFFICULT"}
    ]"#;

    #[test]
    fn json_catalog_accepts_both_vocabularies() {
        let catalog = StaticCatalog::from_json(CATALOG).expect("parse");
        assert_eq!(catalog.len(), 3);
        assert_eq!(resolve(&catalog, "lru").expect("lru").difficulty, Difficulty::Moderate);
        assert_eq!(
            resolve(&catalog, "median").expect("median").difficulty,
            Difficulty::Difficult
        );
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let catalog = StaticCatalog::from_json(CATALOG).expect("parse");
        let err = resolve(&catalog, "nope").expect_err("unknown");
        assert_eq!(err.code(), ErrorCode::UnknownProblem);
        assert_eq!(err.code().http_status(), 404);
    }

    #[test]
    fn unknown_difficulty_fails_the_load() {
        let text = r#"[{"id": "x", "title": "X", "difficulty": "brutal"}]"#;
        let err = StaticCatalog::from_json(text).expect_err("bad level");
        assert!(format!("{err:#}").contains("brutal"));
    }

    fn bank() -> StaticCatalog {
        let entries = (1..=8).map(|n| CatalogEntry {
            id: format!("q{n}"),
            title: format!("Question {n}"),
            difficulty: if n % 2 == 0 { Difficulty::Hard } else { Difficulty::Easy },
            url: None,
            platform: Some("question-bank".into()),
        });
        StaticCatalog::from_entries(entries)
    }

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, n).expect("valid date")
    }

    fn solve_on(store: &MemoryStore, clock: &FixedClock, catalog: &StaticCatalog, id: &str) {
        let request = resolve(catalog, id).expect("listed").solve_request("alice");
        ProgressOrchestrator::new(store, clock)
            .complete_solve(request)
            .expect("solve");
    }

    fn ids(list: &[QuestionStatus]) -> Vec<&str> {
        list.iter().map(|q| q.entry.id.as_str()).collect()
    }

    #[test]
    fn browse_marks_solved_entries_and_filters() {
        let store = MemoryStore::new();
        let clock = FixedClock::on(day(1));
        let catalog = bank();
        solve_on(&store, &clock, &catalog, "q2");
        let ledger = SolveLedger::new(&store);

        let all = catalog.browse(&ledger, "alice", None).expect("browse");
        assert_eq!(all.len(), 8);
        let done: Vec<_> = all
            .iter()
            .filter(|q| q.completed)
            .map(|q| q.entry.id.as_str())
            .collect();
        assert_eq!(done, ["q2"]);

        let hard = catalog
            .browse(&ledger, "alice", Some(Difficulty::Hard))
            .expect("browse");
        assert_eq!(hard.len(), 4);
        assert!(hard.iter().all(|q| q.entry.difficulty == Difficulty::Hard));
        assert!(hard.iter().all(|q| q.xp_reward == 150));
    }

    #[test]
    fn question_reports_completion_or_not_found() {
        let store = MemoryStore::new();
        let clock = FixedClock::on(day(1));
        let catalog = bank();
        solve_on(&store, &clock, &catalog, "q1");
        let ledger = SolveLedger::new(&store);

        let solved = catalog.question(&ledger, "alice", "q1").expect("q1");
        assert!(solved.completed);
        assert_eq!(solved.completed_at.map(|t| t.date_naive()), Some(day(1)));

        let open = catalog.question(&ledger, "bob", "q1").expect("q1 for bob");
        assert!(!open.completed);
        assert!(open.completed_at.is_none());

        let err = catalog.question(&ledger, "alice", "q99").expect_err("unknown");
        assert_eq!(err.code(), ErrorCode::UnknownProblem);
    }

    #[test]
    fn todays_questions_skip_earlier_solves_and_hold_for_the_day() {
        let store = MemoryStore::new();
        let clock = FixedClock::on(day(1));
        let catalog = bank();
        solve_on(&store, &clock, &catalog, "q1");
        solve_on(&store, &clock, &catalog, "q2");
        solve_on(&store, &clock, &catalog, "q3");
        let ledger = SolveLedger::new(&store);

        let morning = catalog
            .todays_questions(&ledger, "alice", day(2), TODAYS_QUESTIONS)
            .expect("today");
        assert_eq!(morning.len(), TODAYS_QUESTIONS);
        assert!(morning.iter().all(|q| !["q1", "q2", "q3"].contains(&q.entry.id.as_str())));
        assert!(morning.iter().all(|q| !q.completed));

        clock.set_date(day(2));
        solve_on(&store, &clock, &catalog, ids(&morning)[0]);
        let evening = catalog
            .todays_questions(&ledger, "alice", day(2), TODAYS_QUESTIONS)
            .expect("today");
        assert_eq!(ids(&evening), ids(&morning));
        assert!(evening[0].completed);
        assert!(evening[1..].iter().all(|q| !q.completed));
    }

    #[test]
    fn todays_questions_shrink_with_the_open_pool() {
        let store = MemoryStore::new();
        let clock = FixedClock::on(day(1));
        let catalog = bank();
        for n in 1..=6 {
            solve_on(&store, &clock, &catalog, &format!("q{n}"));
        }
        let ledger = SolveLedger::new(&store);

        let list = catalog
            .todays_questions(&ledger, "alice", day(3), TODAYS_QUESTIONS)
            .expect("today");
        let mut open = ids(&list);
        open.sort_unstable();
        assert_eq!(open, ["q7", "q8"]);
    }

    #[test]
    fn entries_become_solve_requests() {
        let catalog = StaticCatalog::from_json(CATALOG).expect("parse");
        let request = resolve(&catalog, "lru").expect("lru").solve_request("alice");
        assert_eq!(request.problem_title, "LRU Cache");
        assert_eq!(request.platform.as_deref(), Some("question-bank"));
        assert_eq!(request.user_id, "alice");
    }
}
