//! # Cohort Aggregator
//!
//! Accumulates per-submission results into the two cohort tables: one score row per graded
//! submission (in processing order) and the failing-test frequency table.
//!
//! The aggregator is an explicit value: created when a cohort run starts, passed by `&mut`
//! into each grading step, and consumed by [`CohortAggregator::finalize`] at the end.

use crate::types::{SubgroupKey, SubmissionResult};
use std::collections::{HashMap, HashSet};

/// One line of the cohort score table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRow {
    pub identity: String,
    pub auto_grade: u8,
    pub sum_successes: usize,
    pub sum_failures: usize,
    /// Passing test count per subgroup, in [`SubgroupKey::all`] order.
    pub subgroup_successes: Vec<usize>,
}

impl From<&SubmissionResult> for ScoreRow {
    fn from(result: &SubmissionResult) -> Self {
        ScoreRow {
            identity: result.identity.clone(),
            auto_grade: result.auto_grade,
            sum_successes: result.sum_successes,
            sum_failures: result.sum_failures,
            subgroup_successes: SubgroupKey::all()
                .map(|k| result.subgroup(k).map_or(0, |s| s.passing_tests.len()))
                .collect(),
        }
    }
}

/// Test name -> number of submissions in which it failed.
///
/// Insertion order is remembered so that equal counts rank in first-seen order.
#[derive(Debug, Default, Clone)]
pub struct FailureTable {
    counts: HashMap<String, usize>,
    first_seen: Vec<String>,
}

impl FailureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count each distinct name once for the submission that produced `failing`.
    pub fn add_submission<'a>(&mut self, failing: impl IntoIterator<Item = &'a str>) {
        let mut seen = HashSet::new();
        for name in failing {
            if !seen.insert(name) {
                continue;
            }
            match self.counts.get_mut(name) {
                Some(count) => *count += 1,
                None => {
                    self.counts.insert(name.to_string(), 1);
                    self.first_seen.push(name.to_string());
                }
            }
        }
    }

    pub fn count(&self, name: &str) -> usize {
        self.counts.get(name).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.first_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first_seen.is_empty()
    }

    /// Descending by count; ties keep first-seen order.
    pub fn ranked(&self) -> Vec<(String, usize)> {
        let mut ranked: Vec<(String, usize)> = self
            .first_seen
            .iter()
            .map(|name| (name.clone(), self.counts[name]))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

/// Finalized cohort tables, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortReport {
    pub scores: Vec<ScoreRow>,
    pub failures: Vec<(String, usize)>,
}

#[derive(Debug, Default)]
pub struct CohortAggregator {
    scores: Vec<ScoreRow>,
    failures: FailureTable,
}

impl CohortAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the submission's score row and count its failing tests, optional included.
    pub fn record(&mut self, result: &SubmissionResult) {
        self.scores.push(ScoreRow::from(result));
        self.failures.add_submission(result.failing_tests());
    }

    pub fn graded(&self) -> usize {
        self.scores.len()
    }

    pub fn failures(&self) -> &FailureTable {
        &self.failures
    }

    pub fn finalize(self) -> CohortReport {
        CohortReport {
            failures: self.failures.ranked(),
            scores: self.scores,
        }
    }
}
