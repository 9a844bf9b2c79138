//! # Marker Library
//!
//! This crate holds the grading policy for the final assignment: it collects per-test verdicts
//! for a submission, decides subgroup and group outcomes against the configured thresholds,
//! computes the composite score and distinction, and renders the results.
//!
//! ## Key Concepts
//! - **GradingJob**: Grades one submission end-to-end against a fixed [`TestInventory`].
//! - **VerdictCollector**: Pluggable source of verdicts (the real one drives the test runner).
//! - **CohortAggregator**: Accumulates score rows and failure frequencies across submissions.
//! - **Reports**: Markdown report per submission plus the cohort CSV tables.

pub mod cohort;
pub mod error;
pub mod inventory;
pub mod report;
pub mod scorer;
pub mod traits;
pub mod types;

use crate::error::MarkerError;
use crate::inventory::TestInventory;
use crate::traits::collector::VerdictCollector;
use crate::types::{SubgroupKey, Submission, SubmissionResult, VerdictSet};
use tracing::{debug, info};

/// Represents the grading of a single submission.
///
/// # Fields
/// - `submission`: The submission being graded; its artifact must exist.
/// - `inventory`: Test counts and thresholds shared by the whole cohort run.
/// - `collector`: Strategy that produces the verdicts of one subgroup.
pub struct GradingJob<'a> {
    submission: &'a Submission,
    inventory: &'a TestInventory,
    collector: &'a dyn VerdictCollector,
}

impl<'a> GradingJob<'a> {
    pub fn new(
        submission: &'a Submission,
        inventory: &'a TestInventory,
        collector: &'a dyn VerdictCollector,
    ) -> Self {
        Self {
            submission,
            inventory,
            collector,
        }
    }

    /// Collect every subgroup's verdicts and apply the grading policy.
    ///
    /// # Returns
    /// * `Ok(SubmissionResult)` with all 15 subgroups, the group outcomes and the score.
    /// * `Err(MarkerError)` if the artifact is missing or a collection step fails. No partial
    ///   result is produced in that case.
    ///
    /// Subgroups whose inventory count is zero are not handed to the collector; they are
    /// recorded with an empty verdict list.
    pub async fn grade(self) -> Result<SubmissionResult, MarkerError> {
        if !self.submission.artifact.is_file() {
            return Err(MarkerError::MissingArtifact(self.submission.artifact.clone()));
        }

        let mut verdicts = VerdictSet::new();
        for key in SubgroupKey::all() {
            let entry = self.inventory.entry(key)?;
            let list = if entry.expected_test_count == 0 {
                debug!("{}: skipping {key}, no tests enumerated", self.submission.identity);
                Vec::new()
            } else {
                self.collector.collect(self.submission, key).await?
            };
            verdicts.insert(key, list);
        }

        let result = scorer::grade_submission(&self.submission.identity, &verdicts, self.inventory)?;

        for sub in result.subgroups.values() {
            info!("{}: {}", result.identity, report::subgroup_summary(sub));
        }
        info!(
            "{}: {} {}",
            result.identity,
            report::distinction_summary(&result),
            report::totals_summary(&result)
        );

        Ok(result)
    }
}
