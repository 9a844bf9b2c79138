//! The sequential cohort loop.
//!
//! One submission is graded completely (artifacts cleared, verdicts collected, report
//! written, aggregator updated) before the next starts. A failure inside one submission is
//! logged and recorded in the [`RunSummary`]; it never stops the loop.

use crate::artifacts;
use marker::GradingJob;
use marker::cohort::CohortAggregator;
use marker::error::MarkerError;
use marker::inventory::TestInventory;
use marker::traits::collector::VerdictCollector;
use marker::types::Submission;
use std::time::Instant;
use tracing::{error, info};

/// What happened to each selected submission.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub graded: Vec<String>,
    /// Identity and reason of every submission that could not be graded.
    pub failed: Vec<(String, String)>,
    /// Submissions rejected by the selection predicate.
    pub skipped: usize,
}

pub async fn run_cohort<F>(
    submissions: &[Submission],
    select: F,
    inventory: &TestInventory,
    collector: &dyn VerdictCollector,
    aggregator: &mut CohortAggregator,
) -> RunSummary
where
    F: Fn(&Submission) -> bool,
{
    let mut summary = RunSummary::default();

    for submission in submissions {
        if !select(submission) {
            summary.skipped += 1;
            continue;
        }

        info!("grading {} ({})", submission.identity, submission.dir.display());
        let started = Instant::now();

        match grade_one(submission, inventory, collector, aggregator).await {
            Ok(auto_grade) => {
                info!(
                    "{}: auto-graded-score {auto_grade} in {:.1?}",
                    submission.identity,
                    started.elapsed()
                );
                summary.graded.push(submission.identity.clone());
            }
            Err(e) => {
                error!("{}: not graded: {e}", submission.identity);
                summary
                    .failed
                    .push((submission.identity.clone(), e.to_string()));
            }
        }
    }

    summary
}

async fn grade_one(
    submission: &Submission,
    inventory: &TestInventory,
    collector: &dyn VerdictCollector,
    aggregator: &mut CohortAggregator,
) -> Result<u8, MarkerError> {
    artifacts::clear_submission_artifacts(&submission.dir)?;

    let result = GradingJob::new(submission, inventory, collector)
        .grade()
        .await?;

    artifacts::write_submission_report(submission, &result, inventory)?;
    aggregator.record(&result);

    Ok(result.auto_grade)
}
