//! Collector Traits
//!
//! This module defines the two collaborators the marker needs from a test runner:
//!
//! - [`TestEnumerator`]: counts the tests matching a name filter. Used once per run to
//!   build the [`TestInventory`](crate::inventory::TestInventory).
//! - [`VerdictCollector`]: runs the tests of one subgroup against one submission and
//!   reports a verdict per test.
//!
//! Neither trait interprets pass/fail policy; that is the job of the [`scorer`](crate::scorer).

use crate::error::MarkerError;
use crate::types::{Submission, SubgroupKey, Verdict};
use async_trait::async_trait;

#[async_trait]
pub trait TestEnumerator: Send + Sync {
    /// Number of tests whose name matches `filter`.
    async fn count(&self, filter: &str) -> Result<usize, MarkerError>;
}

/// Executes one subgroup's tests against a submission's artifact.
///
/// # Returns
/// - `Ok(vec![])` when the runner matched no tests for the subgroup.
/// - `Ok(verdicts)` otherwise, one per executed test.
/// - `Err(MarkerError)` when the runner could not run or its result is missing or malformed.
///   A collector must never report an unreadable result as an empty or all-passing list.
#[async_trait]
pub trait VerdictCollector: Send + Sync {
    async fn collect(
        &self,
        submission: &Submission,
        key: SubgroupKey,
    ) -> Result<Vec<Verdict>, MarkerError>;
}
