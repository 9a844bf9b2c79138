//! # Scorer Module
//!
//! The grading policy engine. It turns the verdicts collected for one submission into
//! per-subgroup and per-group outcomes, the composite auto-grade, and the distinction flag.
//!
//! ## Policy
//!
//! - A subgroup passes when its failures do not exceed its threshold. A subgroup with no
//!   tests passes and is marked `no_tests`.
//! - A group passes when both `fundamentals` and `challenging` pass. `optional` is recorded
//!   (its threshold is zero, for display and aggregation) but carries no scoring weight.
//! - `auto_grade = basics + currency + (tipping OR nonce)`. `staking` carries no weight.
//! - When the total number of failures over all 15 subgroups, optional included, stays within
//!   the distinction budget, one bonus point is awarded. The three boolean terms sum to at
//!   most 3, so the grade never exceeds 4.
//!
//! The engine is pure: it never runs tests and never retries. Missing input is an error,
//! since a silently absent subgroup would inflate a score.

use crate::error::MarkerError;
use crate::inventory::TestInventory;
use crate::types::{
    Group, GroupResult, SubgroupKey, SubgroupKind, SubgroupResult, SubmissionResult, Verdict,
    VerdictSet,
};
use std::collections::BTreeMap;
use tracing::warn;

/// Highest score the policy can award.
pub const MAX_AUTO_GRADE: u8 = 4;

/// Decide one subgroup from its verdicts and threshold.
pub fn evaluate_subgroup(
    key: SubgroupKey,
    verdicts: &[Verdict],
    max_allowed_failures: u32,
) -> SubgroupResult {
    let (passing, failing): (Vec<&Verdict>, Vec<&Verdict>) =
        verdicts.iter().partition(|v| v.passed);

    let no_tests = verdicts.is_empty();
    let outcome = no_tests || failing.len() <= max_allowed_failures as usize;

    SubgroupResult {
        key,
        outcome,
        no_tests,
        failing_tests: failing.into_iter().map(|v| v.test_name.clone()).collect(),
        passing_tests: passing.into_iter().map(|v| v.test_name.clone()).collect(),
        total: verdicts.len(),
        max_allowed_failures,
    }
}

/// A group passes iff its fundamentals and challenging subgroups pass.
pub fn evaluate_group(fundamentals: &SubgroupResult, challenging: &SubgroupResult) -> GroupResult {
    GroupResult {
        outcome: fundamentals.outcome && challenging.outcome,
    }
}

/// The three scored terms: basics, currency, and tipping OR nonce.
///
/// Returns the sum of the terms and the value of the disjunctive term.
pub fn composite_terms(groups: &BTreeMap<Group, GroupResult>) -> (u8, bool) {
    let passed = |g: Group| groups.get(&g).is_some_and(|r| r.outcome);

    let tipping_or_nonce = passed(Group::Tipping) || passed(Group::Nonce);
    let terms = [passed(Group::Basics), passed(Group::Currency), tipping_or_nonce];

    (terms.iter().filter(|t| **t).count() as u8, tipping_or_nonce)
}

/// Whether a report disagrees with the inventory. An empty report against a non-empty
/// inventory still passes as `no_tests`, so it counts as a mismatch too.
pub fn count_mismatch(reported: usize, expected: usize) -> bool {
    reported != expected
}

/// Grade one submission from its full verdict set.
///
/// # Errors
/// - [`MarkerError::MissingSubgroup`] when any of the 15 subgroups has no verdict list.
/// - [`MarkerError::UnknownSubgroup`] when the inventory lacks a subgroup.
pub fn grade_submission(
    identity: &str,
    verdicts: &VerdictSet,
    inventory: &TestInventory,
) -> Result<SubmissionResult, MarkerError> {
    let mut subgroups = BTreeMap::new();
    for key in SubgroupKey::all() {
        let list = verdicts
            .get(&key)
            .ok_or_else(|| MarkerError::MissingSubgroup(key.to_string()))?;
        let entry = inventory.entry(key)?;

        if count_mismatch(list.len(), entry.expected_test_count) {
            warn!(
                "{identity}: {key} reported {} tests, inventory expects {}",
                list.len(),
                entry.expected_test_count
            );
        }

        subgroups.insert(key, evaluate_subgroup(key, list, entry.max_allowed_failures));
    }

    let mut groups = BTreeMap::new();
    for group in Group::ALL {
        let fundamentals = &subgroups[&SubgroupKey::new(group, SubgroupKind::Fundamentals)];
        let challenging = &subgroups[&SubgroupKey::new(group, SubgroupKind::Challenging)];
        groups.insert(group, evaluate_group(fundamentals, challenging));
    }

    let sum_successes: usize = subgroups.values().map(|s| s.passing_tests.len()).sum();
    let sum_failures: usize = subgroups.values().map(|s| s.failing_tests.len()).sum();

    let (mut auto_grade, tipping_or_nonce) = composite_terms(&groups);
    let distinction = sum_failures <= inventory.distinction_max_failures() as usize;
    if distinction {
        auto_grade += 1;
    }

    Ok(SubmissionResult {
        identity: identity.to_string(),
        subgroups,
        groups,
        tipping_or_nonce,
        sum_successes,
        sum_failures,
        auto_grade,
        distinction,
    })
}
