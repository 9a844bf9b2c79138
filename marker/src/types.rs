//! # Types Module
//!
//! This module defines the core data structures used throughout the marker system:
//! the fixed group/subgroup taxonomy of the test suite, the verdicts a runner reports,
//! and the derived per-subgroup, per-group and per-submission results.

use crate::error::MarkerError;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// An assignment topic. The declaration order is the canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    Basics,
    Currency,
    Staking,
    Tipping,
    Nonce,
}

impl Group {
    pub const ALL: [Group; 5] = [
        Group::Basics,
        Group::Currency,
        Group::Staking,
        Group::Tipping,
        Group::Nonce,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Basics => "basics",
            Group::Currency => "currency",
            Group::Staking => "staking",
            Group::Tipping => "tipping",
            Group::Nonce => "nonce",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Group {
    type Err = MarkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Group::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| MarkerError::UnknownSubgroup(s.to_string()))
    }
}

/// The three tiers every group is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubgroupKind {
    Fundamentals,
    Challenging,
    Optional,
}

impl SubgroupKind {
    pub const ALL: [SubgroupKind; 3] = [
        SubgroupKind::Fundamentals,
        SubgroupKind::Challenging,
        SubgroupKind::Optional,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubgroupKind::Fundamentals => "fundamentals",
            SubgroupKind::Challenging => "challenging",
            SubgroupKind::Optional => "optional",
        }
    }

    /// Optional subgroups are recorded but never feed a group outcome.
    pub fn is_scored(&self) -> bool {
        !matches!(self, SubgroupKind::Optional)
    }
}

impl fmt::Display for SubgroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubgroupKind {
    type Err = MarkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubgroupKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| MarkerError::UnknownSubgroup(s.to_string()))
    }
}

/// Identity of a subgroup. Renders as the runner filter `group::subgroup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubgroupKey {
    pub group: Group,
    pub kind: SubgroupKind,
}

impl SubgroupKey {
    pub const fn new(group: Group, kind: SubgroupKind) -> Self {
        Self { group, kind }
    }

    /// All 15 keys in canonical order (group, then kind).
    pub fn all() -> impl Iterator<Item = SubgroupKey> {
        Group::ALL.into_iter().flat_map(|group| {
            SubgroupKind::ALL
                .into_iter()
                .map(move |kind| SubgroupKey::new(group, kind))
        })
    }

    /// Test-name filter handed to the runner.
    pub fn filter(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SubgroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.group, self.kind)
    }
}

impl FromStr for SubgroupKey {
    type Err = MarkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (group, kind) = s
            .split_once("::")
            .ok_or_else(|| MarkerError::UnknownSubgroup(s.to_string()))?;
        let group = group
            .parse::<Group>()
            .map_err(|_| MarkerError::UnknownSubgroup(s.to_string()))?;
        let kind = kind
            .parse::<SubgroupKind>()
            .map_err(|_| MarkerError::UnknownSubgroup(s.to_string()))?;
        Ok(SubgroupKey::new(group, kind))
    }
}

impl Serialize for SubgroupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The outcome of one named test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub test_name: String,
    pub passed: bool,
}

impl Verdict {
    pub fn passed(test_name: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            passed: true,
        }
    }

    pub fn failed(test_name: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            passed: false,
        }
    }
}

/// Every verdict list collected for one submission, keyed by subgroup.
pub type VerdictSet = BTreeMap<SubgroupKey, Vec<Verdict>>;

/// A submission discovered on disk.
///
/// The identity is fixed at discovery time; later stages never parse it out of the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub identity: String,
    pub dir: PathBuf,
    /// Prebuilt artifact the tests are run against.
    pub artifact: PathBuf,
}

/// Outcome of one subgroup for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubgroupResult {
    pub key: SubgroupKey,
    pub outcome: bool,
    /// The runner found no tests for this subgroup; `outcome` is then `true`.
    pub no_tests: bool,
    pub failing_tests: Vec<String>,
    pub passing_tests: Vec<String>,
    pub total: usize,
    pub max_allowed_failures: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupResult {
    pub outcome: bool,
}

/// Everything the policy engine decided for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionResult {
    pub identity: String,
    pub subgroups: BTreeMap<SubgroupKey, SubgroupResult>,
    pub groups: BTreeMap<Group, GroupResult>,
    /// The disjunctive term: tipping OR nonce.
    pub tipping_or_nonce: bool,
    pub sum_successes: usize,
    pub sum_failures: usize,
    pub auto_grade: u8,
    pub distinction: bool,
}

impl SubmissionResult {
    pub fn subgroup(&self, key: SubgroupKey) -> Option<&SubgroupResult> {
        self.subgroups.get(&key)
    }

    pub fn group_outcome(&self, group: Group) -> bool {
        self.groups.get(&group).is_some_and(|g| g.outcome)
    }

    /// Failing test names across all subgroups, optional included.
    pub fn failing_tests(&self) -> impl Iterator<Item = &str> {
        self.subgroups
            .values()
            .flat_map(|s| s.failing_tests.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_keys_are_canonical() {
        let keys: Vec<String> = SubgroupKey::all().map(|k| k.filter()).collect();
        assert_eq!(keys.len(), 15);
        assert_eq!(keys[0], "basics::fundamentals");
        assert_eq!(keys[2], "basics::optional");
        assert_eq!(keys[3], "currency::fundamentals");
        assert_eq!(keys[14], "nonce::optional");
    }

    #[test]
    fn test_key_parse() {
        let key: SubgroupKey = "tipping::challenging".parse().unwrap();
        assert_eq!(key, SubgroupKey::new(Group::Tipping, SubgroupKind::Challenging));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        for raw in ["lending::fundamentals", "basics::hidden", "basics", ""] {
            match raw.parse::<SubgroupKey>() {
                Err(MarkerError::UnknownSubgroup(k)) => assert_eq!(k, raw),
                other => panic!("expected UnknownSubgroup for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_key_serializes_as_filter() {
        let key = SubgroupKey::new(Group::Nonce, SubgroupKind::Optional);
        assert_eq!(serde_json::to_value(key).unwrap(), "nonce::optional");
    }
}
