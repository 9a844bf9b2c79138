//! # Test Inventory
//!
//! The inventory fixes, for every `group::subgroup`, how many tests exist and how many of them
//! may fail. Counts are queried from a [`TestEnumerator`] once per run and are treated as
//! constant for the whole cohort pass.

use crate::error::MarkerError;
use crate::traits::collector::TestEnumerator;
use crate::types::{Group, SubgroupKey, SubgroupKind};
use std::collections::BTreeMap;
use tracing::info;
use util::grading_config::{GroupThresholds, PolicyOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryEntry {
    pub expected_test_count: usize,
    pub max_allowed_failures: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestInventory {
    entries: BTreeMap<SubgroupKey, InventoryEntry>,
    distinction_max_failures: u32,
}

/// Threshold of one group as configured in the policy.
pub fn group_thresholds(policy: &PolicyOptions, group: Group) -> GroupThresholds {
    match group {
        Group::Basics => policy.basics,
        Group::Currency => policy.currency,
        Group::Staking => policy.staking,
        Group::Tipping => policy.tipping,
        Group::Nonce => policy.nonce,
    }
}

/// Optional subgroups are always evaluated against zero.
pub fn max_allowed_failures(policy: &PolicyOptions, key: SubgroupKey) -> u32 {
    let thresholds = group_thresholds(policy, key.group);
    match key.kind {
        SubgroupKind::Fundamentals => thresholds.max_fundamentals_failures,
        SubgroupKind::Challenging => thresholds.max_challenging_failures,
        SubgroupKind::Optional => 0,
    }
}

impl TestInventory {
    /// Query the enumerator for every subgroup and pair each count with its threshold.
    ///
    /// Any enumeration failure aborts: grading cannot proceed without the denominators.
    pub async fn build(
        enumerator: &dyn TestEnumerator,
        policy: &PolicyOptions,
    ) -> Result<Self, MarkerError> {
        let mut counts = BTreeMap::new();
        for key in SubgroupKey::all() {
            let count = enumerator
                .count(&key.filter())
                .await
                .map_err(|e| MarkerError::Inventory(format!("counting {key}: {e}")))?;
            counts.insert(key, count);
        }
        Self::from_counts(policy, counts)
    }

    /// Build from already known counts. Every subgroup must be present.
    pub fn from_counts(
        policy: &PolicyOptions,
        counts: BTreeMap<SubgroupKey, usize>,
    ) -> Result<Self, MarkerError> {
        let mut entries = BTreeMap::new();
        for key in SubgroupKey::all() {
            let expected_test_count = *counts
                .get(&key)
                .ok_or_else(|| MarkerError::Inventory(format!("no test count for {key}")))?;
            entries.insert(
                key,
                InventoryEntry {
                    expected_test_count,
                    max_allowed_failures: max_allowed_failures(policy, key),
                },
            );
        }

        Ok(Self {
            entries,
            distinction_max_failures: policy.distinction_max_failures,
        })
    }

    pub fn entry(&self, key: SubgroupKey) -> Result<InventoryEntry, MarkerError> {
        self.entries
            .get(&key)
            .copied()
            .ok_or_else(|| MarkerError::UnknownSubgroup(key.to_string()))
    }

    pub fn entries(&self) -> impl Iterator<Item = (SubgroupKey, InventoryEntry)> + '_ {
        self.entries.iter().map(|(k, e)| (*k, *e))
    }

    pub fn distinction_max_failures(&self) -> u32 {
        self.distinction_max_failures
    }

    /// Log every subgroup's count and threshold.
    pub fn log_summary(&self) {
        for (key, entry) in self.entries() {
            if key.kind.is_scored() {
                info!(
                    "{key}: {} tests, max_failures: {}",
                    entry.expected_test_count, entry.max_allowed_failures
                );
            } else {
                info!("{key}: {} tests", entry.expected_test_count);
            }
        }
        info!("distinction: max_failures: {}", self.distinction_max_failures);
    }
}
