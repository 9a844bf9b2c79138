//! Parsing of the JSON test listing printed by `cargo nextest list -T json-pretty`.

use crate::error::RunnerError;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(rename = "rust-suites")]
    rust_suites: BTreeMap<String, Suite>,
}

#[derive(Debug, Deserialize)]
struct Suite {
    #[serde(default)]
    testcases: BTreeMap<String, Testcase>,
}

#[derive(Debug, Deserialize)]
struct Testcase {
    #[serde(rename = "filter-match")]
    filter_match: FilterMatch,
}

#[derive(Debug, Deserialize)]
struct FilterMatch {
    status: String,
}

/// Number of testcases of `suite` that matched the filter expression.
///
/// The listing reports every test of the binary; only those whose `filter-match.status`
/// is `matches` count.
pub fn count_matching(json: &str, suite: &str) -> Result<usize, RunnerError> {
    let listing: Listing =
        serde_json::from_str(json).map_err(|e| RunnerError::InvalidListing(e.to_string()))?;

    let suite = listing
        .rust_suites
        .get(suite)
        .ok_or_else(|| RunnerError::InvalidListing(format!("suite '{suite}' not listed")))?;

    Ok(suite
        .testcases
        .values()
        .filter(|t| t.filter_match.status == "matches")
        .count())
}
