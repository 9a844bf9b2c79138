//! # Report Module
//!
//! Renders grading results for people to read:
//!
//! - [`render_submission_report`]: the Markdown report written next to each submission,
//!   explaining the policy and listing every subgroup outcome and the final score.
//! - [`render_score_table`] / [`render_failure_table`]: the cohort CSV tables.
//!
//! Everything here is formatting. Outcomes, totals and the score are read from the
//! [`SubmissionResult`]; nothing is re-derived.

use crate::cohort::ScoreRow;
use crate::inventory::TestInventory;
use crate::types::{Group, SubgroupKey, SubgroupKind, SubgroupResult, SubmissionResult};
use std::fmt::Write;

/// One-line verdict for a subgroup, e.g. `✅ passed basics::fundamentals with 3/3 successes.`
pub fn subgroup_summary(result: &SubgroupResult) -> String {
    let key = result.key;
    if result.no_tests {
        return format!("🤷 no tests in {key} subgroup.");
    }

    let optional = !key.kind.is_scored();
    let (glyph, verb) = match (result.outcome, optional) {
        (true, false) => ("✅", "passed"),
        (true, true) => ("👍", "passed"),
        (false, false) => ("❌", "failed"),
        (false, true) => ("🤷", "failed"),
    };
    format!(
        "{glyph} {verb} {key} with {}/{} successes.",
        result.passing_tests.len(),
        result.total
    )
}

pub fn distinction_summary(result: &SubmissionResult) -> &'static str {
    if result.distinction {
        "🔥 Received distinction."
    } else {
        "😞 No distinction."
    }
}

pub fn totals_summary(result: &SubmissionResult) -> String {
    format!(
        "sum-success: {} / sum-failure: {} / auto-graded-score: {}",
        result.sum_successes, result.sum_failures, result.auto_grade
    )
}

/// Groups in the order the rubric presents them.
const REPORT_ORDER: [Group; 5] = [
    Group::Basics,
    Group::Currency,
    Group::Tipping,
    Group::Nonce,
    Group::Staking,
];

/// Render the Markdown report for one graded submission.
pub fn render_submission_report(result: &SubmissionResult, inventory: &TestInventory) -> String {
    let distinction_max = inventory.distinction_max_failures();
    let mut out = String::new();

    out.push_str("## Prelude\n\n");
    out.push_str(
        "This report was generated automatically from the outcome of the grading test suite \
         run against your submission.\n\n",
    );

    out.push_str("## Grading Process\n\n<details>\n\n");
    out.push_str("<summary>Click to see the detailed grading process.</summary>\n\n");
    out.push_str("The tests are split into groups. Points are awarded as follows:\n\n");
    out.push_str("* if you pass all the _basics_ tests, you get 1 point.\n");
    out.push_str("* if you pass all the _currency_ tests, you get 1 point.\n");
    out.push_str("* if you pass either all the _tipping *OR* nonce_ tests, you get 1 point.\n\n");
    out.push_str(
        "Each group has 3 subgroups, and each subgroup tolerates a maximum number of failures:\n\n",
    );
    out.push_str("* **fundamentals**: unambiguous tests that must pass.\n");
    out.push_str(
        "* **challenging**: harder tests; a bounded number of failures is tolerated.\n",
    );
    out.push_str(
        "* **optional**: edge cases the assignment did not clarify. Failures here have no \
         impact on your score.\n\n",
    );

    out.push_str("### Distinction\n\n");
    out.push_str("One additional point is awarded if you fail at most ");
    let _ = writeln!(out, "{distinction_max} tests overall, optional tests included.\n");
    out.push_str(
        "The group and subgroup of a test are the first two segments of its name, e.g. \
         `tipping::fundamentals::some_test` is a _fundamentals_ test of the _tipping_ group.\n\n",
    );

    out.push_str("The number of tests and the tolerated failures per subgroup are:\n\n");
    for group in REPORT_ORDER {
        let _ = writeln!(out, "* {group}:");
        for kind in SubgroupKind::ALL {
            let key = SubgroupKey::new(group, kind);
            let Ok(entry) = inventory.entry(key) else {
                continue;
            };
            if kind.is_scored() {
                let _ = writeln!(
                    out,
                    "    * {} {kind} tests, {} max failures.",
                    entry.expected_test_count, entry.max_allowed_failures
                );
            } else {
                let _ = writeln!(out, "    * {} {kind} tests.", entry.expected_test_count);
            }
        }
    }
    let _ = writeln!(out, "* distinction:");
    let _ = writeln!(
        out,
        "    * Less than or equal to {distinction_max} failures overall.\n"
    );
    out.push_str("The staking group is optional and has no impact on your score.\n\n");
    out.push_str("</details>\n\n");

    out.push_str("## Auto-Graded Score\n\n");
    for group in REPORT_ORDER {
        let _ = writeln!(out, "* {group}");
        for kind in SubgroupKind::ALL {
            if let Some(sub) = result.subgroup(SubgroupKey::new(group, kind)) {
                let _ = writeln!(out, "    * {}", subgroup_summary(sub));
            }
        }
    }
    let _ = writeln!(out, "* distinction");
    let _ = writeln!(out, "    * {}\n", distinction_summary(result));
    let _ = writeln!(out, "{}\n", totals_summary(result));

    out.push_str(
        "The raw runner output (`xml` result and `stderr`) of every subgroup is in the \
         `result` folder.\n\n",
    );

    out.push_str("## Score\n\n");
    let _ = writeln!(out, "**{}**", result.auto_grade);

    out
}

/// Quote a CSV field if it contains a delimiter, quote or newline.
fn esc(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Column headers of the score table; subgroup columns carry the inventory counts.
pub fn score_table_header(inventory: &TestInventory) -> Vec<String> {
    let mut cols = vec![
        "student".to_string(),
        "final-score".to_string(),
        "sum-success".to_string(),
        "sum-failures".to_string(),
    ];
    for key in SubgroupKey::all() {
        let Ok(entry) = inventory.entry(key) else {
            continue;
        };
        let col = match key.kind {
            SubgroupKind::Challenging => format!(
                "{key} ({}, max_failures: {})",
                entry.expected_test_count, entry.max_allowed_failures
            ),
            _ => format!("{key} ({})", entry.expected_test_count),
        };
        cols.push(col);
    }
    cols
}

/// Render the cohort score table as CSV.
pub fn render_score_table(rows: &[ScoreRow], inventory: &TestInventory) -> String {
    let header: Vec<String> = score_table_header(inventory).iter().map(|c| esc(c)).collect();
    let mut csv = header.join(",");
    csv.push('\n');

    for row in rows {
        let mut fields = vec![
            esc(&row.identity),
            row.auto_grade.to_string(),
            row.sum_successes.to_string(),
            row.sum_failures.to_string(),
        ];
        fields.extend(row.subgroup_successes.iter().map(|s| s.to_string()));
        csv.push_str(&fields.join(","));
        csv.push('\n');
    }
    csv
}

/// Render the ranked failure table as CSV.
pub fn render_failure_table(ranked: &[(String, usize)]) -> String {
    let mut csv = String::from("test,failures\n");
    for (test, count) in ranked {
        let _ = writeln!(csv, "{},{}", esc(test), count);
    }
    csv
}
