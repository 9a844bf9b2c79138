//! Writing grading output to disk.

use marker::cohort::CohortReport;
use marker::inventory::TestInventory;
use marker::report;
use marker::types::{Submission, SubmissionResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use util::paths;

/// Remove the report and raw runner output of an earlier run. Absent files are fine.
pub fn clear_submission_artifacts(submission_dir: &Path) -> io::Result<()> {
    let report = paths::submission_report_path(submission_dir);
    if report.exists() {
        fs::remove_file(&report)?;
    }
    let result_dir = paths::submission_result_dir(submission_dir);
    if result_dir.exists() {
        fs::remove_dir_all(&result_dir)?;
    }
    Ok(())
}

/// Write `result.md` and the machine-readable `result/summary.json`.
pub fn write_submission_report(
    submission: &Submission,
    result: &SubmissionResult,
    inventory: &TestInventory,
) -> io::Result<PathBuf> {
    let report_path = paths::submission_report_path(&submission.dir);
    fs::write(&report_path, report::render_submission_report(result, inventory))?;

    let summary_path = paths::submission_summary_path(&submission.dir);
    paths::ensure_parent_dir(&summary_path)?;
    let json = serde_json::to_string_pretty(result).map_err(io::Error::other)?;
    fs::write(&summary_path, json)?;

    Ok(report_path)
}

/// Write both cohort tables under `output_dir`, named by the run timestamp.
pub fn write_cohort_tables(
    output_dir: &Path,
    timestamp: &str,
    cohort: &CohortReport,
    inventory: &TestInventory,
) -> io::Result<(PathBuf, PathBuf)> {
    paths::ensure_dir(output_dir)?;

    let results = paths::cohort_results_path(output_dir, timestamp);
    fs::write(&results, report::render_score_table(&cohort.scores, inventory))?;

    let tests = paths::cohort_tests_path(output_dir, timestamp);
    fs::write(&tests, report::render_failure_table(&cohort.failures))?;

    Ok((results, tests))
}

#[cfg(test)]
mod tests {
    use super::*;
    use marker::cohort::CohortAggregator;
    use marker::scorer::grade_submission;
    use marker::types::{SubgroupKey, Verdict, VerdictSet};
    use tempfile::TempDir;
    use util::grading_config::PolicyOptions;

    fn inventory() -> TestInventory {
        let counts = SubgroupKey::all().map(|k| (k, 1)).collect();
        TestInventory::from_counts(&PolicyOptions::default(), counts).unwrap()
    }

    fn graded(identity: &str) -> SubmissionResult {
        let set: VerdictSet = SubgroupKey::all()
            .map(|k| (k, vec![Verdict::failed(format!("{k}::only"))]))
            .collect();
        grade_submission(identity, &set, &inventory()).unwrap()
    }

    #[test]
    fn test_clear_removes_previous_output() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        fs::write(dir.join("result.md"), "old").unwrap();
        fs::create_dir_all(dir.join("result")).unwrap();
        fs::write(dir.join("result").join("basics::optional_stderr.txt"), "old").unwrap();
        fs::write(dir.join("runtime.wasm"), "keep").unwrap();

        clear_submission_artifacts(dir).unwrap();
        clear_submission_artifacts(dir).unwrap();

        assert!(!dir.join("result.md").exists());
        assert!(!dir.join("result").exists());
        assert!(dir.join("runtime.wasm").exists());
    }

    #[test]
    fn test_submission_report_files() {
        let tmp = TempDir::new().unwrap();
        let submission = Submission {
            identity: "alice".to_string(),
            dir: tmp.path().to_path_buf(),
            artifact: tmp.path().join("runtime.wasm"),
        };
        let result = graded("alice");

        let path = write_submission_report(&submission, &result, &inventory()).unwrap();

        let md = fs::read_to_string(path).unwrap();
        assert!(md.contains("auto-graded-score: 0"));
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(tmp.path().join("result/summary.json")).unwrap())
                .unwrap();
        assert_eq!(json["identity"], "alice");
        assert_eq!(json["sum_failures"], 15);
        assert_eq!(json["subgroups"]["basics::fundamentals"]["outcome"], false);
    }

    #[test]
    fn test_cohort_tables_are_timestamped() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let mut agg = CohortAggregator::new();
        agg.record(&graded("alice"));
        agg.record(&graded("bob"));

        let (results, tests) =
            write_cohort_tables(&out, "20240101_120000", &agg.finalize(), &inventory()).unwrap();

        assert_eq!(results, out.join("20240101_120000_results.csv"));
        assert_eq!(tests, out.join("20240101_120000_tests.csv"));

        let scores = fs::read_to_string(results).unwrap();
        assert_eq!(scores.lines().count(), 3);
        assert!(scores.lines().nth(1).unwrap().starts_with("alice,0,0,15,"));

        let failures = fs::read_to_string(tests).unwrap();
        assert!(failures.starts_with("test,failures\n"));
        assert!(failures.contains("basics::fundamentals::only,2\n"));
    }
}
