use crate::config::AppConfig;
use chrono::{DateTime, Local};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Create a directory (and all parents) if it doesn't exist, and return the path.
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<PathBuf> {
    let p = path.as_ref();
    fs::create_dir_all(p)?;
    Ok(p.to_path_buf())
}

/// Ensure the parent directory of a *file path* exists (no-op if none).
pub fn ensure_parent_dir<P: AsRef<Path>>(file_path: P) -> io::Result<()> {
    if let Some(parent) = file_path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Resolve a configured path: absolute as-is, relative against current_dir().
fn resolve(configured: &str) -> PathBuf {
    let p = PathBuf::from(configured);
    if p.is_absolute() {
        p
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(p)
    }
}

/// Folder holding one directory per submission.
pub fn submissions_root() -> PathBuf {
    resolve(&AppConfig::global().submissions_root)
}

/// Folder receiving the timestamped cohort tables.
pub fn output_dir() -> PathBuf {
    resolve(&AppConfig::global().output_dir)
}

/// Directory the test runner is invoked from.
pub fn runner_workdir() -> PathBuf {
    resolve(&AppConfig::global().runner_workdir)
}

pub fn grading_config_path() -> PathBuf {
    resolve(&AppConfig::global().grading_config)
}

// ─── Per-submission artifacts ───────────────────────────────────────

/// Rendered report:  {submission}/result.md
pub fn submission_report_path(submission_dir: &Path) -> PathBuf {
    submission_dir.join("result.md")
}

/// Raw runner artifacts:  {submission}/result
pub fn submission_result_dir(submission_dir: &Path) -> PathBuf {
    submission_dir.join("result")
}

/// {submission}/result/summary.json
pub fn submission_summary_path(submission_dir: &Path) -> PathBuf {
    submission_result_dir(submission_dir).join("summary.json")
}

/// {submission}/result/{filter}_stderr.txt
pub fn subgroup_stderr_path(submission_dir: &Path, filter: &str) -> PathBuf {
    submission_result_dir(submission_dir).join(format!("{filter}_stderr.txt"))
}

/// {submission}/result/{filter}_result.xml
pub fn subgroup_junit_path(submission_dir: &Path, filter: &str) -> PathBuf {
    submission_result_dir(submission_dir).join(format!("{filter}_result.xml"))
}

// ─── Cohort artifacts ───────────────────────────────────────────────

/// Timestamp used to keep cohort tables from overwriting earlier runs.
pub fn run_timestamp(now: DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// {output}/{timestamp}_results.csv
pub fn cohort_results_path(output_dir: &Path, timestamp: &str) -> PathBuf {
    output_dir.join(format!("{timestamp}_results.csv"))
}

/// {output}/{timestamp}_tests.csv
pub fn cohort_tests_path(output_dir: &Path, timestamp: &str) -> PathBuf {
    output_dir.join(format!("{timestamp}_tests.csv"))
}
