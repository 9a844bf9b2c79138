//! Drives `cargo nextest` against a submission's prebuilt artifact.
//!
//! [`NextestRunner`] is the production [`TestEnumerator`] and [`VerdictCollector`]:
//! it lists tests to build the inventory, and runs one subgroup at a time, keeping the
//! runner's stderr and JUnit report in the submission's `result/` folder.

pub mod error;
pub mod junit;
pub mod listing;

use crate::error::RunnerError;
use async_trait::async_trait;
use marker::error::MarkerError;
use marker::traits::collector::{TestEnumerator, VerdictCollector};
use marker::types::{SubgroupKey, Submission, Verdict};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::{
    process::Command,
    time::{Duration, timeout},
};
use tracing::{debug, warn};
use util::grading_config::RunnerOptions;
use util::paths;

pub struct NextestRunner {
    options: RunnerOptions,
    /// Directory of the workspace holding the grading tests.
    workdir: PathBuf,
    program: String,
    program_args: Vec<String>,
}

impl NextestRunner {
    pub fn new(options: RunnerOptions, workdir: impl Into<PathBuf>) -> Self {
        Self {
            options,
            workdir: workdir.into(),
            program: "cargo".to_string(),
            program_args: Vec::new(),
        }
    }

    /// Invoke `program` with `args` prepended instead of `cargo`.
    pub fn with_program(mut self, program: impl Into<String>, args: Vec<String>) -> Self {
        self.program = program.into();
        self.program_args = args;
        self
    }

    fn filter_expr(filter: &str) -> String {
        format!("test({filter})")
    }

    pub fn list_args(&self, filter: &str) -> Vec<String> {
        vec![
            "nextest".to_string(),
            "list".to_string(),
            "-p".to_string(),
            self.options.package.clone(),
            "--features".to_string(),
            self.options.features.clone(),
            "-E".to_string(),
            Self::filter_expr(filter),
            "-T".to_string(),
            "json-pretty".to_string(),
        ]
    }

    pub fn run_args(&self, filter: &str) -> Vec<String> {
        vec![
            "nextest".to_string(),
            "run".to_string(),
            "--release".to_string(),
            "-p".to_string(),
            self.options.package.clone(),
            "--features".to_string(),
            self.options.features.clone(),
            "-E".to_string(),
            Self::filter_expr(filter),
            "--failure-output".to_string(),
            "final".to_string(),
            "--success-output".to_string(),
            "never".to_string(),
            "--no-fail-fast".to_string(),
        ]
    }

    /// Where nextest writes its JUnit report for the configured profile.
    pub fn junit_path(&self) -> PathBuf {
        self.workdir
            .join("target")
            .join("nextest")
            .join(&self.options.profile)
            .join(&self.options.junit_file)
    }

    /// Run the runner to completion under the configured timeout.
    ///
    /// The exit status is returned, not judged: nextest exits non-zero whenever a test fails.
    /// On unix the runner leads its own process group, and a timeout kills that whole group
    /// so no test binary outlives the run.
    async fn exec(&self, args: Vec<String>, envs: &[(&str, &str)]) -> Result<Output, RunnerError> {
        debug!("running {} {} {}", self.program, self.program_args.join(" "), args.join(" "));

        let mut command = Command::new(&self.program);
        command
            .args(&self.program_args)
            .args(&args)
            .current_dir(&self.workdir)
            .envs(envs.iter().copied())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let child = command
            .spawn()
            .map_err(|e| RunnerError::Spawn(format!("{}: {e}", self.program)))?;
        let pid = child.id();

        let secs = self.options.timeout_secs;
        match timeout(Duration::from_secs(secs), child.wait_with_output()).await {
            Ok(output) => Ok(output?),
            Err(_) => {
                if let Some(pid) = pid {
                    kill_process_group(pid).await;
                }
                Err(RunnerError::Timeout(secs))
            }
        }
    }

    async fn run_subgroup(
        &self,
        submission: &Submission,
        key: SubgroupKey,
    ) -> Result<Vec<Verdict>, RunnerError> {
        let filter = key.filter();
        let artifact = std::path::absolute(&submission.artifact)?;
        let artifact = artifact.to_string_lossy();

        paths::ensure_dir(paths::submission_result_dir(&submission.dir))?;

        let junit = self.junit_path();
        remove_stale(&junit)?;

        let output = match self
            .exec(
                self.run_args(&filter),
                &[
                    (self.options.artifact_env_key.as_str(), artifact.as_ref()),
                    ("RUST_LOG", self.options.runner_log.as_str()),
                ],
            )
            .await
        {
            Ok(output) => output,
            Err(e @ RunnerError::Timeout(_)) => {
                remove_stale(&junit)?;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        std::fs::write(paths::subgroup_stderr_path(&submission.dir, &filter), &output.stderr)?;

        if !output.status.success() {
            debug!(
                "{}: runner exited with {:?} for {filter}",
                submission.identity,
                output.status.code()
            );
        }

        if !junit.is_file() {
            return Err(RunnerError::InvalidJunit(format!(
                "no report at {} after running {filter} (exit code {:?})",
                junit.display(),
                output.status.code()
            )));
        }

        let kept = paths::subgroup_junit_path(&submission.dir, &filter);
        std::fs::copy(&junit, &kept)?;

        let xml = std::fs::read_to_string(&kept)?;
        junit::parse_junit(&xml)
    }
}

/// A report left behind by an earlier run must never be read as this run's.
fn remove_stale(path: &Path) -> Result<(), RunnerError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// SIGKILL every process in the group led by `pgid`.
#[cfg(unix)]
async fn kill_process_group(pgid: u32) {
    let status = Command::new("kill")
        .args(["-s", "KILL", "--"])
        .arg(format!("-{pgid}"))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    match status {
        Ok(status) if status.success() => debug!("killed runner process group {pgid}"),
        Ok(status) => warn!("kill of process group {pgid} exited with {:?}", status.code()),
        Err(e) => warn!("could not kill process group {pgid}: {e}"),
    }
}

#[cfg(not(unix))]
async fn kill_process_group(_pgid: u32) {}

#[async_trait]
impl TestEnumerator for NextestRunner {
    async fn count(&self, filter: &str) -> Result<usize, MarkerError> {
        let output = self.exec(self.list_args(filter), &[]).await?;

        if !output.status.success() {
            return Err(RunnerError::NonZeroExit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(listing::count_matching(&stdout, &self.options.suite)?)
    }
}

#[async_trait]
impl VerdictCollector for NextestRunner {
    async fn collect(
        &self,
        submission: &Submission,
        key: SubgroupKey,
    ) -> Result<Vec<Verdict>, MarkerError> {
        if !submission.artifact.is_file() {
            return Err(MarkerError::MissingArtifact(submission.artifact.clone()));
        }

        self.run_subgroup(submission, key).await.map_err(|e| {
            warn!("{}: collecting {key} failed: {e}", submission.identity);
            e.into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_args() {
        let runner = NextestRunner::new(RunnerOptions::default(), "/work");
        assert_eq!(
            runner.list_args("basics::fundamentals").join(" "),
            "nextest list -p runtime --features final-grade -E test(basics::fundamentals) -T json-pretty"
        );
    }

    #[test]
    fn test_run_args() {
        let runner = NextestRunner::new(RunnerOptions::default(), "/work");
        assert_eq!(
            runner.run_args("nonce::optional").join(" "),
            "nextest run --release -p runtime --features final-grade -E test(nonce::optional) \
             --failure-output final --success-output never --no-fail-fast"
        );
    }

    #[test]
    fn test_junit_path_follows_profile() {
        let mut options = RunnerOptions::default();
        options.profile = "ci".to_string();
        let runner = NextestRunner::new(options, "/work");
        assert_eq!(
            runner.junit_path(),
            PathBuf::from("/work/target/nextest/ci/result.xml")
        );
    }
}
