use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Failure tolerance for the two scored subgroups of one group.
///
/// `optional` subgroups have no entry here: they are always evaluated with a
/// threshold of zero and never contribute to a group's outcome.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct GroupThresholds {
    #[serde(default)]
    pub max_fundamentals_failures: u32,
    #[serde(default)]
    pub max_challenging_failures: u32,
}

impl GroupThresholds {
    pub const fn new(max_fundamentals_failures: u32, max_challenging_failures: u32) -> Self {
        Self {
            max_fundamentals_failures,
            max_challenging_failures,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PolicyOptions {
    #[serde(default = "default_basics")]
    pub basics: GroupThresholds,
    #[serde(default = "default_currency")]
    pub currency: GroupThresholds,
    #[serde(default = "default_staking")]
    pub staking: GroupThresholds,
    #[serde(default = "default_tipping")]
    pub tipping: GroupThresholds,
    #[serde(default = "default_nonce")]
    pub nonce: GroupThresholds,
    /// Total failures (optional subgroups included) still eligible for distinction.
    #[serde(default = "default_distinction_max_failures")]
    pub distinction_max_failures: u32,
}

impl Default for PolicyOptions {
    fn default() -> Self {
        Self {
            basics: default_basics(),
            currency: default_currency(),
            staking: default_staking(),
            tipping: default_tipping(),
            nonce: default_nonce(),
            distinction_max_failures: default_distinction_max_failures(),
        }
    }
}

/// How the external test runner is driven.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Cargo package holding the grading tests.
    #[serde(default = "default_package")]
    pub package: String,
    #[serde(default = "default_features")]
    pub features: String,
    /// Suite key under `rust-suites` in the nextest listing.
    #[serde(default = "default_suite")]
    pub suite: String,
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_junit_file")]
    pub junit_file: String,
    /// File name of the prebuilt artifact inside each submission folder.
    #[serde(default = "default_artifact_file_name")]
    pub artifact_file_name: String,
    /// Environment key used to hand the artifact path to the test binary.
    #[serde(default = "default_artifact_env_key")]
    pub artifact_env_key: String,
    /// `RUST_LOG` value passed to the test binary.
    #[serde(default = "default_runner_log")]
    pub runner_log: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            package: default_package(),
            features: default_features(),
            suite: default_suite(),
            profile: default_profile(),
            junit_file: default_junit_file(),
            artifact_file_name: default_artifact_file_name(),
            artifact_env_key: default_artifact_env_key(),
            runner_log: default_runner_log(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct GradingConfig {
    #[serde(default)]
    pub policy: PolicyOptions,
    #[serde(default)]
    pub runner: RunnerOptions,
}

impl GradingConfig {
    pub fn default_config() -> Self {
        GradingConfig {
            policy: PolicyOptions::default(),
            runner: RunnerOptions::default(),
        }
    }

    /// Load the grading config from `path`.
    ///
    /// A missing file yields [`GradingConfig::default_config`]; an unreadable or
    /// invalid file is an error.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            tracing::warn!(
                "No grading config at {}, using default policy",
                path.display()
            );
            return Ok(Self::default_config());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read grading config at {path:?}: {e}"))?;

        serde_json::from_str(&contents)
            .map_err(|e| format!("Invalid grading config JSON at {path:?}: {e}"))
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {e:?}"))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config to JSON: {e}"))?;

        fs::write(path, json).map_err(|e| format!("Failed to write config file to disk: {e:?}"))
    }
}

//Default Functions

fn default_basics() -> GroupThresholds {
    GroupThresholds::new(0, 2)
}

fn default_currency() -> GroupThresholds {
    GroupThresholds::new(0, 4)
}

fn default_staking() -> GroupThresholds {
    GroupThresholds::new(0, 2)
}

fn default_tipping() -> GroupThresholds {
    GroupThresholds::new(0, 4)
}

fn default_nonce() -> GroupThresholds {
    GroupThresholds::new(0, 2)
}

fn default_distinction_max_failures() -> u32 {
    5
}

fn default_package() -> String {
    "runtime".to_string()
}

fn default_features() -> String {
    "final-grade".to_string()
}

fn default_suite() -> String {
    "runtime::grading".to_string()
}

fn default_profile() -> String {
    "default".to_string()
}

fn default_junit_file() -> String {
    "result.xml".to_string()
}

fn default_artifact_file_name() -> String {
    "runtime.wasm".to_string()
}

fn default_artifact_env_key() -> String {
    "WASM_FILE".to_string()
}

fn default_runner_log() -> String {
    "grading=debug".to_string()
}

fn default_timeout_secs() -> u64 {
    600
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "policy": { "currency": { "max_challenging_failures": 1 } } }"#;
        let cfg: GradingConfig = serde_json::from_str(json).unwrap();

        assert_eq!(cfg.policy.currency, GroupThresholds::new(0, 1));
        assert_eq!(cfg.policy.basics, GroupThresholds::new(0, 2));
        assert_eq!(cfg.policy.distinction_max_failures, 5);
        assert_eq!(cfg.runner, RunnerOptions::default());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let cfg = GradingConfig::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(cfg, GradingConfig::default_config());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grading_config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = GradingConfig::load(&path).unwrap_err();
        assert!(err.contains("Invalid grading config JSON"), "{err}");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("grading_config.json");

        let mut cfg = GradingConfig::default_config();
        cfg.policy.distinction_max_failures = 3;
        cfg.runner.timeout_secs = 30;
        cfg.save(&path).unwrap();

        assert_eq!(GradingConfig::load(&path).unwrap(), cfg);
    }
}
