//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    /// Directory holding one folder per student submission.
    pub submissions_root: String,
    /// Only folders whose name starts with this prefix are submissions.
    pub submission_prefix: String,
    /// Where the timestamped cohort tables are written.
    pub output_dir: String,
    /// Working directory the test runner is invoked from (the grading harness crate).
    pub runner_workdir: String,
    /// Path to the grading policy JSON document.
    pub grading_config: String,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// This method is used internally to populate the singleton. Every value
    /// has a default, so it never panics.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            log_level: env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "grader=info,marker=info,code_runner=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "grader.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "true".into()) == "true",
            submissions_root: env::var("SUBMISSIONS_ROOT").unwrap_or_else(|_| "submissions".into()),
            submission_prefix: env::var("SUBMISSION_PREFIX").unwrap_or_default(),
            output_dir: env::var("OUTPUT_DIR").unwrap_or_else(|_| ".".into()),
            runner_workdir: env::var("RUNNER_WORKDIR").unwrap_or_else(|_| ".".into()),
            grading_config: env::var("GRADING_CONFIG")
                .unwrap_or_else(|_| "grading_config.json".into()),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock.write().expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    /// Generic internal setter for any field in the config.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_log_to_stdout(value: bool) {
        AppConfig::set_field(|cfg| cfg.log_to_stdout = value);
    }

    pub fn set_submissions_root(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.submissions_root = value.into());
    }

    pub fn set_submission_prefix(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.submission_prefix = value.into());
    }

    pub fn set_output_dir(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.output_dir = value.into());
    }

    pub fn set_runner_workdir(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.runner_workdir = value.into());
    }

    pub fn set_grading_config(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.grading_config = value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn setters_override_and_reset_restores() {
        unsafe {
            env::set_var("SUBMISSION_PREFIX", "hk-2024-assignment-3-frameless");
        }
        AppConfig::reset();
        assert_eq!(
            AppConfig::global().submission_prefix,
            "hk-2024-assignment-3-frameless"
        );

        AppConfig::set_submission_prefix("other");
        assert_eq!(AppConfig::global().submission_prefix, "other");

        AppConfig::reset();
        assert_eq!(
            AppConfig::global().submission_prefix,
            "hk-2024-assignment-3-frameless"
        );

        unsafe {
            env::remove_var("SUBMISSION_PREFIX");
        }
        AppConfig::reset();
    }

    #[test]
    #[serial]
    fn defaults_are_usable_without_env() {
        unsafe {
            env::remove_var("OUTPUT_DIR");
            env::remove_var("GRADING_CONFIG");
        }
        AppConfig::reset();
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.output_dir, ".");
        assert_eq!(cfg.grading_config, "grading_config.json");
    }
}
