//! Marker Error Types
//!
//! This module defines the [`MarkerError`] enum, which encapsulates all error types that can occur
//! while building the test inventory, collecting verdicts, and applying the grading policy.
//!
//! # Usage
//!
//! Use [`MarkerError`] as the error type in functions that may fail due to runner, input or I/O
//! issues. Each variant is tailored to a specific error scenario encountered in the grading pipeline.
//!
//! # Example
//!
//! ```rust
//! use marker::error::MarkerError;
//!
//! fn parse_filter(data: &str) -> Result<(), MarkerError> {
//!     if data.is_empty() {
//!         return Err(MarkerError::UnknownSubgroup("empty filter".to_string()));
//!     }
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::path::PathBuf;

/// Represents all error types that can occur in the marker system.
#[derive(Debug)]
pub enum MarkerError {
    /// A `group::subgroup` key that is not part of the configured inventory.
    UnknownSubgroup(String),
    /// Verdicts for a subgroup were never supplied to the policy engine.
    MissingSubgroup(String),
    /// The test inventory could not be established.
    Inventory(String),
    /// The prebuilt submission artifact does not exist.
    MissingArtifact(PathBuf),
    /// The test runner could not be executed or did not finish.
    Collector(String),
    /// The runner's structured result is missing or unreadable.
    MalformedResult(String),
    /// I/O error (file not found, unreadable, etc.).
    IoError(String),
}

impl fmt::Display for MarkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerError::UnknownSubgroup(key) => write!(f, "Unknown subgroup '{key}'"),
            MarkerError::MissingSubgroup(key) => write!(f, "No verdicts supplied for '{key}'"),
            MarkerError::Inventory(e) => write!(f, "Test inventory error: {e}"),
            MarkerError::MissingArtifact(path) => {
                write!(f, "Submission artifact {} does not exist", path.display())
            }
            MarkerError::Collector(e) => write!(f, "Test runner error: {e}"),
            MarkerError::MalformedResult(e) => write!(f, "Malformed runner result: {e}"),
            MarkerError::IoError(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for MarkerError {}

impl From<std::io::Error> for MarkerError {
    fn from(value: std::io::Error) -> Self {
        MarkerError::IoError(value.to_string())
    }
}
