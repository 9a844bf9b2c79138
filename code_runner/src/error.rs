use marker::error::MarkerError;
use std::fmt;

/// Failures of the external test runner.
#[derive(Debug)]
pub enum RunnerError {
    /// The runner process could not be started.
    Spawn(String),
    /// The runner exceeded the configured wall-clock limit and was killed.
    Timeout(u64),
    /// The runner exited unsuccessfully where success was required.
    NonZeroExit { code: Option<i32>, stderr: String },
    Io(String),
    /// The test listing was not the expected JSON document.
    InvalidListing(String),
    /// The JUnit report was missing or not well-formed.
    InvalidJunit(String),
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerError::Spawn(e) => write!(f, "Failed to start test runner: {e}"),
            RunnerError::Timeout(secs) => write!(f, "Test runner timed out after {secs}s"),
            RunnerError::NonZeroExit { code, stderr } => match code {
                Some(code) => write!(f, "Test runner exited with code {code}: {stderr}"),
                None => write!(f, "Test runner was terminated by a signal: {stderr}"),
            },
            RunnerError::Io(e) => write!(f, "I/O error: {e}"),
            RunnerError::InvalidListing(e) => write!(f, "Invalid test listing: {e}"),
            RunnerError::InvalidJunit(e) => write!(f, "Invalid JUnit report: {e}"),
        }
    }
}

impl std::error::Error for RunnerError {}

impl From<std::io::Error> for RunnerError {
    fn from(e: std::io::Error) -> Self {
        RunnerError::Io(e.to_string())
    }
}

impl From<RunnerError> for MarkerError {
    fn from(e: RunnerError) -> Self {
        match e {
            RunnerError::Io(msg) => MarkerError::IoError(msg),
            RunnerError::InvalidJunit(msg) => MarkerError::MalformedResult(msg),
            other => MarkerError::Collector(other.to_string()),
        }
    }
}
