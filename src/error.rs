// src/error.rs

//! Error types for kettle
//!
//! Every failure is terminal for the current invocation: there is no partial
//! success and no automatic retry. Recovery is re-running after fixing the
//! root cause.

use thiserror::Error;

/// Result type alias using kettle's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while checking, planning, or brewing a formula
#[derive(Error, Debug)]
pub enum Error {
    /// A fatal requirement is missing or in an unsupported configuration
    #[error("{message}")]
    UnsatisfiedRequirement { name: String, message: String },

    /// An external build command exited non-zero
    #[error("{stage} stage failed with exit code {}\n{output}", exit_code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    BuildStageFailure {
        stage: String,
        exit_code: Option<i32>,
        output: String,
    },

    /// A downloaded artifact did not match its declared checksum
    #[error("Checksum mismatch for {url}: expected {expected}, got {actual}")]
    IntegrityFailure {
        url: String,
        expected: String,
        actual: String,
    },

    /// The host has no installation path for a dependency
    #[error("Dependency '{0}' is not installed or has no known path")]
    UnresolvedDependency(String),

    /// The formula is structurally invalid
    #[error("Invalid formula: {0}")]
    InvalidFormula(String),

    /// Download failed
    #[error("Download error: {0}")]
    DownloadError(String),

    /// Parse error (formula, checksum, config)
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O error with context
    #[error("I/O error: {0}")]
    IoError(String),

    /// Raw I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Name of the stage a build failure came from, if any
    pub fn failed_stage(&self) -> Option<&str> {
        match self {
            Error::BuildStageFailure { stage, .. } => Some(stage),
            _ => None,
        }
    }
}
