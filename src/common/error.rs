//! Error types for the UI Conductor runner
//!
//! Only configuration-time problems are represented here. Anything that goes
//! wrong while a single test case runs is folded into that case's report
//! instead of surfacing as an `Error`.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the runner
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Invalid argument '{value}': {reason}")]
    InvalidArgument { value: String, reason: String },

    #[error("UI Conductor CLI not found at '{}'. Pass --cli-jar or set cli_jar in the config file", .0.display())]
    CliNotFound(PathBuf),

    #[error("Test file or directory '{}' (key '{key}') not found", path.display())]
    TestNotFound { key: String, path: PathBuf },

    #[error("Test id '{id}' is produced by both '{}' and '{}'. Rename one of the test roots", first.display(), second.display())]
    DuplicateTestId {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    // === Work Directory Errors ===
    #[error("Failed to prepare work directory '{}': {source}", path.display())]
    WorkDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("Failed to write file '{path}': {error}")]
    FileWrite { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(value: &str, reason: &str) -> Self {
        Self::InvalidArgument {
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a work directory error for `path`
    pub fn work_dir(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::WorkDir {
            path: path.into(),
            source,
        }
    }
}
