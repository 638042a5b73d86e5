//! Error types for avdkit
//!
//! Centralized error handling using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Broad failure category, used by callers that only care about the class of
/// problem (exit codes, retry policy in the host, reporting).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A named AVD is not present on disk
    Discovery,
    /// SDK root unknown/missing, or the AVD config could not be read or written
    Configuration,
    /// The creation tool failed, or its output was classified as a failure
    CreationFailure,
    /// An I/O error interrupted the creation tool conversation
    CreationAborted,
    /// The caller cancelled the operation while the tool was running
    CreationInterrupted,
    /// Removing the AVD from disk failed
    DeletionFailure,
    /// Rejected while resolving the request, before any tool was run
    InvalidInput,
}

/// Main error type for avdkit
#[derive(Error, Debug)]
pub enum AvdError {
    #[error("AVD '{name}' does not exist at {path}")]
    Discovery { name: String, path: PathBuf },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Could not access AVD config file {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("AVD creation failed: {0}")]
    CreationFailed(String),

    #[error("Invalid AVD target '{package}': the system image is not installed")]
    InvalidTarget { package: String, output: String },

    #[error("More than one ABI is available for '{package}'; specify the ABI explicitly")]
    AmbiguousAbi { package: String, output: String },

    #[error("AVD creation aborted: {0}")]
    CreationAborted(#[source] std::io::Error),

    #[error("AVD creation interrupted")]
    CreationInterrupted,

    #[error("Failed to delete {path}: {source}")]
    DeletionFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for avdkit operations
pub type Result<T> = std::result::Result<T, AvdError>;

impl AvdError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AvdError::Discovery { .. } => ErrorKind::Discovery,
            AvdError::Configuration(_)
            | AvdError::ConfigFile { .. }
            | AvdError::TomlParse(_)
            | AvdError::TomlSerialize(_) => ErrorKind::Configuration,
            AvdError::CreationFailed(_)
            | AvdError::InvalidTarget { .. }
            | AvdError::AmbiguousAbi { .. } => ErrorKind::CreationFailure,
            AvdError::CreationAborted(_) => ErrorKind::CreationAborted,
            AvdError::CreationInterrupted => ErrorKind::CreationInterrupted,
            AvdError::DeletionFailed { .. } => ErrorKind::DeletionFailure,
            AvdError::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }

    /// Raw tool output captured for a classified failure, if any
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            AvdError::InvalidTarget { output, .. } | AvdError::AmbiguousAbi { output, .. } => {
                Some(output)
            }
            _ => None,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            AvdError::Discovery { name, .. } => {
                format!("The AVD '{}' was not found. Named AVDs must be created beforehand.", name)
            }
            AvdError::InvalidTarget { package, .. } => format!(
                "Cannot create AVD: '{}' is not a valid target. Is the system image installed?",
                package
            ),
            AvdError::AmbiguousAbi { package, .. } => format!(
                "Cannot create AVD: '{}' is available for more than one ABI. Choose one explicitly.",
                package
            ),
            AvdError::CreationInterrupted => "AVD creation was cancelled".to_string(),
            _ => self.to_string(),
        }
    }
}
