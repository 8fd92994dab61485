//! Error types for lazybuild
//!
//! All modules use `LazybuildResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for lazybuild operations
pub type LazybuildResult<T> = Result<T, LazybuildError>;

/// All errors that can occur in lazybuild
#[derive(Error, Debug)]
pub enum LazybuildError {
    // Input errors
    #[error("Missing value for input '{0}'")]
    MissingInput(String),

    #[error("Invalid {input} entry '{entry}': expected KEY=VALUE")]
    InvalidKeyValue { input: String, entry: String },

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    GlobPattern { pattern: String, reason: String },

    #[error("Failed to read Dockerfile {path}: {source}")]
    DockerfileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read hash input {path}: {source}")]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Tag errors
    #[error("Invalid image reference '{reference}': {reason}")]
    InvalidTagFormat { reference: String, reason: String },

    // Sandbox errors
    #[error("Sandbox input not found: {0}")]
    SandboxInputMissing(PathBuf),

    #[error("Sandbox input outside the staging root: {0}")]
    SandboxInputOutside(PathBuf),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    #[error("Existence check timed out after {0}s")]
    ProbeTimeout(u64),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LazybuildError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Create an invalid tag format error
    pub fn invalid_tag(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTagFormat {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Check if error is retryable (transient probe failures only)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CommandFailed { .. } | Self::CommandExecution { .. } | Self::ProbeTimeout(_)
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingInput(_) => Some("Pass the flag or set the matching INPUT_* variable"),
            Self::InvalidTagFormat { .. } => {
                Some("References look like 'name' or 'name:tag', e.g. ghcr.io/acme/app:latest")
            }
            Self::DockerfileRead { .. } => {
                Some("Pass --file or place a Dockerfile in the build context")
            }
            Self::SandboxInputOutside(_) => {
                Some("Use paths relative to the working directory, without '..'")
            }
            _ => None,
        }
    }
}
