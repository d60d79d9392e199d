//! # Domain Errors
//!
//! Structured error codes for everything the bridge owns. Failures inside the
//! external CLI itself surface as `Cli` with whatever the CLI reported.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// A requested path resolved outside the workspace root.
    /// The operation is rejected before any filesystem effect.
    #[error("path traversal: '{requested}' resolves outside the workspace")]
    PathTraversal { requested: String },

    #[error("task execution exceeded {seconds}s timeout")]
    Timeout { seconds: u64 },

    #[error("claude CLI is not installed or not in PATH")]
    NotInstalled,

    /// The CLI ran but reported failure (is_error flag or non-zero exit).
    #[error("claude CLI error: {message}")]
    Cli { message: String, stderr: String },

    #[error("failed to parse CLI output: {reason}")]
    Parse { reason: String, stdout: String },

    #[error("invalid configuration [{field}]: {message}")]
    InvalidConfig { field: String, message: String },

    #[error("{operation} failed for {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BridgeError {
    /// Short machine-readable code, mirrored into logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PathTraversal { .. } => "PATH_TRAVERSAL",
            Self::Timeout { .. } => "TIMEOUT",
            Self::NotInstalled => "NOT_INSTALLED",
            Self::Cli { .. } => "CLI_ERROR",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::InvalidConfig { .. } => "INVALID_CONFIG",
            Self::Io { .. } => "IO_ERROR",
        }
    }

    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
