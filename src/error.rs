//! Error types for the instance guard.
//!
//! Uses thiserror for derive macros. Every fault carries enough context
//! (path and underlying I/O error) to be reported to a user as-is.

use crate::exit_codes;
use thiserror::Error;

/// Faults recorded by an [`InstanceGuard`](crate::InstanceGuard).
///
/// Faults are collected during construction and acquisition and surfaced
/// only when the guard is released, after cleanup has run.
#[derive(Error, Debug)]
pub enum GuardError {
    /// The application name is empty or contains a path separator.
    #[error("invalid application name '{0}': must be non-empty and contain no path separator")]
    InvalidName(String),

    /// The user data root is missing, or the marker directory could not be created.
    #[error("filesystem unavailable: {0}")]
    FileSystemUnavailable(String),

    /// The marker file could not be created, written or reopened.
    #[error("failed to create marker: {0}")]
    MarkerCreateFailed(String),

    /// A stale marker could not be removed, blocking recovery.
    #[error("failed to delete stale marker: {0}")]
    MarkerDeleteFailed(String),
}

impl GuardError {
    /// Returns the process exit code a binary embedding the guard should use.
    pub fn exit_code(&self) -> i32 {
        match self {
            GuardError::InvalidName(_) => exit_codes::INVALID_NAME,
            GuardError::FileSystemUnavailable(_) => exit_codes::FILESYSTEM_FAILURE,
            GuardError::MarkerCreateFailed(_) => exit_codes::MARKER_FAILURE,
            GuardError::MarkerDeleteFailed(_) => exit_codes::MARKER_FAILURE,
        }
    }
}

/// Result type alias for guard operations.
pub type Result<T> = std::result::Result<T, GuardError>;
