//! Defines the custom error type for the `core` module.

use std::path::PathBuf;
use thiserror::Error;

use super::session::SessionStatus;

/// The primary error type for the `core` module.
///
/// Per-entry traversal failures and per-field metadata failures are recovered
/// where they happen and never surface here. What remains are the errors a caller
/// can actually act on: a bad root, misuse of the session lifecycle, or an
/// unknown report column.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Represents an I/O error, typically from file system operations.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),

    /// The configured root does not exist.
    #[error("Search root does not exist: {0}")]
    RootNotFound(PathBuf),

    /// Represents a path that was expected to be a directory but was not.
    #[error("Path is not a valid directory: {0}")]
    NotADirectory(PathBuf),

    /// An operation was attempted in a lifecycle state that does not allow it.
    #[error("Cannot {operation} while the session is {status}")]
    InvalidState {
        operation: &'static str,
        status: SessionStatus,
    },

    /// The session was started before `configure` succeeded.
    #[error("Session has not been configured")]
    NotConfigured,

    /// A report column name outside the fixed vocabulary.
    #[error("Unsupported report field: {0}")]
    UnsupportedField(String),
}
