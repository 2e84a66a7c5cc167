//! Domain error types for matrix operations.

use thiserror::Error;

/// Domain-specific errors for matrix operations.
///
/// Any failure to read from the directory is fatal to a run: a matrix built
/// from partial policy or membership data would be misleading, so errors are
/// propagated rather than degraded into partial rows.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Error reading from the remote directory.
    #[error("directory error: {message}")]
    Directory { message: String },
}

impl DomainError {
    /// Wraps an arbitrary transport-level failure.
    pub fn directory(message: impl Into<String>) -> Self {
        Self::Directory {
            message: message.into(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
