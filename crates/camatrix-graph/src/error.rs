//! Transport-level error types.
//!
//! Every variant here is fatal to a run: downstream policy evaluation needs
//! complete group and user sets, so there is no retry or partial-result
//! path at this layer.

use thiserror::Error;

/// Errors from credential handling and directory API access.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Missing or invalid client credentials, caught before any network call.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Token acquisition against the identity provider failed.
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// A directory API call failed (transport error or non-success status).
    #[error("directory request failed: {message}")]
    Transport { message: String },

    /// A directory response did not match the expected shape.
    #[error("unexpected directory response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for GraphError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }
}

impl From<GraphError> for camatrix_domain::DomainError {
    fn from(err: GraphError) -> Self {
        camatrix_domain::DomainError::directory(err.to_string())
    }
}

/// Result type for directory client operations.
pub type GraphResult<T> = Result<T, GraphError>;
