//! Error types for the working set.

use thiserror::Error;

/// Result type alias for working set operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur while building or loading a working set.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to read snapshot {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("snapshot decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("unknown resource: {0}")]
    UnknownResource(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("unknown ordering type: {0}")]
    UnknownOrderType(String),

    #[error("duplicate {kind} name: {name}")]
    Duplicate { kind: &'static str, name: String },

    #[error("resource {0} is a primitive and cannot have children")]
    NotCollective(String),

    #[error("malformed ordering: {0}")]
    MalformedOrdering(String),
}
