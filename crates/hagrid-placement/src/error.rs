//! Error types for placement.

use thiserror::Error;

pub type PlacementResult<T> = Result<T, PlacementError>;

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("unknown placement strategy '{0}' (expected default, utilization, minimal, or balanced)")]
    UnknownStrategy(String),
}
