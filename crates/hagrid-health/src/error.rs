//! Error types for node health.

use thiserror::Error;

pub type HealthResult<T> = Result<T, HealthError>;

#[derive(Debug, Error)]
pub enum HealthError {
    #[error(
        "unknown node health strategy '{0}' (expected none, migrate-on-red, only-green, progressive, or custom)"
    )]
    UnknownStrategy(String),
}
