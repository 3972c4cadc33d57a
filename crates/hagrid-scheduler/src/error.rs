//! Scheduler error types.

use thiserror::Error;

/// Errors that can occur during a planning cycle.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid cluster options: {0}")]
    Config(#[from] hagrid_core::ConfigError),

    #[error("working set error: {0}")]
    State(#[from] hagrid_state::StateError),

    #[error("placement error: {0}")]
    Placement(#[from] hagrid_placement::PlacementError),

    #[error("node health error: {0}")]
    Health(#[from] hagrid_health::HealthError),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
