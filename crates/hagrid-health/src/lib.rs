//! hagrid-health: node health as placement input.
//!
//! Nodes report health through `#health-*` attributes whose values are
//! colours (`red`, `yellow`, `green`) or plain scores. The configured
//! strategy decides what each colour is worth; the summed score is applied
//! to every resource as a location constraint before placement.

pub mod applier;
pub mod error;
pub mod strategy;

pub use applier::{apply_node_health, sum_node_health_scores};
pub use error::{HealthError, HealthResult};
pub use strategy::{ColourScores, HealthStrategy, validate_health_strategy};
