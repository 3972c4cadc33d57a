//! hagrid-core: shared vocabulary for the hagrid planning crates.
//!
//! - **`config`**: cluster options loaded from TOML or a snapshot
//! - **`score`**: saturating placement score arithmetic
//! - **`names`**: task names, attribute keys, action key helpers

pub mod config;
pub mod names;
pub mod score;

pub use config::{ClusterOptions, ConfigError, ConfigResult};
pub use score::{INFINITY, add_scores, parse_score, score_to_string};
