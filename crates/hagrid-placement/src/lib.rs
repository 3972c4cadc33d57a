//! hagrid-placement: node ranking and resource assignment.
//!
//! This crate decides where resources should run. It reads location
//! scores out of the working set, ranks candidate nodes, and records one
//! assigned node per primitive. Probes and ordering live in
//! `hagrid-scheduler`.
//!
//! # Components
//!
//! - **`node`**: Availability checks and per-resource node copies
//! - **`ranking`**: Node comparator and placement strategies
//! - **`location`**: Applying location constraints to allowed nodes
//! - **`assign`**: Picking a node for each primitive

pub mod assign;
pub mod error;
pub mod location;
pub mod node;
pub mod ranking;

pub use assign::{assign_resources, choose_node, ranked_candidates};
pub use error::{PlacementError, PlacementResult};
pub use location::{apply_location, apply_locations, init_allowed_nodes};
pub use node::{any_available, copy_node_list, copy_node_table, is_available};
pub use ranking::{PlacementStrategy, compare_node_capacities, compare_nodes, rank_nodes};
