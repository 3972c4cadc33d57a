//! hagrid-state: the per-cycle working set.
//!
//! Nodes, resources, and actions are stored in arenas inside a
//! [`WorkingSet`] and addressed by index newtypes ([`NodeId`],
//! [`ResourceId`], [`ActionId`]). Ordering edges live in each action's
//! `before` / `after` lists, so the action graph may contain cycles without
//! any shared ownership.
//!
//! A working set is usually built from a JSON [`ClusterSnapshot`], where
//! everything is referenced by name.

pub mod error;
pub mod snapshot;
pub mod types;
pub mod working_set;

pub use error::{StateError, StateResult};
pub use snapshot::{
    ActionSnapshot, ClusterSnapshot, EdgeSnapshot, LocationSnapshot, NodeSnapshot, OrderingSnapshot,
    ResourceSnapshot,
};
pub use types::*;
pub use working_set::WorkingSet;
