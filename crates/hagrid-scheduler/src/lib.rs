//! hagrid-scheduler: turning a placed working set into a transition graph.
//!
//! Given resources assigned to nodes, the scheduler decides which probes
//! are needed, what has to be fenced or shut down, and in which order the
//! resulting actions may run.
//!
//! # Architecture
//!
//! ```text
//! Scheduler
//!   ├── hagrid-placement (allowed nodes, locations, assignment)
//!   ├── hagrid-health (node health location scores)
//!   ├── probes ── variant (per-variant probe and stop/demote lookup)
//!   ├── fencing (fence, unfence, shutdown actions)
//!   ├── ordering (constraints → action edges)
//!   │     └── implicit (probe restart and stop orderings)
//!   └── graph (TransitionGraph output)
//! ```

pub mod error;
pub mod fencing;
pub mod graph;
pub mod implicit;
pub mod ordering;
pub mod probes;
pub mod scheduler;
pub mod variant;

pub use error::{SchedulerError, SchedulerResult};
pub use graph::{GraphAction, GraphEdge, TransitionGraph};
pub use implicit::{
    RestartWalk, add_probe_orderings_for_stops, find_compatible_child, order_probes,
    probe_needed_before_action,
};
pub use ordering::{apply_ordering, apply_orderings, resolve_side};
pub use probes::{ProbeSummary, schedule_probes};
pub use scheduler::{PlanSummary, Scheduler};
