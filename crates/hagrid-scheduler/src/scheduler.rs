//! Scheduler: one planning cycle over a working set.
//!
//! The `Scheduler` owns the working set for the cycle and runs each stage
//! in order:
//! - Validate options
//! - Build allowed nodes, apply node health and location constraints
//! - Assign resources to nodes
//! - Schedule probes and shutdowns
//! - Apply ordering constraints and infer implicit probe orderings

use serde::Serialize;
use tracing::{debug, info};

use hagrid_core::ClusterOptions;
use hagrid_health::{HealthStrategy, apply_node_health};
use hagrid_placement::{
    PlacementStrategy, apply_locations, assign_resources, init_allowed_nodes, ranked_candidates,
};
use hagrid_state::{Node, ResourceId, WorkingSet};

use crate::error::SchedulerResult;
use crate::fencing::schedule_shutdowns;
use crate::graph::TransitionGraph;
use crate::ordering::apply_orderings;
use crate::probes::schedule_probes;

/// Counts from one planning cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub health_constraints: usize,
    pub locations_applied: usize,
    pub assigned: usize,
    pub probes: usize,
    pub reprobes: usize,
    pub fenced: usize,
    pub shutdowns: usize,
    pub ordering_edges: usize,
    pub actions: usize,
}

/// Drives a planning cycle.
pub struct Scheduler {
    ws: WorkingSet,
    prepared: bool,
}

impl Scheduler {
    pub fn new(ws: WorkingSet) -> Self {
        Self {
            ws,
            prepared: false,
        }
    }

    /// Refuse option values the cycle cannot act on.
    pub fn validate(options: &ClusterOptions) -> SchedulerResult<()> {
        options.placement_strategy.parse::<PlacementStrategy>()?;
        options.node_health_strategy.parse::<HealthStrategy>()?;
        Ok(())
    }

    /// Compute every node's weight for every resource, without assigning
    /// anything. Runs once; later calls are no-ops.
    pub fn prepare(&mut self) -> SchedulerResult<PlanSummary> {
        let mut summary = PlanSummary::default();
        if self.prepared {
            return Ok(summary);
        }
        Self::validate(&self.ws.options)?;

        init_allowed_nodes(&mut self.ws);
        summary.health_constraints = apply_node_health(&mut self.ws)?;
        summary.locations_applied = apply_locations(&mut self.ws);
        self.prepared = true;
        debug!(
            health = summary.health_constraints,
            locations = summary.locations_applied,
            "node weights computed"
        );
        Ok(summary)
    }

    /// Run the whole cycle.
    pub fn run(&mut self) -> SchedulerResult<PlanSummary> {
        let mut summary = self.prepare()?;

        summary.assigned = assign_resources(&mut self.ws)?;
        let probes = schedule_probes(&mut self.ws)?;
        summary.probes = probes.probes;
        summary.reprobes = probes.reprobes;
        summary.fenced = probes.fenced;
        summary.shutdowns = schedule_shutdowns(&mut self.ws);
        summary.ordering_edges = apply_orderings(&mut self.ws);
        summary.actions = self.ws.actions().len();

        info!(
            assigned = summary.assigned,
            probes = summary.probes,
            fenced = summary.fenced,
            actions = summary.actions,
            "planning cycle complete"
        );
        Ok(summary)
    }

    /// Candidate nodes for `rsc`, most preferred first.
    pub fn rank(&mut self, rsc: ResourceId) -> SchedulerResult<Vec<Node>> {
        self.prepare()?;
        let strategy: PlacementStrategy = self.ws.options.placement_strategy.parse()?;
        Ok(ranked_candidates(&self.ws, rsc, strategy))
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.ws
    }

    pub fn into_working_set(self) -> WorkingSet {
        self.ws
    }

    pub fn transition_graph(&self) -> TransitionGraph {
        TransitionGraph::from_working_set(&self.ws)
    }
}
