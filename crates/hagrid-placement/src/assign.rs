//! Assignment: choosing one node per primitive resource.
//!
//! Resources are assigned in working-set order. Each assignment consumes
//! capacity on the chosen node, so later resources see the updated load
//! when they are ranked.

use tracing::{debug, trace, warn};

use hagrid_state::{Node, NodeId, ResourceId, WorkingSet};

use crate::error::PlacementResult;
use crate::node::any_available;
use crate::ranking::{PlacementStrategy, rank_nodes};

/// Whether `node` has room for `rsc`'s utilization demand.
fn has_capacity(ws: &WorkingSet, rsc: ResourceId, node: NodeId) -> bool {
    let remaining = &ws.node(node).utilization;
    ws.resource(rsc)
        .utilization
        .iter()
        .all(|(key, demand)| remaining.get(key).copied().unwrap_or(0) >= *demand)
}

/// The resource's allowed nodes, most preferred first.
///
/// Candidates carry the resource's weights but the node's live state, so
/// earlier assignments in the same cycle are taken into account.
pub fn ranked_candidates(ws: &WorkingSet, rsc: ResourceId, strategy: PlacementStrategy) -> Vec<Node> {
    let resource = ws.resource(rsc);
    let candidates = resource
        .allowed_nodes
        .values()
        .map(|allowed| {
            let mut live = ws.node(allowed.id).clone();
            live.weight = allowed.weight;
            live.discover_mode = allowed.discover_mode;
            live
        })
        .collect();

    let active = match resource.running_on.as_slice() {
        [only] => Some(*only),
        _ => None,
    };
    rank_nodes(candidates, active, strategy)
}

/// Pick the best node for a primitive resource, or `None` if no allowed
/// node can take it.
pub fn choose_node(ws: &WorkingSet, rsc: ResourceId, strategy: PlacementStrategy) -> Option<NodeId> {
    let candidates = ranked_candidates(ws, rsc, strategy);
    if !any_available(&candidates) {
        trace!(rsc = %ws.resource(rsc).name, "no available node allows resource");
        return None;
    }
    candidates
        .into_iter()
        .find(|node| {
            any_available([node])
                && (strategy == PlacementStrategy::Default || has_capacity(ws, rsc, node.id))
        })
        .map(|node| node.id)
}

/// Assign every unassigned primitive to a node. Returns how many were
/// assigned.
pub fn assign_resources(ws: &mut WorkingSet) -> PlacementResult<usize> {
    let strategy: PlacementStrategy = ws.options.placement_strategy.parse()?;
    let mut assigned = 0;
    for rsc in ws.top_level_resources() {
        assigned += assign_resource(ws, rsc, strategy);
    }
    debug!(assigned, %strategy, "resources assigned");
    Ok(assigned)
}

fn assign_resource(ws: &mut WorkingSet, rsc: ResourceId, strategy: PlacementStrategy) -> usize {
    let resource = ws.resource(rsc);
    if resource.variant.is_collective() {
        let children = resource.children.clone();
        return children
            .into_iter()
            .map(|child| assign_resource(ws, child, strategy))
            .sum();
    }
    if resource.assigned_to.is_some() || resource.orphan {
        return 0;
    }

    let Some(node) = choose_node(ws, rsc, strategy) else {
        warn!(rsc = %ws.resource(rsc).name, "resource cannot run anywhere");
        return 0;
    };

    let demand = ws.resource(rsc).utilization.clone();
    let target = ws.node_mut(node);
    target.num_resources += 1;
    for (key, amount) in demand {
        *target.utilization.entry(key).or_insert(0) -= amount;
    }
    ws.resource_mut(rsc).assigned_to = Some(node);
    debug!(
        rsc = %ws.resource(rsc).name,
        node = %ws.node(node).name,
        "resource assigned"
    );
    1
}
