//! Location constraints: turning constraint scores into per-resource node
//! weights.

use tracing::{debug, trace};

use hagrid_core::add_scores;
use hagrid_state::{DiscoverMode, LocationConstraint, ResourceId, WorkingSet};

/// Seed every resource's allowed-node table.
///
/// In a symmetric cluster every node starts allowed at weight 0. In an
/// asymmetric cluster nothing is allowed until a location constraint adds
/// the node.
pub fn init_allowed_nodes(ws: &mut WorkingSet) {
    let symmetric = ws.options.symmetric_cluster;
    let nodes = ws.nodes().to_vec();
    let resources: Vec<ResourceId> = ws.resources().iter().map(|r| r.id).collect();

    for rsc in resources {
        let allowed = &mut ws.resource_mut(rsc).allowed_nodes;
        allowed.clear();
        if symmetric {
            for node in &nodes {
                let mut copy = node.clone();
                copy.weight = 0;
                allowed.insert(copy.id, copy);
            }
        }
    }
    debug!(symmetric, "allowed nodes initialized");
}

/// Apply every recorded location constraint. Returns how many were applied.
pub fn apply_locations(ws: &mut WorkingSet) -> usize {
    let locations = ws.locations().to_vec();
    for constraint in &locations {
        apply_location(ws, constraint.rsc, constraint);
    }
    locations.len()
}

/// Add one constraint's score to `rsc`'s allowed-node copy, then pass it
/// on to the children of a collective resource.
pub fn apply_location(ws: &mut WorkingSet, rsc: ResourceId, constraint: &LocationConstraint) {
    let node = ws.node(constraint.node).clone();
    let resource = ws.resource_mut(rsc);

    let weighted = resource.allowed_nodes.entry(node.id).or_insert_with(|| {
        let mut copy = node.clone();
        copy.weight = 0;
        copy
    });
    weighted.weight = add_scores(weighted.weight, constraint.score);
    trace!(
        id = %constraint.id,
        rsc = %resource.name,
        node = %node.name,
        weight = weighted.weight,
        "location applied"
    );

    if weighted.discover_mode < constraint.discover_mode {
        weighted.discover_mode = constraint.discover_mode;
        if constraint.discover_mode == DiscoverMode::Exclusive {
            resource.exclusive_discover = true;
        }
    }

    let children = resource.children.clone();
    for child in children {
        apply_location(ws, child, constraint);
    }
}
