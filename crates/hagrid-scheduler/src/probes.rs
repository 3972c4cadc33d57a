//! Probe scheduling.
//!
//! A probe is a one-shot `monitor` with interval 0 that discovers whether
//! a resource is already running on a node. Probes are scheduled for every
//! node and resource where the resource's state is not yet known, and are
//! ordered before the resource's start so nothing starts twice.

use tracing::{debug, info, trace};

use hagrid_core::names::{action_meta, is_true, node_attr, op_key, task};
use hagrid_core::names::{RC_NOT_RUNNING, RC_RUNNING_PROMOTED};
use hagrid_state::{
    ActionFlags, DiscoverMode, Node, NodeId, NodeKind, OrderSide, OrderType, ResourceId, Role,
    StateResult, Variant, WorkingSet,
};

use crate::fencing::{fence_node, is_unfence_device, order_vs_unfence};
use crate::variant::create_probe;

/// What one probe scheduling pass produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeSummary {
    /// Probe actions created.
    pub probes: usize,
    /// Nodes that get a full reprobe instead of per-resource probes.
    pub reprobes: usize,
    /// Offline remote nodes scheduled for fencing.
    pub fenced: usize,
}

/// A remote node whose connection resource failed beyond recovery.
pub fn is_failed_remote_node(node: &Node) -> bool {
    node.kind == NodeKind::Remote && node.remote_connection_failed
}

/// Schedule probes on every node.
pub fn schedule_probes(ws: &mut WorkingSet) -> StateResult<ProbeSummary> {
    let mut summary = ProbeSummary::default();
    let before = count_probes(ws);

    for node in ws.node_ids() {
        let target = ws.node(node);
        if !target.online {
            if is_failed_remote_node(target) {
                fence_node(ws, node, "the connection is unrecoverable");
                summary.fenced += 1;
            }
            continue;
        }
        if target.unclean {
            trace!(node = %target.name, "not probing unclean node");
            continue;
        }
        if !target.rsc_discovery_enabled {
            trace!(node = %target.name, "resource discovery disabled");
            continue;
        }

        // Saved state from old clusters may still carry this attribute.
        if let Some(probed) = target.attribute(node_attr::PROBE_COMPLETE) {
            if !is_true(probed) {
                let key = format!("{}-{}", task::REPROBE, target.name);
                info!(node = %target.name, "scheduling full reprobe");
                let reprobe = ws.custom_action(None, key, task::REPROBE, Some(node), false);
                ws.action_mut(reprobe)
                    .meta
                    .insert(action_meta::NO_WAIT.to_string(), "true".to_string());
                summary.reprobes += 1;
                continue;
            }
        }

        for rsc in ws.top_level_resources() {
            create_probe(ws, rsc, node)?;
        }
    }

    summary.probes = count_probes(ws) - before;
    debug!(
        probes = summary.probes,
        reprobes = summary.reprobes,
        fenced = summary.fenced,
        "probes scheduled"
    );
    Ok(summary)
}

fn count_probes(ws: &WorkingSet) -> usize {
    ws.actions().iter().filter(|a| a.rsc.is_some() && a.is_probe()).count()
}

/// Probe a primitive on one node, if its state there is unknown.
///
/// Returns true if a probe was created.
pub fn create_primitive_probe(ws: &mut WorkingSet, rsc: ResourceId, node: NodeId) -> StateResult<bool> {
    let resource = ws.resource(rsc);
    let target = ws.node(node);
    let top = ws.uber_parent(rsc);

    if resource.container.is_some() && !resource.is_remote_connection {
        trace!(rsc = %resource.name, "skipping probe of resource inside a container");
        return Ok(false);
    }
    if resource.orphan {
        trace!(rsc = %resource.name, "skipping probe of orphan");
        return Ok(false);
    }
    if resource.known_on.contains(&node) {
        trace!(rsc = %resource.name, node = %target.name, "state already known");
        return Ok(false);
    }

    let allowed = resource.allowed_nodes.get(&node);
    if resource.exclusive_discover || ws.resource(top).exclusive_discover {
        let exclusive_here = allowed.is_some_and(|n| n.discover_mode == DiscoverMode::Exclusive);
        if !exclusive_here {
            trace!(rsc = %resource.name, node = %target.name, "node not marked for exclusive discovery");
            return Ok(false);
        }
    }
    let discover_mode = allowed.map_or(target.discover_mode, |n| n.discover_mode);
    if discover_mode == DiscoverMode::Never {
        trace!(rsc = %resource.name, node = %target.name, "discovery disabled for resource");
        return Ok(false);
    }

    if target.is_guest() {
        if let Some(container) = target.container {
            if !guest_container_allows_probe(ws, node, container, top)? {
                return Ok(false);
            }
        }
    }

    let probe = ws.resource_action(rsc, task::MONITOR, Some(node), false);
    order_vs_unfence(ws, rsc, node, probe, OrderType::OPTIONAL);

    let resource = ws.resource(rsc);
    let target_rc = if !resource.running_on.contains(&node) {
        Some(RC_NOT_RUNNING)
    } else if resource.role == Role::Promoted {
        Some(RC_RUNNING_PROMOTED)
    } else {
        None
    };
    let runs_nowhere = resource.running_on.is_empty();
    if let Some(rc) = target_rc {
        ws.action_mut(probe)
            .meta
            .insert(action_meta::TARGET_RC.to_string(), rc.to_string());
    }
    debug!(
        rsc = %ws.resource(rsc).name,
        node = %ws.node(node).name,
        runnable = ws.action(probe).is_runnable(),
        "probing resource"
    );

    let start_rsc = if is_unfence_device(ws, rsc) || ws.resource(top).variant != Variant::Clone {
        rsc
    } else {
        top
    };

    let mut kind = OrderType::OPTIONAL;
    if !ws.action(probe).flags.contains(ActionFlags::RUNNABLE) && runs_nowhere {
        // Keep an inactive resource from starting without preventing a
        // running one from staying up.
        kind |= OrderType::RUNNABLE_LEFT;
    }
    let start_key = op_key(&ws.resource(start_rsc).name, task::START, 0);
    ws.new_ordering(
        kind,
        OrderSide::action(Some(rsc), probe),
        OrderSide::task(Some(start_rsc), start_key),
    )?;

    let reload_key = op_key(&ws.resource(rsc).name, task::RELOAD_AGENT, 0);
    ws.new_ordering(
        OrderType::OPTIONAL,
        OrderSide::action(Some(rsc), probe),
        OrderSide::task(Some(start_rsc), reload_key),
    )?;

    Ok(true)
}

/// Decide whether a resource can be probed on a guest node given the state
/// of the guest's container. When it cannot, the resource's start is
/// ordered after whatever will settle the container instead.
fn guest_container_allows_probe(
    ws: &mut WorkingSet,
    node: NodeId,
    container: ResourceId,
    top: ResourceId,
) -> StateResult<bool> {
    let guest = ws.node(node);
    let remote = ws.resource(container);

    if remote.role == Role::Stopped {
        // Anything inside a stopped container is stopped too.
        if let Some(assigned) = remote.assigned_to {
            if !remote.known_on.contains(&assigned) {
                ws.order_resource_tasks(container, task::MONITOR, top, task::START, OrderType::OPTIONAL);
            }
        }
        trace!(node = %ws.node(node).name, container = %ws.resource(container).name, "container is stopped");
        return Ok(false);
    }

    let moving = remote
        .assigned_to
        .is_some_and(|assigned| !remote.running_on.contains(&assigned));
    if guest.remote_requires_reset
        || guest.unclean
        || remote.failed
        || remote.next_role == Role::Stopped
        || moving
    {
        ws.order_resource_tasks(container, task::STOP, top, task::START, OrderType::OPTIONAL);
        trace!(
            node = %ws.node(node).name,
            container = %ws.resource(container).name,
            "container is stopping, restarting or moving"
        );
        return Ok(false);
    }
    Ok(true)
}
