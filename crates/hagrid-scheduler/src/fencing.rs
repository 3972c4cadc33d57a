//! Fencing, unfencing, and node shutdown actions.

use tracing::{debug, info, warn};

use hagrid_core::names::{action_meta, class, meta, task};
use hagrid_state::{ActionFlags, ActionId, NodeId, OrderSide, OrderType, ResourceId, WorkingSet};

use crate::variant::collect_stop_actions;

/// Key of the fencing action for `node`.
pub fn fence_key(node: &str, action: &str) -> String {
    format!("{}-{node}-{action}", task::FENCE)
}

/// Schedule fencing of `node` with the configured fencing action.
///
/// The node is marked unclean. The fencing action is executed by another
/// node, so it stays runnable even though its target is down.
pub fn fence_node(ws: &mut WorkingSet, node: NodeId, reason: &str) -> ActionId {
    let name = ws.node(node).name.clone();
    let fence_action = ws.options.fence_action().to_string();
    info!(node = %name, action = %fence_action, reason, "scheduling node fencing");

    ws.node_mut(node).unclean = true;
    let id = ws.custom_action(None, fence_key(&name, &fence_action), task::FENCE, Some(node), false);
    let action = ws.action_mut(id);
    action.flags.insert(ActionFlags::RUNNABLE);
    action
        .meta
        .insert(action_meta::STONITH_ACTION.to_string(), fence_action);
    id
}

/// Find or create the optional unfencing (`on`) action for `node`.
pub fn unfence_action(ws: &mut WorkingSet, node: NodeId) -> ActionId {
    let key = fence_key(&ws.node(node).name, "on");
    let id = ws.custom_action(None, key, task::FENCE, Some(node), true);
    ws.action_mut(id)
        .meta
        .insert(action_meta::STONITH_ACTION.to_string(), "on".to_string());
    id
}

/// Whether `rsc` may only run on a node after the node was unfenced.
pub fn requires_unfencing(ws: &WorkingSet, rsc: ResourceId) -> bool {
    ws.resource(rsc)
        .meta_value(meta::REQUIRES)
        .is_some_and(|v| v.eq_ignore_ascii_case("unfencing"))
}

/// Whether `rsc` is a fencing device that performs unfencing.
pub fn is_unfence_device(ws: &WorkingSet, rsc: ResourceId) -> bool {
    let resource = ws.resource(rsc);
    resource.class.eq_ignore_ascii_case(class::STONITH)
        && resource
            .meta_value(meta::PROVIDES)
            .is_some_and(|v| v.eq_ignore_ascii_case("unfencing"))
}

/// Order unfencing of `node` before `action` when `rsc` requires it.
pub fn order_vs_unfence(
    ws: &mut WorkingSet,
    rsc: ResourceId,
    node: NodeId,
    action: ActionId,
    kind: OrderType,
) {
    let target = ws.node(node);
    if !target.online || target.unclean || target.is_remote() {
        return;
    }
    if ws.resource(rsc).class.eq_ignore_ascii_case(class::STONITH) || !requires_unfencing(ws, rsc) {
        return;
    }
    let unfence = unfence_action(ws, node);
    ws.order_actions(unfence, action, kind);
}

/// Find or create the shutdown action for `node`.
pub fn shutdown_action(ws: &mut WorkingSet, node: NodeId) -> ActionId {
    let key = format!("{}-{}", task::SHUTDOWN, ws.node(node).name);
    ws.custom_action(None, key, task::SHUTDOWN, Some(node), false)
}

/// Schedule a shutdown for every online node that asked for one, with all
/// stops on that node ordered before it. Returns the number of shutdowns.
pub fn schedule_shutdowns(ws: &mut WorkingSet) -> usize {
    let mut scheduled = 0;
    for node in ws.node_ids() {
        let target = ws.node(node);
        if !target.online || !target.shutdown || target.unclean {
            continue;
        }
        let shutdown = shutdown_action(ws, node);
        for rsc in ws.top_level_resources() {
            for stop in collect_stop_actions(ws, rsc) {
                let stop_action = ws.action(stop);
                if stop_action.node != Some(node) {
                    continue;
                }
                let first = OrderSide::action(stop_action.rsc, stop);
                let then = OrderSide::action(None, shutdown);
                if let Err(err) = ws.new_ordering(OrderType::OPTIONAL, first, then) {
                    warn!(%err, "skipping stop-before-shutdown ordering");
                }
            }
        }
        debug!(node = %ws.node(node).name, "node shutdown scheduled");
        scheduled += 1;
    }
    scheduled
}
