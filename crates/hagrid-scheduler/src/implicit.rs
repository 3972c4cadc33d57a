//! Implicit probe orderings.
//!
//! A probe expects to find its resource stopped. Until it reports back,
//! anything that was ordered after the resource's stop, or that may end up
//! restarting another resource, has to wait for the probe too. Two passes
//! add those edges:
//!
//! - **Restart orderings**: for every "probe then X" edge, order the probe
//!   before the stop (or demote) of any other primitive X would restart,
//!   following the chain of actions ordered after X down through parent
//!   and child resources.
//! - **Stop orderings**: for every "A stop then X" constraint, order each
//!   probe of A before X.

use std::collections::HashSet;

use tracing::trace;

use hagrid_core::names::{action_meta, meta, op_key_suffix, task};
use hagrid_placement::{PlacementStrategy, rank_nodes};
use hagrid_state::{ActionId, NodeId, OrderSide, OrderType, ResourceId, Variant, WorkingSet};

use crate::ordering::resolve_side;
use crate::variant::{collect_demote_actions, collect_stop_actions};

/// Add both kinds of implicit probe orderings.
pub fn order_probes(ws: &mut WorkingSet) {
    for rsc in ws.top_level_resources() {
        add_restart_orderings_for_rsc(ws, rsc);
    }
    add_probe_orderings_for_stops(ws);
}

// ── Restart orderings ────────────────────────────────────────────

fn add_restart_orderings_for_rsc(ws: &mut WorkingSet, rsc: ResourceId) {
    let resource = ws.resource(rsc);
    if resource.variant.is_collective() {
        for child in resource.children.clone() {
            add_restart_orderings_for_rsc(ws, child);
        }
        return;
    }

    for probe in ws.resource_actions(rsc, None, task::MONITOR, false) {
        let thens: Vec<ActionId> = ws.action(probe).after.iter().map(|e| e.action).collect();
        for after in thens {
            RestartWalk::new(probe).visit(ws, after);
        }
    }
}

/// One restart-ordering traversal from a probe.
///
/// `visited` keeps the walk finite on graphs with cycles. It lives only as
/// long as one top-level call.
pub struct RestartWalk {
    probe: ActionId,
    visited: HashSet<ActionId>,
}

impl RestartWalk {
    pub fn new(probe: ActionId) -> Self {
        Self {
            probe,
            visited: HashSet::new(),
        }
    }

    /// Add restart orderings for "probe then `after`", then recurse into
    /// the actions ordered after `after`.
    pub fn visit(&mut self, ws: &mut WorkingSet, after: ActionId) {
        let probe = ws.action(self.probe);
        let Some(probe_rsc) = probe.rsc else {
            return;
        };
        if ws.resource(probe_rsc).variant != Variant::Primitive
            || !probe.task.eq_ignore_ascii_case(task::MONITOR)
        {
            return;
        }
        if !self.visited.insert(after) {
            return;
        }
        trace!(
            probe = %ws.describe_action(self.probe),
            then = %ws.describe_action(after),
            "adding probe restart orderings"
        );

        let after_rsc = ws.action(after).rsc;
        if let Some(other) = after_rsc {
            if ws.resource(other).variant == Variant::Primitive && other != probe_rsc {
                let after_task = &ws.action(after).task;
                let restarts = if after_task.eq_ignore_ascii_case(task::START) {
                    collect_stop_actions(ws, other)
                } else if after_task.eq_ignore_ascii_case(task::PROMOTE) {
                    collect_demote_actions(ws, other)
                } else {
                    Vec::new()
                };
                for then in restarts {
                    // Pseudo actions (such as stops implied by fencing)
                    // have nothing to wait for.
                    if !ws.action(then).is_pseudo() {
                        ws.order_actions(self.probe, then, OrderType::OPTIONAL);
                    }
                }
            }
        }

        let mut interleave = false;
        let mut compatible = None;
        if let Some(other) = after_rsc {
            if ws.resource(other).variant.is_clone_like() {
                interleave = ws.resource(other).meta_is_true(meta::INTERLEAVE);
                if interleave {
                    compatible = find_compatible_child(ws, probe_rsc, other);
                }
            }
        }

        let edges = ws.action(after).after.clone();
        for edge in edges {
            if !edge.kind.contains(OrderType::IMPLIES_THEN) {
                // Without implies-then, only follow the edge from a
                // collective action to the same action of one of its
                // children.
                let next_rsc = ws.action(edge.action).rsc;
                let (Some(parent), Some(child)) = (after_rsc, next_rsc) else {
                    continue;
                };
                let parent_res = ws.resource(parent);
                let child_res = ws.resource(child);
                if parent_res.variant < Variant::Group
                    || ws.resource(probe_rsc).parent == Some(parent)
                    || child_res.variant > Variant::Group
                    || child_res.parent != Some(parent)
                {
                    continue;
                }
                if parent_res.variant.is_clone_like() && interleave && compatible != Some(child) {
                    continue;
                }
            }
            trace!(
                after = %ws.describe_action(after),
                then = %ws.describe_action(edge.action),
                kind = %edge.kind,
                "following ordering for probe restart"
            );
            self.visit(ws, edge.action);
        }
    }
}

/// The instance of `clone` placed on the same node as `rsc`, for pairing
/// interleaved clone instances.
///
/// An unassigned `rsc` is matched against its allowed nodes, best first.
pub fn find_compatible_child(ws: &WorkingSet, rsc: ResourceId, clone: ResourceId) -> Option<ResourceId> {
    let instance_on = |node: NodeId| {
        ws.resource(clone)
            .children
            .iter()
            .copied()
            .find(|&child| ws.resource(child).assigned_to == Some(node))
    };

    let resource = ws.resource(rsc);
    if let Some(node) = resource.assigned_to {
        return instance_on(node);
    }
    let candidates = resource.allowed_nodes.values().cloned().collect();
    rank_nodes(candidates, None, PlacementStrategy::Default)
        .iter()
        .find_map(|node| instance_on(node.id))
}

// ── Stop orderings ───────────────────────────────────────────────

fn names_stop(ws: &WorkingSet, side: &OrderSide) -> bool {
    match (side.action, side.task.as_deref()) {
        (Some(action), _) => ws.action(action).task == task::STOP,
        (None, Some(key)) => key.ends_with(&op_key_suffix(task::STOP)),
        (None, None) => false,
    }
}

/// Whether `probe` should be ordered before `then`.
pub fn probe_needed_before_action(ws: &WorkingSet, probe: ActionId, then: ActionId) -> bool {
    let probe_node = ws.action(probe).node;
    let then_action = ws.action(then);
    let then_node = then_action.node;

    // Unfencing a node comes before probing it.
    if then_action.task.eq_ignore_ascii_case(task::FENCE)
        && probe_node.is_some()
        && probe_node == then_node
        && then_action
            .meta_value(action_meta::STONITH_ACTION)
            .is_some_and(|a| a.eq_ignore_ascii_case("on"))
    {
        return false;
    }

    // Shutting a node down never waits for probes elsewhere.
    if then_action.task == task::SHUTDOWN
        && probe_node.is_some()
        && then_node.is_some()
        && probe_node != then_node
    {
        return false;
    }

    true
}

/// For every "stop A then X" constraint, order A's probes before X.
pub fn add_probe_orderings_for_stops(ws: &mut WorkingSet) {
    let orderings = ws.orderings().to_vec();
    for ordering in &orderings {
        if ordering.kind.is_none() {
            continue;
        }
        let Some(first_rsc) = ordering.first.rsc else {
            continue;
        };
        if ordering.then.rsc == Some(first_rsc) {
            continue;
        }
        if !ordering.first.is_resolvable() || !ordering.then.is_resolvable() {
            continue;
        }
        if !names_stop(ws, &ordering.first) {
            continue;
        }

        // A probe inside a stopping container could otherwise be scheduled
        // after the container starts again, looping the transition.
        if let Some(then_rsc) = ordering.then.rsc {
            if ws.resource(first_rsc).container == Some(then_rsc) && names_stop(ws, &ordering.then) {
                continue;
            }
        }

        let mut kind = OrderType::OPTIONAL;
        if ordering.kind.contains(OrderType::APPLY_FIRST_NON_MIGRATABLE) {
            kind |= OrderType::APPLY_FIRST_NON_MIGRATABLE;
        }
        if ordering.kind.contains(OrderType::SAME_NODE) {
            kind |= OrderType::SAME_NODE;
        }
        if ordering.kind == OrderType::ANTI_COLOCATION || ordering.kind == OrderType::LOAD {
            kind = ordering.kind;
        }

        let probes = ws.resource_actions(first_rsc, None, task::MONITOR, false);
        if probes.is_empty() {
            continue;
        }
        // A then side without a resource only counts when it names an
        // action directly.
        if ordering.then.rsc.is_none() && ordering.then.action.is_none() {
            continue;
        }
        let thens = resolve_side(ws, &ordering.then).unwrap_or_default();
        if thens.is_empty() {
            continue;
        }

        trace!(id = ordering.id.0, kind = %ordering.kind, "implying probe orderings for stop ordering");
        for &probe in &probes {
            for &then in &thens {
                if probe_needed_before_action(ws, probe, then) {
                    ws.order_actions(probe, then, kind);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hagrid_core::{ClusterOptions, INFINITY};
    use hagrid_state::{Node, Resource};

    fn cluster() -> (WorkingSet, NodeId, NodeId) {
        let mut ws = WorkingSet::new(ClusterOptions::default());
        let n1 = ws.add_node(Node::new("n1")).unwrap();
        let n2 = ws.add_node(Node::new("n2")).unwrap();
        (ws, n1, n2)
    }

    fn has_edge(ws: &WorkingSet, first: ActionId, then: ActionId) -> bool {
        ws.action(first).after.iter().any(|e| e.action == then)
    }

    #[test]
    fn stop_ordering_implies_probe_ordering() {
        let (mut ws, n1, _) = cluster();
        let a = ws.add_resource(Resource::primitive("A")).unwrap();
        let b = ws.add_resource(Resource::primitive("B")).unwrap();
        let probe_a = ws.resource_action(a, task::MONITOR, Some(n1), false);
        ws.resource_action(a, task::STOP, Some(n1), false);
        let stop_b = ws.resource_action(b, task::STOP, Some(n1), false);
        ws.order_resource_tasks(a, task::STOP, b, task::STOP, OrderType::OPTIONAL);

        add_probe_orderings_for_stops(&mut ws);
        assert!(has_edge(&ws, probe_a, stop_b));
        assert_eq!(ws.action(probe_a).after.len(), 1);
    }

    #[test]
    fn non_stop_orderings_imply_nothing() {
        let (mut ws, n1, _) = cluster();
        let a = ws.add_resource(Resource::primitive("A")).unwrap();
        let b = ws.add_resource(Resource::primitive("B")).unwrap();
        let probe_a = ws.resource_action(a, task::MONITOR, Some(n1), false);
        ws.resource_action(b, task::START, Some(n1), false);
        ws.order_resource_tasks(a, task::START, b, task::START, OrderType::OPTIONAL);
        ws.order_resource_tasks(a, task::STOP, a, task::START, OrderType::OPTIONAL);

        add_probe_orderings_for_stops(&mut ws);
        assert!(ws.action(probe_a).after.is_empty());
    }

    #[test]
    fn stop_orderings_keep_filtering_flags() {
        let (mut ws, n1, _) = cluster();
        let a = ws.add_resource(Resource::primitive("A")).unwrap();
        let b = ws.add_resource(Resource::primitive("B")).unwrap();
        let probe_a = ws.resource_action(a, task::MONITOR, Some(n1), false);
        ws.resource_action(b, task::STOP, Some(n1), false);
        ws.order_resource_tasks(
            a,
            task::STOP,
            b,
            task::STOP,
            OrderType::IMPLIES_THEN | OrderType::SAME_NODE,
        );

        add_probe_orderings_for_stops(&mut ws);
        let kind = ws.action(probe_a).after[0].kind;
        assert_eq!(kind, OrderType::OPTIONAL | OrderType::SAME_NODE);
    }

    #[test]
    fn load_orderings_are_kept_verbatim() {
        let (mut ws, n1, _) = cluster();
        let a = ws.add_resource(Resource::primitive("A")).unwrap();
        let b = ws.add_resource(Resource::primitive("B")).unwrap();
        let probe_a = ws.resource_action(a, task::MONITOR, Some(n1), false);
        ws.resource_action(b, task::STOP, Some(n1), false);
        ws.order_resource_tasks(a, task::STOP, b, task::STOP, OrderType::LOAD);

        add_probe_orderings_for_stops(&mut ws);
        assert_eq!(ws.action(probe_a).after[0].kind, OrderType::LOAD);
    }

    #[test]
    fn container_stop_is_not_ordered_after_probe() {
        let (mut ws, n1, _) = cluster();
        let vm = ws.add_resource(Resource::primitive("vm")).unwrap();
        let mut app = Resource::primitive("app");
        app.container = Some(vm);
        let app = ws.add_resource(app).unwrap();
        let probe = ws.resource_action(app, task::MONITOR, Some(n1), false);
        ws.resource_action(vm, task::STOP, Some(n1), false);
        ws.order_resource_tasks(app, task::STOP, vm, task::STOP, OrderType::OPTIONAL);

        add_probe_orderings_for_stops(&mut ws);
        assert!(ws.action(probe).after.is_empty());
    }

    #[test]
    fn probes_follow_unfencing_on_the_same_node() {
        let (mut ws, n1, n2) = cluster();
        let a = ws.add_resource(Resource::primitive("A")).unwrap();
        let probe = ws.resource_action(a, task::MONITOR, Some(n1), false);

        let unfence_n1 = ws.custom_action(None, "stonith-n1-on".into(), task::FENCE, Some(n1), true);
        ws.action_mut(unfence_n1)
            .meta
            .insert(action_meta::STONITH_ACTION.into(), "on".into());
        let unfence_n2 = ws.custom_action(None, "stonith-n2-on".into(), task::FENCE, Some(n2), true);
        ws.action_mut(unfence_n2)
            .meta
            .insert(action_meta::STONITH_ACTION.into(), "on".into());
        let fence_n1 = ws.custom_action(None, "stonith-n1-reboot".into(), task::FENCE, Some(n1), false);
        ws.action_mut(fence_n1)
            .meta
            .insert(action_meta::STONITH_ACTION.into(), "reboot".into());

        assert!(!probe_needed_before_action(&ws, probe, unfence_n1));
        assert!(probe_needed_before_action(&ws, probe, unfence_n2));
        assert!(probe_needed_before_action(&ws, probe, fence_n1));
    }

    #[test]
    fn probes_never_delay_shutdown_elsewhere() {
        let (mut ws, n1, n2) = cluster();
        let a = ws.add_resource(Resource::primitive("A")).unwrap();
        let probe = ws.resource_action(a, task::MONITOR, Some(n1), false);
        let here = ws.custom_action(None, "do_shutdown-n1".into(), task::SHUTDOWN, Some(n1), false);
        let there = ws.custom_action(None, "do_shutdown-n2".into(), task::SHUTDOWN, Some(n2), false);

        assert!(probe_needed_before_action(&ws, probe, here));
        assert!(!probe_needed_before_action(&ws, probe, there));
    }

    #[test]
    fn restart_orderings_cover_stops_of_started_resources() {
        let (mut ws, n1, n2) = cluster();
        let a = ws.add_resource(Resource::primitive("A")).unwrap();
        let b = ws.add_resource(Resource::primitive("B")).unwrap();
        let probe_a = ws.resource_action(a, task::MONITOR, Some(n1), false);
        let start_b = ws.resource_action(b, task::START, Some(n2), false);
        let stop_b = ws.resource_action(b, task::STOP, Some(n1), false);
        let implied_stop = ws.pseudo_action(b, task::STOP, false);
        ws.order_actions(probe_a, start_b, OrderType::OPTIONAL);

        order_probes(&mut ws);
        assert!(has_edge(&ws, probe_a, stop_b));
        assert!(!has_edge(&ws, probe_a, implied_stop));
    }

    #[test]
    fn restart_orderings_cover_demotes_of_promoted_resources() {
        let (mut ws, n1, _) = cluster();
        let a = ws.add_resource(Resource::primitive("A")).unwrap();
        let b = ws.add_resource(Resource::primitive("B")).unwrap();
        let probe_a = ws.resource_action(a, task::MONITOR, Some(n1), false);
        let promote_b = ws.resource_action(b, task::PROMOTE, Some(n1), false);
        let demote_b = ws.resource_action(b, task::DEMOTE, Some(n1), false);
        ws.order_actions(probe_a, promote_b, OrderType::OPTIONAL);

        order_probes(&mut ws);
        assert!(has_edge(&ws, probe_a, demote_b));
    }

    #[test]
    fn restart_walk_follows_implies_then_chains() {
        let (mut ws, n1, _) = cluster();
        let a = ws.add_resource(Resource::primitive("A")).unwrap();
        let b = ws.add_resource(Resource::primitive("B")).unwrap();
        let c = ws.add_resource(Resource::primitive("C")).unwrap();
        let probe_a = ws.resource_action(a, task::MONITOR, Some(n1), false);
        let start_b = ws.resource_action(b, task::START, Some(n1), false);
        let start_c = ws.resource_action(c, task::START, Some(n1), false);
        let stop_c = ws.resource_action(c, task::STOP, Some(n1), false);
        ws.order_actions(probe_a, start_b, OrderType::OPTIONAL);
        ws.order_actions(start_b, start_c, OrderType::IMPLIES_THEN);

        order_probes(&mut ws);
        assert!(has_edge(&ws, probe_a, stop_c));
    }

    #[test]
    fn restart_walk_ignores_unrelated_optional_edges() {
        let (mut ws, n1, _) = cluster();
        let a = ws.add_resource(Resource::primitive("A")).unwrap();
        let b = ws.add_resource(Resource::primitive("B")).unwrap();
        let c = ws.add_resource(Resource::primitive("C")).unwrap();
        let probe_a = ws.resource_action(a, task::MONITOR, Some(n1), false);
        let start_b = ws.resource_action(b, task::START, Some(n1), false);
        let start_c = ws.resource_action(c, task::START, Some(n1), false);
        let stop_c = ws.resource_action(c, task::STOP, Some(n1), false);
        ws.order_actions(probe_a, start_b, OrderType::OPTIONAL);
        ws.order_actions(start_b, start_c, OrderType::OPTIONAL);

        order_probes(&mut ws);
        assert!(!has_edge(&ws, probe_a, stop_c));
    }

    #[test]
    fn restart_walk_descends_from_group_to_members() {
        let (mut ws, n1, _) = cluster();
        let a = ws.add_resource(Resource::primitive("A")).unwrap();
        let group = ws.add_resource(Resource::new("grp", Variant::Group)).unwrap();
        let member = ws.add_child(group, Resource::primitive("ip")).unwrap();
        let probe_a = ws.resource_action(a, task::MONITOR, Some(n1), false);
        let group_start = ws.pseudo_action(group, task::START, false);
        let member_start = ws.resource_action(member, task::START, Some(n1), false);
        let member_stop = ws.resource_action(member, task::STOP, Some(n1), false);
        ws.order_actions(probe_a, group_start, OrderType::OPTIONAL);
        ws.order_actions(
            group_start,
            member_start,
            OrderType::IMPLIES_FIRST_PRINTED | OrderType::RUNNABLE_LEFT,
        );

        order_probes(&mut ws);
        assert!(has_edge(&ws, probe_a, member_stop));
    }

    #[test]
    fn interleaved_clones_restart_only_the_local_instance() {
        let (mut ws, n1, n2) = cluster();
        let mut a = Resource::primitive("A");
        a.assigned_to = Some(n1);
        let a = ws.add_resource(a).unwrap();
        let clone = ws
            .add_resource(Resource::new("web-clone", Variant::Clone).with_meta("interleave", "true"))
            .unwrap();
        let mut local = Resource::primitive("web:0");
        local.assigned_to = Some(n1);
        let local = ws.add_child(clone, local).unwrap();
        let mut remote = Resource::primitive("web:1");
        remote.assigned_to = Some(n2);
        let remote = ws.add_child(clone, remote).unwrap();

        let probe_a = ws.resource_action(a, task::MONITOR, Some(n1), false);
        let clone_start = ws.pseudo_action(clone, task::START, false);
        let local_start = ws.resource_action(local, task::START, Some(n1), false);
        let remote_start = ws.resource_action(remote, task::START, Some(n2), false);
        let local_stop = ws.resource_action(local, task::STOP, Some(n1), false);
        let remote_stop = ws.resource_action(remote, task::STOP, Some(n2), false);
        ws.order_actions(probe_a, clone_start, OrderType::OPTIONAL);
        ws.order_actions(clone_start, local_start, OrderType::RUNNABLE_LEFT);
        ws.order_actions(clone_start, remote_start, OrderType::RUNNABLE_LEFT);

        order_probes(&mut ws);
        assert!(has_edge(&ws, probe_a, local_stop));
        assert!(!has_edge(&ws, probe_a, remote_stop));

        // Without interleaving, every instance is covered.
        ws.resource_mut(clone).meta.remove("interleave");
        order_probes(&mut ws);
        assert!(has_edge(&ws, probe_a, remote_stop));
    }

    #[test]
    fn restart_walk_terminates_on_cycles_without_duplicates() {
        let (mut ws, n1, _) = cluster();
        let a = ws.add_resource(Resource::primitive("A")).unwrap();
        let b = ws.add_resource(Resource::primitive("B")).unwrap();
        let c = ws.add_resource(Resource::primitive("C")).unwrap();
        let probe_a = ws.resource_action(a, task::MONITOR, Some(n1), false);
        let start_b = ws.resource_action(b, task::START, Some(n1), false);
        let start_c = ws.resource_action(c, task::START, Some(n1), false);
        ws.resource_action(b, task::STOP, Some(n1), false);
        ws.resource_action(c, task::STOP, Some(n1), false);
        ws.order_actions(probe_a, start_b, OrderType::OPTIONAL);
        ws.order_actions(start_b, start_c, OrderType::IMPLIES_THEN);
        ws.order_actions(start_c, start_b, OrderType::IMPLIES_THEN);

        order_probes(&mut ws);
        let edges = ws.action(probe_a).after.len();
        assert_eq!(edges, 3, "start B plus the stops of B and C");

        order_probes(&mut ws);
        assert_eq!(ws.action(probe_a).after.len(), edges);
    }

    #[test]
    fn restart_walk_ignores_edges_it_added() {
        let (mut ws, n1, _) = cluster();
        let a = ws.add_resource(Resource::primitive("A")).unwrap();
        let b = ws.add_resource(Resource::primitive("B")).unwrap();
        let c = ws.add_resource(Resource::primitive("C")).unwrap();
        let probe_a = ws.resource_action(a, task::MONITOR, Some(n1), false);
        let start_b = ws.resource_action(b, task::START, Some(n1), false);
        let stop_b = ws.resource_action(b, task::STOP, Some(n1), false);
        let start_c = ws.resource_action(c, task::START, Some(n1), false);
        let stop_c = ws.resource_action(c, task::STOP, Some(n1), false);
        ws.order_actions(probe_a, start_b, OrderType::OPTIONAL);
        ws.order_actions(stop_b, start_c, OrderType::IMPLIES_THEN);

        order_probes(&mut ws);
        assert!(has_edge(&ws, probe_a, stop_b));
        // stop B only became a successor of the probe during the walk.
        assert!(!has_edge(&ws, probe_a, stop_c));
        assert_eq!(ws.action(probe_a).after.len(), 2);
    }

    #[test]
    fn compatible_child_follows_the_assignment() {
        let (mut ws, n1, n2) = cluster();
        let a = ws.add_resource(Resource::primitive("A")).unwrap();
        let clone = ws.add_resource(Resource::new("c", Variant::Clone)).unwrap();
        let mut first = Resource::primitive("c:0");
        first.assigned_to = Some(n1);
        let first = ws.add_child(clone, first).unwrap();
        let mut second = Resource::primitive("c:1");
        second.assigned_to = Some(n2);
        let second = ws.add_child(clone, second).unwrap();

        ws.resource_mut(a).assigned_to = Some(n1);
        assert_eq!(find_compatible_child(&ws, a, clone), Some(first));
        ws.resource_mut(a).assigned_to = Some(n2);
        assert_eq!(find_compatible_child(&ws, a, clone), Some(second));
    }

    #[test]
    fn unassigned_resources_pair_with_their_best_allowed_node() {
        let (mut ws, n1, n2) = cluster();
        let a = ws.add_resource(Resource::primitive("A")).unwrap();
        let clone = ws.add_resource(Resource::new("c", Variant::Clone)).unwrap();
        let mut first = Resource::primitive("c:0");
        first.assigned_to = Some(n1);
        let first = ws.add_child(clone, first).unwrap();
        let mut second = Resource::primitive("c:1");
        second.assigned_to = Some(n2);
        let second = ws.add_child(clone, second).unwrap();

        assert_eq!(find_compatible_child(&ws, a, clone), None);

        let mut low = ws.node(n1).clone();
        low.weight = 10;
        let mut high = ws.node(n2).clone();
        high.weight = 100;
        let allowed = &mut ws.resource_mut(a).allowed_nodes;
        allowed.insert(n1, low);
        allowed.insert(n2, high);
        assert_eq!(find_compatible_child(&ws, a, clone), Some(second));

        // A banned node is never preferred over an allowed one.
        ws.resource_mut(a).allowed_nodes.get_mut(&n2).unwrap().weight = -INFINITY;
        assert_eq!(find_compatible_child(&ws, a, clone), Some(first));
    }

    #[test]
    fn resourceless_then_sides_need_an_explicit_action() {
        let (mut ws, n1, _) = cluster();
        let a = ws.add_resource(Resource::primitive("A")).unwrap();
        let probe_a = ws.resource_action(a, task::MONITOR, Some(n1), false);
        ws.resource_action(a, task::STOP, Some(n1), false);
        let shutdown = ws.custom_action(None, "do_shutdown-n1".into(), task::SHUTDOWN, Some(n1), false);

        ws.new_ordering(
            OrderType::OPTIONAL,
            OrderSide::task(Some(a), "A_stop_0"),
            OrderSide::task(None, "do_shutdown-n1"),
        )
        .unwrap();
        add_probe_orderings_for_stops(&mut ws);
        assert!(!has_edge(&ws, probe_a, shutdown));

        ws.new_ordering(
            OrderType::OPTIONAL,
            OrderSide::task(Some(a), "A_stop_0"),
            OrderSide::action(None, shutdown),
        )
        .unwrap();
        add_probe_orderings_for_stops(&mut ws);
        assert!(has_edge(&ws, probe_a, shutdown));
    }
}
