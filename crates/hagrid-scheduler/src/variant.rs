//! Per-variant behaviour of resources.
//!
//! Primitives own their actions directly. Collective resources (groups,
//! clones, bundles) delegate to their children, with anonymous clones
//! probing a single instance per node.

use tracing::trace;

use hagrid_core::names::{class, meta, task};
use hagrid_state::{ActionId, NodeId, ResourceId, StateResult, Variant, WorkingSet};

use crate::probes::create_primitive_probe;

/// Operations whose behaviour depends on the resource variant.
pub trait VariantOps {
    /// Schedule a probe of `rsc` on `node` if one is needed. Returns true
    /// if any probe was created.
    fn create_probe(&self, ws: &mut WorkingSet, rsc: ResourceId, node: NodeId) -> StateResult<bool>;

    /// Every stop action scheduled for `rsc`.
    fn collect_stop_actions(&self, ws: &WorkingSet, rsc: ResourceId) -> Vec<ActionId>;

    /// Every demote action scheduled for `rsc`.
    fn collect_demote_actions(&self, ws: &WorkingSet, rsc: ResourceId) -> Vec<ActionId>;
}

pub struct PrimitiveOps;

pub struct CollectiveOps;

static PRIMITIVE: PrimitiveOps = PrimitiveOps;
static COLLECTIVE: CollectiveOps = CollectiveOps;

/// Select the operations for a resource variant.
pub fn ops_for(variant: Variant) -> &'static dyn VariantOps {
    match variant {
        Variant::Primitive => &PRIMITIVE,
        Variant::Group | Variant::Clone | Variant::Bundle => &COLLECTIVE,
    }
}

impl VariantOps for PrimitiveOps {
    fn create_probe(&self, ws: &mut WorkingSet, rsc: ResourceId, node: NodeId) -> StateResult<bool> {
        create_primitive_probe(ws, rsc, node)
    }

    fn collect_stop_actions(&self, ws: &WorkingSet, rsc: ResourceId) -> Vec<ActionId> {
        ws.resource_actions(rsc, None, task::STOP, false)
    }

    fn collect_demote_actions(&self, ws: &WorkingSet, rsc: ResourceId) -> Vec<ActionId> {
        ws.resource_actions(rsc, None, task::DEMOTE, false)
    }
}

impl VariantOps for CollectiveOps {
    fn create_probe(&self, ws: &mut WorkingSet, rsc: ResourceId, node: NodeId) -> StateResult<bool> {
        let resource = ws.resource(rsc);
        if resource.variant == Variant::Clone && !resource.meta_is_true(meta::GLOBALLY_UNIQUE) {
            return match anonymous_instance(ws, rsc, node) {
                Some(child) => create_probe(ws, child, node),
                None => Ok(false),
            };
        }

        let mut any_created = false;
        for child in resource.children.clone() {
            any_created |= create_probe(ws, child, node)?;
        }
        Ok(any_created)
    }

    fn collect_stop_actions(&self, ws: &WorkingSet, rsc: ResourceId) -> Vec<ActionId> {
        let mut actions = ws.resource_actions(rsc, None, task::STOP, false);
        for &child in &ws.resource(rsc).children {
            actions.extend(collect_stop_actions(ws, child));
        }
        actions
    }

    fn collect_demote_actions(&self, ws: &WorkingSet, rsc: ResourceId) -> Vec<ActionId> {
        let mut actions = ws.resource_actions(rsc, None, task::DEMOTE, false);
        for &child in &ws.resource(rsc).children {
            actions.extend(collect_demote_actions(ws, child));
        }
        actions
    }
}

/// The instance of an anonymous clone that represents it on `node`: the
/// one running there, else the one assigned there, else the first
/// instance.
fn anonymous_instance(ws: &WorkingSet, clone: ResourceId, node: NodeId) -> Option<ResourceId> {
    let children = &ws.resource(clone).children;
    let chosen = children
        .iter()
        .copied()
        .find(|&c| ws.resource(c).running_on.contains(&node))
        .or_else(|| {
            children
                .iter()
                .copied()
                .find(|&c| ws.resource(c).assigned_to == Some(node))
        })
        .or_else(|| children.first().copied());
    if let Some(child) = chosen {
        trace!(
            clone = %ws.resource(clone).name,
            instance = %ws.resource(child).name,
            node = %ws.node(node).name,
            "probing anonymous clone through one instance"
        );
    }
    chosen
}

/// Whether `rsc` or one of its descendants hosts a guest node.
pub fn contains_guest_node(ws: &WorkingSet, rsc: ResourceId) -> bool {
    ws.nodes().iter().any(|n| n.is_guest() && n.container == Some(rsc))
        || ws
            .resource(rsc)
            .children
            .iter()
            .any(|&child| contains_guest_node(ws, child))
}

/// Schedule whatever probes `rsc` needs on `node`.
///
/// Checks that apply to every variant happen here before dispatching.
pub fn create_probe(ws: &mut WorkingSet, rsc: ResourceId, node: NodeId) -> StateResult<bool> {
    if !ws.options.enable_startup_probes {
        trace!(rsc = %ws.resource(rsc).name, "startup probes disabled");
        return Ok(false);
    }

    let target = ws.node(node);
    if target.is_remote() {
        let resource = ws.resource(rsc);
        let reason = if resource.class.eq_ignore_ascii_case(class::STONITH) {
            Some("remote nodes cannot run fencing agents")
        } else if target.is_guest() && contains_guest_node(ws, rsc) {
            Some("guest nodes cannot run resources containing guest nodes")
        } else if resource.is_remote_connection {
            Some("remote nodes cannot host remote connections")
        } else {
            None
        };
        if let Some(reason) = reason {
            trace!(rsc = %resource.name, node = %target.name, reason, "skipping probe");
            return Ok(false);
        }
    }

    ops_for(ws.resource(rsc).variant).create_probe(ws, rsc, node)
}

pub fn collect_stop_actions(ws: &WorkingSet, rsc: ResourceId) -> Vec<ActionId> {
    ops_for(ws.resource(rsc).variant).collect_stop_actions(ws, rsc)
}

pub fn collect_demote_actions(ws: &WorkingSet, rsc: ResourceId) -> Vec<ActionId> {
    ops_for(ws.resource(rsc).variant).collect_demote_actions(ws, rsc)
}
