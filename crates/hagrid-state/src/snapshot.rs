//! JSON snapshot of cluster state, used to build a [`WorkingSet`].
//!
//! Everything is referenced by name. Resources nest their children;
//! pre-scheduled actions are identified by resource, task and node, and
//! edges between them by action key and node.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use hagrid_core::names::op_key;
use hagrid_core::{ClusterOptions, parse_score};

use crate::error::{StateError, StateResult};
use crate::types::*;
use crate::working_set::WorkingSet;

fn default_true() -> bool {
    true
}

fn default_class() -> String {
    "ocf".to_string()
}

fn default_order_kind() -> Vec<String> {
    vec!["optional".to_string()]
}

/// Complete planning input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    #[serde(default)]
    pub options: ClusterOptions,
    #[serde(default)]
    pub nodes: Vec<NodeSnapshot>,
    #[serde(default)]
    pub resources: Vec<ResourceSnapshot>,
    /// Actions scheduled by earlier stages (starts, stops, promotes, ...).
    #[serde(default)]
    pub actions: Vec<ActionSnapshot>,
    /// Existing ordering edges between the actions above.
    #[serde(default)]
    pub edges: Vec<EdgeSnapshot>,
    #[serde(default)]
    pub orderings: Vec<OrderingSnapshot>,
    #[serde(default)]
    pub locations: Vec<LocationSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub name: String,
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default = "default_true")]
    pub online: bool,
    #[serde(default)]
    pub unclean: bool,
    #[serde(default)]
    pub standby: bool,
    #[serde(default)]
    pub maintenance: bool,
    #[serde(default)]
    pub shutdown: bool,
    #[serde(default = "default_true")]
    pub rsc_discovery_enabled: bool,
    #[serde(default)]
    pub remote_connection_failed: bool,
    #[serde(default)]
    pub remote_requires_reset: bool,
    /// Container resource of a guest node.
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub weight: i32,
    #[serde(default)]
    pub utilization: BTreeMap<String, i64>,
    #[serde(default)]
    pub num_resources: u32,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub name: String,
    #[serde(default)]
    pub variant: Variant,
    #[serde(default = "default_class")]
    pub class: String,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub next_role: Role,
    #[serde(default)]
    pub running_on: Vec<String>,
    #[serde(default)]
    pub known_on: Vec<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub utilization: BTreeMap<String, i64>,
    #[serde(default)]
    pub orphan: bool,
    #[serde(default)]
    pub failed: bool,
    #[serde(default)]
    pub remote_connection: bool,
    #[serde(default)]
    pub children: Vec<ResourceSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSnapshot {
    /// Owning resource; absent for cluster actions, which need `key`.
    #[serde(default)]
    pub resource: Option<String>,
    pub task: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub interval_ms: u32,
    #[serde(default)]
    pub pseudo: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub first: String,
    #[serde(default)]
    pub first_node: Option<String>,
    pub then: String,
    #[serde(default)]
    pub then_node: Option<String>,
    #[serde(default = "default_order_kind")]
    pub kind: Vec<String>,
}

/// An ordering constraint. A side with a resource names a task of that
/// resource (`stop`); a side without one names an action key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderingSnapshot {
    #[serde(default)]
    pub first_resource: Option<String>,
    pub first_task: String,
    #[serde(default)]
    pub then_resource: Option<String>,
    pub then_task: String,
    #[serde(default = "default_order_kind")]
    pub kind: Vec<String>,
}

/// A location score for one resource on one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSnapshot {
    pub id: String,
    pub resource: String,
    pub node: String,
    /// Integer or `INFINITY` / `-INFINITY`.
    pub score: String,
    #[serde(default)]
    pub resource_discovery: DiscoverMode,
}

impl ClusterSnapshot {
    pub fn from_json_str(content: &str) -> StateResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> StateResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| StateError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Build a fresh working set from this snapshot.
    pub fn into_working_set(self) -> StateResult<WorkingSet> {
        let mut ws = WorkingSet::new(self.options);

        for n in &self.nodes {
            let mut node = Node::new(n.name.clone());
            node.kind = n.kind;
            node.online = n.online;
            node.unclean = n.unclean;
            node.standby = n.standby;
            node.maintenance = n.maintenance;
            node.shutdown = n.shutdown;
            node.rsc_discovery_enabled = n.rsc_discovery_enabled;
            node.remote_connection_failed = n.remote_connection_failed;
            node.remote_requires_reset = n.remote_requires_reset;
            node.weight = n.weight;
            node.utilization = n.utilization.clone();
            node.num_resources = n.num_resources;
            node.attributes = n.attributes.clone();
            ws.add_node(node)?;
        }

        // Containers may refer to resources declared later, so link them
        // after every resource exists.
        let mut containers = Vec::new();
        for r in &self.resources {
            add_resource_tree(&mut ws, None, r, &mut containers)?;
        }
        for (rsc, container) in containers {
            let container = resolve_resource(&ws, &container)?;
            ws.resource_mut(rsc).container = Some(container);
        }
        for n in &self.nodes {
            if let Some(container) = &n.container {
                let container = resolve_resource(&ws, container)?;
                let node = resolve_node(&ws, &n.name)?;
                ws.node_mut(node).container = Some(container);
            }
        }

        for a in &self.actions {
            add_action(&mut ws, a)?;
        }

        for e in &self.edges {
            let first_node = e.first_node.as_deref().map(|n| resolve_node(&ws, n)).transpose()?;
            let then_node = e.then_node.as_deref().map(|n| resolve_node(&ws, n)).transpose()?;
            let first = ws
                .action_by_key(&e.first, first_node)
                .ok_or_else(|| StateError::UnknownAction(e.first.clone()))?;
            let then = ws
                .action_by_key(&e.then, then_node)
                .ok_or_else(|| StateError::UnknownAction(e.then.clone()))?;
            ws.order_actions(first, then, resolve_kind(&e.kind)?);
        }

        for o in &self.orderings {
            let kind = resolve_kind(&o.kind)?;
            let first = order_side(&ws, o.first_resource.as_deref(), &o.first_task)?;
            let then = order_side(&ws, o.then_resource.as_deref(), &o.then_task)?;
            ws.new_ordering(kind, first, then)?;
        }

        for l in &self.locations {
            let rsc = resolve_resource(&ws, &l.resource)?;
            let node = resolve_node(&ws, &l.node)?;
            ws.new_location(&l.id, rsc, node, parse_score(&l.score), l.resource_discovery);
        }

        debug!(
            nodes = ws.nodes().len(),
            resources = ws.resources().len(),
            actions = ws.actions().len(),
            orderings = ws.orderings().len(),
            "working set loaded from snapshot"
        );
        Ok(ws)
    }
}

fn add_resource_tree(
    ws: &mut WorkingSet,
    parent: Option<ResourceId>,
    snap: &ResourceSnapshot,
    containers: &mut Vec<(ResourceId, String)>,
) -> StateResult<ResourceId> {
    let mut rsc = Resource::new(snap.name.clone(), snap.variant);
    rsc.class = snap.class.clone();
    rsc.meta = snap.meta.clone();
    rsc.role = snap.role.unwrap_or(if snap.running_on.is_empty() {
        Role::Stopped
    } else {
        Role::Started
    });
    rsc.next_role = snap.next_role;
    rsc.utilization = snap.utilization.clone();
    rsc.orphan = snap.orphan;
    rsc.failed = snap.failed;
    rsc.is_remote_connection = snap.remote_connection;
    for name in &snap.running_on {
        rsc.running_on.push(resolve_node(ws, name)?);
    }
    for name in &snap.known_on {
        rsc.known_on.insert(resolve_node(ws, name)?);
    }
    rsc.assigned_to = snap
        .assigned_to
        .as_deref()
        .map(|n| resolve_node(ws, n))
        .transpose()?;

    let id = match parent {
        Some(p) => ws.add_child(p, rsc)?,
        None => ws.add_resource(rsc)?,
    };
    if let Some(container) = &snap.container {
        containers.push((id, container.clone()));
    }
    for child in &snap.children {
        add_resource_tree(ws, Some(id), child, containers)?;
    }
    Ok(id)
}

fn add_action(ws: &mut WorkingSet, snap: &ActionSnapshot) -> StateResult<ActionId> {
    let node = snap.node.as_deref().map(|n| resolve_node(ws, n)).transpose()?;
    let rsc = snap
        .resource
        .as_deref()
        .map(|r| resolve_resource(ws, r))
        .transpose()?;
    let key = match (&snap.key, rsc) {
        (Some(key), _) => key.clone(),
        (None, Some(r)) => op_key(&ws.resource(r).name, &snap.task, snap.interval_ms),
        (None, None) => {
            return Err(StateError::UnknownAction(format!(
                "cluster action '{}' has no key",
                snap.task
            )));
        }
    };

    let id = ws.custom_action(rsc, key, &snap.task, node, snap.optional);
    let action = ws.action_mut(id);
    action.interval_ms = snap.interval_ms;
    action.meta.extend(snap.meta.clone());
    if snap.pseudo {
        action.flags.insert(ActionFlags::PSEUDO | ActionFlags::RUNNABLE);
    }
    Ok(id)
}

fn order_side(ws: &WorkingSet, rsc: Option<&str>, task: &str) -> StateResult<OrderSide> {
    match rsc {
        Some(name) => {
            let rsc = resolve_resource(ws, name)?;
            Ok(OrderSide::task(Some(rsc), op_key(name, task, 0)))
        }
        None => Ok(OrderSide::task(None, task)),
    }
}

fn resolve_node(ws: &WorkingSet, name: &str) -> StateResult<NodeId> {
    ws.node_by_name(name)
        .ok_or_else(|| StateError::UnknownNode(name.to_string()))
}

fn resolve_resource(ws: &WorkingSet, name: &str) -> StateResult<ResourceId> {
    ws.resource_by_name(name)
        .ok_or_else(|| StateError::UnknownResource(name.to_string()))
}

fn resolve_kind(names: &[String]) -> StateResult<OrderType> {
    OrderType::from_names(names).ok_or_else(|| StateError::UnknownOrderType(names.join(",")))
}
