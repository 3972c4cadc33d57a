//! WorkingSet: the per-cycle aggregate of nodes, resources, actions, and
//! constraints.
//!
//! Every planning stage receives the working set by `&mut` reference; there
//! is no other shared state. A working set is built (usually from a
//! [`ClusterSnapshot`](crate::ClusterSnapshot)), planned once, and dropped.

use std::collections::HashMap;

use tracing::trace;

use hagrid_core::ClusterOptions;
use hagrid_core::names::op_key;

use crate::error::{StateError, StateResult};
use crate::types::*;

/// Arena-backed planning state for one cycle.
#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    pub options: ClusterOptions,
    nodes: Vec<Node>,
    resources: Vec<Resource>,
    actions: Vec<Action>,
    orderings: Vec<Ordering>,
    locations: Vec<LocationConstraint>,
    /// (key, node) → action, enforcing one action per key and node.
    action_index: HashMap<(String, Option<NodeId>), ActionId>,
}

impl WorkingSet {
    pub fn new(options: ClusterOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    // ── Nodes ──────────────────────────────────────────────────────

    /// Add a node. Node names must be unique.
    pub fn add_node(&mut self, mut node: Node) -> StateResult<NodeId> {
        if self.node_by_name(&node.name).is_some() {
            return Err(StateError::Duplicate {
                kind: "node",
                name: node.name,
            });
        }
        let id = NodeId(self.nodes.len());
        node.id = id;
        self.nodes.push(node);
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().find(|n| n.name == name).map(|n| n.id)
    }

    // ── Resources ──────────────────────────────────────────────────

    /// Add a top-level resource. Resource names must be unique.
    pub fn add_resource(&mut self, mut rsc: Resource) -> StateResult<ResourceId> {
        if self.resource_by_name(&rsc.name).is_some() {
            return Err(StateError::Duplicate {
                kind: "resource",
                name: rsc.name,
            });
        }
        let id = ResourceId(self.resources.len());
        rsc.id = id;
        rsc.parent = None;
        self.resources.push(rsc);
        Ok(id)
    }

    /// Add a resource as the last child of a collective resource.
    pub fn add_child(&mut self, parent: ResourceId, rsc: Resource) -> StateResult<ResourceId> {
        if !self.resource(parent).variant.is_collective() {
            return Err(StateError::NotCollective(self.resource(parent).name.clone()));
        }
        let id = self.add_resource(rsc)?;
        self.resources[id.0].parent = Some(parent);
        self.resources[parent.0].children.push(id);
        Ok(id)
    }

    pub fn resource(&self, id: ResourceId) -> &Resource {
        &self.resources[id.0]
    }

    pub fn resource_mut(&mut self, id: ResourceId) -> &mut Resource {
        &mut self.resources[id.0]
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn resource_by_name(&self, name: &str) -> Option<ResourceId> {
        self.resources.iter().find(|r| r.name == name).map(|r| r.id)
    }

    /// Resources without a parent, in insertion order.
    pub fn top_level_resources(&self) -> Vec<ResourceId> {
        self.resources
            .iter()
            .filter(|r| r.parent.is_none())
            .map(|r| r.id)
            .collect()
    }

    /// Outermost ancestor of a resource (the resource itself if top-level).
    pub fn uber_parent(&self, rsc: ResourceId) -> ResourceId {
        let mut current = rsc;
        while let Some(parent) = self.resources[current.0].parent {
            current = parent;
        }
        current
    }

    // ── Actions ────────────────────────────────────────────────────

    pub fn action(&self, id: ActionId) -> &Action {
        &self.actions[id.0]
    }

    pub fn action_mut(&mut self, id: ActionId) -> &mut Action {
        &mut self.actions[id.0]
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Find or create the action with `key` on `node`.
    ///
    /// An existing action stays shared; asking for a required instance makes
    /// it required. New actions are runnable when they have no node or their
    /// node is online and clean.
    pub fn custom_action(
        &mut self,
        rsc: Option<ResourceId>,
        key: String,
        task: &str,
        node: Option<NodeId>,
        optional: bool,
    ) -> ActionId {
        if let Some(&id) = self.action_index.get(&(key.clone(), node)) {
            if !optional {
                self.actions[id.0].flags.remove(ActionFlags::OPTIONAL);
            }
            return id;
        }

        let mut flags = ActionFlags::empty();
        if optional {
            flags.insert(ActionFlags::OPTIONAL);
        }
        let runnable = match node {
            None => true,
            Some(n) => self.nodes[n.0].online && !self.nodes[n.0].unclean,
        };
        if runnable {
            flags.insert(ActionFlags::RUNNABLE);
        }

        let id = ActionId(self.actions.len());
        trace!(%key, node = ?node.map(|n| self.nodes[n.0].name.as_str()), "action created");
        self.actions.push(Action {
            id,
            key: key.clone(),
            task: task.to_string(),
            interval_ms: 0,
            rsc,
            node,
            flags,
            meta: Default::default(),
            after: Vec::new(),
            before: Vec::new(),
        });
        self.action_index.insert((key, node), id);
        if let Some(r) = rsc {
            self.resources[r.0].actions.push(id);
        }
        id
    }

    /// Find or create `<rsc>_<task>_0` on `node`.
    pub fn resource_action(
        &mut self,
        rsc: ResourceId,
        task: &str,
        node: Option<NodeId>,
        optional: bool,
    ) -> ActionId {
        let key = op_key(&self.resources[rsc.0].name, task, 0);
        self.custom_action(Some(rsc), key, task, node, optional)
    }

    /// Find or create a node-less pseudo action for a resource.
    pub fn pseudo_action(&mut self, rsc: ResourceId, task: &str, optional: bool) -> ActionId {
        let id = self.resource_action(rsc, task, None, optional);
        self.actions[id.0]
            .flags
            .insert(ActionFlags::PSEUDO | ActionFlags::RUNNABLE);
        id
    }

    /// Look up an action by key and node without creating it.
    pub fn action_by_key(&self, key: &str, node: Option<NodeId>) -> Option<ActionId> {
        self.action_index.get(&(key.to_string(), node)).copied()
    }

    /// Filter `candidates` by key. With a node, actions on that node and
    /// actions without a node match; without one, every node matches.
    pub fn find_actions(
        &self,
        candidates: &[ActionId],
        key: &str,
        node: Option<NodeId>,
    ) -> Vec<ActionId> {
        candidates
            .iter()
            .copied()
            .filter(|id| {
                let action = &self.actions[id.0];
                action.key == key
                    && match node {
                        None => true,
                        Some(n) => action.node.is_none() || action.node == Some(n),
                    }
            })
            .collect()
    }

    /// All actions in the working set with a given key.
    pub fn find_actions_by_key(&self, key: &str) -> Vec<ActionId> {
        self.actions
            .iter()
            .filter(|a| a.key == key)
            .map(|a| a.id)
            .collect()
    }

    /// Actions of `rsc` for `task` at interval 0. With `require_node`, only
    /// actions on exactly `node` match.
    pub fn resource_actions(
        &self,
        rsc: ResourceId,
        node: Option<NodeId>,
        task: &str,
        require_node: bool,
    ) -> Vec<ActionId> {
        let resource = &self.resources[rsc.0];
        let key = op_key(&resource.name, task, 0);
        if require_node {
            resource
                .actions
                .iter()
                .copied()
                .filter(|id| {
                    let action = &self.actions[id.0];
                    action.key == key && action.node == node
                })
                .collect()
        } else {
            self.find_actions(&resource.actions, &key, node)
        }
    }

    /// Order `first` before `then`.
    ///
    /// Returns false when nothing was added: the type is `NONE`, the two
    /// actions are the same, or an edge between them already shares a type
    /// bit with `kind`.
    pub fn order_actions(&mut self, first: ActionId, then: ActionId, kind: OrderType) -> bool {
        if kind.is_none() || first == then {
            return false;
        }
        let duplicate = self.actions[first.0]
            .after
            .iter()
            .any(|e| e.action == then && e.kind.intersects(kind));
        if duplicate {
            return false;
        }

        trace!(
            first = %self.actions[first.0].key,
            then = %self.actions[then.0].key,
            kind = %kind,
            "ordering actions"
        );
        self.actions[first.0].after.push(ActionEdge { action: then, kind });
        self.actions[then.0].before.push(ActionEdge { action: first, kind });
        true
    }

    /// Human-readable `key@node` label for logs.
    pub fn describe_action(&self, id: ActionId) -> String {
        let action = &self.actions[id.0];
        match action.node {
            Some(n) => format!("{}@{}", action.key, self.nodes[n.0].name),
            None => action.key.clone(),
        }
    }

    // ── Constraints ────────────────────────────────────────────────

    /// Record an ordering constraint.
    ///
    /// Both sides must name an action or a task; anything else is a builder
    /// bug and is rejected.
    pub fn new_ordering(
        &mut self,
        kind: OrderType,
        first: OrderSide,
        then: OrderSide,
    ) -> StateResult<OrderingId> {
        if !first.is_resolvable() || !then.is_resolvable() {
            return Err(StateError::MalformedOrdering(format!(
                "{first:?} then {then:?} names neither an action nor a task"
            )));
        }
        let id = OrderingId(self.orderings.len());
        self.orderings.push(Ordering {
            id,
            kind,
            first,
            then,
        });
        Ok(id)
    }

    /// Order `first_task` of one resource before `then_task` of another
    /// (both at interval 0).
    pub fn order_resource_tasks(
        &mut self,
        first_rsc: ResourceId,
        first_task: &str,
        then_rsc: ResourceId,
        then_task: &str,
        kind: OrderType,
    ) -> OrderingId {
        let first = OrderSide::task(
            Some(first_rsc),
            op_key(&self.resources[first_rsc.0].name, first_task, 0),
        );
        let then = OrderSide::task(
            Some(then_rsc),
            op_key(&self.resources[then_rsc.0].name, then_task, 0),
        );
        let id = OrderingId(self.orderings.len());
        self.orderings.push(Ordering {
            id,
            kind,
            first,
            then,
        });
        id
    }

    pub fn orderings(&self) -> &[Ordering] {
        &self.orderings
    }

    /// Record a location constraint for `rsc` on `node`.
    pub fn new_location(
        &mut self,
        id: &str,
        rsc: ResourceId,
        node: NodeId,
        score: i32,
        discover_mode: DiscoverMode,
    ) {
        trace!(
            id,
            rsc = %self.resources[rsc.0].name,
            node = %self.nodes[node.0].name,
            score,
            "location constraint added"
        );
        self.locations.push(LocationConstraint {
            id: id.to_string(),
            rsc,
            node,
            score,
            discover_mode,
        });
    }

    pub fn locations(&self) -> &[LocationConstraint] {
        &self.locations
    }
}
