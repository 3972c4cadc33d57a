//! Transition graph: the planned actions and their ordering edges.
//!
//! The graph is a flat, name-based copy of the working set's action
//! arena, suitable for printing or serializing as JSON.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use hagrid_state::WorkingSet;

/// A planned action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphAction {
    pub id: usize,
    pub key: String,
    pub task: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    pub pseudo: bool,
    pub runnable: bool,
    pub optional: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

/// "`first` before `then`", by action id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub first: usize,
    pub then: usize,
    /// Ordering type bits.
    pub kind: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionGraph {
    pub actions: Vec<GraphAction>,
    pub edges: Vec<GraphEdge>,
}

impl TransitionGraph {
    pub fn from_working_set(ws: &WorkingSet) -> Self {
        let actions = ws
            .actions()
            .iter()
            .map(|a| GraphAction {
                id: a.id.0,
                key: a.key.clone(),
                task: a.task.clone(),
                resource: a.rsc.map(|r| ws.resource(r).name.clone()),
                node: a.node.map(|n| ws.node(n).name.clone()),
                pseudo: a.is_pseudo(),
                runnable: a.is_runnable(),
                optional: a.is_optional(),
                meta: a.meta.clone(),
            })
            .collect();
        let edges = ws
            .actions()
            .iter()
            .flat_map(|a| {
                a.after.iter().map(move |e| GraphEdge {
                    first: a.id.0,
                    then: e.action.0,
                    kind: e.kind.bits(),
                })
            })
            .collect();
        Self { actions, edges }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Edges going into and out of `id`.
    pub fn edges_of(&self, id: usize) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |e| e.first == id || e.then == id)
    }

    pub fn action_by_key(&self, key: &str) -> Option<&GraphAction> {
        self.actions.iter().find(|a| a.key == key)
    }

    /// Whether an edge `first_key` → `then_key` exists.
    pub fn has_edge(&self, first_key: &str, then_key: &str) -> bool {
        let (Some(first), Some(then)) = (self.action_by_key(first_key), self.action_by_key(then_key))
        else {
            return false;
        };
        self.edges.iter().any(|e| e.first == first.id && e.then == then.id)
    }

    /// Action ids in an order that respects every edge, or `None` if the
    /// edges contain a cycle (Kahn's algorithm, lowest id first).
    pub fn topological_order(&self) -> Option<Vec<usize>> {
        let mut in_degree = vec![0usize; self.actions.len()];
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); self.actions.len()];
        for edge in &self.edges {
            in_degree[edge.then] += 1;
            successors[edge.first].push(edge.then);
        }

        let mut ready: VecDeque<usize> = (0..self.actions.len())
            .filter(|&id| in_degree[id] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.actions.len());
        while let Some(id) = ready.pop_front() {
            order.push(id);
            for &next in &successors[id] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push_back(next);
                }
            }
        }
        (order.len() == self.actions.len()).then_some(order)
    }

    pub fn is_acyclic(&self) -> bool {
        self.topological_order().is_some()
    }
}

impl fmt::Display for TransitionGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = |id: usize| {
            let action = &self.actions[id];
            match &action.node {
                Some(node) => format!("{} on {}", action.key, node),
                None => action.key.clone(),
            }
        };

        writeln!(f, "Actions:")?;
        for action in &self.actions {
            let mut notes = Vec::new();
            if action.pseudo {
                notes.push("pseudo");
            }
            if action.optional {
                notes.push("optional");
            }
            if !action.runnable {
                notes.push("unrunnable");
            }
            if notes.is_empty() {
                writeln!(f, "  * {}", label(action.id))?;
            } else {
                writeln!(f, "  * {} ({})", label(action.id), notes.join(", "))?;
            }
        }

        writeln!(f, "Orderings:")?;
        for edge in &self.edges {
            writeln!(
                f,
                "  {} -> {} [{:#x}]",
                label(edge.first),
                label(edge.then),
                edge.kind
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hagrid_core::ClusterOptions;
    use hagrid_core::names::task;
    use hagrid_state::{Node, OrderType, Resource};

    fn graph_with_edges(cyclic: bool) -> TransitionGraph {
        let mut ws = WorkingSet::new(ClusterOptions::default());
        let n1 = ws.add_node(Node::new("n1")).unwrap();
        let a = ws.add_resource(Resource::primitive("a")).unwrap();
        let b = ws.add_resource(Resource::primitive("b")).unwrap();
        let stop_b = ws.resource_action(b, task::STOP, Some(n1), false);
        let stop_a = ws.resource_action(a, task::STOP, Some(n1), false);
        let start_a = ws.resource_action(a, task::START, Some(n1), true);
        ws.order_actions(stop_a, stop_b, OrderType::OPTIONAL);
        ws.order_actions(stop_a, start_a, OrderType::IMPLIES_THEN);
        if cyclic {
            ws.order_actions(stop_b, stop_a, OrderType::OPTIONAL);
        }
        TransitionGraph::from_working_set(&ws)
    }

    #[test]
    fn copies_actions_and_edges_by_name() {
        let graph = graph_with_edges(false);
        assert_eq!(graph.actions.len(), 3);
        assert_eq!(graph.edges.len(), 2);
        assert!(graph.has_edge("a_stop_0", "b_stop_0"));
        assert!(!graph.has_edge("b_stop_0", "a_stop_0"));

        let start = graph.action_by_key("a_start_0").unwrap();
        assert_eq!(start.node.as_deref(), Some("n1"));
        assert_eq!(start.resource.as_deref(), Some("a"));
        assert!(start.optional);
        assert_eq!(graph.edges_of(start.id).count(), 1);
    }

    #[test]
    fn topological_order_respects_edges() {
        let graph = graph_with_edges(false);
        let order = graph.topological_order().unwrap();
        let pos = |key: &str| {
            let id = graph.action_by_key(key).unwrap().id;
            order.iter().position(|&x| x == id).unwrap()
        };
        assert!(pos("a_stop_0") < pos("b_stop_0"));
        assert!(pos("a_stop_0") < pos("a_start_0"));
    }

    #[test]
    fn cycles_are_detected() {
        assert!(graph_with_edges(false).is_acyclic());
        assert!(!graph_with_edges(true).is_acyclic());
    }

    #[test]
    fn json_output_round_trips() {
        let graph = graph_with_edges(false);
        let json = graph.to_json().unwrap();
        let back: TransitionGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, graph);
    }

    #[test]
    fn text_output_lists_actions_and_orderings() {
        let text = graph_with_edges(false).to_string();
        assert!(text.contains("a_start_0 on n1 (optional)"));
        assert!(text.contains("a_stop_0 on n1 -> b_stop_0 on n1 [0x1]"));
    }
}
