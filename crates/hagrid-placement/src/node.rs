//! Node availability and per-resource node copies.

use std::collections::BTreeMap;

use hagrid_state::{Node, NodeId};

/// Whether a node can run resources: it exists, is online, and is not
/// shutting down, unclean, in standby, or in maintenance.
pub fn is_available(node: Option<&Node>) -> bool {
    match node {
        Some(n) => n.online && !n.shutdown && !n.unclean && !n.standby && !n.maintenance,
        None => false,
    }
}

/// Independent copy of a node table.
pub fn copy_node_table(nodes: &BTreeMap<NodeId, Node>) -> BTreeMap<NodeId, Node> {
    nodes.iter().map(|(id, node)| (*id, node.clone())).collect()
}

/// Independent copy of a node list. With `reset`, every copy starts from
/// weight 0.
pub fn copy_node_list(nodes: &[Node], reset: bool) -> Vec<Node> {
    nodes
        .iter()
        .map(|node| {
            let mut copy = node.clone();
            if reset {
                copy.weight = 0;
            }
            copy
        })
        .collect()
}

/// Whether any node has a non-negative weight and is available.
pub fn any_available<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> bool {
    nodes
        .into_iter()
        .any(|n| n.weight >= 0 && is_available(Some(n)))
}
