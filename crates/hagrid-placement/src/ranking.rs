//! Node ranking for placement decisions.
//!
//! Candidate nodes are sorted most to least preferred by comparing, in
//! order:
//! - **Weight**: higher wins; unavailable nodes count as `-INFINITY`
//! - **Capacity** (`balanced` only): more remaining utilization wins
//! - **Load**: fewer assigned resources wins
//! - **Active node**: the resource's current host wins
//! - **Name**: ascending, so equal inputs always produce the same order
//!
//! The `minimal` strategy stops after the weight comparison and goes
//! straight to the name.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use tracing::trace;

use hagrid_core::INFINITY;
use hagrid_state::{Node, NodeId};

use crate::error::PlacementError;
use crate::node::is_available;

/// How resources are spread across nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementStrategy {
    #[default]
    Default,
    Utilization,
    Minimal,
    Balanced,
}

impl FromStr for PlacementStrategy {
    type Err = PlacementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "default" => Ok(Self::Default),
            "utilization" => Ok(Self::Utilization),
            "minimal" => Ok(Self::Minimal),
            "balanced" => Ok(Self::Balanced),
            _ => Err(PlacementError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for PlacementStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Default => "default",
            Self::Utilization => "utilization",
            Self::Minimal => "minimal",
            Self::Balanced => "balanced",
        };
        f.write_str(name)
    }
}

/// Compare the remaining utilization capacity of two nodes.
///
/// Every attribute in either node's map casts one vote for the node with
/// more remaining capacity (a missing attribute counts as 0). `Less` means
/// `a` has more capacity overall and is preferred.
pub fn compare_node_capacities(a: &Node, b: &Node) -> Ordering {
    let keys: BTreeSet<&String> = a.utilization.keys().chain(b.utilization.keys()).collect();
    let mut votes: i64 = 0;
    for key in keys {
        let remaining_a = a.utilization.get(key).copied().unwrap_or(0);
        let remaining_b = b.utilization.get(key).copied().unwrap_or(0);
        match remaining_a.cmp(&remaining_b) {
            Ordering::Greater => votes -= 1,
            Ordering::Less => votes += 1,
            Ordering::Equal => {}
        }
    }
    votes.cmp(&0)
}

fn effective_weight(node: &Node) -> i32 {
    if is_available(Some(node)) {
        node.weight
    } else {
        -INFINITY
    }
}

/// Compare two nodes for hosting a resource. `Less` means `a` is preferred.
pub fn compare_nodes(
    a: &Node,
    b: &Node,
    active: Option<NodeId>,
    strategy: PlacementStrategy,
) -> Ordering {
    let weight_a = effective_weight(a);
    let weight_b = effective_weight(b);
    if weight_a != weight_b {
        trace!(a = %a.name, weight_a, b = %b.name, weight_b, "decided by weight");
        return weight_b.cmp(&weight_a);
    }

    if strategy != PlacementStrategy::Minimal {
        if strategy == PlacementStrategy::Balanced {
            let capacity = compare_node_capacities(a, b);
            if capacity != Ordering::Equal {
                trace!(a = %a.name, b = %b.name, ?capacity, "decided by capacity");
                return capacity;
            }
        }

        if a.num_resources != b.num_resources {
            trace!(
                a = %a.name, a_resources = a.num_resources,
                b = %b.name, b_resources = b.num_resources,
                "decided by resource count"
            );
            return a.num_resources.cmp(&b.num_resources);
        }

        if let Some(active) = active {
            if a.id == active && b.id != active {
                trace!(a = %a.name, b = %b.name, "decided by active node");
                return Ordering::Less;
            }
            if b.id == active && a.id != active {
                trace!(a = %a.name, b = %b.name, "decided by active node");
                return Ordering::Greater;
            }
        }
    }

    a.name.cmp(&b.name)
}

/// Sort nodes most to least preferred for hosting one resource.
///
/// `active` is the resource's current host, if any.
pub fn rank_nodes(
    mut nodes: Vec<Node>,
    active: Option<NodeId>,
    strategy: PlacementStrategy,
) -> Vec<Node> {
    nodes.sort_by(|a, b| compare_nodes(a, b, active, strategy));
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_node(id: usize, name: &str, weight: i32) -> Node {
        let mut node = Node::new(name);
        node.id = NodeId(id);
        node.weight = weight;
        node
    }

    fn names(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(|n| n.name.as_str()).collect()
    }

    #[test]
    fn parses_strategies_case_insensitively() {
        assert_eq!("".parse::<PlacementStrategy>().unwrap(), PlacementStrategy::Default);
        assert_eq!("Balanced".parse::<PlacementStrategy>().unwrap(), PlacementStrategy::Balanced);
        assert_eq!("MINIMAL".parse::<PlacementStrategy>().unwrap(), PlacementStrategy::Minimal);
        assert_eq!(
            "utilization".parse::<PlacementStrategy>().unwrap(),
            PlacementStrategy::Utilization
        );
        assert!("spread".parse::<PlacementStrategy>().is_err());
    }

    #[test]
    fn higher_weight_first() {
        let ranked = rank_nodes(
            vec![make_node(0, "a", 10), make_node(1, "b", 100), make_node(2, "c", -5)],
            None,
            PlacementStrategy::Default,
        );
        assert_eq!(names(&ranked), ["b", "a", "c"]);
    }

    #[test]
    fn unavailable_nodes_rank_last_regardless_of_weight() {
        let mut standby = make_node(0, "a", INFINITY);
        standby.standby = true;
        let banned = make_node(1, "b", -INFINITY + 1);

        let ranked = rank_nodes(vec![standby, banned], None, PlacementStrategy::Default);
        assert_eq!(names(&ranked), ["b", "a"]);
    }

    #[test]
    fn fewer_resources_then_active_then_name() {
        let mut busy = make_node(0, "a", 0);
        busy.num_resources = 3;
        let idle = make_node(1, "b", 0);
        let active = make_node(2, "c", 0);

        let ranked = rank_nodes(
            vec![busy, idle, active],
            Some(NodeId(2)),
            PlacementStrategy::Default,
        );
        assert_eq!(names(&ranked), ["c", "b", "a"]);
    }

    #[test]
    fn minimal_ignores_load_and_active_node() {
        let mut busy = make_node(0, "a", 0);
        busy.num_resources = 3;
        let idle = make_node(1, "b", 0);

        let ranked = rank_nodes(vec![idle, busy], Some(NodeId(1)), PlacementStrategy::Minimal);
        assert_eq!(names(&ranked), ["a", "b"]);
    }

    #[test]
    fn balanced_prefers_remaining_capacity() {
        let mut full = make_node(0, "a", 0);
        full.utilization.insert("cpu".into(), 1);
        full.utilization.insert("memory".into(), 512);
        let mut empty = make_node(1, "b", 0);
        empty.utilization.insert("cpu".into(), 8);
        empty.utilization.insert("memory".into(), 4096);
        empty.num_resources = 5;

        let ranked = rank_nodes(
            vec![full.clone(), empty.clone()],
            None,
            PlacementStrategy::Balanced,
        );
        assert_eq!(names(&ranked), ["b", "a"]);

        // Without balancing, load decides instead.
        let ranked = rank_nodes(vec![full, empty], None, PlacementStrategy::Utilization);
        assert_eq!(names(&ranked), ["a", "b"]);
    }

    #[test]
    fn capacity_votes_per_attribute() {
        let mut a = make_node(0, "a", 0);
        a.utilization.insert("cpu".into(), 4);
        let mut b = make_node(1, "b", 0);
        b.utilization.insert("memory".into(), 1024);
        // One vote each: tie.
        assert_eq!(compare_node_capacities(&a, &b), Ordering::Equal);

        b.utilization.insert("cpu".into(), 2);
        assert_eq!(compare_node_capacities(&a, &b), Ordering::Equal);
        b.utilization.insert("disk".into(), 10);
        assert_eq!(compare_node_capacities(&a, &b), Ordering::Greater);
        assert_eq!(compare_node_capacities(&b, &a), Ordering::Less);
    }

    #[test]
    fn ranking_is_deterministic_under_input_permutation() {
        let nodes = vec![
            make_node(0, "delta", 5),
            make_node(1, "alpha", 5),
            make_node(2, "charlie", 5),
            make_node(3, "bravo", 7),
        ];
        for strategy in [
            PlacementStrategy::Default,
            PlacementStrategy::Minimal,
            PlacementStrategy::Balanced,
        ] {
            let first = rank_nodes(nodes.clone(), None, strategy);
            let again = rank_nodes(first.clone(), None, strategy);
            let mut reversed = nodes.clone();
            reversed.reverse();
            let from_reversed = rank_nodes(reversed, None, strategy);

            assert_eq!(names(&first), ["bravo", "alpha", "charlie", "delta"]);
            assert_eq!(names(&first), names(&again));
            assert_eq!(names(&first), names(&from_reversed));
        }
    }
}
