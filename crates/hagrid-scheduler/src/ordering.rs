//! Turning ordering constraints into action graph edges.

use tracing::{debug, trace, warn};

use hagrid_state::{ActionId, OrderSide, OrderType, Ordering, WorkingSet};

use crate::implicit::order_probes;

/// Resolve one side of an ordering to the actions it names.
///
/// `None` means the side names neither an action nor a task.
pub fn resolve_side(ws: &WorkingSet, side: &OrderSide) -> Option<Vec<ActionId>> {
    if let Some(action) = side.action {
        return Some(vec![action]);
    }
    let key = side.task.as_deref()?;
    Some(match side.rsc {
        Some(rsc) => ws.find_actions(&ws.resource(rsc).actions, key, None),
        None => ws.find_actions_by_key(key),
    })
}

/// Add the edges for one ordering. Returns how many edges were added.
pub fn apply_ordering(ws: &mut WorkingSet, ordering: &Ordering) -> usize {
    if ordering.kind.is_none() {
        return 0;
    }
    let (Some(firsts), Some(thens)) = (
        resolve_side(ws, &ordering.first),
        resolve_side(ws, &ordering.then),
    ) else {
        warn!(id = ordering.id.0, "skipping ordering with an unresolvable side");
        return 0;
    };

    let same_node = ordering.kind.contains(OrderType::SAME_NODE);
    let mut added = 0;
    for &first in &firsts {
        for &then in &thens {
            if same_node {
                let (first_node, then_node) = (ws.action(first).node, ws.action(then).node);
                if first_node.is_some() && then_node.is_some() && first_node != then_node {
                    continue;
                }
            }
            if ws.order_actions(first, then, ordering.kind) {
                added += 1;
            }
        }
    }
    if firsts.is_empty() || thens.is_empty() {
        trace!(id = ordering.id.0, "ordering matched no actions");
    }
    added
}

/// Apply every ordering constraint, then infer the implicit probe
/// orderings. Returns the number of edges added by the constraints
/// themselves.
pub fn apply_orderings(ws: &mut WorkingSet) -> usize {
    let orderings = ws.orderings().to_vec();
    let added: usize = orderings.iter().map(|o| apply_ordering(ws, o)).sum();
    debug!(orderings = orderings.len(), edges = added, "orderings applied");

    order_probes(ws);
    added
}
