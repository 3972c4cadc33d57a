//! Applying node health as location constraints.
//!
//! Each node's health attributes (`#health-*`) are summed into one score.
//! A non-zero score becomes a location constraint for every top-level
//! resource on that node, so unhealthy nodes repel resources and healthy
//! ones attract them.

use tracing::{info, trace};

use hagrid_core::names::{meta, node_attr};
use hagrid_core::{add_scores, parse_score};
use hagrid_state::{DiscoverMode, Node, WorkingSet};

use crate::error::HealthResult;
use crate::strategy::{ColourScores, HealthStrategy};

/// Sum a node's health attributes on top of `base`.
pub fn sum_node_health_scores(node: &Node, base: i32, colours: &ColourScores) -> i32 {
    node.attributes
        .iter()
        .filter(|(name, _)| name.starts_with(node_attr::HEALTH_PREFIX))
        .fold(base, |health, (_, value)| add_scores(health, colours.score(value)))
}

/// Add health location constraints for every node. Returns the number of
/// constraints added.
pub fn apply_node_health(ws: &mut WorkingSet) -> HealthResult<usize> {
    let configured = ws.options.node_health_strategy.clone();
    let strategy: HealthStrategy = configured.parse()?;
    if strategy == HealthStrategy::None {
        return Ok(0);
    }
    info!(strategy = %configured, "applying node health strategy");

    let base = match strategy {
        HealthStrategy::Progressive => parse_score(&ws.options.node_health_base),
        _ => 0,
    };
    let colours = ColourScores::for_strategy(strategy, &ws.options);
    let resources = ws.top_level_resources();
    let mut added = 0;

    for node in ws.node_ids() {
        let health = sum_node_health_scores(ws.node(node), base, &colours);
        if health == 0 {
            continue;
        }
        info!(node = %ws.node(node).name, health, "node overall system health");

        for &rsc in &resources {
            if health < 0 && ws.resource(rsc).meta_is_true(meta::ALLOW_UNHEALTHY_NODES) {
                trace!(
                    rsc = %ws.resource(rsc).name,
                    node = %ws.node(node).name,
                    "resource is immune from health ban"
                );
                continue;
            }
            ws.new_location(&configured, rsc, node, health, DiscoverMode::Always);
            added += 1;
        }
    }
    Ok(added)
}
