use std::path::Path;

use anyhow::anyhow;

use hagrid_core::score_to_string;
use hagrid_scheduler::Scheduler;

use super::load_working_set;

pub fn rank(snapshot: &Path, resource: &str) -> anyhow::Result<()> {
    print!("{}", render(snapshot, resource)?);
    Ok(())
}

/// One line per candidate node, most preferred first.
pub fn render(snapshot: &Path, resource: &str) -> anyhow::Result<String> {
    let ws = load_working_set(snapshot, None)?;
    let rsc = ws
        .resource_by_name(resource)
        .ok_or_else(|| anyhow!("unknown resource: {resource}"))?;

    let mut scheduler = Scheduler::new(ws);
    let ranked = scheduler.rank(rsc)?;
    let mut out = String::new();
    for (position, node) in ranked.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}. {} (score {}, {} resources)\n",
            position + 1,
            node.name,
            score_to_string(node.weight),
            node.num_resources
        ));
    }
    Ok(out)
}
