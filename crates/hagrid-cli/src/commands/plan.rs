use std::path::Path;

use hagrid_scheduler::Scheduler;

use super::load_working_set;

pub fn plan(snapshot: &Path, config: Option<&Path>, format: &str) -> anyhow::Result<()> {
    print!("{}", render(snapshot, config, format)?);
    Ok(())
}

/// Run one planning cycle and format the result.
pub fn render(snapshot: &Path, config: Option<&Path>, format: &str) -> anyhow::Result<String> {
    let mut scheduler = Scheduler::new(load_working_set(snapshot, config)?);
    let summary = scheduler.run()?;
    let graph = scheduler.transition_graph();
    if !graph.is_acyclic() {
        tracing::warn!("transition graph contains a cycle");
    }

    match format {
        "json" => {
            let output = serde_json::json!({
                "summary": summary,
                "graph": graph,
            });
            Ok(format!("{}\n", serde_json::to_string_pretty(&output)?))
        }
        _ => Ok(format!(
            "{graph}\n{} resources assigned, {} probes, {} nodes fenced, {} actions\n",
            summary.assigned, summary.probes, summary.fenced, summary.actions
        )),
    }
}
