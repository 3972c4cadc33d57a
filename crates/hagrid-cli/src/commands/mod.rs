pub mod check;
pub mod plan;
pub mod rank;

use std::path::Path;

use anyhow::Context;

use hagrid_core::ClusterOptions;
use hagrid_state::{ClusterSnapshot, WorkingSet};

/// Load a snapshot into a working set, optionally replacing its options.
pub fn load_working_set(snapshot: &Path, config: Option<&Path>) -> anyhow::Result<WorkingSet> {
    let mut snap = ClusterSnapshot::from_file(snapshot)
        .with_context(|| format!("Failed to load snapshot {}", snapshot.display()))?;
    if let Some(config) = config {
        snap.options = ClusterOptions::from_file(config)?;
    }
    Ok(snap.into_working_set()?)
}

#[cfg(test)]
pub(crate) fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}
