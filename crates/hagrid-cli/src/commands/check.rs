use std::path::Path;

use hagrid_core::ClusterOptions;
use hagrid_scheduler::Scheduler;

pub fn check_config(path: &Path) -> anyhow::Result<()> {
    let options = ClusterOptions::from_file(path)?;
    Scheduler::validate(&options)?;
    println!("✓ {} is valid", path.display());
    print!("{}", options.to_toml_string()?);
    Ok(())
}
