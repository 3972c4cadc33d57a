use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "hagrid",
    about = "hagrid: cluster resource planning core",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a planning cycle over a cluster snapshot and print the
    /// transition graph.
    Plan {
        /// Snapshot file (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,
        /// Cluster options (TOML); replaces the options in the snapshot
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Rank candidate nodes for one resource.
    ///
    /// Node health and location constraints are applied first; nothing is
    /// assigned.
    Rank {
        #[arg(short, long)]
        snapshot: PathBuf,
        /// Resource name
        #[arg(short, long)]
        resource: String,
    },
    /// Validate a cluster options file.
    CheckConfig {
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hagrid=info".parse()?)
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan { snapshot, config, format } => {
            commands::plan::plan(&snapshot, config.as_deref(), &format)
        }
        Commands::Rank { snapshot, resource } => {
            commands::rank::rank(&snapshot, &resource)
        }
        Commands::CheckConfig { config } => {
            commands::check::check_config(&config)
        }
    }
}
