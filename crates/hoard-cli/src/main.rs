//! Hoard CLI entrypoint.

use clap::Parser;
use std::path::PathBuf;

mod bootstrap;
mod commands;
mod config;
mod handlers;

use commands::{Commands, ConfigCommands, SnapshotCommands};
use config::HoardConfig;

#[derive(Parser)]
#[command(name = "hoard")]
#[command(author, version, about = "Content-addressed upload archive", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, env = "HOARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = HoardConfig::load(cli.config.as_deref())?;
    hoard_trace::init_tracer(&config.tracing)?;

    let result = match cli.command {
        Commands::Serve { listen, warm } => {
            if let Some(listen) = listen {
                config.listen = listen;
            }
            config.warm_on_start |= warm;
            handlers::serve(&config).await
        }
        Commands::Hash { path } => handlers::hash(&path).await,
        Commands::Archive { path, name } => handlers::archive(&config, &path, name).await,
        Commands::Snapshot { command } => match command {
            SnapshotCommands::Show => handlers::show_snapshot(&config).await,
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => handlers::show_config(&config, cli.config.as_deref()),
        },
    };

    hoard_trace::shutdown_tracer();
    result
}
