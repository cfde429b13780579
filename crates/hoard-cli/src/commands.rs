//! CLI command definitions.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP upload service
    Serve {
        /// Address to bind, overriding the configuration
        #[arg(short, long, env = "HOARD_LISTEN")]
        listen: Option<String>,

        /// Rebuild the fast cache from the snapshot before serving
        #[arg(long)]
        warm: bool,
    },

    /// Print the content key of a file
    Hash {
        /// File to fingerprint
        path: PathBuf,
    },

    /// Resolve a local file against the cache, archiving it if new
    Archive {
        /// File to archive
        path: PathBuf,

        /// Logical artifact name (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Inspect the durable snapshot
    Snapshot {
        #[command(subcommand)]
        command: SnapshotCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum SnapshotCommands {
    /// Print the snapshot document
    Show,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
}
