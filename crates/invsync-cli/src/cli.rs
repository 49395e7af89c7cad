use std::path::PathBuf;

use clap::{Parser, Subcommand};
use invsync_core::SyncDirection;

#[derive(Parser)]
#[command(name = "invsync")]
#[command(about = "Replicate a store's inventory between the cloud database and a local backup")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the local backup database (defaults to backup_<tenant>.db)
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// CLI profile name
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replicate records between the cloud database and the local backup
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Copy cloud records into the local backup
    Pull {
        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Copy local backup records into the cloud database
    Push {
        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Pull, then push
    Both {
        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },
}

impl SyncCommands {
    pub const fn direction(&self) -> SyncDirection {
        match self {
            Self::Pull { .. } => SyncDirection::CloudToLocal,
            Self::Push { .. } => SyncDirection::LocalToCloud,
            Self::Both { .. } => SyncDirection::Bidirectional,
        }
    }

    pub const fn json(&self) -> bool {
        match self {
            Self::Pull { json } | Self::Push { json } | Self::Both { json } => *json,
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update a profile
    Init {
        /// Tenant (store) whose data is replicated
        #[arg(long, value_name = "ID")]
        tenant: Option<String>,
        /// Cloud database URL (e.g. libsql://inventory.example.com)
        #[arg(long, value_name = "URL")]
        cloud_url: Option<String>,
        /// Directory holding the local backup files
        #[arg(long, value_name = "DIR")]
        local_dir: Option<PathBuf>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Show the effective settings of a profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
