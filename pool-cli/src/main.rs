//! # chatpool CLI
//!
//! Command-line client for a chatpool organization.
//!
//! ## Commands
//!
//! - `signup`: Create a new organization and make it the local default
//! - `sync`: Pull new conversations from the pool into the local mirror
//! - `list`: List mirrored conversations
//! - `show`: Show one conversation with its messages
//! - `search`: Full-text search across mirrored messages
//! - `import`: Encrypt and upload exported conversation files
//! - `export`: Write a backup of the local mirror database
//!
//! ## Example
//!
//! ```bash
//! # Create an org on a server
//! chatpool signup --server https://pool.example.com --name "My Team" --slug my-team
//!
//! # Upload exports, then search them from any member's machine
//! chatpool import exports/*.json
//! chatpool sync
//! chatpool search "borrow checker"
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{export, import, list, search, show, signup, sync};

/// Command-line client for a chatpool organization.
#[derive(Parser, Debug)]
#[command(name = "chatpool")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for the local mirror and sync state
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new organization and make it the local default
    Signup {
        /// Server base URL, e.g. https://pool.example.com
        #[arg(long)]
        server: String,

        /// Organization display name
        #[arg(long)]
        name: String,

        /// Organization slug (lowercase letters, digits, hyphens)
        #[arg(long)]
        slug: String,
    },

    /// Pull new conversations from the pool into the local mirror
    Sync,

    /// List mirrored conversations, most recent first
    List {
        /// Only show conversations from this platform
        #[arg(long)]
        platform: Option<String>,

        /// Page size
        #[arg(long, default_value_t = 50)]
        limit: u32,

        /// Page offset
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    /// Show one conversation with its messages
    Show {
        /// Conversation id (as printed by `list`)
        id: String,
    },

    /// Full-text search across mirrored messages
    Search {
        /// Search text
        query: String,
    },

    /// Encrypt and upload exported conversation files (JSON)
    Import {
        /// Exported conversation files
        files: Vec<PathBuf>,
    },

    /// Write a backup of the local mirror database
    Export {
        /// Output file path
        path: PathBuf,
    },
}

fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "chatpool", "chatpool")
        .context("could not determine a data directory; pass --data-dir")?;
    Ok(dirs.data_dir().to_path_buf())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;

    match cli.command {
        Commands::Signup { server, name, slug } => signup::run(&data_dir, &server, &name, &slug).await,
        Commands::Sync => sync::run(&data_dir).await,
        Commands::List {
            platform,
            limit,
            offset,
        } => list::run(&data_dir, platform.as_deref(), limit, offset).await,
        Commands::Show { id } => show::run(&data_dir, &id).await,
        Commands::Search { query } => search::run(&data_dir, &query).await,
        Commands::Import { files } => import::run(&data_dir, &files).await,
        Commands::Export { path } => export::run(&data_dir, &path).await,
    }
}
