//! CLI argument parsing for the blind index tool.
//!
//! CLI flags override all other config sources.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Blind index operator tool
///
/// Backfills, inspects and maintains the keyed-hash search index.
#[derive(Parser, Debug)]
#[command(name = "blindex")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/blindex/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override index database path
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Operator commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index documents that are missing entries or were indexed with another key
    Backfill(BackfillArgs),

    /// List candidate documents for a query
    Search {
        /// Tenant to search in
        #[arg(short, long)]
        tenant: String,

        /// Maximum results
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,

        /// Query text
        query: String,
    },

    /// Remove a deleted document from the index
    Remove {
        /// Tenant of the document
        #[arg(short, long)]
        tenant: String,

        /// Document to remove
        #[arg(short, long)]
        document: String,
    },

    /// Show index statistics
    Stats,
}

/// Backfill options
#[derive(Args, Debug, Clone)]
pub struct BackfillArgs {
    /// JSON-lines export of decrypted documents
    #[arg(long)]
    pub documents: PathBuf,

    /// Documents per batch (default from config, BLINDEX_BACKFILL_BATCH_SIZE)
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Reindex every live document, not only missing or stale ones
    #[arg(long)]
    pub full: bool,

    /// Continue from the last checkpoint of an interrupted run
    #[arg(long)]
    pub resume: bool,

    /// Abort on the first failing document
    #[arg(long)]
    pub fail_fast: bool,
}
