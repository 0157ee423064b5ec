//! Blind index operator tool
//!
//! # Usage
//!
//! ```bash
//! blindex backfill --documents export.jsonl [--batch-size N] [--full] [--resume]
//! blindex search --tenant TENANT [--limit N] QUERY
//! blindex remove --tenant TENANT --document DOCUMENT
//! blindex stats
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/blindex/config.toml)
//! 3. Environment variables (BLINDEX_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use blindex_cli::{
    handle_backfill, handle_remove, handle_search, handle_stats, init_logging, load_settings,
    Cli, Commands,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(
        cli.config.as_deref(),
        cli.db_path.as_deref(),
        cli.log_level.as_deref(),
    )?;
    init_logging(&settings)?;

    match cli.command {
        Commands::Backfill(args) => handle_backfill(&settings, &args)?,
        Commands::Search {
            tenant,
            limit,
            query,
        } => handle_search(&settings, &tenant, limit, &query)?,
        Commands::Remove { tenant, document } => handle_remove(&settings, &tenant, &document)?,
        Commands::Stats => handle_stats(&settings)?,
    }

    Ok(())
}
