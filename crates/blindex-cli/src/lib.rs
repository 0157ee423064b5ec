//! Operator tool for the blind search index.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (backfill, search, remove, stats)
//! - `export`: JSON-lines document export reader

pub mod cli;
pub mod commands;
pub mod export;

pub use cli::{BackfillArgs, Cli, Commands};
pub use commands::{
    handle_backfill, handle_remove, handle_search, handle_stats, init_logging, load_settings,
};
pub use export::{load_export, read_export};
