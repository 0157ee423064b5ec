//! Command implementations for the blind index tool.
//!
//! Handles:
//! - backfill: index an export of decrypted documents
//! - search: list candidate documents for a query
//! - remove: cascade-delete one document's entries
//! - stats: index statistics

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use blindex_index::{
    BackfillConfig, BackfillCoordinator, BackfillResult, CandidateSet, IndexWriter,
    LoggingProgressCallback, QueryPlanner,
};
use blindex_storage::{Storage, StorageStats};
use blindex_tokens::TokenPipeline;
use blindex_types::{DocumentId, Settings, TenantId};

use crate::cli::BackfillArgs;
use crate::export::load_export;

/// Load configuration and apply CLI overrides (highest precedence).
pub fn load_settings(
    config_path: Option<&str>,
    db_path_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(db_path) = db_path_override {
        settings.db_path = db_path.to_string();
    }
    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    Ok(settings)
}

/// Initialize logging from RUST_LOG, falling back to the configured level.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

fn open_storage(settings: &Settings) -> Result<Arc<Storage>> {
    let db_path = settings.expanded_db_path();
    let storage = Storage::open_with_lock_timeout(&db_path, settings.lock_timeout_ms)
        .with_context(|| format!("Failed to open index at {:?}", db_path))?;
    Ok(Arc::new(storage))
}

fn pipeline(settings: &Settings) -> Result<TokenPipeline> {
    TokenPipeline::from_settings(settings).context("Search index key is not configured")
}

/// Run a backfill and return its result.
pub fn run_backfill(settings: &Settings, args: &BackfillArgs) -> Result<BackfillResult> {
    let source = load_export(&args.documents)?;
    info!(documents = source.len(), "Loaded document export");

    let storage = open_storage(settings)?;
    let writer = IndexWriter::new(storage, pipeline(settings)?);
    let coordinator = BackfillCoordinator::new(writer, Arc::new(source));

    let config = BackfillConfig::default()
        .with_batch_size(args.batch_size.unwrap_or(settings.backfill_batch_size))
        .with_full(args.full)
        .with_resume(args.resume)
        .with_continue_on_error(!args.fail_fast);

    coordinator
        .run(&config, &LoggingProgressCallback::new(10))
        .context("Backfill failed")
}

/// Backfill command: prints the number of documents indexed.
pub fn handle_backfill(settings: &Settings, args: &BackfillArgs) -> Result<()> {
    let result = run_backfill(settings, args)?;
    let progress = &result.progress;
    println!("Backfilled search tokens for {} document(s).", progress.processed);
    if progress.removed > 0 {
        println!("Removed entries of {} deleted document(s).", progress.removed);
    }
    if progress.errors > 0 {
        println!("{} document(s) failed; see log for details.", progress.errors);
    }
    Ok(())
}

/// Run a search and return the candidates.
pub fn run_search(settings: &Settings, tenant: &str, limit: usize, query: &str) -> Result<CandidateSet> {
    let tenant: TenantId = tenant.parse().context("Invalid tenant id")?;
    let planner = QueryPlanner::new(open_storage(settings)?, pipeline(settings)?);
    planner
        .search(tenant, query, Some(limit))
        .context("Search failed")
}

/// Search command: prints one `document_id<TAB>match_count` line per candidate.
pub fn handle_search(settings: &Settings, tenant: &str, limit: usize, query: &str) -> Result<()> {
    let candidates = run_search(settings, tenant, limit, query)?;
    if candidates.is_empty() {
        println!("No matching documents.");
        return Ok(());
    }
    for candidate in &candidates {
        println!("{}\t{}", candidate.document_id, candidate.match_count);
    }
    Ok(())
}

/// Remove command: cascade-delete one document.
pub fn handle_remove(settings: &Settings, tenant: &str, document: &str) -> Result<()> {
    let tenant: TenantId = tenant.parse().context("Invalid tenant id")?;
    let document: DocumentId = document.parse().context("Invalid document id")?;
    let storage = open_storage(settings)?;
    let removed = storage
        .delete_document(tenant, document)
        .context("Failed to remove document")?;
    println!("Removed {} index entries for document {}.", removed, document);
    Ok(())
}

/// Collect index statistics.
pub fn run_stats(settings: &Settings) -> Result<StorageStats> {
    open_storage(settings)?
        .get_stats()
        .context("Failed to read index statistics")
}

/// Stats command.
pub fn handle_stats(settings: &Settings) -> Result<()> {
    let stats = run_stats(settings)?;
    println!("Index: {}", settings.expanded_db_path().display());
    println!("  Entries:     {}", stats.entry_count);
    println!("  Documents:   {}", stats.document_count);
    println!("  Checkpoints: {}", stats.checkpoint_count);
    println!("  Disk usage:  {} bytes", stats.disk_usage_bytes);
    Ok(())
}
