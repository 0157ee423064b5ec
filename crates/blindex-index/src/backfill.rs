//! Backfill coordinator.
//!
//! Walks the document store in `(created_at, document_id)` order, one page
//! of `batch_size` documents at a time, and reindexes every live document
//! with text whose entries are missing or were built with another key.
//! Deleted documents that still have entries are removed.
//!
//! Safe to rerun and to run alongside live traffic: each document's
//! reindex is its own transaction.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use blindex_types::{DocumentCursor, DocumentRecord, DocumentText};

use crate::checkpoint::{BackfillCheckpoint, BACKFILL_JOB};
use crate::error::IndexError;
use crate::source::DocumentSource;
use crate::writer::IndexWriter;

/// Configuration for backfill runs.
#[derive(Debug, Clone)]
pub struct BackfillConfig {
    /// Documents read from the source per batch.
    pub batch_size: usize,
    /// Whether to continue on individual document errors.
    pub continue_on_error: bool,
    /// Continue from the stored checkpoint, if it matches this run.
    pub resume: bool,
    /// Reindex every live document, not only missing or stale ones.
    pub full: bool,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            continue_on_error: true,
            resume: false,
            full: false,
        }
    }
}

impl BackfillConfig {
    /// Set the batch size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set whether to continue on errors.
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    /// Set whether to resume from a checkpoint.
    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    /// Set whether to reindex everything.
    pub fn with_full(mut self, full: bool) -> Self {
        self.full = full;
        self
    }
}

/// Progress tracking for backfill runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillProgress {
    /// Documents reindexed.
    pub processed: u64,
    /// Documents left alone (already current, no text, undecryptable).
    pub skipped: u64,
    /// Deleted documents whose entries were removed.
    pub removed: u64,
    /// Documents that failed.
    pub errors: u64,
    /// Batches committed.
    pub batches: u64,
    /// Whether the run reached the end of the document store.
    pub completed: bool,
}

impl BackfillProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_processed(&mut self) {
        self.processed += 1;
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    pub fn record_removed(&mut self) {
        self.removed += 1;
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    pub fn record_batch(&mut self) {
        self.batches += 1;
    }

    pub fn mark_completed(&mut self) {
        self.completed = true;
    }

    /// Documents looked at so far.
    pub fn total_seen(&self) -> u64 {
        self.processed + self.skipped + self.removed + self.errors
    }
}

/// Result of a backfill run.
#[derive(Debug, Clone)]
pub struct BackfillResult {
    pub progress: BackfillProgress,
    /// Time taken in milliseconds.
    pub elapsed_ms: u64,
}

/// Trait for receiving backfill progress updates.
pub trait ProgressCallback: Send {
    /// Called after each committed batch.
    fn on_progress(&self, progress: &BackfillProgress);
}

/// A no-op progress callback for when progress reporting isn't needed.
pub struct NoOpProgressCallback;

impl ProgressCallback for NoOpProgressCallback {
    fn on_progress(&self, _progress: &BackfillProgress) {}
}

/// A callback that logs progress at info level every `every_batches` batches.
pub struct LoggingProgressCallback {
    every_batches: u64,
}

impl LoggingProgressCallback {
    pub fn new(every_batches: u64) -> Self {
        Self {
            every_batches: every_batches.max(1),
        }
    }
}

impl ProgressCallback for LoggingProgressCallback {
    fn on_progress(&self, progress: &BackfillProgress) {
        if progress.batches % self.every_batches == 0 {
            info!(
                batches = progress.batches,
                processed = progress.processed,
                skipped = progress.skipped,
                removed = progress.removed,
                errors = progress.errors,
                "Backfill progress"
            );
        }
    }
}

/// What happened to one document.
enum Disposition {
    Processed,
    Skipped,
    Removed,
}

pub struct BackfillCoordinator {
    writer: IndexWriter,
    source: Arc<dyn DocumentSource>,
}

impl BackfillCoordinator {
    pub fn new(writer: IndexWriter, source: Arc<dyn DocumentSource>) -> Self {
        Self { writer, source }
    }

    /// Index every document that is missing entries, `batch_size` at a time.
    ///
    /// Returns the number of documents reindexed.
    pub fn backfill(&self, batch_size: usize) -> Result<u64, IndexError> {
        let config = BackfillConfig::default().with_batch_size(batch_size);
        Ok(self.run(&config, &NoOpProgressCallback)?.progress.processed)
    }

    /// Run a backfill with full control over its behavior.
    pub fn run<P: ProgressCallback>(
        &self,
        config: &BackfillConfig,
        progress_callback: &P,
    ) -> Result<BackfillResult, IndexError> {
        if config.batch_size == 0 {
            return Err(IndexError::Source("batch_size must be > 0".to_string()));
        }

        let started = Instant::now();
        // Fails fast on a missing or insecure secret, before touching any document
        let fingerprint = self.writer.pipeline().key_fingerprint()?;
        let mut checkpoint = self.start_checkpoint(config, fingerprint)?;
        let mut cursor = checkpoint.cursor;
        let mut progress = BackfillProgress::new();

        info!(
            batch_size = config.batch_size,
            full = config.full,
            resumed = cursor.is_some(),
            "Starting backfill"
        );

        loop {
            let page = self.source.documents_after(cursor.as_ref(), config.batch_size)?;
            if page.is_empty() {
                break;
            }

            let mut batch_processed = 0u64;
            for record in &page {
                match self.backfill_one(record, fingerprint, config.full) {
                    Ok(Disposition::Processed) => {
                        progress.record_processed();
                        batch_processed += 1;
                    }
                    Ok(Disposition::Skipped) => progress.record_skip(),
                    Ok(Disposition::Removed) => progress.record_removed(),
                    Err(e) if e.is_configuration() => return Err(e),
                    Err(e) => {
                        if !config.continue_on_error {
                            return Err(e);
                        }
                        warn!(
                            tenant = %record.tenant_id,
                            document = %record.document_id,
                            error = %e,
                            "Failed to backfill document"
                        );
                        progress.record_error();
                    }
                }
            }

            cursor = page.last().map(DocumentRecord::cursor);
            progress.record_batch();
            self.save_checkpoint(&mut checkpoint, cursor, batch_processed)?;
            progress_callback.on_progress(&progress);

            if page.len() < config.batch_size {
                break;
            }
        }

        self.writer.storage().delete_checkpoint(BACKFILL_JOB)?;
        progress.mark_completed();

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            processed = progress.processed,
            skipped = progress.skipped,
            removed = progress.removed,
            errors = progress.errors,
            batches = progress.batches,
            elapsed_ms,
            "Backfill complete"
        );

        Ok(BackfillResult {
            progress,
            elapsed_ms,
        })
    }

    fn backfill_one(
        &self,
        record: &DocumentRecord,
        fingerprint: u64,
        full: bool,
    ) -> Result<Disposition, IndexError> {
        let (tenant, document) = (record.tenant_id, record.document_id);

        if record.deleted {
            if self.writer.has_manifest(tenant, document)? {
                self.writer.remove(tenant, document)?;
                return Ok(Disposition::Removed);
            }
            return Ok(Disposition::Skipped);
        }
        if !record.is_indexable() {
            return Ok(Disposition::Skipped);
        }
        if !full {
            let current = self
                .writer
                .storage()
                .get_manifest(tenant, document)?
                .is_some_and(|m| m.is_current(fingerprint));
            if current {
                return Ok(Disposition::Skipped);
            }
        }

        match self.source.load_text(tenant, document)? {
            DocumentText::Available(text) if !text.is_empty() => {
                self.writer.reindex(tenant, document, &text)?;
                Ok(Disposition::Processed)
            }
            DocumentText::Undecryptable => {
                warn!(tenant = %tenant, document = %document, "Document text could not be decrypted, skipping");
                Ok(Disposition::Skipped)
            }
            DocumentText::Available(_) | DocumentText::Missing => {
                debug!(tenant = %tenant, document = %document, "Document has no text, skipping");
                Ok(Disposition::Skipped)
            }
        }
    }

    fn start_checkpoint(
        &self,
        config: &BackfillConfig,
        fingerprint: u64,
    ) -> Result<BackfillCheckpoint, IndexError> {
        if config.resume {
            if let Some(bytes) = self.writer.storage().get_checkpoint(BACKFILL_JOB)? {
                let stored = BackfillCheckpoint::from_bytes(&bytes)?;
                if stored.is_resumable_by(fingerprint, config.full) {
                    info!(
                        batches = stored.batches,
                        processed = stored.processed_count,
                        "Resuming backfill from checkpoint"
                    );
                    return Ok(stored);
                }
                warn!("Backfill checkpoint belongs to another key or mode, starting over");
            }
        }
        Ok(BackfillCheckpoint::new(fingerprint, config.full))
    }

    fn save_checkpoint(
        &self,
        checkpoint: &mut BackfillCheckpoint,
        cursor: Option<DocumentCursor>,
        processed: u64,
    ) -> Result<(), IndexError> {
        checkpoint.update(cursor, processed);
        self.writer
            .storage()
            .put_checkpoint(BACKFILL_JOB, &checkpoint.to_bytes()?)?;
        Ok(())
    }
}
