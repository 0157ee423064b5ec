//! End-to-end test infrastructure for the blind search index.
//!
//! Provides a shared TestHarness and helper functions for E2E tests
//! covering the full text-to-candidates pipeline.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use blindex_index::{BackfillCoordinator, IndexWriter, MemoryDocumentSource, QueryPlanner};
use blindex_storage::Storage;
use blindex_tokens::{KeyProvider, TokenPipeline, Tokenizer};
use blindex_types::{DocumentId, DocumentRecord, LimitSettings, TenantId, TokenizerSettings};

/// Deployment secret used unless a test rotates it.
pub const TEST_SECRET: &str = "e2e-deployment-secret-7f3a";

/// Base creation time for test documents (2024-01-29 approx).
pub const BASE_TS_MS: i64 = 1_706_540_400_000;

/// Shared test harness for E2E tests.
///
/// Holds one index store and one in-memory document store. Writers,
/// planners and coordinators are built per secret so tests can rotate keys.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Shared storage instance
    pub storage: Arc<Storage>,
    /// Stand-in for the external document store
    pub source: Arc<MemoryDocumentSource>,
}

impl TestHarness {
    /// Create a new test harness with temp directory and storage.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let storage =
            Arc::new(Storage::open(temp_dir.path()).expect("Failed to open test storage"));

        Self {
            _temp_dir: temp_dir,
            storage,
            source: Arc::new(MemoryDocumentSource::new()),
        }
    }

    pub fn writer(&self, secret: &str) -> IndexWriter {
        IndexWriter::new(self.storage.clone(), test_pipeline(secret, LimitSettings::default()))
    }

    pub fn writer_with_limits(&self, secret: &str, limits: LimitSettings) -> IndexWriter {
        IndexWriter::new(self.storage.clone(), test_pipeline(secret, limits))
    }

    pub fn planner(&self, secret: &str) -> QueryPlanner {
        QueryPlanner::new(self.storage.clone(), test_pipeline(secret, LimitSettings::default()))
    }

    pub fn coordinator(&self, secret: &str) -> BackfillCoordinator {
        BackfillCoordinator::new(self.writer(secret), self.source.clone())
    }

    /// Add a live document with text to the document store (not the index).
    ///
    /// `seq` orders documents by creation time.
    pub fn add_document(&self, tenant: TenantId, seq: i64, text: &str) -> DocumentId {
        self.insert_document(tenant, seq, Some(text.to_string()))
    }

    /// Add a document whose stored text cannot be decrypted.
    pub fn add_undecryptable_document(&self, tenant: TenantId, seq: i64) -> DocumentId {
        self.insert_document(tenant, seq, None)
    }

    fn insert_document(&self, tenant: TenantId, seq: i64, text: Option<String>) -> DocumentId {
        let record = DocumentRecord {
            tenant_id: tenant,
            document_id: DocumentId::new(),
            created_at: Utc
                .timestamp_millis_opt(BASE_TS_MS + seq * 1_000)
                .single()
                .expect("valid timestamp"),
            deleted: false,
            has_text: true,
        };
        let id = record.document_id;
        self.source
            .upsert(record, text)
            .expect("Failed to add document");
        id
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Token pipeline with default tokenizer settings.
pub fn test_pipeline(secret: &str, limits: LimitSettings) -> TokenPipeline {
    TokenPipeline::new(
        Tokenizer::new(TokenizerSettings::default()),
        Arc::new(KeyProvider::from_secret(secret)),
        limits,
    )
}

/// `n` distinct terms that each survive normalization unchanged and are
/// too short for prefix expansion.
pub fn distinct_terms(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("w{:05}", i)).collect()
}
