//! Index writer.
//!
//! Replaces a document's entries wholesale: the new token set is computed
//! outside the transaction, then old rows are deleted and new rows inserted
//! in one storage transaction.

use std::sync::Arc;

use tracing::{debug, warn};

use blindex_storage::{DocumentManifest, Storage};
use blindex_tokens::TokenPipeline;
use blindex_types::{DocumentId, DocumentText, TenantId};

use crate::error::IndexError;

/// What a reindex wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOutcome {
    /// Entry rows now stored for the document
    pub tokens: usize,
    /// Entry rows the replace removed
    pub removed: usize,
    /// Whether the per-document cap dropped hashes
    pub truncated: bool,
}

#[derive(Clone)]
pub struct IndexWriter {
    storage: Arc<Storage>,
    pipeline: TokenPipeline,
}

impl IndexWriter {
    pub fn new(storage: Arc<Storage>, pipeline: TokenPipeline) -> Self {
        Self { storage, pipeline }
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    pub fn pipeline(&self) -> &TokenPipeline {
        &self.pipeline
    }

    /// Index `text` as the full content of the document.
    ///
    /// Empty text leaves the document with no entries. On error the previous
    /// entries are untouched; retrying is up to the caller.
    pub fn reindex(
        &self,
        tenant_id: TenantId,
        document_id: DocumentId,
        text: &str,
    ) -> Result<IndexOutcome, IndexError> {
        let fingerprint = self.pipeline.key_fingerprint()?;
        let tokens = self.pipeline.document_tokens(text)?;
        let truncated = tokens.is_truncated();
        if truncated {
            warn!(
                tenant = %tenant_id,
                document = %document_id,
                cap = tokens.cap(),
                "Document token cap reached, index truncated"
            );
        }

        let hashes = tokens.into_sorted_vec();
        let manifest = DocumentManifest::new(
            u32::try_from(hashes.len()).unwrap_or(u32::MAX),
            truncated,
            fingerprint,
        );
        let outcome = self
            .storage
            .replace_document_entries(tenant_id, document_id, &hashes, &manifest)?;

        debug!(
            tenant = %tenant_id,
            document = %document_id,
            tokens = outcome.inserted,
            removed = outcome.removed,
            "Reindexed document"
        );
        Ok(IndexOutcome {
            tokens: outcome.inserted,
            removed: outcome.removed,
            truncated,
        })
    }

    /// Index whatever the document store returned; unavailable text indexes
    /// as empty.
    pub fn reindex_text(
        &self,
        tenant_id: TenantId,
        document_id: DocumentId,
        text: &DocumentText,
    ) -> Result<IndexOutcome, IndexError> {
        self.reindex(tenant_id, document_id, text.as_text().unwrap_or(""))
    }

    /// Remove every entry of a deleted document.
    ///
    /// Returns the number of entry rows removed.
    pub fn remove(&self, tenant_id: TenantId, document_id: DocumentId) -> Result<usize, IndexError> {
        let removed = self.storage.delete_document(tenant_id, document_id)?;
        debug!(tenant = %tenant_id, document = %document_id, removed, "Removed document from index");
        Ok(removed)
    }

    /// Whether the document has entries built with the active key.
    pub fn is_current(&self, tenant_id: TenantId, document_id: DocumentId) -> Result<bool, IndexError> {
        let fingerprint = self.pipeline.key_fingerprint()?;
        Ok(self
            .storage
            .get_manifest(tenant_id, document_id)?
            .is_some_and(|m| m.is_current(fingerprint)))
    }

    /// Whether the index holds anything for the document.
    pub fn has_manifest(&self, tenant_id: TenantId, document_id: DocumentId) -> Result<bool, IndexError> {
        Ok(self.storage.get_manifest(tenant_id, document_id)?.is_some())
    }
}
