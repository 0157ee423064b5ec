//! Interface to the external document store.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use blindex_types::{DocumentCursor, DocumentId, DocumentRecord, DocumentText, TenantId};

use crate::error::IndexError;

/// Narrow view of the document store the index depends on.
///
/// The index never persists or caches the text it is handed.
pub trait DocumentSource: Send + Sync {
    /// Up to `limit` documents strictly after `cursor`, ordered by
    /// `(created_at, document_id)`. Deleted documents are included so the
    /// caller can clean up after them.
    fn documents_after(
        &self,
        cursor: Option<&DocumentCursor>,
        limit: usize,
    ) -> Result<Vec<DocumentRecord>, IndexError>;

    /// Decrypted text of one document.
    fn load_text(
        &self,
        tenant_id: TenantId,
        document_id: DocumentId,
    ) -> Result<DocumentText, IndexError>;
}

#[derive(Debug, Clone)]
struct StoredDocument {
    record: DocumentRecord,
    text: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    by_cursor: BTreeMap<DocumentCursor, StoredDocument>,
    by_id: HashMap<(TenantId, DocumentId), DocumentCursor>,
}

/// In-memory [`DocumentSource`], fed from an export or from tests.
///
/// A record with `has_text` but no text loads as
/// [`DocumentText::Undecryptable`].
#[derive(Debug, Default)]
pub struct MemoryDocumentSource {
    inner: RwLock<Inner>,
}

fn poisoned() -> IndexError {
    IndexError::Source("document source lock poisoned".to_string())
}

impl MemoryDocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document.
    pub fn upsert(&self, record: DocumentRecord, text: Option<String>) -> Result<(), IndexError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let id = (record.tenant_id, record.document_id);
        if let Some(old) = inner.by_id.remove(&id) {
            inner.by_cursor.remove(&old);
        }
        let cursor = record.cursor();
        inner.by_id.insert(id, cursor);
        inner.by_cursor.insert(cursor, StoredDocument { record, text });
        Ok(())
    }

    /// Replace the text of an existing document. Returns false if unknown.
    pub fn set_text(
        &self,
        tenant_id: TenantId,
        document_id: DocumentId,
        text: Option<String>,
    ) -> Result<bool, IndexError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let Some(cursor) = inner.by_id.get(&(tenant_id, document_id)).copied() else {
            return Ok(false);
        };
        if let Some(doc) = inner.by_cursor.get_mut(&cursor) {
            doc.record.has_text = text.is_some();
            doc.text = text;
        }
        Ok(true)
    }

    /// Soft-delete a document. Returns false if unknown.
    pub fn mark_deleted(&self, tenant_id: TenantId, document_id: DocumentId) -> Result<bool, IndexError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let Some(cursor) = inner.by_id.get(&(tenant_id, document_id)).copied() else {
            return Ok(false);
        };
        if let Some(doc) = inner.by_cursor.get_mut(&cursor) {
            doc.record.deleted = true;
        }
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.by_cursor.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentSource for MemoryDocumentSource {
    fn documents_after(
        &self,
        cursor: Option<&DocumentCursor>,
        limit: usize,
    ) -> Result<Vec<DocumentRecord>, IndexError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        let records = match cursor {
            Some(after) => inner
                .by_cursor
                .range((std::ops::Bound::Excluded(*after), std::ops::Bound::Unbounded))
                .take(limit)
                .map(|(_, doc)| doc.record.clone())
                .collect(),
            None => inner
                .by_cursor
                .values()
                .take(limit)
                .map(|doc| doc.record.clone())
                .collect(),
        };
        Ok(records)
    }

    fn load_text(
        &self,
        tenant_id: TenantId,
        document_id: DocumentId,
    ) -> Result<DocumentText, IndexError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        let doc = inner
            .by_id
            .get(&(tenant_id, document_id))
            .and_then(|cursor| inner.by_cursor.get(cursor));

        Ok(match doc {
            Some(doc) if !doc.record.is_indexable() => DocumentText::Missing,
            Some(StoredDocument { text: Some(text), .. }) => DocumentText::Available(text.clone()),
            Some(_) => DocumentText::Undecryptable,
            None => DocumentText::Missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(tenant: TenantId, ms: i64) -> DocumentRecord {
        DocumentRecord {
            tenant_id: tenant,
            document_id: DocumentId::new(),
            created_at: Utc.timestamp_millis_opt(ms).unwrap(),
            deleted: false,
            has_text: true,
        }
    }

    #[test]
    fn test_documents_after_orders_by_creation() {
        let source = MemoryDocumentSource::new();
        let tenant = TenantId::new();
        let newer = record(tenant, 2_000);
        let older = record(tenant, 1_000);
        source.upsert(newer.clone(), Some("b".into())).unwrap();
        source.upsert(older.clone(), Some("a".into())).unwrap();

        let page = source.documents_after(None, 10).unwrap();
        assert_eq!(page, vec![older.clone(), newer.clone()]);

        let rest = source.documents_after(Some(&older.cursor()), 10).unwrap();
        assert_eq!(rest, vec![newer]);
    }

    #[test]
    fn test_documents_after_respects_limit() {
        let source = MemoryDocumentSource::new();
        let tenant = TenantId::new();
        for ms in 0..5 {
            source.upsert(record(tenant, ms), Some("x".into())).unwrap();
        }
        assert_eq!(source.documents_after(None, 2).unwrap().len(), 2);
        assert_eq!(source.len(), 5);
    }

    #[test]
    fn test_load_text_states() {
        let source = MemoryDocumentSource::new();
        let tenant = TenantId::new();

        let available = record(tenant, 1);
        let broken = record(tenant, 2);
        let mut empty = record(tenant, 3);
        empty.has_text = false;
        source.upsert(available.clone(), Some("text".into())).unwrap();
        source.upsert(broken.clone(), None).unwrap();
        source.upsert(empty.clone(), None).unwrap();

        assert_eq!(
            source.load_text(tenant, available.document_id).unwrap(),
            DocumentText::Available("text".into())
        );
        assert_eq!(
            source.load_text(tenant, broken.document_id).unwrap(),
            DocumentText::Undecryptable
        );
        assert_eq!(
            source.load_text(tenant, empty.document_id).unwrap(),
            DocumentText::Missing
        );
        assert_eq!(
            source.load_text(TenantId::new(), available.document_id).unwrap(),
            DocumentText::Missing
        );
    }

    #[test]
    fn test_mark_deleted_hides_text() {
        let source = MemoryDocumentSource::new();
        let tenant = TenantId::new();
        let rec = record(tenant, 1);
        source.upsert(rec.clone(), Some("text".into())).unwrap();

        assert!(source.mark_deleted(tenant, rec.document_id).unwrap());
        assert_eq!(
            source.load_text(tenant, rec.document_id).unwrap(),
            DocumentText::Missing
        );
        assert!(source.documents_after(None, 10).unwrap()[0].deleted);
        assert!(!source.mark_deleted(tenant, DocumentId::new()).unwrap());
    }

    #[test]
    fn test_set_text() {
        let source = MemoryDocumentSource::new();
        let tenant = TenantId::new();
        let rec = record(tenant, 1);
        source.upsert(rec.clone(), Some("old".into())).unwrap();

        assert!(source.set_text(tenant, rec.document_id, Some("new".into())).unwrap());
        assert_eq!(
            source.load_text(tenant, rec.document_id).unwrap(),
            DocumentText::Available("new".into())
        );
    }
}
