//! RocksDB wrapper for the blind index store.
//!
//! Provides:
//! - Database open with column family setup
//! - Per-document replace and delete, each a single pessimistic transaction
//! - Tenant-scoped hash lookups
//! - Manifests, checkpoints and statistics

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rocksdb::{
    ColumnFamily, Direction, IteratorMode, Options, Transaction, TransactionDB,
    TransactionDBOptions,
};
use tracing::{debug, info};

use blindex_types::{DocumentId, TenantId, TokenHash};

use crate::column_families::{
    build_cf_descriptors, CF_CHECKPOINTS, CF_DOCUMENT_ENTRIES, CF_ENTRIES, CF_MANIFESTS,
};
use crate::error::StorageError;
use crate::keys::{CheckpointKey, DocumentEntryKey, EntryKey, ManifestKey};
use crate::manifest::DocumentManifest;

/// How long a transaction waits for a document held by another one.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 1_000;

/// Row counts touched by a replace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceOutcome {
    pub removed: usize,
    pub inserted: usize,
}

/// Main storage interface for the blind index
pub struct Storage {
    db: TransactionDB,
    path: PathBuf,
}

impl Storage {
    /// Open storage at the given path, creating if necessary
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Self::open_with_lock_timeout(path, DEFAULT_LOCK_TIMEOUT_MS)
    }

    /// Open storage with an explicit per-document lock timeout.
    pub fn open_with_lock_timeout(path: &Path, lock_timeout_ms: u64) -> Result<Self, StorageError> {
        info!(path = ?path, lock_timeout_ms, "Opening index storage");

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_background_jobs(4);

        let mut txn_opts = TransactionDBOptions::default();
        txn_opts.set_txn_lock_timeout(i64::try_from(lock_timeout_ms).unwrap_or(i64::MAX));

        let db = TransactionDB::open_cf_descriptors(&db_opts, &txn_opts, path, build_cf_descriptors())?;

        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(name.to_string()))
    }

    /// Take the per-document lock and collect the document's current rows.
    ///
    /// The lock is an exclusive `get_for_update` on the manifest key, which
    /// serializes concurrent writers of the same document even before the
    /// document has ever been indexed.
    fn lock_document(
        &self,
        txn: &Transaction<'_, TransactionDB>,
        tenant_id: TenantId,
        document_id: DocumentId,
    ) -> Result<Vec<DocumentEntryKey>, StorageError> {
        let manifests_cf = self.cf(CF_MANIFESTS)?;
        let doc_entries_cf = self.cf(CF_DOCUMENT_ENTRIES)?;

        let manifest_key = ManifestKey::new(tenant_id, document_id);
        txn.get_for_update_cf(&manifests_cf, manifest_key.to_bytes(), true)?;

        let prefix = DocumentEntryKey::document_prefix(tenant_id, document_id);
        let iter = txn.iterator_cf(
            &doc_entries_cf,
            IteratorMode::From(&prefix, Direction::Forward),
        );

        let mut existing = Vec::new();
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            existing.push(DocumentEntryKey::from_bytes(&key)?);
        }
        Ok(existing)
    }

    fn delete_rows(
        &self,
        txn: &Transaction<'_, TransactionDB>,
        rows: &[DocumentEntryKey],
    ) -> Result<(), StorageError> {
        let entries_cf = self.cf(CF_ENTRIES)?;
        let doc_entries_cf = self.cf(CF_DOCUMENT_ENTRIES)?;
        for row in rows {
            txn.delete_cf(&entries_cf, row.entry_key().to_bytes())?;
            txn.delete_cf(&doc_entries_cf, row.to_bytes())?;
        }
        Ok(())
    }

    /// Replace every entry of one document with `hashes`, and write its manifest.
    ///
    /// Runs in one transaction: on any error nothing is written and the
    /// previous entries stay as they were. A concurrent replace or delete of
    /// the same document waits for the lock, and fails with
    /// [`StorageError::Conflict`] if it times out.
    pub fn replace_document_entries(
        &self,
        tenant_id: TenantId,
        document_id: DocumentId,
        hashes: &[TokenHash],
        manifest: &DocumentManifest,
    ) -> Result<ReplaceOutcome, StorageError> {
        let entries_cf = self.cf(CF_ENTRIES)?;
        let doc_entries_cf = self.cf(CF_DOCUMENT_ENTRIES)?;
        let manifests_cf = self.cf(CF_MANIFESTS)?;
        let manifest_bytes = manifest.to_bytes()?;

        let txn = self.db.transaction();
        let existing = self.lock_document(&txn, tenant_id, document_id)?;
        self.delete_rows(&txn, &existing)?;

        for hash in hashes {
            let key = EntryKey::new(tenant_id, *hash, document_id);
            txn.put_cf(&entries_cf, key.to_bytes(), b"")?;
            txn.put_cf(&doc_entries_cf, key.document_key().to_bytes(), b"")?;
        }
        txn.put_cf(
            &manifests_cf,
            ManifestKey::new(tenant_id, document_id).to_bytes(),
            manifest_bytes,
        )?;
        txn.commit()?;

        let outcome = ReplaceOutcome {
            removed: existing.len(),
            inserted: hashes.len(),
        };
        debug!(
            tenant = %tenant_id,
            document = %document_id,
            removed = outcome.removed,
            inserted = outcome.inserted,
            "Replaced document entries"
        );
        Ok(outcome)
    }

    /// Remove every entry and the manifest of one document.
    ///
    /// Returns the number of entry rows removed.
    pub fn delete_document(
        &self,
        tenant_id: TenantId,
        document_id: DocumentId,
    ) -> Result<usize, StorageError> {
        let manifests_cf = self.cf(CF_MANIFESTS)?;

        let txn = self.db.transaction();
        let existing = self.lock_document(&txn, tenant_id, document_id)?;
        self.delete_rows(&txn, &existing)?;
        txn.delete_cf(
            &manifests_cf,
            ManifestKey::new(tenant_id, document_id).to_bytes(),
        )?;
        txn.commit()?;

        debug!(
            tenant = %tenant_id,
            document = %document_id,
            removed = existing.len(),
            "Deleted document entries"
        );
        Ok(existing.len())
    }

    /// Count, per document of `tenant_id`, how many of `hashes` it holds.
    ///
    /// Callers pass deduplicated hashes; a repeated hash counts twice.
    pub fn lookup(
        &self,
        tenant_id: TenantId,
        hashes: &[TokenHash],
    ) -> Result<HashMap<DocumentId, u32>, StorageError> {
        let entries_cf = self.cf(CF_ENTRIES)?;
        let mut matches: HashMap<DocumentId, u32> = HashMap::new();

        for hash in hashes {
            let prefix = EntryKey::lookup_prefix(tenant_id, hash);
            let iter = self
                .db
                .iterator_cf(&entries_cf, IteratorMode::From(&prefix, Direction::Forward));
            for item in iter {
                let (key, _) = item?;
                // Stop if we've passed the prefix
                if !key.starts_with(&prefix) {
                    break;
                }
                let entry = EntryKey::from_bytes(&key)?;
                *matches.entry(entry.document_id).or_insert(0) += 1;
            }
        }

        Ok(matches)
    }

    /// Hashes currently stored for one document, in byte order.
    pub fn document_hashes(
        &self,
        tenant_id: TenantId,
        document_id: DocumentId,
    ) -> Result<Vec<TokenHash>, StorageError> {
        let doc_entries_cf = self.cf(CF_DOCUMENT_ENTRIES)?;
        let prefix = DocumentEntryKey::document_prefix(tenant_id, document_id);
        let iter = self.db.iterator_cf(
            &doc_entries_cf,
            IteratorMode::From(&prefix, Direction::Forward),
        );

        let mut hashes = Vec::new();
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            hashes.push(DocumentEntryKey::from_bytes(&key)?.token_hash);
        }
        Ok(hashes)
    }

    /// Get the manifest for a document, if it has ever been indexed.
    pub fn get_manifest(
        &self,
        tenant_id: TenantId,
        document_id: DocumentId,
    ) -> Result<Option<DocumentManifest>, StorageError> {
        let cf = self.cf(CF_MANIFESTS)?;
        match self
            .db
            .get_cf(&cf, ManifestKey::new(tenant_id, document_id).to_bytes())?
        {
            Some(bytes) => Ok(Some(DocumentManifest::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Store a checkpoint for a resumable job
    pub fn put_checkpoint(&self, job_name: &str, checkpoint_bytes: &[u8]) -> Result<(), StorageError> {
        let cf = self.cf(CF_CHECKPOINTS)?;
        self.db
            .put_cf(&cf, CheckpointKey::new(job_name).to_bytes(), checkpoint_bytes)?;
        Ok(())
    }

    /// Get a checkpoint for a resumable job
    pub fn get_checkpoint(&self, job_name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let cf = self.cf(CF_CHECKPOINTS)?;
        Ok(self.db.get_cf(&cf, CheckpointKey::new(job_name).to_bytes())?)
    }

    /// Remove a checkpoint once its job completes
    pub fn delete_checkpoint(&self, job_name: &str) -> Result<(), StorageError> {
        let cf = self.cf(CF_CHECKPOINTS)?;
        self.db
            .delete_cf(&cf, CheckpointKey::new(job_name).to_bytes())?;
        Ok(())
    }

    /// Get database statistics.
    pub fn get_stats(&self) -> Result<StorageStats, StorageError> {
        Ok(StorageStats {
            entry_count: self.count_cf_entries(CF_ENTRIES)?,
            document_count: self.count_cf_entries(CF_MANIFESTS)?,
            checkpoint_count: self.count_cf_entries(CF_CHECKPOINTS)?,
            disk_usage_bytes: self.get_disk_usage(),
        })
    }

    fn count_cf_entries(&self, cf_name: &str) -> Result<u64, StorageError> {
        let cf = self.cf(cf_name)?;
        let mut count = 0u64;
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    fn get_disk_usage(&self) -> u64 {
        let mut total_size = 0u64;
        if let Ok(entries) = std::fs::read_dir(&self.path) {
            for entry in entries.flatten() {
                if let Ok(metadata) = entry.metadata() {
                    total_size += metadata.len();
                }
            }
        }
        total_size
    }
}

/// Hooks that put the store into failure states, for tests in dependent crates.
#[cfg(any(test, feature = "test-util"))]
impl Storage {
    /// Take the per-document lock and hold it until the returned
    /// transaction is dropped (rolled back).
    pub fn hold_document_lock(
        &self,
        tenant_id: TenantId,
        document_id: DocumentId,
    ) -> Result<Transaction<'_, TransactionDB>, StorageError> {
        let txn = self.db.transaction();
        self.lock_document(&txn, tenant_id, document_id)?;
        Ok(txn)
    }

    /// Drop a column family; every later operation on it fails.
    pub fn drop_column_family(&mut self, name: &str) -> Result<(), StorageError> {
        self.db.drop_cf(name)?;
        Ok(())
    }
}

/// Statistics about the index store.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of index entry rows
    pub entry_count: u64,
    /// Number of documents with a manifest
    pub document_count: u64,
    /// Number of stored job checkpoints
    pub checkpoint_count: u64,
    /// Total disk usage in bytes
    pub disk_usage_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column_families::ALL_CF_NAMES;
    use blindex_types::TOKEN_HASH_LEN;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_test_storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::open(temp_dir.path()).unwrap();
        (storage, temp_dir)
    }

    fn h(b: u8) -> TokenHash {
        TokenHash::from_bytes([b; TOKEN_HASH_LEN])
    }

    fn manifest(count: usize) -> DocumentManifest {
        DocumentManifest::new(count as u32, false, 42)
    }

    fn replace(storage: &Storage, t: TenantId, d: DocumentId, hashes: &[TokenHash]) -> ReplaceOutcome {
        storage
            .replace_document_entries(t, d, hashes, &manifest(hashes.len()))
            .unwrap()
    }

    #[test]
    fn test_open_creates_column_families() {
        let (storage, _temp) = create_test_storage();
        for cf_name in ALL_CF_NAMES {
            assert!(
                storage.db.cf_handle(cf_name).is_some(),
                "CF {} should exist",
                cf_name
            );
        }
    }

    #[test]
    fn test_replace_and_lookup() {
        let (storage, _temp) = create_test_storage();
        let tenant = TenantId::new();
        let doc = DocumentId::new();

        let outcome = replace(&storage, tenant, doc, &[h(1), h(2)]);
        assert_eq!(outcome, ReplaceOutcome { removed: 0, inserted: 2 });

        let found = storage.lookup(tenant, &[h(2), h(9)]).unwrap();
        assert_eq!(found.get(&doc), Some(&1));
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_replace_removes_stale_rows() {
        let (storage, _temp) = create_test_storage();
        let tenant = TenantId::new();
        let doc = DocumentId::new();

        replace(&storage, tenant, doc, &[h(1), h(2), h(3)]);
        let outcome = replace(&storage, tenant, doc, &[h(3), h(4)]);
        assert_eq!(outcome.removed, 3);

        assert_eq!(storage.document_hashes(tenant, doc).unwrap(), vec![h(3), h(4)]);
        assert!(storage.lookup(tenant, &[h(1)]).unwrap().is_empty());
        assert_eq!(storage.get_stats().unwrap().entry_count, 2);
    }

    #[test]
    fn test_replace_is_idempotent() {
        let (storage, _temp) = create_test_storage();
        let tenant = TenantId::new();
        let doc = DocumentId::new();

        replace(&storage, tenant, doc, &[h(5), h(6)]);
        let first = storage.document_hashes(tenant, doc).unwrap();
        replace(&storage, tenant, doc, &[h(5), h(6)]);
        assert_eq!(storage.document_hashes(tenant, doc).unwrap(), first);
        assert_eq!(storage.get_stats().unwrap().entry_count, 2);
    }

    #[test]
    fn test_lookup_is_tenant_scoped() {
        let (storage, _temp) = create_test_storage();
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let doc = DocumentId::new();

        replace(&storage, tenant_a, doc, &[h(1)]);
        assert!(storage.lookup(tenant_b, &[h(1)]).unwrap().is_empty());
    }

    #[test]
    fn test_lookup_counts_matches_per_document() {
        let (storage, _temp) = create_test_storage();
        let tenant = TenantId::new();
        let doc_a = DocumentId::new();
        let doc_b = DocumentId::new();

        replace(&storage, tenant, doc_a, &[h(1), h(2), h(3)]);
        replace(&storage, tenant, doc_b, &[h(3)]);

        let found = storage.lookup(tenant, &[h(1), h(2), h(3)]).unwrap();
        assert_eq!(found[&doc_a], 3);
        assert_eq!(found[&doc_b], 1);
    }

    #[test]
    fn test_delete_document() {
        let (storage, _temp) = create_test_storage();
        let tenant = TenantId::new();
        let doc = DocumentId::new();
        let other = DocumentId::new();

        replace(&storage, tenant, doc, &[h(1), h(2)]);
        replace(&storage, tenant, other, &[h(1)]);

        assert_eq!(storage.delete_document(tenant, doc).unwrap(), 2);
        assert!(storage.get_manifest(tenant, doc).unwrap().is_none());
        assert!(storage.document_hashes(tenant, doc).unwrap().is_empty());

        let found = storage.lookup(tenant, &[h(1)]).unwrap();
        assert_eq!(found.keys().copied().collect::<Vec<_>>(), vec![other]);

        // Deleting again is a no-op
        assert_eq!(storage.delete_document(tenant, doc).unwrap(), 0);
    }

    #[test]
    fn test_empty_replace_keeps_manifest() {
        let (storage, _temp) = create_test_storage();
        let tenant = TenantId::new();
        let doc = DocumentId::new();

        replace(&storage, tenant, doc, &[h(1)]);
        replace(&storage, tenant, doc, &[]);

        assert!(storage.document_hashes(tenant, doc).unwrap().is_empty());
        let stored = storage.get_manifest(tenant, doc).unwrap().unwrap();
        assert_eq!(stored.token_count, 0);
    }

    #[test]
    fn test_manifest_roundtrip() {
        let (storage, _temp) = create_test_storage();
        let tenant = TenantId::new();
        let doc = DocumentId::new();
        let written = DocumentManifest::new(1, true, 7);

        storage
            .replace_document_entries(tenant, doc, &[h(1)], &written)
            .unwrap();
        assert_eq!(storage.get_manifest(tenant, doc).unwrap(), Some(written));
    }

    #[test]
    fn test_checkpoint_lifecycle() {
        let (storage, _temp) = create_test_storage();
        assert!(storage.get_checkpoint("backfill").unwrap().is_none());

        storage.put_checkpoint("backfill", b"{}").unwrap();
        assert_eq!(storage.get_checkpoint("backfill").unwrap(), Some(b"{}".to_vec()));
        assert_eq!(storage.get_stats().unwrap().checkpoint_count, 1);

        storage.delete_checkpoint("backfill").unwrap();
        assert!(storage.get_checkpoint("backfill").unwrap().is_none());
    }

    #[test]
    fn test_reopen_preserves_entries() {
        let temp_dir = TempDir::new().unwrap();
        let tenant = TenantId::new();
        let doc = DocumentId::new();
        {
            let storage = Storage::open(temp_dir.path()).unwrap();
            replace(&storage, tenant, doc, &[h(8)]);
        }
        let storage = Storage::open(temp_dir.path()).unwrap();
        assert_eq!(storage.lookup(tenant, &[h(8)]).unwrap()[&doc], 1);
    }

    #[test]
    fn test_lock_timeout_is_conflict_and_keeps_rows() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::open_with_lock_timeout(temp_dir.path(), 1).unwrap();
        let tenant = TenantId::new();
        let doc = DocumentId::new();
        replace(&storage, tenant, doc, &[h(1), h(2)]);

        let held = storage.hold_document_lock(tenant, doc).unwrap();
        let err = storage
            .replace_document_entries(tenant, doc, &[h(3)], &manifest(1))
            .unwrap_err();
        assert!(err.is_conflict(), "expected conflict, got {err}");
        assert!(storage.delete_document(tenant, doc).unwrap_err().is_conflict());

        assert_eq!(storage.document_hashes(tenant, doc).unwrap(), vec![h(1), h(2)]);
        assert_eq!(storage.get_manifest(tenant, doc).unwrap().unwrap().token_count, 2);
        drop(held);

        replace(&storage, tenant, doc, &[h(3)]);
        assert_eq!(storage.document_hashes(tenant, doc).unwrap(), vec![h(3)]);
    }

    #[test]
    fn test_missing_column_family_fails_lookup() {
        let (mut storage, _temp) = create_test_storage();
        storage.drop_column_family(CF_ENTRIES).unwrap();
        assert!(matches!(
            storage.lookup(TenantId::new(), &[h(1)]),
            Err(StorageError::ColumnFamilyNotFound(_))
        ));
    }

    #[test]
    fn test_concurrent_replace_never_unions() {
        let (storage, _temp) = create_test_storage();
        let storage = Arc::new(storage);
        let tenant = TenantId::new();
        let doc = DocumentId::new();

        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let storage = Arc::clone(&storage);
                std::thread::spawn(move || {
                    let hashes = [h(i * 2 + 1), h(i * 2 + 2)];
                    for _ in 0..5 {
                        match storage.replace_document_entries(tenant, doc, &hashes, &manifest(2)) {
                            Ok(_) => return,
                            Err(e) if e.is_conflict() => continue,
                            Err(e) => panic!("unexpected error: {e}"),
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stored = storage.document_hashes(tenant, doc).unwrap();
        assert_eq!(stored.len(), 2);
        // Both rows come from the same writer: h(2k+1), h(2k+2)
        let first = stored[0].as_bytes()[0];
        assert_eq!(first % 2, 1);
        assert_eq!(stored[1].as_bytes()[0], first + 1);
        assert_eq!(storage.get_stats().unwrap().entry_count, 2);
    }
}
