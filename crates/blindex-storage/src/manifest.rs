//! Per-document bookkeeping row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Written alongside a document's entries in the same transaction.
///
/// Records what the entries were built from, so backfill can tell which
/// documents have never been indexed or were indexed under another key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentManifest {
    /// Number of entry rows written
    pub token_count: u32,
    /// Whether the per-document cap dropped hashes
    pub truncated: bool,
    /// Fingerprint of the key the hashes were computed with
    pub key_fingerprint: u64,
    pub indexed_at: DateTime<Utc>,
}

impl DocumentManifest {
    pub fn new(token_count: u32, truncated: bool, key_fingerprint: u64) -> Self {
        Self {
            token_count,
            truncated,
            key_fingerprint,
            indexed_at: Utc::now(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, StorageError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Whether these entries were hashed with the key identified by `fingerprint`.
    pub fn is_current(&self, fingerprint: u64) -> bool {
        self.key_fingerprint == fingerprint
    }
}
