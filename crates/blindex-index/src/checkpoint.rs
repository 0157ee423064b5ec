//! Backfill checkpoint.
//!
//! Records the keyset cursor of the last committed batch so an interrupted
//! backfill can resume instead of rescanning the whole document store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use blindex_types::DocumentCursor;

use crate::error::IndexError;

/// Checkpoint job name for backfill runs.
pub const BACKFILL_JOB: &str = "backfill";

/// Progress of one backfill run, persisted after each batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackfillCheckpoint {
    /// Last document of the last committed batch
    pub cursor: Option<DocumentCursor>,

    /// Key the run was indexing with; a resume under another key starts over
    pub key_fingerprint: u64,

    /// Whether the run reindexes every document
    pub full: bool,

    /// Documents indexed so far in this run
    pub processed_count: u64,

    /// Batches committed so far in this run
    pub batches: u64,

    /// Milliseconds since epoch for JSON compatibility
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl BackfillCheckpoint {
    pub fn new(key_fingerprint: u64, full: bool) -> Self {
        let now = Utc::now();
        Self {
            cursor: None,
            key_fingerprint,
            full,
            processed_count: 0,
            batches: 0,
            started_at: now,
            updated_at: now,
        }
    }

    /// Advance after a committed batch.
    pub fn update(&mut self, cursor: Option<DocumentCursor>, processed: u64) {
        self.cursor = cursor;
        self.processed_count += processed;
        self.batches += 1;
        self.updated_at = Utc::now();
    }

    /// Whether a run with these parameters may continue from this checkpoint.
    pub fn is_resumable_by(&self, key_fingerprint: u64, full: bool) -> bool {
        self.key_fingerprint == key_fingerprint && self.full == full
    }

    /// Serialize to JSON bytes for storage
    pub fn to_bytes(&self) -> Result<Vec<u8>, IndexError> {
        serde_json::to_vec(self).map_err(IndexError::from)
    }

    /// Deserialize from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IndexError> {
        serde_json::from_slice(bytes).map_err(|e| IndexError::Checkpoint(e.to_string()))
    }
}
