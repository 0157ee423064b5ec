//! Storage layer for the blind search index.
//!
//! Provides RocksDB-backed storage with:
//! - Column family isolation for entries, the per-document secondary index,
//!   manifests and checkpoints
//! - Fixed-width binary keys so tenant and hash prefixes scan in order
//! - Per-document replace and delete inside one pessimistic transaction
//! - Checkpoints for resumable backfill

pub mod column_families;
pub mod db;
pub mod error;
pub mod keys;
pub mod manifest;

pub use db::{ReplaceOutcome, Storage, StorageStats, DEFAULT_LOCK_TIMEOUT_MS};
pub use error::StorageError;
pub use keys::{CheckpointKey, DocumentEntryKey, EntryKey, ManifestKey};
pub use manifest::DocumentManifest;
