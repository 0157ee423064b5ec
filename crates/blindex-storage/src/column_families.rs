//! Column family definitions for RocksDB.
//!
//! - search_index_entries: `tenant ‖ hash ‖ document`, the lookup path
//! - search_index_documents: `tenant ‖ document ‖ hash`, the replace/delete path
//! - search_index_manifests: one bookkeeping row per indexed document
//! - checkpoints: backfill progress

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family name for index entries keyed for lookup
pub const CF_ENTRIES: &str = "search_index_entries";

/// Column family name for the per-document secondary index
pub const CF_DOCUMENT_ENTRIES: &str = "search_index_documents";

/// Column family name for document manifests
pub const CF_MANIFESTS: &str = "search_index_manifests";

/// Column family name for background job checkpoints
pub const CF_CHECKPOINTS: &str = "checkpoints";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[
    CF_ENTRIES,
    CF_DOCUMENT_ENTRIES,
    CF_MANIFESTS,
    CF_CHECKPOINTS,
];

/// Options for the key-only entry column families
fn entry_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_ENTRIES, entry_options()),
        ColumnFamilyDescriptor::new(CF_DOCUMENT_ENTRIES, entry_options()),
        ColumnFamilyDescriptor::new(CF_MANIFESTS, Options::default()),
        ColumnFamilyDescriptor::new(CF_CHECKPOINTS, Options::default()),
    ]
}
