//! Key encoding and decoding for storage layer.
//!
//! All index keys are fixed-width binary concatenations:
//! - entry: `tenant(16) ‖ hash(32) ‖ document(16)`
//! - document entry: `tenant(16) ‖ document(16) ‖ hash(32)`
//! - manifest: `tenant(16) ‖ document(16)`
//!
//! Ids are ULIDs stored big-endian, so every prefix scan stays inside one
//! tenant, and for document entries inside one document.

use blindex_types::{DocumentId, TenantId, TokenHash, TOKEN_HASH_LEN};

use crate::error::StorageError;

const ID_LEN: usize = TenantId::LEN;

/// Length of an entry or document-entry key
pub const ENTRY_KEY_LEN: usize = ID_LEN + TOKEN_HASH_LEN + ID_LEN;

fn split_id(bytes: &[u8]) -> Result<[u8; ID_LEN], StorageError> {
    bytes
        .try_into()
        .map_err(|_| StorageError::Key(format!("Invalid id length: {}", bytes.len())))
}

fn split_hash(bytes: &[u8]) -> Result<TokenHash, StorageError> {
    TokenHash::from_slice(bytes)
        .ok_or_else(|| StorageError::Key(format!("Invalid token hash length: {}", bytes.len())))
}

fn check_len(bytes: &[u8], expected: usize, what: &str) -> Result<(), StorageError> {
    if bytes.len() != expected {
        return Err(StorageError::Key(format!(
            "Invalid {} key length: {} (expected {})",
            what,
            bytes.len(),
            expected
        )));
    }
    Ok(())
}

/// Key for the lookup path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryKey {
    pub tenant_id: TenantId,
    pub token_hash: TokenHash,
    pub document_id: DocumentId,
}

impl EntryKey {
    pub fn new(tenant_id: TenantId, token_hash: TokenHash, document_id: DocumentId) -> Self {
        Self {
            tenant_id,
            token_hash,
            document_id,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut key = Self::lookup_prefix(self.tenant_id, &self.token_hash);
        key.extend_from_slice(&self.document_id.to_bytes());
        key
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        check_len(bytes, ENTRY_KEY_LEN, "entry")?;
        let hash_end = ID_LEN + TOKEN_HASH_LEN;
        Ok(Self {
            tenant_id: TenantId::from_bytes(split_id(&bytes[..ID_LEN])?),
            token_hash: split_hash(&bytes[ID_LEN..hash_end])?,
            document_id: DocumentId::from_bytes(split_id(&bytes[hash_end..])?),
        })
    }

    /// Prefix covering every document holding `hash` for `tenant`.
    pub fn lookup_prefix(tenant_id: TenantId, token_hash: &TokenHash) -> Vec<u8> {
        let mut key = Vec::with_capacity(ENTRY_KEY_LEN);
        key.extend_from_slice(&tenant_id.to_bytes());
        key.extend_from_slice(token_hash.as_bytes());
        key
    }

    /// The matching secondary-index key.
    pub fn document_key(&self) -> DocumentEntryKey {
        DocumentEntryKey::new(self.tenant_id, self.document_id, self.token_hash)
    }
}

/// Key for the per-document secondary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentEntryKey {
    pub tenant_id: TenantId,
    pub document_id: DocumentId,
    pub token_hash: TokenHash,
}

impl DocumentEntryKey {
    pub fn new(tenant_id: TenantId, document_id: DocumentId, token_hash: TokenHash) -> Self {
        Self {
            tenant_id,
            document_id,
            token_hash,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut key = Self::document_prefix(self.tenant_id, self.document_id);
        key.extend_from_slice(self.token_hash.as_bytes());
        key
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        check_len(bytes, ENTRY_KEY_LEN, "document entry")?;
        let doc_end = ID_LEN * 2;
        Ok(Self {
            tenant_id: TenantId::from_bytes(split_id(&bytes[..ID_LEN])?),
            document_id: DocumentId::from_bytes(split_id(&bytes[ID_LEN..doc_end])?),
            token_hash: split_hash(&bytes[doc_end..])?,
        })
    }

    /// Prefix covering every hash of one document.
    pub fn document_prefix(tenant_id: TenantId, document_id: DocumentId) -> Vec<u8> {
        let mut key = Vec::with_capacity(ENTRY_KEY_LEN);
        key.extend_from_slice(&tenant_id.to_bytes());
        key.extend_from_slice(&document_id.to_bytes());
        key
    }

    /// The matching lookup-path key.
    pub fn entry_key(&self) -> EntryKey {
        EntryKey::new(self.tenant_id, self.token_hash, self.document_id)
    }
}

/// Key for a document manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestKey {
    pub tenant_id: TenantId,
    pub document_id: DocumentId,
}

impl ManifestKey {
    pub fn new(tenant_id: TenantId, document_id: DocumentId) -> Self {
        Self {
            tenant_id,
            document_id,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        DocumentEntryKey::document_prefix(self.tenant_id, self.document_id)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        check_len(bytes, ID_LEN * 2, "manifest")?;
        Ok(Self {
            tenant_id: TenantId::from_bytes(split_id(&bytes[..ID_LEN])?),
            document_id: DocumentId::from_bytes(split_id(&bytes[ID_LEN..])?),
        })
    }
}

/// Key for checkpoint entries
/// Format: checkpoint:{job_name}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointKey {
    /// Job name (e.g., "backfill")
    pub job_name: String,
}

impl CheckpointKey {
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!("checkpoint:{}", self.job_name).into_bytes()
    }
}
