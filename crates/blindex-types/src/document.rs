//! Interface types for the external document store.
//!
//! The index never owns documents. It only sees the metadata needed to pick
//! backfill candidates and, on demand, the decrypted plaintext.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{DocumentId, TenantId};

/// Metadata for one document as exposed by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub tenant_id: TenantId,
    pub document_id: DocumentId,
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker
    #[serde(default)]
    pub deleted: bool,
    /// Whether encrypted text is stored for this document
    #[serde(default)]
    pub has_text: bool,
}

impl DocumentRecord {
    /// Live documents with stored text are the only ones the index covers.
    pub fn is_indexable(&self) -> bool {
        !self.deleted && self.has_text
    }

    /// Keyset position of this record in creation order.
    pub fn cursor(&self) -> DocumentCursor {
        DocumentCursor {
            created_at: self.created_at,
            document_id: self.document_id,
        }
    }
}

/// Position in the `(created_at, document_id)` ordering.
///
/// Field order matters: the derived `Ord` compares `created_at` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentCursor {
    pub created_at: DateTime<Utc>,
    pub document_id: DocumentId,
}

/// Result of asking the document store for plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentText {
    /// Decrypted text
    Available(String),
    /// No text stored, or the document is gone
    Missing,
    /// Text is stored but could not be decrypted
    Undecryptable,
}

impl DocumentText {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DocumentText::Available(text) => Some(text),
            DocumentText::Missing | DocumentText::Undecryptable => None,
        }
    }
}
