//! Error types for the index write, query and backfill paths.

use blindex_storage::StorageError;
use blindex_tokens::TokenError;
use thiserror::Error;

/// Errors on the write and backfill paths
#[derive(Error, Debug)]
pub enum IndexError {
    /// Storage operation failed; no partial state was written
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Secret missing or insecure
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Document source could not list or load documents
    #[error("Document source error: {0}")]
    Source(String),

    /// Checkpoint load/save issues
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// JSON encoding/decoding errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl IndexError {
    /// Configuration problems are fatal for every document, not just one.
    pub fn is_configuration(&self) -> bool {
        matches!(self, IndexError::Token(_))
    }

    /// Whether retrying the same document may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, IndexError::Storage(e) if e.is_conflict())
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(err: serde_json::Error) -> Self {
        IndexError::Serialization(err.to_string())
    }
}

/// Errors on the query path.
///
/// Kept apart from an empty result: an `Err` means search is broken, an
/// empty candidate set means nothing matched.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Secret missing or insecure
    #[error("Search misconfigured: {0}")]
    Configuration(#[from] TokenError),

    /// Index store failed
    #[error("Search unavailable: {0}")]
    Unavailable(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IndexError::Checkpoint("failed to load".to_string());
        assert_eq!(err.to_string(), "Checkpoint error: failed to load");

        let err = IndexError::Source("export unreadable".to_string());
        assert_eq!(err.to_string(), "Document source error: export unreadable");
    }

    #[test]
    fn test_from_serde_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: IndexError = json_err.into();
        assert!(matches!(err, IndexError::Serialization(_)));
    }

    #[test]
    fn test_classification() {
        let err: IndexError = TokenError::MissingSecret.into();
        assert!(err.is_configuration());
        assert!(!err.is_conflict());

        let err: IndexError = StorageError::Conflict("lock timeout".to_string()).into();
        assert!(err.is_conflict());
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_query_error_display() {
        let err: QueryError = StorageError::ColumnFamilyNotFound("x".to_string()).into();
        assert!(err.to_string().starts_with("Search unavailable"));
        let err: QueryError = TokenError::MissingSecret.into();
        assert!(err.to_string().starts_with("Search misconfigured"));
    }
}
