//! Token pipeline error types.

use thiserror::Error;

/// Errors raised while deriving the hashing key.
///
/// Tokenization itself is total over any string and never fails; every
/// variant here is a configuration problem for the operator to fix.
#[derive(Debug, Error)]
pub enum TokenError {
    /// No deployment secret configured
    #[error("Configuration error: search index secret is not configured (set BLINDEX_SECRET_KEY)")]
    MissingSecret,

    /// Secret is empty or a known placeholder
    #[error("Configuration error: search index secret is insecure: {0}")]
    InsecureSecret(String),

    /// HMAC state could not be built from the derived key
    #[error("Key derivation error: {0}")]
    KeyDerivation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TokenError::InsecureSecret("placeholder value".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: search index secret is insecure: placeholder value"
        );
        assert!(TokenError::MissingSecret
            .to_string()
            .contains("BLINDEX_SECRET_KEY"));
    }
}
