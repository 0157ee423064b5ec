//! Text to token-hash sets, shared by indexing and querying.

use std::sync::Arc;

use tracing::trace;

use blindex_types::{LimitSettings, Settings};

use crate::error::TokenError;
use crate::hasher::KeyProvider;
use crate::token_set::TokenSet;
use crate::tokenizer::Tokenizer;

/// Tokenizer plus keyed hasher plus caps.
///
/// Documents and queries go through the same tokenizer and the same key, so
/// a query term hashes to the same value as the identical document term.
#[derive(Debug, Clone)]
pub struct TokenPipeline {
    tokenizer: Tokenizer,
    keys: Arc<KeyProvider>,
    limits: LimitSettings,
}

impl TokenPipeline {
    pub fn new(tokenizer: Tokenizer, keys: Arc<KeyProvider>, limits: LimitSettings) -> Self {
        Self {
            tokenizer,
            keys,
            limits,
        }
    }

    /// Build from settings. Fails only when no secret is configured.
    pub fn from_settings(settings: &Settings) -> Result<Self, TokenError> {
        let keys = KeyProvider::from_settings(settings)?;
        Ok(Self::new(
            Tokenizer::new(settings.tokenizer.clone()),
            keys,
            settings.limits.clone(),
        ))
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn limits(&self) -> &LimitSettings {
        &self.limits
    }

    /// Hashes for document text, capped at `max_document_tokens`.
    pub fn document_tokens(&self, text: &str) -> Result<TokenSet, TokenError> {
        self.build(text, self.limits.max_document_tokens)
    }

    /// Hashes for query text, capped at `max_query_tokens`.
    pub fn query_tokens(&self, text: &str) -> Result<TokenSet, TokenError> {
        self.build(text, self.limits.max_query_tokens)
    }

    /// Fingerprint of the active key.
    pub fn key_fingerprint(&self) -> Result<u64, TokenError> {
        Ok(self.keys.hasher()?.fingerprint())
    }

    fn build(&self, text: &str, cap: usize) -> Result<TokenSet, TokenError> {
        let hasher = self.keys.hasher()?;
        let mut set = TokenSet::with_cap(cap);
        for term in self.tokenizer.terms(text) {
            if !set.insert(hasher.hash(&term)) {
                break;
            }
        }
        trace!(
            unique = set.len(),
            truncated = set.is_truncated(),
            cap,
            "Built token set"
        );
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blindex_types::TokenizerSettings;

    fn pipeline_with(secret: &str, limits: LimitSettings) -> TokenPipeline {
        TokenPipeline::new(
            Tokenizer::new(TokenizerSettings::default()),
            Arc::new(KeyProvider::from_secret(secret)),
            limits,
        )
    }

    fn pipeline() -> TokenPipeline {
        pipeline_with("pipeline-test-secret", LimitSettings::default())
    }

    #[test]
    fn test_document_tokens_dedup() {
        let p = pipeline();
        let set = p.document_tokens("Monate monate MONATE").unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_query_matches_document() {
        let p = pipeline();
        let doc = p
            .document_tokens("Die Kündigungsfrist beträgt drei Monate")
            .unwrap();
        assert_eq!(doc.len(), 5);

        let query = p.query_tokens("kündigungsfrist").unwrap();
        assert_eq!(query.len(), 2);
        assert!(query.iter().all(|h| doc.contains(h)));
    }

    #[test]
    fn test_sharp_s_spellings_hash_alike() {
        let p = pipeline();
        let doc = p.document_tokens("Die Straße").unwrap();
        for text in ["STRASSE", "strasse", "Straße"] {
            let query = p.query_tokens(text).unwrap();
            assert_eq!(query.len(), 1);
            assert!(doc.contains(&query.as_slice()[0]), "{:?} should match", text);
        }
    }

    #[test]
    fn test_prefix_query_hits_compound() {
        let p = pipeline();
        let doc = p.document_tokens("Kündigungsfrist").unwrap();
        // "kündig" is exactly the 6-char prefix emitted for the document term
        let query = p.query_tokens("Kündig").unwrap();
        assert_eq!(query.len(), 1);
        assert!(doc.contains(&query.as_slice()[0]));
    }

    #[test]
    fn test_stop_words_only_query_is_empty() {
        let p = pipeline();
        assert!(p.query_tokens("der die das und").unwrap().is_empty());
        assert!(p.query_tokens("").unwrap().is_empty());
    }

    #[test]
    fn test_query_cap() {
        let p = pipeline();
        let text: Vec<String> = (0..100).map(|i| format!("wort{:03}", i)).collect();
        let set = p.query_tokens(&text.join(" ")).unwrap();
        assert_eq!(set.len(), 32);
        assert!(set.is_truncated());
    }

    #[test]
    fn test_document_cap_keeps_first_terms() {
        let p = pipeline_with(
            "pipeline-test-secret",
            LimitSettings {
                max_document_tokens: 3,
                max_query_tokens: 32,
            },
        );
        let doc = p.document_tokens("alpha beta gamma delta epsilon").unwrap();
        assert_eq!(doc.len(), 3);
        assert!(doc.is_truncated());

        let kept = p.query_tokens("alpha beta gamma").unwrap();
        assert!(kept.iter().all(|h| doc.contains(h)));
        let dropped = p.query_tokens("delta").unwrap();
        assert!(!doc.contains(&dropped.as_slice()[0]));
    }

    #[test]
    fn test_distinct_secrets_produce_disjoint_hashes() {
        let a = pipeline_with("first-deployment-secret", LimitSettings::default());
        let b = pipeline_with("second-deployment-secret", LimitSettings::default());
        let ha = a.document_tokens("Kündigungsfrist Monate").unwrap();
        let hb = b.document_tokens("Kündigungsfrist Monate").unwrap();
        assert!(ha.iter().all(|h| !hb.contains(h)));
        assert_ne!(a.key_fingerprint().unwrap(), b.key_fingerprint().unwrap());
    }

    #[test]
    fn test_insecure_secret_fails_on_use() {
        let p = pipeline_with("change-me-in-production", LimitSettings::default());
        assert!(matches!(
            p.document_tokens("vertrag"),
            Err(TokenError::InsecureSecret(_))
        ));
        assert!(matches!(
            p.query_tokens("vertrag"),
            Err(TokenError::InsecureSecret(_))
        ));
    }

    #[test]
    fn test_from_settings_without_secret() {
        assert!(matches!(
            TokenPipeline::from_settings(&Settings::default()),
            Err(TokenError::MissingSecret)
        ));
    }

    #[test]
    fn test_from_settings_uses_configured_limits() {
        let mut settings = Settings {
            secret_key: Some("configured-secret".into()),
            ..Default::default()
        };
        settings.limits.max_query_tokens = 2;
        let p = TokenPipeline::from_settings(&settings).unwrap();
        let set = p.query_tokens("alpha beta gamma").unwrap();
        assert_eq!(set.len(), 2);
    }
}
