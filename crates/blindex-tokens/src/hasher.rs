//! Keyed hashing of normalized terms.
//!
//! The HMAC key is derived from the deployment secret with a
//! domain-separated SHA-256, so the same secret used elsewhere (e.g. for
//! document encryption) yields an unrelated key here.
//!
//! Rotating the secret changes every hash. Existing index rows stop matching
//! and must be rebuilt by a backfill; the key fingerprint lets the backfill
//! tell which rows were written under an older key.

use std::fmt;
use std::sync::{Arc, OnceLock};

use hmac::{Hmac, Mac};
use secrecy::zeroize::Zeroize;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use tracing::debug;

use blindex_types::{Settings, TokenHash, TOKEN_HASH_LEN};

use crate::error::TokenError;

type HmacSha256 = Hmac<Sha256>;

/// Domain separation label for key derivation.
const KEY_DOMAIN: &[u8] = b"blindex:search-index:";

/// Reserved input for the key fingerprint.
///
/// Starts with NUL, which the tokenizer never emits, so no term can
/// collide with it.
const FINGERPRINT_INPUT: &[u8] = b"\0blindex:key-fingerprint";

/// Placeholder secrets that must never reach production.
const INSECURE_SECRETS: &[&str] = &[
    "change-this-to-a-random-secret-key",
    "change-me-in-production",
    "changeme",
    "secret",
];

/// Reject empty or placeholder secrets.
pub fn validate_secret(secret: &str) -> Result<(), TokenError> {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return Err(TokenError::InsecureSecret("secret is empty".to_string()));
    }
    if INSECURE_SECRETS.contains(&trimmed) {
        return Err(TokenError::InsecureSecret(
            "secret is a known placeholder value".to_string(),
        ));
    }
    Ok(())
}

/// HMAC-SHA256 over terms with a fixed derived key.
#[derive(Clone)]
pub struct KeyedHasher {
    mac: HmacSha256,
    fingerprint: u64,
}

impl KeyedHasher {
    /// Derive the hashing key from a deployment secret.
    pub fn derive(secret: &str) -> Result<Self, TokenError> {
        validate_secret(secret)?;

        let digest = Sha256::new()
            .chain_update(KEY_DOMAIN)
            .chain_update(secret.as_bytes())
            .finalize();
        let mut material = [0u8; 32];
        material.copy_from_slice(&digest);

        let mac = <HmacSha256 as Mac>::new_from_slice(&material)
            .map_err(|e| TokenError::KeyDerivation(e.to_string()));
        material.zeroize();
        let mac = mac?;

        let mut fp = mac.clone();
        fp.update(FINGERPRINT_INPUT);
        let fp_bytes = fp.finalize().into_bytes();
        let mut head = [0u8; 8];
        head.copy_from_slice(&fp_bytes[..8]);

        Ok(Self {
            mac,
            fingerprint: u64::from_be_bytes(head),
        })
    }

    /// Hash one normalized term.
    pub fn hash(&self, term: &str) -> TokenHash {
        let mut mac = self.mac.clone();
        mac.update(term.as_bytes());
        let out = mac.finalize().into_bytes();
        let mut bytes = [0u8; TOKEN_HASH_LEN];
        bytes.copy_from_slice(&out);
        TokenHash::from_bytes(bytes)
    }

    /// Identifies the key without revealing it. Two hashers agree on the
    /// fingerprint exactly when they derive from the same secret.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

impl fmt::Debug for KeyedHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedHasher")
            .field("fingerprint", &format_args!("{:016x}", self.fingerprint))
            .finish_non_exhaustive()
    }
}

/// Injectable owner of the deployment secret.
///
/// Derives the [`KeyedHasher`] on first use and caches it for the lifetime
/// of the provider. Configuration errors surface on that first use.
pub struct KeyProvider {
    secret: SecretString,
    hasher: OnceLock<KeyedHasher>,
}

impl KeyProvider {
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            hasher: OnceLock::new(),
        }
    }

    pub fn from_secret(secret: impl Into<String>) -> Self {
        Self::new(SecretString::from(secret.into()))
    }

    /// Build from settings. A missing secret fails here; an insecure one
    /// fails at derivation.
    pub fn from_settings(settings: &Settings) -> Result<Arc<Self>, TokenError> {
        let secret = settings
            .secret_key
            .clone()
            .ok_or(TokenError::MissingSecret)?;
        Ok(Arc::new(Self::new(secret)))
    }

    /// Get the derived hasher, deriving it on first call.
    pub fn hasher(&self) -> Result<&KeyedHasher, TokenError> {
        if let Some(hasher) = self.hasher.get() {
            return Ok(hasher);
        }
        let derived = KeyedHasher::derive(self.secret.expose_secret())?;
        let hasher = self.hasher.get_or_init(|| derived);
        debug!(
            fingerprint = %format_args!("{:016x}", hasher.fingerprint()),
            "Derived search index key"
        );
        Ok(hasher)
    }
}

impl fmt::Debug for KeyProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyProvider")
            .field("secret", &"[REDACTED]")
            .field("derived", &self.hasher.get().is_some())
            .finish()
    }
}
