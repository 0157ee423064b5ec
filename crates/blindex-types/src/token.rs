//! Opaque token hash values.

use std::fmt;

/// Width of a token hash in bytes (HMAC-SHA256 output).
pub const TOKEN_HASH_LEN: usize = 32;

/// Keyed one-way hash of a normalized term.
///
/// The value carries no recoverable plaintext. `Debug` prints only a short
/// hex prefix so hashes stay readable in test failures.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenHash([u8; TOKEN_HASH_LEN]);

impl TokenHash {
    pub const fn from_bytes(bytes: [u8; TOKEN_HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Decode from a slice, `None` unless it is exactly [`TOKEN_HASH_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; TOKEN_HASH_LEN] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; TOKEN_HASH_LEN] {
        &self.0
    }
}

impl fmt::Debug for TokenHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenHash(")?;
        for b in &self.0[..4] {
            write!(f, "{:02x}", b)?;
        }
        write!(f, "..)")
    }
}
