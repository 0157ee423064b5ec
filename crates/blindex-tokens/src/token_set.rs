//! Ordered, deduplicated, capped set of token hashes.

use std::collections::HashSet;

use blindex_types::TokenHash;

/// Unique hashes in first-insertion order, bounded by a cap.
///
/// Once the cap is reached, new unique hashes are rejected and the set is
/// marked truncated. Re-inserting a hash already present is a no-op and does
/// not count as truncation.
#[derive(Debug, Clone)]
pub struct TokenSet {
    hashes: Vec<TokenHash>,
    seen: HashSet<TokenHash>,
    cap: usize,
    truncated: bool,
}

impl TokenSet {
    pub fn with_cap(cap: usize) -> Self {
        Self {
            hashes: Vec::new(),
            seen: HashSet::new(),
            cap,
            truncated: false,
        }
    }

    /// Insert a hash.
    ///
    /// Returns `false` only when the hash is new and the cap rejected it.
    pub fn insert(&mut self, hash: TokenHash) -> bool {
        if self.seen.contains(&hash) {
            return true;
        }
        if self.hashes.len() >= self.cap {
            self.truncated = true;
            return false;
        }
        self.seen.insert(hash);
        self.hashes.push(hash);
        true
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn contains(&self, hash: &TokenHash) -> bool {
        self.seen.contains(hash)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TokenHash> {
        self.hashes.iter()
    }

    pub fn as_slice(&self) -> &[TokenHash] {
        &self.hashes
    }

    /// Whether at least one unique hash was dropped by the cap.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Consume into a byte-ordered vector, the order storage writes in.
    pub fn into_sorted_vec(self) -> Vec<TokenHash> {
        let mut hashes = self.hashes;
        hashes.sort_unstable();
        hashes
    }
}

impl<'a> IntoIterator for &'a TokenSet {
    type Item = &'a TokenHash;
    type IntoIter = std::slice::Iter<'a, TokenHash>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
