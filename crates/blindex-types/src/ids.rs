//! Tenant and document identifiers.
//!
//! Both are ULIDs. They encode to 16 bytes, which keeps every index key
//! fixed-width and lets the storage layer build prefixes by concatenation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::TypesError;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Ulid);

        impl $name {
            /// Encoded width in bytes.
            pub const LEN: usize = 16;

            /// Generate a fresh id.
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            pub fn from_ulid(ulid: Ulid) -> Self {
                Self(ulid)
            }

            pub fn as_ulid(&self) -> Ulid {
                self.0
            }

            /// Big-endian byte encoding, preserves ULID ordering.
            pub fn to_bytes(&self) -> [u8; 16] {
                self.0.to_bytes()
            }

            pub fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(Ulid::from_bytes(bytes))
            }

            /// Decode from a slice that must be exactly 16 bytes long.
            pub fn from_slice(bytes: &[u8]) -> Result<Self, TypesError> {
                let arr: [u8; 16] = bytes.try_into().map_err(|_| {
                    TypesError::InvalidId(format!(
                        "{} must be 16 bytes, got {}",
                        $label,
                        bytes.len()
                    ))
                })?;
                Ok(Self::from_bytes(arr))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = TypesError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<Ulid>()
                    .map(Self)
                    .map_err(|e| TypesError::InvalidId(format!("{} '{}': {}", $label, s, e)))
            }
        }
    };
}

define_id!(
    /// Isolated customer/organization scope. Every index row and query is
    /// partitioned by tenant.
    TenantId,
    "tenant_id"
);

define_id!(
    /// Identifier of a document owned by the external document store.
    DocumentId,
    "document_id"
);
