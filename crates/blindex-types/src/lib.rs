//! # blindex-types
//!
//! Shared domain types for the blind token search index.
//!
//! This crate defines the data structures every other crate agrees on:
//! - Ids: tenant and document identifiers
//! - Token hashes: the fixed-width opaque values stored in the index
//! - Document interface: what the external document store exposes
//! - Settings: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use blindex_types::{DocumentId, TenantId};
//!
//! let tenant = TenantId::new();
//! let document = DocumentId::new();
//! assert_ne!(tenant.to_string(), document.to_string());
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod ids;
pub mod token;

pub use config::{LimitSettings, Settings, TokenizerSettings};
pub use document::{DocumentCursor, DocumentRecord, DocumentText};
pub use error::TypesError;
pub use ids::{DocumentId, TenantId};
pub use token::{TokenHash, TOKEN_HASH_LEN};
