//! # blindex-tokens
//!
//! Turns text into sets of opaque token hashes.
//!
//! The same [`TokenPipeline`] serves indexing and querying. Both sides run
//! the identical tokenizer and the identical keyed hasher; only the cap on
//! unique hashes differs.
//!
//! ## Components
//! - [`Tokenizer`]: Unicode word runs, case folding, length filters,
//!   stop words, prefix expansion
//! - [`KeyProvider`] / [`KeyedHasher`]: HMAC-SHA256 under a key derived from
//!   the deployment secret
//! - [`TokenSet`]: ordered, deduplicated, capped collection of hashes
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use blindex_tokens::{KeyProvider, TokenPipeline, Tokenizer};
//! use blindex_types::{LimitSettings, TokenizerSettings};
//!
//! let keys = Arc::new(KeyProvider::from_secret("s3cr3t-deployment-key"));
//! let pipeline = TokenPipeline::new(
//!     Tokenizer::new(TokenizerSettings::default()),
//!     keys,
//!     LimitSettings::default(),
//! );
//! let doc = pipeline.document_tokens("Die Kündigungsfrist beträgt drei Monate").unwrap();
//! let query = pipeline.query_tokens("kündigungsfrist").unwrap();
//! assert!(query.iter().all(|h| doc.contains(h)));
//! ```

pub mod error;
pub mod hasher;
pub mod pipeline;
pub mod stopwords;
pub mod token_set;
pub mod tokenizer;

pub use error::TokenError;
pub use hasher::{KeyProvider, KeyedHasher};
pub use pipeline::TokenPipeline;
pub use token_set::TokenSet;
pub use tokenizer::Tokenizer;
