//! Error types shared by the blind index crates.

use thiserror::Error;

/// Errors raised while loading configuration or parsing shared types.
#[derive(Debug, Error)]
pub enum TypesError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Identifier could not be parsed
    #[error("Invalid id: {0}")]
    InvalidId(String),
}
