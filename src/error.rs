//! Error taxonomy for jobrag
//!
//! Validation failures map to client errors at the HTTP layer; storage and
//! embedding failures map to server errors. Generation unavailability is the
//! one kind the composer swallows into a fallback response.

use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum RagError {
    #[error("config error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("storage corruption: {0}")]
    Corrupt(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("generation unavailable: {0}")]
    GenerationUnavailable(String),
}

pub type Result<T> = std::result::Result<T, RagError>;
