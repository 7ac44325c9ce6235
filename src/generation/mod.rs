//! External generation capability
//!
//! The language model is an external collaborator; the core depends on it
//! only through the [`Generator`] contract. Implementations may block for
//! arbitrary latency and fail with [`RagError::GenerationUnavailable`] -
//! the composer turns that into a fallback response, never a hard error.

use async_trait::async_trait;

use crate::error::{RagError, Result};

pub mod client;

pub use client::OpenAiGenerator;

/// Contract for the external text-generation service
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce a response for `user_message` grounded in `context`.
    async fn generate(
        &self,
        system_prompt: &str,
        context: &str,
        user_message: &str,
    ) -> Result<String>;
}

/// Generator used when no backend is configured.
///
/// Keeps the service runnable without credentials; every chat request
/// degrades to the documented fallback response.
pub struct DisabledGenerator;

#[async_trait]
impl Generator for DisabledGenerator {
    async fn generate(
        &self,
        _system_prompt: &str,
        _context: &str,
        _user_message: &str,
    ) -> Result<String> {
        Err(RagError::GenerationUnavailable(
            "no generation backend configured".to_string(),
        ))
    }
}
