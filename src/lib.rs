//! jobrag - embedding-based job retrieval with a RAG chat assistant
//!
//! Stores job postings with deterministic hash embeddings in SQLite, ranks
//! them against free-text queries by cosine similarity (exhaustive scan),
//! and serves a small HTTP surface: job ingestion, similarity search, a
//! retrieval-grounded chat endpoint with persisted history, and a health
//! probe. The language model behind /chat is an external collaborator; when
//! it is unreachable the service degrades to a fixed fallback response.

pub mod app;
pub mod compose;
pub mod config;
pub mod error;
pub mod generation;
pub mod search;
pub mod server;
pub mod storage;

pub use error::{RagError, Result};
