//! Storage layer for jobrag
//!
//! SQLite persistence for job records, their embedding vectors, and the
//! append-only chat-history log.

pub mod sqlite;

pub use sqlite::{CHAT_HISTORY_LIMIT, ChatTurn, JobFields, JobRecord, JobStore};
