//! SQLite database layer
//!
//! Durable storage for job records (with their embedding vectors) and the
//! append-only chat-history log. Every operation opens its own connection,
//! does one unit of work, and releases it, so the store stays `Send + Sync`
//! and concurrent writers are serialized by SQLite itself.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::search::Embedder;

/// Newest-first page size for chat history reads
pub const CHAT_HISTORY_LIMIT: usize = 10;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL DEFAULT '',
    company TEXT NOT NULL DEFAULT '',
    location TEXT NOT NULL DEFAULT '',
    work_type TEXT NOT NULL DEFAULT '',
    salary TEXT NOT NULL DEFAULT '',
    link TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    requirements TEXT NOT NULL DEFAULT '',
    embedding BLOB NOT NULL,
    embedding_dim INTEGER NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS chat_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    message TEXT NOT NULL,
    response TEXT NOT NULL,
    context_job_ids TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_chat_history_user
    ON chat_history (user_id, id DESC);
";

/// Free-text job fields as submitted for ingestion.
///
/// Every field defaults to the empty string; no further validation is
/// applied. Aliases accept the upstream collector's camelCase keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobFields {
    #[serde(alias = "jobTitle")]
    pub title: String,
    pub company: String,
    pub location: String,
    #[serde(alias = "workType")]
    pub work_type: String,
    pub salary: String,
    #[serde(alias = "jobLink")]
    pub link: String,
    pub description: String,
    pub requirements: String,
}

impl JobFields {
    /// Canonical labeled representation used for embedding.
    ///
    /// Field order and labels are fixed; changing either changes every
    /// stored vector, so treat this format as part of the schema.
    pub fn canonical_text(&self) -> String {
        format!(
            "Job Title: {}\nCompany: {}\nLocation: {}\nWork Type: {}\nSalary: {}\nDescription: {}\nRequirements: {}",
            self.title,
            self.company,
            self.location,
            self.work_type,
            self.salary,
            self.description,
            self.requirements,
        )
    }
}

/// A stored job record with its embedding vector
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: i64,
    pub fields: JobFields,
    pub embedding: Vec<f32>,
    pub created_at: String,
}

/// One appended chat interaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub user_id: String,
    pub message: String,
    pub response: String,
    /// Job ids supplied as generation context, in ranking order
    pub context_job_ids: Vec<i64>,
    pub created_at: String,
}

/// SQLite-backed store for jobs and chat history
pub struct JobStore {
    path: PathBuf,
    embedder: Arc<dyn Embedder>,
}

impl JobStore {
    /// Open the store at the given path, creating the schema if absent
    pub fn open(path: impl AsRef<Path>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self { path, embedder };
        let conn = store.connect()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(store)
    }

    /// Database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )?;
        Ok(conn)
    }

    /// Embed the canonical text for `fields` and persist record plus vector
    /// in a single insert. Returns the assigned id.
    pub fn add_job(&self, fields: &JobFields) -> Result<i64> {
        let embedding = self.embedder.embed(&fields.canonical_text())?;
        if embedding.len() != self.embedder.dim() {
            return Err(RagError::Embedding(format!(
                "embedder produced {} values, expected {}",
                embedding.len(),
                self.embedder.dim()
            )));
        }

        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO jobs (title, company, location, work_type, salary,
                               link, description, requirements, embedding, embedding_dim)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                fields.title,
                fields.company,
                fields.location,
                fields.work_type,
                fields.salary,
                fields.link,
                fields.description,
                fields.requirements,
                encode_embedding(&embedding),
                embedding.len() as i64,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Every stored record with its decoded embedding, in insertion order.
    ///
    /// Full scan, no pagination: the catalogue is expected to stay small
    /// enough that callers (the ranker) re-read it per query.
    pub fn list_jobs(&self) -> Result<Vec<JobRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, company, location, work_type, salary,
                    link, description, requirements, embedding, embedding_dim, created_at
             FROM jobs
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            let fields = JobFields {
                title: row.get(1)?,
                company: row.get(2)?,
                location: row.get(3)?,
                work_type: row.get(4)?,
                salary: row.get(5)?,
                link: row.get(6)?,
                description: row.get(7)?,
                requirements: row.get(8)?,
            };
            let blob: Vec<u8> = row.get(9)?;
            let dim: i64 = row.get(10)?;
            let created_at: String = row.get(11)?;
            Ok((row.get::<_, i64>(0)?, fields, blob, dim, created_at))
        })?;

        let mut jobs = Vec::new();
        for row in rows {
            let (id, fields, blob, dim, created_at) = row?;
            let embedding = decode_embedding(&blob, dim, id)?;
            jobs.push(JobRecord {
                id,
                fields,
                embedding,
                created_at,
            });
        }
        Ok(jobs)
    }

    /// Append one chat turn. Context ids keep their ranking order.
    pub fn record_chat(
        &self,
        user_id: &str,
        message: &str,
        response: &str,
        context_job_ids: &[i64],
    ) -> Result<()> {
        let context_json = serde_json::to_string(context_job_ids)?;
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO chat_history (user_id, message, response, context_job_ids)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, message, response, context_json],
        )?;
        Ok(())
    }

    /// Chat turns for a user, newest first, capped at
    /// [`CHAT_HISTORY_LIMIT`]. Ordered by rowid so same-second inserts stay
    /// deterministic.
    pub fn chat_history(&self, user_id: &str) -> Result<Vec<ChatTurn>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, message, response, context_job_ids, created_at
             FROM chat_history
             WHERE user_id = ?1
             ORDER BY id DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![user_id, CHAT_HISTORY_LIMIT as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut turns = Vec::new();
        for row in rows {
            let (user_id, message, response, context_json, created_at) = row?;
            let context_job_ids: Vec<i64> = serde_json::from_str(&context_json)?;
            turns.push(ChatTurn {
                user_id,
                message,
                response,
                context_job_ids,
                created_at,
            });
        }
        Ok(turns)
    }
}

fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn decode_embedding(blob: &[u8], dim: i64, job_id: i64) -> Result<Vec<f32>> {
    let dim = usize::try_from(dim)
        .map_err(|_| RagError::Corrupt(format!("job {job_id}: negative embedding_dim {dim}")))?;
    if blob.len() != dim * 4 {
        return Err(RagError::Corrupt(format!(
            "job {job_id}: embedding blob is {} bytes, expected {} for dim {dim}",
            blob.len(),
            dim * 4,
        )));
    }

    let mut vector = Vec::with_capacity(dim);
    for chunk in blob.chunks_exact(4) {
        vector.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::HashEmbedder;
    use tempfile::tempdir;

    fn test_store(dir: &Path) -> JobStore {
        JobStore::open(dir.join("test.db"), Arc::new(HashEmbedder::new(64))).unwrap()
    }

    #[test]
    fn test_open_creates_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let store = JobStore::open(&db_path, Arc::new(HashEmbedder::new(64))).unwrap();
        assert!(db_path.exists());

        let conn = Connection::open(store.path()).unwrap();
        for table in ["jobs", "chat_history"] {
            let exists: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(exists, 1, "Table {table} should exist");
        }
    }

    #[test]
    fn test_add_job_roundtrip() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path());

        let fields = JobFields {
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            description: "Build APIs in a distributed system".to_string(),
            ..JobFields::default()
        };
        let id = store.add_job(&fields).unwrap();
        assert!(id > 0);

        let jobs = store.list_jobs().unwrap();
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.id, id);
        assert_eq!(job.fields.title, "Backend Engineer");
        assert_eq!(job.fields.company, "Acme");
        // Missing fields normalize to empty strings
        assert_eq!(job.fields.location, "");
        assert_eq!(job.fields.salary, "");
        assert_eq!(job.embedding.len(), 64);
        assert!(!job.created_at.is_empty());
    }

    #[test]
    fn test_ids_are_monotonically_increasing() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path());

        let mut last = 0;
        for n in 0..5 {
            let fields = JobFields {
                title: format!("Job {n}"),
                ..JobFields::default()
            };
            let id = store.add_job(&fields).unwrap();
            assert!(id > last);
            last = id;
        }
    }

    #[test]
    fn test_canonical_text_has_fixed_labels() {
        let fields = JobFields {
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            ..JobFields::default()
        };
        let text = fields.canonical_text();
        assert!(text.contains("Job Title: Backend Engineer"));
        assert!(text.contains("Company: Acme"));
        assert!(text.contains("Work Type: "));
        assert!(text.contains("Requirements: "));
    }

    #[test]
    fn test_corrupt_blob_is_rejected() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path());
        store.add_job(&JobFields::default()).unwrap();

        // Truncate the stored blob so its length no longer matches the dim
        let conn = Connection::open(store.path()).unwrap();
        conn.execute("UPDATE jobs SET embedding = X'DEADBEEF'", [])
            .unwrap();

        assert!(matches!(store.list_jobs(), Err(RagError::Corrupt(_))));
    }

    #[test]
    fn test_chat_roundtrip_newest_first() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path());

        store
            .record_chat("alice", "first", "reply one", &[1, 2])
            .unwrap();
        store
            .record_chat("alice", "second", "reply two", &[3])
            .unwrap();
        store.record_chat("bob", "other", "reply", &[]).unwrap();

        let turns = store.chat_history("alice").unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].message, "second");
        assert_eq!(turns[0].context_job_ids, vec![3]);
        assert_eq!(turns[1].message, "first");
        assert_eq!(turns[1].context_job_ids, vec![1, 2]);
    }

    #[test]
    fn test_chat_history_caps_at_limit() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path());

        for n in 0..11 {
            store
                .record_chat("alice", &format!("message {n}"), "reply", &[])
                .unwrap();
        }

        let turns = store.chat_history("alice").unwrap();
        assert_eq!(turns.len(), CHAT_HISTORY_LIMIT);
        // Most recent 10, newest first: messages 10 down to 1
        assert_eq!(turns[0].message, "message 10");
        assert_eq!(turns[9].message, "message 1");
    }

    #[test]
    fn test_embedding_blob_roundtrip() {
        let vector = vec![0.25f32, -1.5, 0.0, 3.75];
        let blob = encode_embedding(&vector);
        assert_eq!(blob.len(), 16);
        let decoded = decode_embedding(&blob, 4, 1).unwrap();
        assert_eq!(decoded, vector);
    }
}
