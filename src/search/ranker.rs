//! Similarity ranking over the job catalogue
//!
//! Exhaustive cosine-similarity scan: every query re-reads the full store
//! and scores each record. O(N) per query with zero staleness; fine for a
//! bounded catalogue, and the documented scalability ceiling of this design.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::search::embeddings::{Embedder, cosine_similarity};
use crate::storage::{JobRecord, JobStore};

/// A ranked job with its similarity score.
///
/// Wire field names follow the upstream collector's schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub id: i64,
    #[serde(rename = "job_title")]
    pub title: String,
    pub company: String,
    pub location: String,
    pub work_type: String,
    pub salary: String,
    #[serde(rename = "job_link")]
    pub link: String,
    pub description: String,
    pub requirements: String,
    /// Cosine similarity in [-1, 1]
    pub similarity: f32,
}

impl SimilarityResult {
    fn from_record(record: JobRecord, similarity: f32) -> Self {
        let fields = record.fields;
        Self {
            id: record.id,
            title: fields.title,
            company: fields.company,
            location: fields.location,
            work_type: fields.work_type,
            salary: fields.salary,
            link: fields.link,
            description: fields.description,
            requirements: fields.requirements,
            similarity,
        }
    }
}

/// Ranks stored jobs against a free-text query
pub struct JobRanker {
    store: Arc<JobStore>,
    embedder: Arc<dyn Embedder>,
}

impl JobRanker {
    pub fn new(store: Arc<JobStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// Top-k stored jobs by cosine similarity to `query`, descending.
    ///
    /// Ties keep storage order (stable sort), so repeated calls without
    /// intervening writes return identical results. `k == 0` yields an
    /// empty list. Records whose stored dimension differs from the query
    /// vector are skipped, never compared.
    pub fn rank(&self, query: &str, k: usize) -> Result<Vec<SimilarityResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_vec = self.embedder.embed(query)?;
        let jobs = self.store.list_jobs()?;

        let mut results = Vec::with_capacity(jobs.len());
        for job in jobs {
            if job.embedding.len() != query_vec.len() {
                warn!(
                    job_id = job.id,
                    stored_dim = job.embedding.len(),
                    query_dim = query_vec.len(),
                    "skipping job with mismatched embedding dimension"
                );
                continue;
            }
            let score = cosine_similarity(&query_vec, &job.embedding);
            results.push(SimilarityResult::from_record(job, score));
        }

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
        results.truncate(k);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::HashEmbedder;
    use crate::storage::JobFields;
    use rusqlite::{Connection, params};
    use tempfile::tempdir;

    fn seeded_ranker(dir: &std::path::Path) -> (Arc<JobStore>, JobRanker) {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(128));
        let store = Arc::new(JobStore::open(dir.join("test.db"), embedder.clone()).unwrap());

        for (title, description) in [
            ("Backend Engineer", "Build APIs in a distributed system"),
            ("Frontend Developer", "React dashboards and design systems"),
            ("Data Analyst", "SQL reporting and dashboards"),
        ] {
            store
                .add_job(&JobFields {
                    title: title.to_string(),
                    description: description.to_string(),
                    ..JobFields::default()
                })
                .unwrap();
        }

        let ranker = JobRanker::new(store.clone(), embedder);
        (store, ranker)
    }

    #[test]
    fn test_rank_zero_k_is_empty() {
        let dir = tempdir().unwrap();
        let (_store, ranker) = seeded_ranker(dir.path());
        assert!(ranker.rank("backend", 0).unwrap().is_empty());
    }

    #[test]
    fn test_rank_caps_at_k_and_sorts_descending() {
        let dir = tempdir().unwrap();
        let (_store, ranker) = seeded_ranker(dir.path());

        let results = ranker.rank("distributed backend apis", 2).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].similarity >= results[1].similarity);

        let all = ranker.rank("distributed backend apis", 10).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_rank_is_deterministic() {
        let dir = tempdir().unwrap();
        let (_store, ranker) = seeded_ranker(dir.path());

        let a = ranker.rank("dashboards", 3).unwrap();
        let b = ranker.rank("dashboards", 3).unwrap();
        let ids_a: Vec<i64> = a.iter().map(|r| r.id).collect();
        let ids_b: Vec<i64> = b.iter().map(|r| r.id).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn test_rank_on_empty_store() {
        let dir = tempdir().unwrap();
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(128));
        let store = Arc::new(JobStore::open(dir.path().join("empty.db"), embedder.clone()).unwrap());
        let ranker = JobRanker::new(store, embedder);
        assert!(ranker.rank("anything", 5).unwrap().is_empty());
    }

    #[test]
    fn test_mismatched_dimension_records_are_skipped() {
        let dir = tempdir().unwrap();
        let (store, ranker) = seeded_ranker(dir.path());

        // Insert a record with a foreign dimension directly
        let conn = Connection::open(store.path()).unwrap();
        let alien = vec![0u8; 16 * 4];
        conn.execute(
            "INSERT INTO jobs (title, embedding, embedding_dim) VALUES (?1, ?2, ?3)",
            params!["Alien Dim Job", alien, 16i64],
        )
        .unwrap();

        let results = ranker.rank("anything at all", 10).unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.title != "Alien Dim Job"));
    }
}
