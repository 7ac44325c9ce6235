//! Hash embeddings
//!
//! FNV-1a token-hash embeddings for semantic similarity. No ML model
//! dependencies - fully deterministic, so the same text always maps to the
//! same vector.

use crate::error::Result;

/// Capability for turning free text into a fixed-dimension vector.
///
/// Injected into the store and ranker at construction time; any backend
/// satisfying this contract can be substituted without touching callers.
pub trait Embedder: Send + Sync {
    /// Output dimension, constant for the lifetime of the embedder
    fn dim(&self) -> usize;

    /// Embed text into a vector of exactly `dim()` entries.
    ///
    /// Empty or whitespace-only input must not fail; it yields the zero
    /// vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x100_0000_01b3;

/// Hash embedder using FNV-1a
pub struct HashEmbedder {
    /// Embedding dimension (default: 384)
    dim: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self { dim: 384 }
    }
}

impl HashEmbedder {
    /// Create embedder with specified dimension
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    /// Embed text into a signed bag-of-tokens vector, L2-normalized.
    ///
    /// Each lowercased alphanumeric token hashes to a bucket via FNV-1a; the
    /// hash's top bit picks the sign so unrelated tokens cancel rather than
    /// accumulate.
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dim];

        for token in tokenize(text) {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dim as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Compute cosine similarity between two embeddings.
///
/// Zero-norm vectors (and mismatched lengths, which callers must already
/// have screened out) score 0.0 rather than propagating a division fault.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
