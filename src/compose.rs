//! Response composition for the chat assistant
//!
//! Turns ranked retrieval results into the context block handed to the
//! generation backend, and degrades to a fixed fallback response whenever
//! that backend is unavailable.

use std::sync::Arc;

use tracing::warn;

use crate::generation::Generator;
use crate::search::SimilarityResult;

/// Returned verbatim whenever the generation backend fails or times out
pub const FALLBACK_RESPONSE: &str = "temporarily unable to process the request";

/// Longest description excerpt included per job in the context block
const DESCRIPTION_EXCERPT_CHARS: usize = 200;

const SYSTEM_PROMPT: &str = "You are an intelligent job search assistant. You help users find \
relevant job opportunities and provide career advice based on the job database.\n\n\
Your responses should be:\n\
- Helpful and informative\n\
- Based on the provided job context\n\
- Professional and encouraging\n\
- Include specific job recommendations when relevant\n\n\
Always provide actionable advice and mention specific job opportunities when they match the \
user's query.";

/// Combines ranked jobs into generation context and calls the backend
pub struct Composer {
    generator: Arc<dyn Generator>,
}

impl Composer {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Generate a grounded response for `user_message`.
    ///
    /// This is the one place a failure is swallowed: any generator error
    /// becomes [`FALLBACK_RESPONSE`] so the chat surface stays available.
    pub async fn respond(&self, user_message: &str, context: &[SimilarityResult]) -> String {
        let block = build_context_block(context);
        match self
            .generator
            .generate(SYSTEM_PROMPT, &block, user_message)
            .await
        {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "generation backend unavailable, returning fallback");
                FALLBACK_RESPONSE.to_string()
            }
        }
    }
}

/// Format ranked jobs into the text block supplied to the generator.
///
/// Entries keep their ranking order; descriptions are cut to the first
/// [`DESCRIPTION_EXCERPT_CHARS`] characters.
pub fn build_context_block(jobs: &[SimilarityResult]) -> String {
    if jobs.is_empty() {
        return String::new();
    }

    let mut block = String::from("Relevant job opportunities:\n");
    for (i, job) in jobs.iter().enumerate() {
        block.push_str(&format!(
            "{}. {} at {}\n   Location: {}\n   Work Type: {}\n   Salary: {}\n   Link: {}\n   Description: {}\n",
            i + 1,
            job.title,
            job.company,
            job.location,
            job.work_type,
            job.salary,
            job.link,
            excerpt(&job.description, DESCRIPTION_EXCERPT_CHARS),
        ));
    }
    block
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let mut chars = text.char_indices();
    match chars.nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RagError, Result};
    use async_trait::async_trait;

    struct CannedGenerator(&'static str);

    #[async_trait]
    impl Generator for CannedGenerator {
        async fn generate(&self, _system: &str, _context: &str, _msg: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl Generator for FailingGenerator {
        async fn generate(&self, _system: &str, _context: &str, _msg: &str) -> Result<String> {
            Err(RagError::GenerationUnavailable("boom".to_string()))
        }
    }

    fn result(title: &str, description: &str) -> SimilarityResult {
        SimilarityResult {
            id: 1,
            title: title.to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            work_type: "Full-time".to_string(),
            salary: "$100k".to_string(),
            link: "https://example.com/job".to_string(),
            description: description.to_string(),
            requirements: String::new(),
            similarity: 0.9,
        }
    }

    #[test]
    fn test_context_block_lists_jobs_in_rank_order() {
        let jobs = vec![
            result("Backend Engineer", "Build APIs"),
            result("Data Analyst", "SQL reporting"),
        ];
        let block = build_context_block(&jobs);
        assert!(block.starts_with("Relevant job opportunities:"));
        assert!(block.contains("1. Backend Engineer at Acme"));
        assert!(block.contains("2. Data Analyst at Acme"));
        assert!(block.contains("Location: Remote"));
        assert!(block.contains("Link: https://example.com/job"));
        let first = block.find("Backend Engineer").unwrap();
        let second = block.find("Data Analyst").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_context_block_empty_for_no_jobs() {
        assert_eq!(build_context_block(&[]), "");
    }

    #[test]
    fn test_long_descriptions_are_truncated() {
        let long = "x".repeat(500);
        let jobs = vec![result("Backend Engineer", &long)];
        let block = build_context_block(&jobs);
        assert!(block.contains(&format!("{}...", "x".repeat(200))));
        assert!(!block.contains(&"x".repeat(201)));
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let text = "é".repeat(300);
        let cut = excerpt(&text, 200);
        assert_eq!(cut.chars().count(), 203); // 200 chars + "..."
        assert!(cut.ends_with("..."));

        let short = excerpt("short text", 200);
        assert_eq!(short, "short text");
    }

    #[tokio::test]
    async fn test_respond_returns_generator_output() {
        let composer = Composer::new(Arc::new(CannedGenerator("apply to Acme")));
        let reply = composer.respond("any advice?", &[]).await;
        assert_eq!(reply, "apply to Acme");
    }

    #[tokio::test]
    async fn test_respond_falls_back_when_unavailable() {
        let composer = Composer::new(Arc::new(FailingGenerator));
        let reply = composer
            .respond("any advice?", &[result("Backend Engineer", "APIs")])
            .await;
        assert_eq!(reply, FALLBACK_RESPONSE);
    }
}
