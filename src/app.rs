//! Application context
//!
//! Capabilities (embedder, generator) are constructed once at startup and
//! injected explicitly; there are no ambient singletons, so tests can
//! substitute doubles for any seam.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::compose::Composer;
use crate::config::Config;
use crate::error::Result;
use crate::generation::{DisabledGenerator, Generator, OpenAiGenerator};
use crate::search::{Embedder, HashEmbedder, JobRanker};
use crate::storage::JobStore;

pub struct AppContext {
    pub config: Config,
    pub store: Arc<JobStore>,
    pub ranker: Arc<JobRanker>,
    pub composer: Arc<Composer>,
    pub generation_enabled: bool,
}

impl AppContext {
    /// Build the context with capabilities resolved from config and env.
    ///
    /// Without an API key in the configured env var the service still
    /// starts; chat answers degrade to the fallback response.
    pub fn from_config(config: Config) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(config.embedding.dim));

        let api_key = std::env::var(&config.generation.api_key_env).unwrap_or_default();
        let (generator, generation_enabled): (Arc<dyn Generator>, bool) =
            if api_key.trim().is_empty() {
                warn!(
                    key_env = %config.generation.api_key_env,
                    "no generation API key set, chat will return the fallback response"
                );
                (Arc::new(DisabledGenerator), false)
            } else {
                let settings = &config.generation;
                (
                    Arc::new(OpenAiGenerator::new(
                        &api_key,
                        &settings.base_url,
                        &settings.model,
                        Duration::from_secs(settings.timeout_secs),
                        settings.max_retries,
                        settings.max_tokens,
                        settings.temperature,
                    )?),
                    true,
                )
            };

        Self::with_capabilities(config, embedder, generator, generation_enabled)
    }

    /// Build the context around explicitly provided capabilities
    pub fn with_capabilities(
        config: Config,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        generation_enabled: bool,
    ) -> Result<Self> {
        let store = Arc::new(JobStore::open(&config.database.path, embedder.clone())?);
        let ranker = Arc::new(JobRanker::new(store.clone(), embedder));
        let composer = Arc::new(Composer::new(generator));

        Ok(Self {
            config,
            store,
            ranker,
            composer,
            generation_enabled,
        })
    }
}
