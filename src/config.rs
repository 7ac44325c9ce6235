//! Configuration
//!
//! Defaults, overridden by an optional TOML file, overridden by
//! environment variables. Every section is optional in the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to (host:port)
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5001".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file for jobs and chat history
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = dirs::data_dir()
            .map(|dir| dir.join("jobrag/jobs.db"))
            .unwrap_or_else(|| PathBuf::from("jobrag.db"));
        Self { path }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding dimension; changing it strands previously stored vectors
    pub dim: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { dim: 384 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL for OpenAI-compatible endpoints
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Seconds before a generation request times out
    pub timeout_secs: u64,
    /// Retry attempts for transient generation errors
    pub max_retries: usize,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
            max_retries: 3,
            max_tokens: 500,
            temperature: 0.7,
        }
    }
}

impl Config {
    /// Load configuration, merging an optional TOML file over defaults and
    /// environment overrides over that.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("JOBRAG_CONFIG").ok().map(PathBuf::from))
            .or_else(default_config_path);

        let mut config = match path {
            Some(ref path) if path.exists() => Self::load_file(path)?,
            _ => Self::default(),
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| RagError::Config(format!("read config {}: {err}", path.display())))?;
        toml::from_str(&raw)
            .map_err(|err| RagError::Config(format!("parse config {}: {err}", path.display())))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(bind) = std::env::var("JOBRAG_BIND") {
            self.server.bind = bind;
        }
        if let Ok(path) = std::env::var("JOBRAG_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Ok(dim) = std::env::var("JOBRAG_EMBEDDING_DIM") {
            self.embedding.dim = dim.parse().map_err(|_| {
                RagError::Config(format!("JOBRAG_EMBEDDING_DIM is not a number: {dim}"))
            })?;
        }
        if let Ok(url) = std::env::var("JOBRAG_GENERATION_BASE_URL") {
            self.generation.base_url = url;
        }
        if let Ok(model) = std::env::var("JOBRAG_GENERATION_MODEL") {
            self.generation.model = model;
        }
        Ok(())
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("jobrag/config.toml"))
}
