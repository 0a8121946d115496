//! TOML configuration.
//!
//! Every section is optional; missing values fall back to the defaults
//! below, except the two provider lines marked otherwise. [`load_config`]
//! parses and validates a file.
//!
//! ```toml
//! [index]
//! path = "./data/docqa.sqlite"
//!
//! [ingest]
//! upload_dir = "./uploads"
//! chunk_size = 600
//! replace_existing = true
//!
//! [retrieval]
//! top_k = 3
//!
//! [embedding]
//! provider = "local"            # not the default ("disabled"); openai | ollama | local
//! model = "all-minilm-l6-v2"
//!
//! [generation]
//! provider = "gemini"           # not the default ("disabled"); gemini | openai | ollama
//! model = "gemini-2.5-flash-lite"
//! temperature = 0.0
//! max_output_tokens = 1800
//! timeout_secs = 60
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use docqa_core::chunk::DEFAULT_CHUNK_SIZE;
use docqa_core::generate::{SamplingConfig, DEFAULT_MAX_OUTPUT_TOKENS};
use docqa_core::index::DEFAULT_EMBED_BATCH;
use docqa_core::retrieve::DEFAULT_TOP_K;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_index_path")]
    pub path: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
        }
    }
}

fn default_index_path() -> PathBuf {
    PathBuf::from("./data/docqa.sqlite")
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Delete a document's previous records before indexing it again.
    #[serde(default = "default_replace_existing")]
    pub replace_existing: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            chunk_size: default_chunk_size(),
            replace_existing: default_replace_existing(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}
fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_replace_existing() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_disabled")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL override (Ollama).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_disabled(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_embedding_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_disabled() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    DEFAULT_EMBED_BATCH
}
fn default_max_retries() -> u32 {
    5
}
fn default_embedding_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_disabled")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Base URL override (OpenAI-compatible servers, Ollama, Gemini proxies).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_disabled(),
            model: None,
            url: None,
            temperature: 0.0,
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

impl GenerationConfig {
    pub fn sampling(&self) -> SamplingConfig {
        SamplingConfig {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

fn default_max_output_tokens() -> u32 {
    DEFAULT_MAX_OUTPUT_TOKENS
}
fn default_generation_timeout_secs() -> u64 {
    60
}

/// Parse a config from TOML text and validate it.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

fn validate(config: &Config) -> Result<()> {
    if config.ingest.chunk_size == 0 {
        anyhow::bail!("ingest.chunk_size must be > 0");
    }

    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    match config.embedding.provider.as_str() {
        "disabled" | "local" => {}
        "openai" | "ollama" => {
            if config.embedding.model.is_none() {
                anyhow::bail!(
                    "embedding.model must be specified when provider is '{}'",
                    config.embedding.provider
                );
            }
            if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
                anyhow::bail!(
                    "embedding.dims must be > 0 when provider is '{}'",
                    config.embedding.provider
                );
            }
        }
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, ollama, or local.",
            other
        ),
    }

    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }

    match config.generation.provider.as_str() {
        "disabled" | "gemini" => {}
        "openai" | "ollama" => {
            if config.generation.model.is_none() {
                anyhow::bail!(
                    "generation.model must be specified when provider is '{}'",
                    config.generation.provider
                );
            }
        }
        other => anyhow::bail!(
            "Unknown generation provider: '{}'. Must be disabled, gemini, openai, or ollama.",
            other
        ),
    }

    if config.generation.max_output_tokens == 0 {
        anyhow::bail!("generation.max_output_tokens must be > 0");
    }

    if !(0.0..=2.0).contains(&config.generation.temperature) {
        anyhow::bail!("generation.temperature must be in [0.0, 2.0]");
    }

    if config.generation.timeout_secs == 0 {
        anyhow::bail!("generation.timeout_secs must be > 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.index.path, PathBuf::from("./data/docqa.sqlite"));
        assert_eq!(config.ingest.upload_dir, PathBuf::from("./uploads"));
        assert_eq!(config.ingest.chunk_size, 600);
        assert!(config.ingest.replace_existing);
        assert_eq!(config.retrieval.top_k, 3);
        assert!(!config.embedding.is_enabled());
        assert_eq!(config.embedding.provider, "disabled");
        assert_eq!(config.generation.provider, "disabled");
        assert_eq!(config.generation.sampling(), SamplingConfig::default());
    }

    #[test]
    fn sections_override_defaults() {
        let config = parse_config(
            r#"
            [ingest]
            chunk_size = 200
            replace_existing = false

            [retrieval]
            top_k = 5

            [generation]
            provider = "gemini"
            max_output_tokens = 512
            "#,
        )
        .unwrap();
        assert_eq!(config.ingest.chunk_size, 200);
        assert!(!config.ingest.replace_existing);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.generation.provider, "gemini");
        assert_eq!(config.generation.max_output_tokens, 512);
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let err = parse_config("[ingest]\nchunk_size = 0").unwrap_err();
        assert!(err.to_string().contains("chunk_size"));
    }

    #[test]
    fn zero_top_k_rejected() {
        let err = parse_config("[retrieval]\ntop_k = 0").unwrap_err();
        assert!(err.to_string().contains("top_k"));
    }

    #[test]
    fn unknown_providers_rejected() {
        assert!(parse_config("[embedding]\nprovider = \"magic\"").is_err());
        assert!(parse_config("[generation]\nprovider = \"magic\"").is_err());
    }

    #[test]
    fn openai_embedding_requires_model_and_dims() {
        assert!(parse_config("[embedding]\nprovider = \"openai\"").is_err());
        assert!(parse_config(
            "[embedding]\nprovider = \"openai\"\nmodel = \"text-embedding-3-small\"\ndims = 1536"
        )
        .is_ok());
    }

    #[test]
    fn temperature_out_of_range_rejected() {
        assert!(parse_config("[generation]\ntemperature = 3.5").is_err());
    }
}
