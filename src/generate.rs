//! Completion backends for answer generation.
//!
//! Implementations of [`docqa_core::generate::CompletionProvider`]:
//! - **[`GeminiProvider`]**: Google Generative Language API (`generateContent`).
//! - **[`OpenAIProvider`]**: OpenAI-compatible `/v1/chat/completions`.
//! - **[`OllamaProvider`]**: Ollama `/api/generate`.
//! - **[`DisabledProvider`]**: fails every call.
//!
//! Each call is a single request bounded by `generation.timeout_secs`. There is
//! no retry: a failed generation fails the question.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use docqa_core::generate::{CompletionProvider, SamplingConfig};

use crate::config::GenerationConfig;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-lite";
const GEMINI_DEFAULT_URL: &str = "https://generativelanguage.googleapis.com";
const OPENAI_DEFAULT_URL: &str = "https://api.openai.com";
const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation provider is disabled; set [generation] provider in the config")]
    Disabled,
    #[error("{var} environment variable not set")]
    MissingApiKey { var: &'static str },
    #[error("{provider} request failed: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} API error {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("{provider} returned no text")]
    EmptyResponse { provider: &'static str },
}

/// Build the completion provider named by `config.provider`.
pub fn create_completion_provider(
    config: &GenerationConfig,
) -> Result<Arc<dyn CompletionProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledProvider)),
        "gemini" => Ok(Arc::new(GeminiProvider::new(config)?)),
        "openai" => Ok(Arc::new(OpenAIProvider::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaProvider::new(config)?)),
        other => bail!("Unknown generation provider: {}", other),
    }
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

fn api_key(var: &'static str) -> Result<String, GenerationError> {
    std::env::var(var).map_err(|_| GenerationError::MissingApiKey { var })
}

fn base_url(config: &GenerationConfig, default: &str) -> String {
    config
        .url
        .as_deref()
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}

/// Send one request and decode the JSON body, mapping failures to
/// [`GenerationError`].
async fn send_json(
    provider: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<Value, GenerationError> {
    let http = |source| GenerationError::Http { provider, source };

    let response = request.send().await.map_err(http)?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GenerationError::Api {
            provider,
            status: status.as_u16(),
            body,
        });
    }
    response.json().await.map_err(http)
}

// ============ Disabled ============

pub struct DisabledProvider;

#[async_trait]
impl CompletionProvider for DisabledProvider {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _prompt: &str, _sampling: &SamplingConfig) -> Result<String> {
        Err(GenerationError::Disabled.into())
    }
}

// ============ Gemini ============

/// Gemini via `POST {url}/v1beta/models/{model}:generateContent`.
/// Reads the key from `GOOGLE_API_KEY` on each call, so a missing key only
/// fails questions that reach generation.
pub struct GeminiProvider {
    model: String,
    url: String,
    key_var: &'static str,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        Ok(Self {
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            url: base_url(config, GEMINI_DEFAULT_URL),
            key_var: "GOOGLE_API_KEY",
            client: http_client(config.timeout_secs)?,
        })
    }
}

fn gemini_body(prompt: &str, sampling: &SamplingConfig) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "temperature": sampling.temperature,
            "maxOutputTokens": sampling.max_output_tokens,
        }
    })
}

/// Concatenate the text parts of the first candidate.
fn parse_gemini_response(json: &Value) -> Result<String, GenerationError> {
    let text: String = json
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(GenerationError::EmptyResponse { provider: "Gemini" });
    }
    Ok(text)
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, sampling: &SamplingConfig) -> Result<String> {
        let key = api_key(self.key_var)?;
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            self.url, self.model
        );
        let request = self
            .client
            .post(endpoint)
            .header("x-goog-api-key", key)
            .json(&gemini_body(prompt, sampling));

        let json = send_json("Gemini", request).await?;
        Ok(parse_gemini_response(&json)?)
    }
}

// ============ OpenAI ============

/// OpenAI-compatible chat completions. Reads the key from `OPENAI_API_KEY`
/// on each call.
pub struct OpenAIProvider {
    model: String,
    url: String,
    key_var: &'static str,
    client: reqwest::Client,
}

impl OpenAIProvider {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("generation.model required for OpenAI provider"))?;
        Ok(Self {
            model,
            url: base_url(config, OPENAI_DEFAULT_URL),
            key_var: "OPENAI_API_KEY",
            client: http_client(config.timeout_secs)?,
        })
    }
}

fn parse_openai_response(json: &Value) -> Result<String, GenerationError> {
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .ok_or(GenerationError::EmptyResponse { provider: "OpenAI" })
}

#[async_trait]
impl CompletionProvider for OpenAIProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, sampling: &SamplingConfig) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": sampling.temperature,
            "max_tokens": sampling.max_output_tokens,
        });
        let key = api_key(self.key_var)?;
        let request = self
            .client
            .post(format!("{}/v1/chat/completions", self.url))
            .bearer_auth(key)
            .json(&body);

        let json = send_json("OpenAI", request).await?;
        Ok(parse_openai_response(&json)?)
    }
}

// ============ Ollama ============

/// Non-streaming `POST {url}/api/generate` against a local Ollama.
pub struct OllamaProvider {
    model: String,
    url: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("generation.model required for Ollama provider"))?;
        Ok(Self {
            model,
            url: base_url(config, OLLAMA_DEFAULT_URL),
            client: http_client(config.timeout_secs)?,
        })
    }
}

fn parse_ollama_response(json: &Value) -> Result<String, GenerationError> {
    json.get("response")
        .and_then(|r| r.as_str())
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .ok_or(GenerationError::EmptyResponse { provider: "Ollama" })
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, sampling: &SamplingConfig) -> Result<String> {
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": sampling.temperature,
                "num_predict": sampling.max_output_tokens,
            }
        });
        let request = self
            .client
            .post(format!("{}/api/generate", self.url))
            .json(&body);

        let json = send_json("Ollama", request).await?;
        Ok(parse_ollama_response(&json)?)
    }
}
