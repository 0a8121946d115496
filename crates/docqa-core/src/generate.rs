//! Grounded generation: prompt construction and the completion trait.
//!
//! [`Generator`] formats a prompt that restricts the model to the retrieved
//! context and hands it to a [`CompletionProvider`] under deterministic
//! sampling. The completion text is returned as-is; refusal handling is the
//! answer gate's job.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::REFUSAL_SENTENCE;

/// Default output budget for one answer.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1800;

/// Sampling parameters passed to the completion backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

/// A text completion backend.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"gemini-2.5-flash-lite"`).
    fn model_name(&self) -> &str;

    /// Complete `prompt`. Errors are returned to the caller unchanged; no
    /// retry is attempted.
    async fn complete(&self, prompt: &str, sampling: &SamplingConfig) -> Result<String>;
}

/// Build the document-grounded prompt for `query` over `context`.
pub fn build_prompt(query: &str, context: &str) -> String {
    format!(
        r#"
You are a strict document-based assistant.

Answer ONLY from the given context.
If not found, say exactly:
"{refusal}"

Do not use outside knowledge.
Do not hallucinate.

Context:
{context}

Question:
{query}
"#,
        refusal = REFUSAL_SENTENCE,
        context = context,
        query = query,
    )
}

/// Produces answers from retrieved context.
pub struct Generator {
    provider: Arc<dyn CompletionProvider>,
    sampling: SamplingConfig,
}

impl Generator {
    pub fn new(provider: Arc<dyn CompletionProvider>, sampling: SamplingConfig) -> Self {
        Self { provider, sampling }
    }

    pub fn sampling(&self) -> &SamplingConfig {
        &self.sampling
    }

    /// Ask the model to answer `query` from `context` only.
    pub async fn generate(&self, query: &str, context: &str) -> Result<String> {
        let prompt = build_prompt(query, context);
        tracing::debug!(
            model = self.provider.model_name(),
            prompt_chars = prompt.len(),
            "requesting completion"
        );
        self.provider.complete(&prompt, &self.sampling).await
    }
}
