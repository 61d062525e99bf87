//! Text generation capability and its OpenAI-backed implementation
//!
//! The rest of the service only sees the `TextGenerator` trait. A concrete
//! client is built once at startup and handed down explicitly; there is no
//! process-wide model handle.

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::openai;

use crate::service::assessment::prompts::QUESTION_SYSTEM_PROMPT;

/// Default model for question generation
pub const DEFAULT_MODEL: &str = openai::GPT_4O_MINI;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("LLM generation failed: {0}")]
    Failed(String),
}

/// Opaque text generation: prompt in, raw untrusted text out
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Identifier of the backing model, used in logs and cache keys
    fn model_id(&self) -> &str;

    /// Generate raw text for a prompt, capped at `max_tokens` output tokens
    async fn generate(&self, prompt: &str, max_tokens: u64) -> Result<String, GenerationError>;
}

/// Shared LLM client wrapper
#[derive(Clone)]
pub struct LlmClient {
    client: openai::Client,
    model: String,
}

impl LlmClient {
    /// Create a new LLM client with the provided API key and model name
    pub fn new(api_key: &str, model: impl Into<String>) -> Result<Self, String> {
        let client = openai::Client::new(api_key)
            .map_err(|e| format!("Failed to create OpenAI client: {}", e))?;

        Ok(Self {
            client,
            model: model.into(),
        })
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, max_tokens: u64) -> Result<String, GenerationError> {
        let agent = self
            .client
            .agent(&self.model)
            .preamble(QUESTION_SYSTEM_PROMPT)
            .max_tokens(max_tokens)
            .build();

        agent
            .prompt(prompt)
            .await
            .map_err(|e| GenerationError::Failed(e.to_string()))
    }
}
