//! Provider-agnostic completion request, response and client trait.

use bookchat_core::AppResult;
use serde::Serialize;

/// One non-streaming completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmRequest {
    /// User message
    pub prompt: String,
    /// Provider model identifier, e.g. `gemini-2.0-flash`
    pub model: String,
    /// Instruction sent as a system message, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature, 0.0 to 2.0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl LlmRequest {
    /// Request with provider defaults for every sampling setting.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            system: None,
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Text returned by the model, untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmResponse {
    pub content: String,
    /// Model that actually answered (may differ from the requested alias)
    pub model: String,
    pub usage: LlmUsage,
}

/// Token accounting as reported by the provider; zero when not reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl LlmUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Trait for LLM providers.
///
/// Implementations hold only immutable client handles so a single instance
/// can serve concurrent requests.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider name, e.g. "gemini" or "ollama".
    fn provider_name(&self) -> &str;

    /// Run one completion. Transport, quota and safety-block failures are
    /// all `AppError::Llm`.
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;
}
