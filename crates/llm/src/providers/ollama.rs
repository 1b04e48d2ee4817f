//! Ollama completion client.
//!
//! Local alternative to Gemini for offline development, using the
//! non-streaming `/api/generate` endpoint.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use bookchat_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "SamplingOptions::is_unset")]
    options: SamplingOptions,
    stream: bool,
}

/// Sampling overrides; omitted entirely when none are set.
#[derive(Debug, Default, Serialize, PartialEq)]
struct SamplingOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

impl SamplingOptions {
    fn from_request(request: &LlmRequest) -> Self {
        Self {
            temperature: request.temperature,
            num_predict: request.max_tokens,
        }
    }

    fn is_unset(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    model: String,
    response: String,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

/// Ollama completion client.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Client for a local Ollama on the default port.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn generate_request<'a>(&self, request: &'a LlmRequest) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            options: SamplingOptions::from_request(request),
            stream: false,
        }
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(model = %request.model, "Ollama generate");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&self.generate_request(request))
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Ollama unreachable at {}: {}", self.base_url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<OllamaError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(AppError::Llm(format!("Ollama returned {}: {}", status, detail)));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Unexpected Ollama response: {}", e)))?;

        Ok(LlmResponse {
            content: body.response,
            model: body.model,
            usage: LlmUsage::new(body.prompt_eval_count, body.eval_count),
        })
    }
}
