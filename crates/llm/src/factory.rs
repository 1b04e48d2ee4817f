//! LLM provider factory.
//!
//! Resolves a provider name from configuration into a shared client handle.

use crate::client::LlmClient;
use crate::providers::{GeminiClient, OllamaClient};
use crate::types::ProviderType;
use bookchat_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("gemini", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key (required by Gemini)
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or its API key is
/// missing, and `AppError::Llm` if the HTTP client cannot be built.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider).ok_or_else(|| {
        AppError::Config(format!(
            "Unknown LLM provider: {}. Supported: gemini, ollama",
            provider
        ))
    })?;

    let api_key = api_key.filter(|k| !k.trim().is_empty());
    if provider_type.requires_api_key() && api_key.is_none() {
        return Err(AppError::Config(format!(
            "{} provider requires an API key",
            provider_type.as_str()
        )));
    }

    tracing::debug!("Creating {} LLM client", provider_type.as_str());

    match provider_type {
        ProviderType::Gemini => {
            let key = api_key.unwrap_or_default();
            let client = match endpoint {
                Some(url) => GeminiClient::with_base_url(key, url)?,
                None => GeminiClient::new(key)?,
            };
            Ok(Arc::new(client))
        }
        ProviderType::Ollama => {
            let base_url = endpoint.unwrap_or("http://localhost:11434");
            Ok(Arc::new(OllamaClient::with_base_url(base_url)))
        }
    }
}
