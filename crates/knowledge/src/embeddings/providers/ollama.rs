//! Ollama Embedding Provider
//!
//! Provides sentence embeddings via Ollama's local API using models like
//! `all-minilm` (384-dim) or `nomic-embed-text` (768-dim).
//!
//! # Features
//! - Batch embedding through `/api/embed`
//! - Automatic retry with exponential backoff
//! - Dimension check on every returned vector
//!
//! # Example
//! ```no_run
//! use bookchat_knowledge::embeddings::{EmbeddingConfig, EmbeddingProvider, OllamaProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OllamaProvider::new(EmbeddingConfig::default()).await?;
//! let embedding = provider.embed("What is inverse kinematics?").await?;
//! assert_eq!(embedding.len(), 384);
//! # Ok(())
//! # }
//! ```

use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use async_trait::async_trait;
use bookchat_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const EMBED_ENDPOINT: &str = "/api/embed";

/// Maximum attempts for a failed request
const MAX_RETRIES: u32 = 3;

/// Initial backoff duration in milliseconds
const INITIAL_BACKOFF_MS: u64 = 100;

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Ollama embedding provider using local API
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    /// HTTP client for API requests
    client: Client,
    /// Ollama API base URL
    base_url: String,
    /// Model name (e.g., "all-minilm")
    model: String,
    /// Expected embedding dimensions
    dimensions: usize,
    /// Texts per request
    batch_size: usize,
    /// Attempts per request
    max_retries: u32,
}

/// Request payload for Ollama embed API
#[derive(Debug, Clone, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Response from Ollama embed API
#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Error response from Ollama API
#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    /// Create new Ollama provider with configuration.
    ///
    /// When neither the configuration nor the known-model table gives the
    /// dimensionality, one probe embedding is requested to learn it.
    ///
    /// # Errors
    /// * `AppError::Embedding` - If the HTTP client cannot be built or the probe fails
    pub async fn new(config: EmbeddingConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::Embedding(format!("Failed to create HTTP client for Ollama: {}", e))
            })?;

        let mut provider = Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimensions: config.resolved_dimensions().unwrap_or(0),
            batch_size: config.batch_size.max(1),
            max_retries: MAX_RETRIES,
        };

        if provider.dimensions == 0 {
            provider.dimensions = provider.probe_dimensions().await?;
            info!(
                "Model '{}' reports {} dimensions",
                provider.model, provider.dimensions
            );
        }

        Ok(provider)
    }

    /// Override the number of attempts per request.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    /// Embed a fixed probe text and report its length.
    async fn probe_dimensions(&self) -> AppResult<usize> {
        debug!("Probing dimensions of model '{}' at {}", self.model, self.base_url);

        let embeddings = self
            .embed_with_retries(&["dimension probe".to_string()])
            .await
            .map_err(|e| {
                AppError::Embedding(format!(
                    "Ollama not available at {} ({}). Ensure Ollama is running and run: ollama pull {}",
                    self.base_url, e, self.model
                ))
            })?;

        match embeddings.first().map(Vec::len) {
            Some(len) if len > 0 => Ok(len),
            _ => Err(AppError::Embedding(format!(
                "Model '{}' returned an empty embedding",
                self.model
            ))),
        }
    }

    /// Embed a batch with retry logic
    #[instrument(skip(self, texts), fields(batch = texts.len(), model = %self.model))]
    async fn embed_with_retries(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt < self.max_retries {
            match self.embed_request(texts).await {
                Ok(embeddings) => return Ok(embeddings),
                Err(e) => {
                    attempt += 1;
                    last_error = Some(e);

                    if attempt < self.max_retries {
                        let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt);
                        warn!(
                            "Embedding failed (attempt {}/{}), retrying in {}ms",
                            attempt, self.max_retries, backoff_ms
                        );
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AppError::Embedding("Unknown embedding error".to_string())))
    }

    /// Single request to the embed endpoint (no retries)
    async fn embed_request(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let url = format!("{}{}", self.base_url, EMBED_ENDPOINT);

        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to send request to Ollama: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let detail = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|e| e.error)
                .unwrap_or(error_text);

            return Err(AppError::Embedding(format!(
                "Ollama API error ({}): {}",
                status, detail
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse Ollama response: {}", e)))?;

        if body.embeddings.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "Ollama returned {} embeddings for {} inputs",
                body.embeddings.len(),
                texts.len()
            )));
        }

        Ok(body.embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "ollama", model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        if let Some(i) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(AppError::Embedding(format!(
                "Cannot embed empty text (index {})",
                i
            )));
        }

        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            for embedding in self.embed_with_retries(batch).await? {
                if embedding.len() != self.dimensions {
                    return Err(AppError::Embedding(format!(
                        "Unexpected embedding dimensions from '{}': got {}, expected {}",
                        self.model,
                        embedding.len(),
                        self.dimensions
                    )));
                }
                embeddings.push(embedding);
            }
        }

        debug!("Generated {} embeddings", embeddings.len());

        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, dimensions: Option<usize>) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "ollama".to_string(),
            model: "all-minilm".to_string(),
            endpoint: server.uri(),
            dimensions,
            batch_size: 2,
        }
    }

    #[tokio::test]
    async fn test_embed_single() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .and(body_partial_json(serde_json::json!({
                "model": "all-minilm",
                "input": ["Robots use PID control."]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "all-minilm",
                "embeddings": [[0.1, 0.2, 0.3]]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(config_for(&server, Some(3))).await.unwrap();
        let embedding = provider.embed("Robots use PID control.").await.unwrap();

        assert_eq!(embedding, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_batches_are_split() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[1.0, 0.0], [0.0, 1.0]]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(config_for(&server, Some(2))).await.unwrap();
        let texts: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let embeddings = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(embeddings.len(), 4);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[0.5, 0.5]]
            })))
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(config_for(&server, Some(384))).await.unwrap();
        let err = provider.embed("hello").await.unwrap_err();

        assert!(matches!(err, AppError::Embedding(_)));
        assert!(err.to_string().contains("expected 384"));
    }

    #[tokio::test]
    async fn test_probe_learns_dimensions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[0.0, 0.0, 0.0, 0.0, 1.0]]
            })))
            .mount(&server)
            .await;

        let config = EmbeddingConfig {
            model: "custom-embedder".to_string(),
            ..config_for(&server, None)
        };
        let provider = OllamaProvider::new(config).await.unwrap();
        assert_eq!(provider.dimensions(), 5);
    }

    #[tokio::test]
    async fn test_server_error_is_surfaced_after_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": "model \"all-minilm\" not found, try pulling it first"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(config_for(&server, Some(384)))
            .await
            .unwrap()
            .with_max_retries(2);
        let err = provider.embed("hello").await.unwrap_err();

        assert!(err.to_string().contains("not found, try pulling it first"));
    }

    #[tokio::test]
    async fn test_empty_text_rejected_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(config_for(&server, Some(384))).await.unwrap();
        assert!(provider.embed("   ").await.is_err());
    }
}
