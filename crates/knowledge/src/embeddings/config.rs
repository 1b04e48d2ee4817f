//! Embedding configuration types.

use bookchat_core::AppConfig;
use serde::{Deserialize, Serialize};

/// Embedding configuration for the active collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "ollama" or "trigram"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Base URL of the embedding service
    pub endpoint: String,

    /// Embedding vector dimensions; resolved from the model when unset
    #[serde(default)]
    pub dimensions: Option<usize>,

    /// Maximum batch size for embedding requests
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    32
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: bookchat_core::config::DEFAULT_EMBEDDING_MODEL.to_string(),
            endpoint: "http://localhost:11434".to_string(),
            dimensions: None,
            batch_size: default_batch_size(),
        }
    }
}

impl EmbeddingConfig {
    /// Extract the embedding settings from the application config.
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            provider: config.embedding_provider.clone(),
            model: config.embedding_model.clone(),
            endpoint: config.embedding_endpoint.clone(),
            dimensions: config.embedding_dimensions,
            batch_size: default_batch_size(),
        }
    }

    /// Dimensions from configuration, falling back to the known-model table.
    pub fn resolved_dimensions(&self) -> Option<usize> {
        self.dimensions.or_else(|| known_dimensions(&self.model))
    }
}

/// Output dimensionality of common sentence-embedding models.
pub fn known_dimensions(model: &str) -> Option<usize> {
    // Ollama tags ("all-minilm:l6-v2") share the base model's size
    let base = model.split(':').next().unwrap_or(model).to_lowercase();
    let base = base.rsplit('/').next().unwrap_or(&base);

    match base {
        "all-minilm" | "all-minilm-l6-v2" | "paraphrase-multilingual" => Some(384),
        "trigram-v1" => Some(384),
        "nomic-embed-text" | "all-mpnet-base-v2" => Some(768),
        "mxbai-embed-large" | "bge-m3" | "bge-large" => Some(1024),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_dimensions() {
        assert_eq!(known_dimensions("all-minilm"), Some(384));
        assert_eq!(known_dimensions("all-minilm:l6-v2"), Some(384));
        assert_eq!(known_dimensions("sentence-transformers/all-MiniLM-L6-v2"), Some(384));
        assert_eq!(known_dimensions("nomic-embed-text"), Some(768));
        assert_eq!(known_dimensions("mxbai-embed-large:latest"), Some(1024));
        assert_eq!(known_dimensions("my-custom-model"), None);
    }

    #[test]
    fn test_explicit_dimensions_win() {
        let config = EmbeddingConfig {
            dimensions: Some(512),
            ..Default::default()
        };
        assert_eq!(config.resolved_dimensions(), Some(512));
        assert_eq!(EmbeddingConfig::default().resolved_dimensions(), Some(384));
    }

    #[test]
    fn test_from_app_config() {
        let mut app = AppConfig::default();
        app.embedding_provider = "trigram".to_string();
        app.embedding_dimensions = Some(64);

        let config = EmbeddingConfig::from_app_config(&app);
        assert_eq!(config.provider, "trigram");
        assert_eq!(config.model, "all-minilm");
        assert_eq!(config.dimensions, Some(64));
    }
}
