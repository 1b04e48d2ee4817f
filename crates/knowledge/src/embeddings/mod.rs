//! Embedding engine for book passages and questions.
//!
//! Provides provider-agnostic embedding generation. The active provider is
//! built once at engine startup and shared across requests.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::{known_dimensions, EmbeddingConfig};
pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{OllamaProvider, TrigramProvider};
