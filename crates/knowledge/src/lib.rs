//! Retrieval-augmented answering over the robotics book.
//!
//! Embeds the reader's question, retrieves the closest passages from a
//! Qdrant collection, and asks the LLM to answer from those passages only.
//!
//! # Example
//! ```no_run
//! use bookchat_core::AppConfig;
//! use bookchat_knowledge::RagEngine;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load(None)?;
//! let engine = RagEngine::initialize(&config).await?;
//! let answer = engine.answer("What does the I term of a PID loop do?", None).await;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

pub mod embeddings;
pub mod engine;
pub mod qdrant;
pub mod retriever;
pub mod synthesizer;
pub mod vector_index;

#[cfg(test)]
mod tests;

pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use engine::{EngineSettings, QueryContext, RagEngine};
pub use qdrant::QdrantIndex;
pub use retriever::Retriever;
pub use synthesizer::{synthesis_error_text, AnswerSynthesizer};
pub use vector_index::{CollectionInfo, CollectionStatus, Distance, ScoredPassage, VectorIndex};
