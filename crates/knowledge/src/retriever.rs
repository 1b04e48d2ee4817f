//! Passage retrieval: embed the question, then search the collection.

use crate::embeddings::EmbeddingProvider;
use crate::vector_index::VectorIndex;
use bookchat_core::AppResult;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Retrieves passage texts for a question, most similar first.
#[derive(Debug, Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    collection: String,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            index,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Search, surfacing embedding and index failures.
    ///
    /// Passages without a `text` payload contribute an empty string.
    pub async fn try_search(&self, query: &str, top_k: usize) -> AppResult<Vec<String>> {
        let vector = self.embedder.embed(query).await?;
        let passages = self
            .index
            .query(&self.collection, &vector, top_k)
            .await?;

        debug!(
            "Retrieved {} passages (best score: {:?})",
            passages.len(),
            passages.first().map(|p| p.score)
        );

        Ok(passages.iter().map(|p| p.text().to_string()).collect())
    }

    /// Search, degrading any failure to an empty result.
    #[instrument(skip(self, query), fields(collection = %self.collection))]
    pub async fn search(&self, query: &str, top_k: usize) -> Vec<String> {
        match self.try_search(query, top_k).await {
            Ok(texts) => texts,
            Err(e) => {
                warn!("Retrieval failed, continuing without context: {}", e);
                Vec::new()
            }
        }
    }
}
