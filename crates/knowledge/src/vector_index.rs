//! Vector index abstraction for book passages.
//!
//! Defines a trait for provider-agnostic collection management and
//! similarity search. Passages are written by an external ingestion job;
//! this crate only reads them.

use async_trait::async_trait;
use bookchat_core::AppResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{info, warn};

/// Similarity metric of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distance {
    Cosine,
    Dot,
    Euclid,
    Manhattan,
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Distance::Cosine => "Cosine",
            Distance::Dot => "Dot",
            Distance::Euclid => "Euclid",
            Distance::Manhattan => "Manhattan",
        };
        f.write_str(name)
    }
}

/// Vector configuration of an existing collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionInfo {
    pub name: String,
    pub dimension: usize,
    pub distance: Distance,
    pub points_count: Option<u64>,
}

/// Outcome of [`VectorIndex::ensure_collection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionStatus {
    /// The collection did not exist and was created
    Created,
    /// The collection already existed and was left untouched
    Existing,
}

/// A stored passage returned by a similarity query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPassage {
    pub id: String,
    pub score: f32,
    pub payload: Map<String, Value>,
}

impl ScoredPassage {
    /// The passage's `text` payload field, or `""` when absent or not a string.
    pub fn text(&self) -> &str {
        self.payload
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

/// Trait for vector store backends.
///
/// Implementations hold only shared client handles so one instance can serve
/// concurrent requests.
#[async_trait]
pub trait VectorIndex: Send + Sync + fmt::Debug {
    /// Names of every collection in the store.
    async fn collection_names(&self) -> AppResult<Vec<String>>;

    /// Vector configuration of one collection.
    async fn collection_info(&self, name: &str) -> AppResult<CollectionInfo>;

    /// Create a collection. Fails if it already exists.
    async fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        distance: Distance,
    ) -> AppResult<()>;

    /// Up to `limit` passages ranked by similarity, most similar first.
    ///
    /// A missing or empty collection, or an unreachable store, yields an
    /// empty list. Other failures (such as a dimension mismatch) are errors,
    /// which `Retriever::search` in turn degrades to no passages.
    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> AppResult<Vec<ScoredPassage>>;

    /// Create the collection with cosine distance unless it already exists.
    ///
    /// An existing collection is never altered. If its dimension differs
    /// from `dimension`, a warning is logged and queries against it will
    /// fail until the embedding model or collection is fixed.
    async fn ensure_collection(&self, name: &str, dimension: usize) -> AppResult<CollectionStatus> {
        let names = self.collection_names().await?;

        if !names.iter().any(|n| n == name) {
            self.create_collection(name, dimension, Distance::Cosine)
                .await?;
            info!(
                "Created collection '{}' ({} dims, {})",
                name,
                dimension,
                Distance::Cosine
            );
            return Ok(CollectionStatus::Created);
        }

        match self.collection_info(name).await {
            Ok(info) if info.dimension != dimension => {
                warn!(
                    "Collection '{}' has {} dimensions but the embedder produces {}; leaving it unchanged",
                    name, info.dimension, dimension
                );
            }
            Ok(info) => {
                info!(
                    "Using existing collection '{}' ({} dims, {} points)",
                    name,
                    info.dimension,
                    info.points_count
                        .map_or_else(|| "unknown".to_string(), |c| c.to_string())
                );
            }
            Err(e) => {
                warn!("Could not inspect collection '{}': {}", name, e);
            }
        }

        Ok(CollectionStatus::Existing)
    }
}
