//! Qdrant-backed vector index over the REST API.
//!
//! Only the four calls the engine needs are implemented: list collections,
//! inspect one, create one, and search it.

use crate::vector_index::{CollectionInfo, Distance, ScoredPassage, VectorIndex};
use async_trait::async_trait;
use bookchat_core::{AppError, AppResult};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Qdrant REST client.
#[derive(Debug, Clone)]
pub struct QdrantIndex {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

/// Standard Qdrant response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    status: ErrorStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorStatus {
    error: String,
}

#[derive(Debug, Deserialize)]
struct CollectionList {
    collections: Vec<CollectionName>,
}

#[derive(Debug, Deserialize)]
struct CollectionName {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CollectionDetails {
    #[serde(default)]
    points_count: Option<u64>,
    config: CollectionConfig,
}

#[derive(Debug, Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Debug, Deserialize)]
struct CollectionParams {
    vectors: VectorsConfig,
}

/// Unnamed vectors carry `size` directly; named vectors are a map of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VectorsConfig {
    Single(VectorParams),
    Named(std::collections::BTreeMap<String, VectorParams>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VectorParams {
    size: usize,
    distance: Distance,
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest {
    vectors: VectorParams,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: Value,
    score: f32,
    #[serde(default)]
    payload: Option<Map<String, Value>>,
}

impl QdrantIndex {
    /// Create a client for the Qdrant instance at `url`.
    ///
    /// # Errors
    /// * `AppError::Config` - If `url` is not an http(s) base URL
    /// * `AppError::Retrieval` - If the HTTP client cannot be built
    pub fn new(url: &str, api_key: Option<&str>) -> AppResult<Self> {
        let base_url = Url::parse(url)
            .map_err(|e| AppError::Config(format!("Invalid Qdrant URL '{}': {}", url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "Invalid Qdrant URL '{}': not a base URL",
                url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Retrieval(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key
                .filter(|k| !k.trim().is_empty())
                .map(str::to_string),
        })
    }

    /// Endpoint under the base URL; each segment is percent-encoded.
    fn url(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                AppError::Config(format!("Invalid Qdrant URL '{}': not a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("api-key", key),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, action: &str) -> AppResult<Response> {
        self.authorize(request)
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to {}: {}", action, e)))
    }

    async fn decode<T: DeserializeOwned>(response: Response, action: &str) -> AppResult<T> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.status.error)
                .unwrap_or(body);
            return Err(AppError::Retrieval(format!(
                "Failed to {} ({}): {}",
                action, status, detail
            )));
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            AppError::Retrieval(format!("Failed to parse response to {}: {}", action, e))
        })?;

        Ok(envelope.result)
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn collection_names(&self) -> AppResult<Vec<String>> {
        let action = "list collections";
        let response = self
            .send(self.client.get(self.url(&["collections"])?), action)
            .await?;
        let list: CollectionList = Self::decode(response, action).await?;

        Ok(list.collections.into_iter().map(|c| c.name).collect())
    }

    async fn collection_info(&self, name: &str) -> AppResult<CollectionInfo> {
        let action = "describe collection";
        let response = self
            .send(
                self.client.get(self.url(&["collections", name])?),
                action,
            )
            .await?;
        let details: CollectionDetails = Self::decode(response, action).await?;

        let params = match details.config.params.vectors {
            VectorsConfig::Single(params) => params,
            VectorsConfig::Named(named) => named.into_values().next().ok_or_else(|| {
                AppError::Retrieval(format!("Collection '{}' has no vector configuration", name))
            })?,
        };

        Ok(CollectionInfo {
            name: name.to_string(),
            dimension: params.size,
            distance: params.distance,
            points_count: details.points_count,
        })
    }

    #[instrument(skip(self))]
    async fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        distance: Distance,
    ) -> AppResult<()> {
        let action = "create collection";
        let body = CreateCollectionRequest {
            vectors: VectorParams {
                size: dimension,
                distance,
            },
        };
        let response = self
            .send(
                self.client
                    .put(self.url(&["collections", name])?)
                    .json(&body),
                action,
            )
            .await?;
        let _: Value = Self::decode(response, action).await?;

        Ok(())
    }

    #[instrument(skip(self, vector), fields(dims = vector.len()))]
    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> AppResult<Vec<ScoredPassage>> {
        let action = "search collection";
        let request = self
            .client
            .post(self.url(&["collections", collection, "points", "search"])?)
            .json(&SearchRequest {
                vector,
                limit,
                with_payload: true,
            });

        let response = match self.send(request, action).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Qdrant unreachable, no passages: {}", e);
                return Ok(vec![]);
            }
        };

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Collection '{}' not found; no passages", collection);
            return Ok(vec![]);
        }

        let hits: Vec<SearchHit> = Self::decode(response, action).await?;
        debug!("Search returned {} hits", hits.len());

        Ok(hits
            .into_iter()
            .map(|hit| ScoredPassage {
                id: match hit.id {
                    Value::String(s) => s,
                    other => other.to_string(),
                },
                score: hit.score,
                payload: hit.payload.unwrap_or_default(),
            })
            .collect())
    }
}
