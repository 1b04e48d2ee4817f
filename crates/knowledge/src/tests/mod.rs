//! In-crate test doubles shared by the engine, retriever and synthesizer tests.

use crate::embeddings::EmbeddingProvider;
use crate::vector_index::{CollectionInfo, Distance, ScoredPassage, VectorIndex};
use async_trait::async_trait;
use bookchat_core::{AppError, AppResult};
use bookchat_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Collection {
    dimension: usize,
    points: Vec<(Vec<f32>, Map<String, Value>)>,
}

/// Cosine-similarity index kept in memory, counting the calls it receives.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    collections: Mutex<HashMap<String, Collection>>,
    queries: AtomicUsize,
    creates: AtomicUsize,
    fail_queries: bool,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `query` call fails; collection management still works.
    pub fn failing(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    /// Index with one passage per text, embedded by `embedder`.
    pub async fn seeded(
        embedder: &dyn EmbeddingProvider,
        collection: &str,
        texts: &[&str],
    ) -> Self {
        let index = Self::new();
        let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let vectors = embedder.embed_batch(&owned).await.unwrap();
        for (text, vector) in owned.iter().zip(vectors) {
            index.insert_raw(collection, vector, serde_json::json!({ "text": text }));
        }
        index
    }

    pub fn insert_raw(&self, collection: &str, vector: Vec<f32>, payload: Value) {
        let mut collections = self.collections.lock().unwrap();
        let entry = collections
            .entry(collection.to_string())
            .or_insert_with(|| Collection {
                dimension: vector.len(),
                points: Vec::new(),
            });
        entry
            .points
            .push((vector, payload.as_object().cloned().unwrap_or_default()));
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn dimension_of(&self, collection: &str) -> Option<usize> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map(|c| c.dimension)
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn collection_names(&self) -> AppResult<Vec<String>> {
        Ok(self.collections.lock().unwrap().keys().cloned().collect())
    }

    async fn collection_info(&self, name: &str) -> AppResult<CollectionInfo> {
        let collections = self.collections.lock().unwrap();
        let collection = collections
            .get(name)
            .ok_or_else(|| AppError::Retrieval(format!("Collection '{}' not found", name)))?;

        Ok(CollectionInfo {
            name: name.to_string(),
            dimension: collection.dimension,
            distance: Distance::Cosine,
            points_count: Some(collection.points.len() as u64),
        })
    }

    async fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        _distance: Distance,
    ) -> AppResult<()> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let mut collections = self.collections.lock().unwrap();
        if collections.contains_key(name) {
            return Err(AppError::Retrieval(format!(
                "Collection '{}' already exists",
                name
            )));
        }
        collections.insert(
            name.to_string(),
            Collection {
                dimension,
                points: Vec::new(),
            },
        );
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> AppResult<Vec<ScoredPassage>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries {
            return Err(AppError::Retrieval("connection refused".to_string()));
        }

        let collections = self.collections.lock().unwrap();
        let Some(collection) = collections.get(collection) else {
            return Ok(vec![]);
        };

        let mut hits: Vec<ScoredPassage> = collection
            .points
            .iter()
            .enumerate()
            .map(|(i, (point, payload))| ScoredPassage {
                id: i.to_string(),
                score: cosine(vector, point),
                payload: payload.clone(),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);

        Ok(hits)
    }
}

/// Embedder whose every call fails.
#[derive(Debug)]
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn provider_name(&self) -> &str {
        "failing"
    }

    fn model_name(&self) -> &str {
        "none"
    }

    fn dimensions(&self) -> usize {
        8
    }

    async fn embed_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Err(AppError::Embedding("model not loaded".to_string()))
    }
}

/// LLM double that records every request and replies with a fixed result.
#[derive(Debug)]
pub struct RecordingLlm {
    reply: Result<String, String>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl RecordingLlm {
    pub fn answering(answer: &str) -> Self {
        Self {
            reply: Ok(answer.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(detail: &str) -> Self {
        Self {
            reply: Err(detail.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.prompt).collect()
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for RecordingLlm {
    fn provider_name(&self) -> &str {
        "recording"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());

        match &self.reply {
            Ok(content) => Ok(LlmResponse {
                content: content.clone(),
                model: request.model.clone(),
                usage: LlmUsage::new(0, 0),
            }),
            Err(detail) => Err(AppError::Llm(detail.clone())),
        }
    }
}
