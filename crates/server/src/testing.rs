//! Engine fixtures for handler tests.

use async_trait::async_trait;
use bookchat_core::{AppError, AppResult};
use bookchat_knowledge::embeddings::TrigramProvider;
use bookchat_knowledge::{
    CollectionInfo, Distance, EngineSettings, RagEngine, ScoredPassage, VectorIndex,
};
use bookchat_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use bookchat_prompt::{builtin_prompt, PromptTemplate};
use std::sync::Arc;
use std::time::Duration;

/// Index that already holds the collection and never finds anything.
#[derive(Debug)]
struct EmptyIndex;

#[async_trait]
impl VectorIndex for EmptyIndex {
    async fn collection_names(&self) -> AppResult<Vec<String>> {
        Ok(vec!["book".to_string()])
    }

    async fn collection_info(&self, name: &str) -> AppResult<CollectionInfo> {
        Ok(CollectionInfo {
            name: name.to_string(),
            dimension: 32,
            distance: Distance::Cosine,
            points_count: Some(0),
        })
    }

    async fn create_collection(&self, _: &str, _: usize, _: Distance) -> AppResult<()> {
        Ok(())
    }

    async fn query(&self, _: &str, _: &[f32], _: usize) -> AppResult<Vec<ScoredPassage>> {
        Ok(vec![])
    }
}

struct CannedLlm {
    answer: Result<String, String>,
    delay: Duration,
}

#[async_trait]
impl LlmClient for CannedLlm {
    fn provider_name(&self) -> &str {
        "canned"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tokio::time::sleep(self.delay).await;
        match &self.answer {
            Ok(content) => Ok(LlmResponse {
                content: content.clone(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            }),
            Err(detail) => Err(AppError::Llm(detail.clone())),
        }
    }
}

async fn build(answer: Result<String, String>, delay: Duration) -> RagEngine {
    RagEngine::from_components(
        Arc::new(TrigramProvider::new(32)),
        Arc::new(EmptyIndex),
        Arc::new(CannedLlm { answer, delay }),
        "test-model",
        PromptTemplate::new(builtin_prompt().unwrap()).unwrap(),
        EngineSettings {
            collection: "book".to_string(),
            top_k: 5,
        },
    )
    .await
    .unwrap()
}

pub async fn engine(answer: &str) -> RagEngine {
    build(Ok(answer.to_string()), Duration::ZERO).await
}

pub async fn failing_engine(detail: &str) -> RagEngine {
    build(Err(detail.to_string()), Duration::ZERO).await
}

pub async fn slow_engine(delay: Duration) -> RagEngine {
    build(Ok("late".to_string()), delay).await
}
