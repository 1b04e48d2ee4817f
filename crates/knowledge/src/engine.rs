//! RAG engine: retrieval plus grounded synthesis behind one `answer` call.
//!
//! The engine is built once from configuration and is immutable afterwards.
//! Every dependency it holds is a shared client handle, so a single instance
//! serves concurrent requests without locking.

use crate::embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
use crate::qdrant::QdrantIndex;
use crate::retriever::Retriever;
use crate::synthesizer::AnswerSynthesizer;
use crate::vector_index::{CollectionStatus, VectorIndex};
use bookchat_core::{AppConfig, AppResult};
use bookchat_llm::{create_client, LlmClient};
use bookchat_prompt::{builtin_prompt, load_prompt_file, PromptTemplate};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Separator between retrieved passages in the assembled context.
pub const PASSAGE_SEPARATOR: &str = "\n";

/// The context an answer is grounded on. Exactly one source per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryContext {
    /// Text the reader selected in the book
    Selected(String),
    /// Passages retrieved for the question, most similar first
    Retrieved(Vec<String>),
}

impl QueryContext {
    /// Context text as handed to the prompt.
    pub fn text(&self) -> String {
        match self {
            QueryContext::Selected(text) => text.clone(),
            QueryContext::Retrieved(passages) => passages.join(PASSAGE_SEPARATOR),
        }
    }

    pub fn is_selected(&self) -> bool {
        matches!(self, QueryContext::Selected(_))
    }
}

/// Per-engine tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub collection: String,
    pub top_k: usize,
}

/// Composes the retriever and synthesizer.
#[derive(Debug)]
pub struct RagEngine {
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
    settings: EngineSettings,
    collection_status: CollectionStatus,
}

impl RagEngine {
    /// Build every dependency from configuration and make sure the
    /// collection exists.
    ///
    /// Steps run in order and the first failure aborts construction:
    /// validate configuration and load the prompt, build the embedder,
    /// build the LLM client, build the vector index client, then ensure the
    /// collection using the embedder's dimensionality.
    ///
    /// # Errors
    /// * `AppError::Config` - Missing or invalid configuration
    /// * Any error from embedder construction or collection setup
    #[instrument(skip_all)]
    pub async fn initialize(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;
        let required = config.require()?;

        let definition = match &config.prompt_file {
            Some(path) => load_prompt_file(path)?,
            None => builtin_prompt()?,
        };
        let prompt = PromptTemplate::new(definition)?;
        info!(
            "Configuration valid (collection '{}', prompt '{}')",
            required.collection,
            prompt.id()
        );

        let embedder = create_provider(&EmbeddingConfig::from_app_config(config)).await?;
        info!(
            "Embedder ready: {}/{} ({} dims)",
            embedder.provider_name(),
            embedder.model_name(),
            embedder.dimensions()
        );

        let llm = create_client(
            &config.llm_provider,
            config.llm_endpoint.as_deref(),
            Some(&required.llm_api_key),
        )?;
        info!("LLM client ready: {}/{}", llm.provider_name(), config.llm_model);

        let index: Arc<dyn VectorIndex> = Arc::new(QdrantIndex::new(
            &required.qdrant_url,
            Some(&required.qdrant_api_key),
        )?);
        info!("Vector index client ready: {}", required.qdrant_url);

        Self::from_components(
            embedder,
            index,
            llm,
            &config.llm_model,
            prompt,
            EngineSettings {
                collection: required.collection,
                top_k: config.top_k,
            },
        )
        .await
        .map(|engine| engine.with_sampling(config.llm_temperature, config.llm_max_tokens))
    }

    /// Assemble an engine from already-built parts, ensuring the collection.
    pub async fn from_components(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn LlmClient>,
        model: &str,
        prompt: PromptTemplate,
        settings: EngineSettings,
    ) -> AppResult<Self> {
        let collection_status = index
            .ensure_collection(&settings.collection, embedder.dimensions())
            .await?;
        info!(
            "Collection '{}' {:?}; engine ready",
            settings.collection, collection_status
        );

        Ok(Self {
            retriever: Retriever::new(embedder, index, settings.collection.clone()),
            synthesizer: AnswerSynthesizer::new(llm, model, prompt),
            settings,
            collection_status,
        })
    }

    /// Sampling overrides applied to every answer.
    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.synthesizer = self.synthesizer.with_sampling(temperature, max_tokens);
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Whether initialization created the collection or found it.
    pub fn collection_status(&self) -> CollectionStatus {
        self.collection_status
    }

    /// Pick the context: non-blank selected text wins, otherwise retrieve.
    pub async fn resolve_context(
        &self,
        question: &str,
        selected_text: Option<&str>,
        top_k: usize,
    ) -> QueryContext {
        match selected_text.filter(|s| !s.trim().is_empty()) {
            Some(selected) => {
                debug!("Using selected text as context ({} chars)", selected.len());
                QueryContext::Selected(selected.to_string())
            }
            None => QueryContext::Retrieved(self.retriever.search(question, top_k).await),
        }
    }

    /// Answer a question. Never fails: retrieval problems shrink the
    /// context and synthesis problems become the answer text.
    pub async fn answer(&self, question: &str, selected_text: Option<&str>) -> String {
        self.answer_with_top_k(question, selected_text, self.settings.top_k)
            .await
    }

    #[instrument(skip(self, question, selected_text), fields(collection = %self.settings.collection))]
    pub async fn answer_with_top_k(
        &self,
        question: &str,
        selected_text: Option<&str>,
        top_k: usize,
    ) -> String {
        let context = self.resolve_context(question, selected_text, top_k).await;
        debug!(
            "Context from {}",
            if context.is_selected() { "selection" } else { "retrieval" }
        );

        self.synthesizer.synthesize(question, &context.text()).await
    }
}
