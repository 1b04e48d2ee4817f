//! Check command handler.

use bookchat_core::config::AppConfig;
use bookchat_knowledge::{CollectionStatus, RagEngine};
use clap::Args;

/// Validate configuration and make sure the collection exists
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CheckCommand {
    /// Execute the check command.
    ///
    /// Runs the full engine startup, which creates the collection when it is
    /// missing, and reports what it found.
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing check command");

        let engine = RagEngine::initialize(config).await?;
        let settings = engine.settings();
        let status = engine.collection_status();

        if self.json {
            println!(
                "{}",
                serde_json::json!({
                    "collection": settings.collection,
                    "status": status,
                    "topK": settings.top_k,
                    "embeddingModel": config.embedding_model,
                    "llmModel": config.llm_model,
                })
            );
        } else {
            let verb = match status {
                CollectionStatus::Created => "created",
                CollectionStatus::Existing => "already exists",
            };
            println!("Configuration OK");
            println!("Collection '{}' {}", settings.collection, verb);
            println!("Embedding model: {}", config.embedding_model);
            println!("LLM: {}/{}", config.llm_provider, config.llm_model);
        }

        Ok(())
    }
}
