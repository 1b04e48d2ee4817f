//! Ask command handler.
//!
//! Builds the engine once and answers a single question, either from the
//! given selection or from retrieved passages.

use bookchat_core::config::AppConfig;
use bookchat_knowledge::RagEngine;
use clap::Args;

/// Answer a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Use this text as context instead of retrieving passages
    #[arg(short, long)]
    pub selected_text: Option<String>,

    /// Number of passages to retrieve (default from configuration)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let engine = RagEngine::initialize(config).await?;
        let top_k = self.top_k.unwrap_or(engine.settings().top_k).max(1);

        let answer = engine
            .answer_with_top_k(&self.question, self.selected_text.as_deref(), top_k)
            .await;

        if self.json {
            println!("{}", serde_json::json!({ "answer": answer }));
        } else {
            println!("{}", answer);
        }

        Ok(())
    }
}
