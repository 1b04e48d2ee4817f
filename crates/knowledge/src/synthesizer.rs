//! Grounded answer synthesis.
//!
//! Renders the answer prompt with the question and its context, sends it to
//! the LLM, and returns the model's text verbatim.

use bookchat_core::AppResult;
use bookchat_llm::{LlmClient, LlmRequest};
use bookchat_prompt::{BuiltPrompt, PromptTemplate};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Prefix of the answer returned when synthesis fails.
pub const SYNTHESIS_ERROR_PREFIX: &str = "[Error generating answer: ";

/// Format a failure as answer text.
pub fn synthesis_error_text(detail: impl std::fmt::Display) -> String {
    format!("{}{}]", SYNTHESIS_ERROR_PREFIX, detail)
}

/// Turns a question and its context into an answer via the LLM.
pub struct AnswerSynthesizer {
    llm: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptTemplate,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl std::fmt::Debug for AnswerSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerSynthesizer")
            .field("provider", &self.llm.provider_name())
            .field("model", &self.model)
            .field("prompt", &self.prompt.id())
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl AnswerSynthesizer {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>, prompt: PromptTemplate) -> Self {
        Self {
            llm,
            model: model.into(),
            prompt,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Override the provider's sampling defaults. `None` keeps the default.
    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Render the prompt for one request.
    pub fn build_prompt(&self, question: &str, context: &str) -> AppResult<BuiltPrompt> {
        let mut variables = HashMap::new();
        variables.insert("context".to_string(), context.to_string());
        variables.insert("question".to_string(), question.to_string());

        self.prompt.render(variables)
    }

    /// Synthesize, surfacing prompt and LLM failures.
    pub async fn try_synthesize(&self, question: &str, context: &str) -> AppResult<String> {
        let built = self.build_prompt(question, context)?;
        debug!("Prompt '{}' ({} chars)", built.prompt_id, built.len());

        let mut request = LlmRequest::new(built.user, &self.model);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = self.llm.complete(&request).await?;

        debug!(
            "Answer from {} ({} completion tokens)",
            response.model, response.usage.completion_tokens
        );

        Ok(response.content)
    }

    /// Synthesize, converting any failure into answer text.
    #[instrument(skip_all, fields(model = %self.model, context_len = context.len()))]
    pub async fn synthesize(&self, question: &str, context: &str) -> String {
        match self.try_synthesize(question, context).await {
            Ok(answer) => answer,
            Err(e) => {
                error!("Answer generation failed: {}", e);
                synthesis_error_text(e)
            }
        }
    }
}
