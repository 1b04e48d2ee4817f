//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use bookchat_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

const TEMPLATE_NAME: &str = "prompt";

/// A prompt definition with its template compiled once.
///
/// Rendering takes `&self`, so one instance is shared by every request.
pub struct PromptTemplate {
    definition: PromptDefinition,
    registry: Handlebars<'static>,
}

impl std::fmt::Debug for PromptTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptTemplate")
            .field("id", &self.definition.id)
            .finish()
    }
}

impl PromptTemplate {
    /// Compile the definition's template.
    pub fn new(definition: PromptDefinition) -> AppResult<Self> {
        let mut registry = Handlebars::new();

        // Disable HTML escaping for plain text
        registry.register_escape_fn(handlebars::no_escape);

        registry
            .register_template_string(TEMPLATE_NAME, &definition.template)
            .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

        Ok(Self {
            definition,
            registry,
        })
    }

    /// Identifier of the underlying definition.
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    /// Render with the given variables.
    pub fn render(&self, variables: HashMap<String, String>) -> AppResult<BuiltPrompt> {
        tracing::debug!("Building prompt: {}", self.definition.id);

        let user = self
            .registry
            .render(TEMPLATE_NAME, &variables)
            .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

        Ok(BuiltPrompt {
            prompt_id: self.definition.id.clone(),
            system: self.definition.system.clone(),
            user,
        })
    }
}
