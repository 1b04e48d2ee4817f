//! Prompt loader for YAML prompt definitions.

use crate::types::PromptDefinition;
use bookchat_core::{AppError, AppResult};
use std::path::Path;

/// Identifier of the prompt compiled into the binary.
pub const BUILTIN_PROMPT_ID: &str = "rag.answer";

const BUILTIN_PROMPT_YAML: &str = include_str!("../prompts/rag_answer.yaml");

/// Variables every answer prompt must reference.
const REQUIRED_VARIABLES: [&str; 2] = ["context", "question"];

/// The grounded-answer prompt shipped with bookchat.
pub fn builtin_prompt() -> AppResult<PromptDefinition> {
    parse_prompt(BUILTIN_PROMPT_YAML, "built-in prompt")
}

/// Load a prompt definition from a YAML file.
///
/// # Example
/// ```no_run
/// use bookchat_prompt::load_prompt_file;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt_file(Path::new("prompts/terse.yaml"))?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt_file(path: &Path) -> AppResult<PromptDefinition> {
    tracing::debug!("Loading prompt from: {:?}", path);

    if !path.exists() {
        return Err(AppError::Prompt(format!("Prompt file not found: {:?}", path)));
    }

    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::Prompt(format!("Failed to read prompt file {:?}: {}", path, e))
    })?;

    let definition = parse_prompt(&contents, &format!("{:?}", path))?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

fn parse_prompt(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e))
    })?;

    validate_prompt(&definition)?;

    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    for variable in REQUIRED_VARIABLES {
        if !references_variable(&def.template, variable) {
            return Err(AppError::Prompt(format!(
                "Prompt '{}' must reference {{{{{}}}}}",
                def.id, variable
            )));
        }
    }

    Ok(())
}

fn references_variable(template: &str, name: &str) -> bool {
    template.contains(&format!("{{{{{}}}}}", name))
        || template.contains(&format!("{{{{ {} }}}}", name))
}
