//! Prompt definitions and rendered prompts.

use serde::{Deserialize, Serialize};

/// A prompt definition as stored in YAML.
///
/// ```yaml
/// id: rag.answer
/// title: Grounded answer from book passages
/// apiVersion: "1.0"
/// template: |
///   ### CONTEXT
///   {{context}}
///   ### QUESTION
///   {{question}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptDefinition {
    pub id: String,
    pub title: String,
    /// Schema version, `major.minor`
    pub api_version: String,
    #[serde(default)]
    pub created_by: String,
    /// Instruction sent as a separate system message, when the model supports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Handlebars template for the user message
    pub template: String,
}

/// The messages produced by rendering a definition for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltPrompt {
    pub prompt_id: String,
    pub system: Option<String>,
    pub user: String,
}

impl BuiltPrompt {
    /// Total characters that will be sent to the model.
    pub fn len(&self) -> usize {
        self.user.chars().count() + self.system.as_deref().map_or(0, |s| s.chars().count())
    }

    pub fn is_empty(&self) -> bool {
        self.user.is_empty() && self.system.as_deref().map_or(true, str::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_from_yaml() {
        let yaml = r#"
id: rag.short
title: Short answers
apiVersion: "1.1"
system: Reply in one sentence.
template: "{{context}} / {{question}}"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.api_version, "1.1");
        assert_eq!(def.created_by, "");
        assert_eq!(def.system.as_deref(), Some("Reply in one sentence."));
    }

    #[test]
    fn test_built_prompt_length_counts_both_messages() {
        let built = BuiltPrompt {
            prompt_id: "p".to_string(),
            system: Some("ab".to_string()),
            user: "cde".to_string(),
        };
        assert_eq!(built.len(), 5);
        assert!(!built.is_empty());
    }
}
