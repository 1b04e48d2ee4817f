//! Prompt system for bookchat.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - Handlebars template rendering
//! - A built-in grounded-answer prompt (`rag.answer`)

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::PromptTemplate;
pub use loader::{builtin_prompt, load_prompt_file, BUILTIN_PROMPT_ID};
pub use types::{BuiltPrompt, PromptDefinition};
