//! Error types for bookchat.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! embedding, retrieval, LLM and prompt failures.

use thiserror::Error;

/// Unified error type for bookchat.
///
/// Only `Config` is fatal: it keeps the RAG engine from ever becoming ready.
/// Every other variant is recovered at the component boundary that produced it.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedding model invocation failures
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector store failures (collection management or search)
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt loading and rendering errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error prevents the engine from serving at all.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Config(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_config_errors_are_fatal() {
        assert!(AppError::Config("missing".to_string()).is_fatal());
        assert!(!AppError::Embedding("boom".to_string()).is_fatal());
        assert!(!AppError::Retrieval("down".to_string()).is_fatal());
        assert!(!AppError::Llm("quota".to_string()).is_fatal());
    }

    #[test]
    fn test_display_prefixes() {
        let err = AppError::Retrieval("connection refused".to_string());
        assert_eq!(err.to_string(), "Retrieval error: connection refused");
    }
}
