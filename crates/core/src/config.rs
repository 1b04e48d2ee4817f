//! Configuration management for bookchat.
//!
//! Settings are resolved once at startup, lowest precedence first:
//! - Built-in defaults
//! - An optional YAML config file (`BOOKCHAT_CONFIG` or `--config`)
//! - Environment variables (a `.env` file in the working directory is loaded first)
//! - Command-line flags
//!
//! Four settings have no default and must be present before the RAG engine
//! may touch the network: the LLM API key, the Qdrant URL, the Qdrant API key
//! and the collection name. See [`AppConfig::require`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default sentence-embedding model (Ollama's name for all-MiniLM-L6-v2).
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";

/// Default number of passages retrieved per question.
pub const DEFAULT_TOP_K: usize = 5;

pub const ENV_LLM_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_QDRANT_URL: &str = "QDRANT_URL";
pub const ENV_QDRANT_API_KEY: &str = "QDRANT_API_KEY";
pub const ENV_COLLECTION: &str = "QDRANT_COLLECTION";
pub const ENV_EMBEDDING_MODEL: &str = "EMBEDDING_MODEL";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Config file the settings were merged from, if any
    pub config_file: Option<PathBuf>,

    /// LLM provider ("gemini" or "ollama")
    pub llm_provider: String,

    /// LLM model identifier
    pub llm_model: String,

    /// Custom LLM endpoint (provider default when unset)
    pub llm_endpoint: Option<String>,

    /// API key for the LLM provider (required)
    #[serde(skip_serializing)]
    pub llm_api_key: Option<String>,

    /// Sampling temperature, 0.0 to 2.0 (provider default when unset)
    pub llm_temperature: Option<f32>,

    /// Cap on generated tokens per answer (provider default when unset)
    pub llm_max_tokens: Option<u32>,

    /// Qdrant base URL (required)
    pub qdrant_url: Option<String>,

    /// Qdrant API key (required)
    #[serde(skip_serializing)]
    pub qdrant_api_key: Option<String>,

    /// Collection holding the book passages (required)
    pub collection: Option<String>,

    /// Embedding provider ("ollama" or "trigram")
    pub embedding_provider: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Embedding service endpoint
    pub embedding_endpoint: String,

    /// Explicit embedding dimensionality (derived from the model when unset)
    pub embedding_dimensions: Option<usize>,

    /// Passages retrieved per question
    pub top_k: usize,

    /// Alternative prompt definition (YAML)
    pub prompt_file: Option<PathBuf>,

    /// HTTP listen address
    pub bind: String,

    /// Upper bound on a single /chat request
    pub request_timeout_secs: u64,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON lines
    pub log_json: bool,
}

/// The four settings the engine cannot start without, all non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredSettings {
    pub llm_api_key: String,
    pub qdrant_url: String,
    pub qdrant_api_key: String,
    pub collection: String,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    qdrant: Option<QdrantSection>,
    embedding: Option<EmbeddingSection>,
    retrieval: Option<RetrievalSection>,
    prompt: Option<PromptSection>,
    server: Option<ServerSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
    temperature: Option<f32>,
    #[serde(rename = "maxTokens")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct QdrantSection {
    url: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
    collection: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmbeddingSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    dimensions: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RetrievalSection {
    #[serde(rename = "topK")]
    top_k: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PromptSection {
    file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerSection {
    bind: Option<String>,
    #[serde(rename = "requestTimeoutSecs")]
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            llm_provider: "gemini".to_string(),
            llm_model: "gemini-2.0-flash".to_string(),
            llm_endpoint: None,
            llm_api_key: None,
            llm_temperature: None,
            llm_max_tokens: None,
            qdrant_url: None,
            qdrant_api_key: None,
            collection: None,
            embedding_provider: "ollama".to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_endpoint: "http://localhost:11434".to_string(),
            embedding_dimensions: None,
            top_k: DEFAULT_TOP_K,
            prompt_file: None,
            bind: "0.0.0.0:8000".to_string(),
            request_timeout_secs: 120,
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from a `.env` file, the process environment and
    /// an optional YAML file.
    ///
    /// Environment variables:
    /// - `GEMINI_API_KEY`, `QDRANT_URL`, `QDRANT_API_KEY`, `QDRANT_COLLECTION` (required)
    /// - `EMBEDDING_MODEL` (default `all-minilm`)
    /// - `BOOKCHAT_CONFIG`: Path to config file (when `config_file` is `None`)
    /// - `BOOKCHAT_LLM_PROVIDER`, `BOOKCHAT_LLM_MODEL`, `BOOKCHAT_LLM_ENDPOINT`
    /// - `BOOKCHAT_LLM_TEMPERATURE`, `BOOKCHAT_LLM_MAX_TOKENS`
    /// - `BOOKCHAT_EMBEDDING_PROVIDER`, `OLLAMA_URL`, `BOOKCHAT_EMBEDDING_DIMENSIONS`
    /// - `BOOKCHAT_TOP_K`, `BOOKCHAT_PROMPT_FILE`
    /// - `BOOKCHAT_BIND`, `BOOKCHAT_REQUEST_TIMEOUT`
    /// - `RUST_LOG`, `NO_COLOR`, `BOOKCHAT_LOG_JSON`
    ///
    /// Loading never fails because a required value is absent; that is
    /// reported by [`AppConfig::require`] so the server can still start and
    /// report itself unavailable.
    ///
    /// # Example
    /// ```no_run
    /// use bookchat_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None).expect("Failed to load config");
    /// println!("Collection: {:?}", config.collection);
    /// ```
    pub fn load(config_file: Option<&Path>) -> AppResult<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {:?}", path),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
        }

        Self::load_with(config_file, |key| std::env::var(key).ok())
    }

    /// Load configuration using `lookup` in place of the process environment.
    pub fn load_with<F>(config_file: Option<&Path>, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Treat empty values exactly like unset ones
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = Self::default();

        let config_path = config_file
            .map(Path::to_path_buf)
            .or_else(|| env("BOOKCHAT_CONFIG").map(PathBuf::from));

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(AppError::Config(format!(
                    "Config file does not exist: {:?}",
                    path
                )));
            }
            config = config.merge_yaml(&path, &env)?;
            config.config_file = Some(path);
        }

        // Environment variables override YAML config
        if let Some(v) = env(ENV_LLM_API_KEY) {
            config.llm_api_key = Some(v);
        }
        if let Some(v) = env(ENV_QDRANT_URL) {
            config.qdrant_url = Some(v);
        }
        if let Some(v) = env(ENV_QDRANT_API_KEY) {
            config.qdrant_api_key = Some(v);
        }
        if let Some(v) = env(ENV_COLLECTION) {
            config.collection = Some(v);
        }
        if let Some(v) = env(ENV_EMBEDDING_MODEL) {
            config.embedding_model = v;
        }
        if let Some(v) = env("BOOKCHAT_LLM_PROVIDER") {
            config.llm_provider = v;
        }
        if let Some(v) = env("BOOKCHAT_LLM_MODEL") {
            config.llm_model = v;
        }
        if let Some(v) = env("BOOKCHAT_LLM_ENDPOINT") {
            config.llm_endpoint = Some(v);
        }
        if let Some(v) = env("BOOKCHAT_LLM_TEMPERATURE") {
            config.llm_temperature = Some(v.trim().parse().map_err(|_| {
                AppError::Config(format!(
                    "BOOKCHAT_LLM_TEMPERATURE must be a number, got {:?}",
                    v
                ))
            })?);
        }
        if let Some(v) = env("BOOKCHAT_LLM_MAX_TOKENS") {
            config.llm_max_tokens = Some(parse_number("BOOKCHAT_LLM_MAX_TOKENS", &v)?);
        }
        if let Some(v) = env("BOOKCHAT_EMBEDDING_PROVIDER") {
            config.embedding_provider = v;
        }
        if let Some(v) = env("OLLAMA_URL") {
            config.embedding_endpoint = v;
        }
        if let Some(v) = env("BOOKCHAT_EMBEDDING_DIMENSIONS") {
            config.embedding_dimensions = Some(parse_number("BOOKCHAT_EMBEDDING_DIMENSIONS", &v)?);
        }
        if let Some(v) = env("BOOKCHAT_TOP_K") {
            config.top_k = parse_number("BOOKCHAT_TOP_K", &v)?;
        }
        if let Some(v) = env("BOOKCHAT_PROMPT_FILE") {
            config.prompt_file = Some(PathBuf::from(v));
        }
        if let Some(v) = env("BOOKCHAT_BIND") {
            config.bind = v;
        }
        if let Some(v) = env("BOOKCHAT_REQUEST_TIMEOUT") {
            config.request_timeout_secs = parse_number("BOOKCHAT_REQUEST_TIMEOUT", &v)?;
        }
        if let Some(v) = env("RUST_LOG") {
            config.log_level = Some(v);
        }
        if lookup("NO_COLOR").is_some() {
            config.no_color = true;
        }
        if let Some(v) = env("BOOKCHAT_LOG_JSON") {
            config.log_json = matches!(v.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml<F>(&self, path: &Path, env: &F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(llm) = file.llm {
            if let Some(provider) = llm.provider {
                result.llm_provider = provider;
            }
            if let Some(model) = llm.model {
                result.llm_model = model;
            }
            if llm.endpoint.is_some() {
                result.llm_endpoint = llm.endpoint;
            }
            if let Some(var) = llm.api_key_env {
                result.llm_api_key = env(&var);
            }
            if llm.temperature.is_some() {
                result.llm_temperature = llm.temperature;
            }
            if llm.max_tokens.is_some() {
                result.llm_max_tokens = llm.max_tokens;
            }
        }

        if let Some(qdrant) = file.qdrant {
            if qdrant.url.is_some() {
                result.qdrant_url = qdrant.url;
            }
            if qdrant.collection.is_some() {
                result.collection = qdrant.collection;
            }
            if let Some(var) = qdrant.api_key_env {
                result.qdrant_api_key = env(&var);
            }
        }

        if let Some(embedding) = file.embedding {
            if let Some(provider) = embedding.provider {
                result.embedding_provider = provider;
            }
            if let Some(model) = embedding.model {
                result.embedding_model = model;
            }
            if let Some(endpoint) = embedding.endpoint {
                result.embedding_endpoint = endpoint;
            }
            if embedding.dimensions.is_some() {
                result.embedding_dimensions = embedding.dimensions;
            }
        }

        if let Some(top_k) = file.retrieval.and_then(|r| r.top_k) {
            result.top_k = top_k;
        }

        if let Some(file_path) = file.prompt.and_then(|p| p.file) {
            // Relative prompt paths are resolved against the config file
            result.prompt_file = Some(match path.parent() {
                Some(dir) if file_path.is_relative() => dir.join(file_path),
                _ => file_path,
            });
        }

        if let Some(server) = file.server {
            if let Some(bind) = server.bind {
                result.bind = bind;
            }
            if let Some(secs) = server.request_timeout_secs {
                result.request_timeout_secs = secs;
            }
        }

        if let Some(logging) = file.logging {
            if logging.level.is_some() {
                result.log_level = logging.level;
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables.
    pub fn with_overrides(
        mut self,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        log_json: bool,
        bind: Option<String>,
    ) -> Self {
        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        if log_json {
            self.log_json = true;
        }

        if let Some(bind) = bind {
            self.bind = bind;
        }

        self
    }

    /// Return the required settings, or a `Config` error naming every one
    /// that is missing.
    pub fn require(&self) -> AppResult<RequiredSettings> {
        let fields = [
            (ENV_LLM_API_KEY, &self.llm_api_key),
            (ENV_QDRANT_URL, &self.qdrant_url),
            (ENV_QDRANT_API_KEY, &self.qdrant_api_key),
            (ENV_COLLECTION, &self.collection),
        ];

        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(AppError::Config(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        Ok(RequiredSettings {
            llm_api_key: self.llm_api_key.clone().unwrap_or_default(),
            qdrant_url: self.qdrant_url.clone().unwrap_or_default(),
            qdrant_api_key: self.qdrant_api_key.clone().unwrap_or_default(),
            collection: self.collection.clone().unwrap_or_default(),
        })
    }

    /// Validate the configuration without building anything.
    pub fn validate(&self) -> AppResult<()> {
        self.require()?;

        if self.top_k == 0 {
            return Err(AppError::Config("top_k must be at least 1".to_string()));
        }

        if let Some(t) = self.llm_temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(AppError::Config(format!(
                    "LLM temperature must be between 0.0 and 2.0, got {}",
                    t
                )));
            }
        }

        if self.llm_max_tokens == Some(0) {
            return Err(AppError::Config(
                "LLM max tokens must be at least 1".to_string(),
            ));
        }

        if self.embedding_model.trim().is_empty() {
            return Err(AppError::Config(
                "Embedding model identifier cannot be empty".to_string(),
            ));
        }

        if self.embedding_dimensions == Some(0) {
            return Err(AppError::Config(
                "Embedding dimensions must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> AppResult<T> {
    value.trim().parse().map_err(|_| {
        AppError::Config(format!("{} must be a non-negative integer, got {:?}", name, value))
    })
}
