//! Shared server state.

use bookchat_knowledge::RagEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Lifecycle of the RAG engine as seen by request handlers.
#[derive(Debug, Clone)]
pub enum EngineStatus {
    /// Startup has not finished building the engine
    Initializing,
    /// The engine is built and serving
    Ready(Arc<RagEngine>),
    /// Startup failed; the engine will not become available
    Failed(String),
}

/// Handle to the single engine instance, written once at startup.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    status: Arc<RwLock<EngineStatus>>,
}

impl Default for EngineHandle {
    fn default() -> Self {
        Self {
            status: Arc::new(RwLock::new(EngineStatus::Initializing)),
        }
    }
}

impl EngineHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that is already serving `engine`.
    pub fn ready(engine: RagEngine) -> Self {
        Self {
            status: Arc::new(RwLock::new(EngineStatus::Ready(Arc::new(engine)))),
        }
    }

    pub async fn set_ready(&self, engine: RagEngine) {
        *self.status.write().await = EngineStatus::Ready(Arc::new(engine));
    }

    pub async fn set_failed(&self, reason: impl Into<String>) {
        *self.status.write().await = EngineStatus::Failed(reason.into());
    }

    pub async fn status(&self) -> EngineStatus {
        self.status.read().await.clone()
    }

    /// The engine, if it is ready.
    pub async fn engine(&self) -> Option<Arc<RagEngine>> {
        match &*self.status.read().await {
            EngineStatus::Ready(engine) => Some(engine.clone()),
            _ => None,
        }
    }
}

/// State passed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub engine: EngineHandle,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(engine: EngineHandle, request_timeout: Duration) -> Self {
        Self {
            engine,
            request_timeout,
        }
    }
}
