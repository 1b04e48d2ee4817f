//! HTTP serving boundary for the book chatbot.
//!
//! Binds first and builds the RAG engine in the background, so `/health`
//! can report availability while the engine is still starting or after it
//! failed to start.

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

#[cfg(test)]
mod testing;

pub use router::router;
pub use state::{AppState, EngineHandle, EngineStatus};

use bookchat_core::{AppConfig, AppError, AppResult};
use bookchat_knowledge::RagEngine;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Build the engine and record the outcome in `handle`.
pub async fn initialize_engine(config: &AppConfig, handle: &EngineHandle) {
    match RagEngine::initialize(config).await {
        Ok(engine) => {
            info!("Chatbot ready");
            handle.set_ready(engine).await;
        }
        Err(e) => {
            error!("Chatbot unavailable: {}", e);
            handle.set_failed(e.to_string()).await;
        }
    }
}

/// Serve until the process is stopped.
pub async fn serve(config: AppConfig) -> AppResult<()> {
    let listener = TcpListener::bind(&config.bind)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind {}: {}", config.bind, e)))?;
    info!("Listening on http://{}", listener.local_addr()?);

    let handle = EngineHandle::new();
    let state = AppState::new(
        handle.clone(),
        Duration::from_secs(config.request_timeout_secs),
    );

    tokio::spawn(async move {
        initialize_engine(&config, &handle).await;
    });

    axum::serve(listener, router(state))
        .await
        .map_err(AppError::Io)?;

    Ok(())
}
