use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::{AppState, EngineStatus};

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub chatbot_available: bool,
}

/// Liveness plus whether the engine is ready. Always 200.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let chatbot_available = matches!(state.engine.status().await, EngineStatus::Ready(_));

    Json(HealthResponse {
        status: "ok",
        chatbot_available,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EngineHandle;
    use std::time::Duration;

    #[tokio::test]
    async fn test_health_while_initializing() {
        let state = AppState::new(EngineHandle::new(), Duration::from_secs(1));

        let Json(body) = health(State(state)).await;

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "status": "ok", "chatbotAvailable": false })
        );
    }

    #[tokio::test]
    async fn test_health_after_failure() {
        let handle = EngineHandle::new();
        handle.set_failed("bad config").await;
        let state = AppState::new(handle, Duration::from_secs(1));

        let Json(body) = health(State(state)).await;
        assert!(!body.chatbot_available);
    }

    #[tokio::test]
    async fn test_health_when_ready() {
        let engine = crate::testing::engine("answer").await;
        let state = AppState::new(EngineHandle::ready(engine), Duration::from_secs(1));

        let Json(body) = health(State(state)).await;
        assert!(body.chatbot_available);
    }
}
