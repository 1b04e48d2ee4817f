use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use bookchat_knowledge::synthesis_error_text;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::state::{AppState, EngineStatus};

/// Body of `POST /chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(default, rename = "selectedText", alias = "selected_text")]
    pub selected_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatResponse {
    pub answer: String,
}

/// Answer one question.
///
/// The answer runs as its own task so a slow model is never cancelled
/// mid-call; the request only stops waiting after the configured timeout.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if request.question.trim().is_empty() {
        return Err(ApiError::BadRequest("question must not be empty".to_string()));
    }

    let engine = match state.engine.status().await {
        EngineStatus::Ready(engine) => engine,
        EngineStatus::Initializing => {
            return Err(ApiError::Unavailable(
                "Chatbot is still initializing, try again shortly".to_string(),
            ))
        }
        EngineStatus::Failed(reason) => {
            return Err(ApiError::Unavailable(format!(
                "Chatbot is not available: {}",
                reason
            )))
        }
    };

    info!(
        question_len = request.question.len(),
        with_selection = request.selected_text.is_some(),
        "Chat request"
    );

    let task = tokio::spawn(async move {
        engine
            .answer(&request.question, request.selected_text.as_deref())
            .await
    });

    let answer = match tokio::time::timeout(state.request_timeout, task).await {
        Ok(Ok(answer)) => answer,
        Ok(Err(e)) => {
            error!("Answer task failed: {}", e);
            synthesis_error_text(e)
        }
        Err(_) => {
            warn!(
                "Answer not ready after {}s",
                state.request_timeout.as_secs()
            );
            synthesis_error_text(format!(
                "request timed out after {}s",
                state.request_timeout.as_secs()
            ))
        }
    };

    Ok(Json(ChatResponse { answer }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EngineHandle;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use std::time::Duration;

    fn request(question: &str, selected: Option<&str>) -> Result<Json<ChatRequest>, JsonRejection> {
        Ok(Json(ChatRequest {
            question: question.to_string(),
            selected_text: selected.map(str::to_string),
        }))
    }

    #[test]
    fn test_request_accepts_both_spellings() {
        let camel: ChatRequest =
            serde_json::from_str(r#"{"question":"q","selectedText":"s"}"#).unwrap();
        let snake: ChatRequest =
            serde_json::from_str(r#"{"question":"q","selected_text":"s"}"#).unwrap();
        let none: ChatRequest = serde_json::from_str(r#"{"question":"q","selectedText":null}"#).unwrap();

        assert_eq!(camel.selected_text.as_deref(), Some("s"));
        assert_eq!(snake.selected_text.as_deref(), Some("s"));
        assert_eq!(none.selected_text, None);
        assert!(serde_json::from_str::<ChatRequest>(r#"{"selectedText":"s"}"#).is_err());
    }

    #[tokio::test]
    async fn test_chat_when_ready() {
        let engine = crate::testing::engine("PID is a feedback controller.").await;
        let state = AppState::new(EngineHandle::ready(engine), Duration::from_secs(5));

        let Json(body) = chat(State(state), request("What is PID?", Some("Robots use PID control.")))
            .await
            .unwrap();

        assert_eq!(body.answer, "PID is a feedback controller.");
    }

    #[tokio::test]
    async fn test_llm_failure_is_still_an_answer() {
        let engine = crate::testing::failing_engine("429 quota exceeded").await;
        let state = AppState::new(EngineHandle::ready(engine), Duration::from_secs(5));

        let response = chat(State(state), request("What is PID?", None))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_llm_failure_answer_text() {
        let engine = crate::testing::failing_engine("429 quota exceeded").await;
        let state = AppState::new(EngineHandle::ready(engine), Duration::from_secs(5));

        let Json(body) = chat(State(state), request("What is PID?", None))
            .await
            .unwrap();
        assert!(body.answer.starts_with("[Error generating answer: "));
        assert!(body.answer.contains("429 quota exceeded"));
    }

    #[tokio::test]
    async fn test_chat_while_initializing_is_error_object() {
        let state = AppState::new(EngineHandle::new(), Duration::from_secs(5));

        let err = chat(State(state), request("What is PID?", None))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Unavailable(_)));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "error": "Chatbot is still initializing, try again shortly" })
        );
    }

    #[tokio::test]
    async fn test_chat_after_failed_startup_reports_reason() {
        let handle = EngineHandle::new();
        handle
            .set_failed("Configuration error: Missing required environment variables: GEMINI_API_KEY")
            .await;
        let state = AppState::new(handle, Duration::from_secs(5));

        let err = chat(State(state), request("What is PID?", None))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[tokio::test]
    async fn test_blank_question_is_bad_request() {
        let state = AppState::new(EngineHandle::new(), Duration::from_secs(5));

        let err = chat(State(state), request("  ", None)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_slow_answer_times_out_as_answer_text() {
        let engine = crate::testing::slow_engine(Duration::from_millis(500)).await;
        let state = AppState::new(EngineHandle::ready(engine), Duration::from_millis(20));

        let Json(body) = chat(State(state), request("What is PID?", Some("ctx")))
            .await
            .unwrap();

        assert!(body.answer.starts_with("[Error generating answer: request timed out"));
    }
}
