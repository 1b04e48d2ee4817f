use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{chat, health};
use crate::state::AppState;

/// Routes and middleware.
///
/// `/api/chat` is the path the book's chat widget posts to; it behaves
/// exactly like `/chat`. CORS is permissive because the widget is served
/// from the static book site.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/chat", post(chat::chat))
        .route("/api/chat", post(chat::chat))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
