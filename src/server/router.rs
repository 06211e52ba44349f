use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::server::handlers::{chat, documents, health};
use crate::state::AppState;

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Creates the application router.
///
/// - `POST /process-pdf`: multipart PDF upload, indexed into the vector store
/// - `POST /chat`: one conversational turn, streamed back as plain text
/// - `GET /health`, `GET /documents/stats`: liveness and index size
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/process-pdf", post(documents::process_pdf))
        .route("/documents/stats", get(documents::stats))
        .route("/chat", post(chat::chat))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
