use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::core::errors::ApiError;
use crate::graph::{NodeContext, TurnEvent, TurnState};
use crate::server::stream::answer_fragments;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatPayload {
    pub message: String,
    pub thread_id: String,
}

/// `POST /chat` — run one turn for the thread and stream the answer back as
/// plain-text fragments.
///
/// The turn runs in its own task: a caller that disconnects stops receiving
/// fragments, but the turn finishes and its messages are still committed.
/// A failed turn commits nothing; the caller sees a single error fragment
/// and the thread history is left as it was before the turn.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatPayload>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }
    if payload.thread_id.trim().is_empty() {
        return Err(ApiError::BadRequest("thread_id must not be empty".to_string()));
    }

    let (tx, rx) = mpsc::channel::<TurnEvent>(32);

    tokio::spawn(async move {
        if let Err(err) = run_turn(&state, &payload, &tx).await {
            tracing::error!("Turn failed for thread '{}': {}", payload.thread_id, err);
            let _ = tx.send(TurnEvent::Error(err.to_string())).await;
        }
    });

    let body = Body::from_stream(answer_fragments(rx));
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body))
}

async fn run_turn(
    state: &AppState,
    payload: &ChatPayload,
    events: &mpsc::Sender<TurnEvent>,
) -> Result<(), ApiError> {
    let history = state.history.load(&payload.thread_id).await?;
    let mut turn = TurnState::new(&payload.thread_id, history, &payload.message);

    let mut ctx = NodeContext {
        llm: &state.llm,
        retriever: &state.retriever,
        events,
    };
    state.graph.run(&mut turn, &mut ctx).await?;

    state.history.append(&turn.thread_id, turn.appended()).await?;

    tracing::info!(
        "Turn complete for thread '{}' ({} messages appended)",
        turn.thread_id,
        turn.appended().len()
    );
    Ok(())
}
