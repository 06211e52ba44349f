mod core;
mod graph;
mod history;
mod llm;
mod rag;
mod server;
mod state;

use std::env;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let state = AppState::initialize().await?;
    let _log_guard = crate::core::logging::init(&state.paths).context("Failed to set up logging")?;
    tracing::info!("Data directory: {}", state.paths.user_data_dir.display());
    tracing::info!(
        "Using {} (chat: {}, embeddings: {})",
        state.llm.name(),
        state.settings.chat_model,
        state.settings.embedding_model
    );

    let port = env::var("PORT")
        .ok()
        .and_then(|val| val.parse::<u16>().ok())
        .unwrap_or(8000);
    let bind_addr = format!("127.0.0.1:{}", port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state.clone());

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
