use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::state::AppState;

/// `POST /process-pdf` — multipart upload under the `file` field.
///
/// The upload is spooled to a temporary file, indexed, and the temporary
/// file is removed whether indexing succeeded or not.
pub async fn process_pdf(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload: Option<(PathBuf, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(String::from)
            .unwrap_or_else(|| "upload.pdf".to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {}", e)))?;

        let temp_path = state
            .paths
            .upload_dir
            .join(format!("{}.pdf", Uuid::new_v4()));
        tokio::fs::write(&temp_path, &data)
            .await
            .map_err(ApiError::internal)?;

        upload = Some((temp_path, filename));
        break;
    }

    let (temp_path, filename) =
        upload.ok_or_else(|| ApiError::BadRequest("missing 'file' field".to_string()))?;

    let result = state.indexer.index(&temp_path, &filename).await;

    if let Err(e) = tokio::fs::remove_file(&temp_path).await {
        tracing::warn!("Failed to remove temporary upload {:?}: {}", temp_path, e);
    }

    let chunk_count = result?;

    Ok(Json(json!({
        "status": "success",
        "filename": filename,
        "message": format!("Indexed {} chunks", chunk_count),
    })))
}

/// `GET /documents/stats` — size of the persisted index.
pub async fn stats(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let chunks = state.vector_store.count().await?;
    Ok(Json(json!({ "chunks": chunks })))
}
