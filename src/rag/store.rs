//! VectorStore trait — abstract interface for chunk storage backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// A persisted document chunk with its source metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Unique chunk identifier.
    pub chunk_id: String,
    /// The text content of the chunk.
    pub content: String,
    /// Origin file name.
    pub source: String,
    /// 1-based page number within the source document.
    pub page: i64,
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSearchResult {
    pub chunk: StoredChunk,
    /// Cosine similarity (higher = better).
    pub score: f32,
}

/// Abstract trait for chunk storage backends.
///
/// The index grows monotonically: there is no dedup and no update-in-place,
/// so re-indexing the same document stores a second copy of its chunks.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert chunks with their embedding vectors in one batch.
    async fn insert_batch(&self, items: Vec<(StoredChunk, Vec<f32>)>) -> Result<(), ApiError>;

    /// Search for chunks similar to the query embedding, ordered by
    /// non-increasing score. Returns at most `limit` results; an empty index
    /// yields an empty list, not an error.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, ApiError>;

    /// Total number of persisted chunks.
    async fn count(&self) -> Result<usize, ApiError>;
}
