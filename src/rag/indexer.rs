//! Document indexer: PDF -> per-page text -> overlapping chunks -> one
//! batched embed + insert into the vector store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use super::splitter::{TextChunk, TextSplitter};
use super::store::{StoredChunk, VectorStore};
use crate::core::config::Settings;
use crate::core::errors::ApiError;
use crate::llm::LlmProvider;

#[derive(Clone)]
pub struct DocumentIndexer {
    splitter: TextSplitter,
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LlmProvider>,
}

impl DocumentIndexer {
    pub fn new(settings: &Settings, store: Arc<dyn VectorStore>, llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            splitter: TextSplitter::new(settings.chunk_size, settings.chunk_overlap),
            store,
            llm,
        }
    }

    /// Index the PDF at `path`, recording `source_name` (the original upload
    /// filename) in chunk metadata. Returns the number of chunks persisted.
    ///
    /// Re-indexing the same document appends a second copy of its chunks;
    /// deduplication is intentionally out of scope.
    pub async fn index(&self, path: &Path, source_name: &str) -> Result<usize, ApiError> {
        let owned: PathBuf = path.to_path_buf();
        let pages = tokio::task::spawn_blocking(move || extract_pdf_pages(&owned))
            .await
            .map_err(ApiError::internal)??;

        self.index_pages(&pages, source_name).await
    }

    async fn index_pages(&self, pages: &[(i64, String)], source: &str) -> Result<usize, ApiError> {
        let mut chunks: Vec<TextChunk> = Vec::new();
        for (page, text) in pages {
            chunks.extend(self.splitter.split(text, source, *page));
        }

        if chunks.is_empty() {
            return Err(ApiError::SourceUnreadable(format!(
                "no extractable text in '{}'",
                source
            )));
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = self.llm.embed(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(ApiError::Upstream(format!(
                "embedding count mismatch: {} chunks, {} vectors",
                chunks.len(),
                embeddings.len()
            )));
        }

        let count = chunks.len();
        let items: Vec<(StoredChunk, Vec<f32>)> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                (
                    StoredChunk {
                        chunk_id: Uuid::new_v4().to_string(),
                        content: chunk.text,
                        source: chunk.source,
                        page: chunk.page,
                    },
                    embedding,
                )
            })
            .collect();

        self.store.insert_batch(items).await?;
        tracing::info!("Indexed {} chunks from '{}'", count, source);
        Ok(count)
    }
}

fn extract_pdf_pages(path: &Path) -> Result<Vec<(i64, String)>, ApiError> {
    let doc = lopdf::Document::load(path)
        .map_err(|e| ApiError::SourceUnreadable(format!("failed to load PDF: {}", e)))?;

    let mut pages = Vec::new();
    for (page_number, _) in doc.get_pages() {
        match doc.extract_text(&[page_number]) {
            Ok(text) if !text.trim().is_empty() => pages.push((page_number as i64, text)),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Skipping page {}: {}", page_number, e);
            }
        }
    }

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedProvider;
    use crate::rag::store::testing::InMemoryVectorStore;

    fn indexer(store: Arc<InMemoryVectorStore>) -> DocumentIndexer {
        let settings = Settings {
            llm_base_url: String::new(),
            llm_api_key: None,
            chat_model: String::new(),
            embedding_model: String::new(),
            chunk_size: 100,
            chunk_overlap: 20,
            top_k: 3,
        };
        let llm = Arc::new(ScriptedProvider::new(Vec::new(), Vec::new()));
        DocumentIndexer::new(&settings, store, llm)
    }

    #[tokio::test]
    async fn missing_file_is_source_unreadable() {
        let store = Arc::new(InMemoryVectorStore::new());
        let err = indexer(store)
            .index(Path::new("/does/not/exist.pdf"), "exist.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::SourceUnreadable(_)));
    }

    #[tokio::test]
    async fn pages_are_chunked_embedded_and_stored() {
        let store = Arc::new(InMemoryVectorStore::new());
        let indexer = indexer(store.clone());

        let long_page = "x".repeat(250);
        let pages = vec![(1i64, long_page), (2i64, "short page".to_string())];
        let count = indexer.index_pages(&pages, "doc.pdf").await.unwrap();

        // 250 chars at size 100 / overlap 20 -> 4 chunks, plus 1 for page 2.
        assert_eq!(count, 5);
        assert_eq!(store.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn empty_document_is_source_unreadable() {
        let store = Arc::new(InMemoryVectorStore::new());
        let err = indexer(store)
            .index_pages(&[], "empty.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::SourceUnreadable(_)));
    }

    #[tokio::test]
    async fn reindexing_duplicates_chunks() {
        let store = Arc::new(InMemoryVectorStore::new());
        let indexer = indexer(store.clone());
        let pages = vec![(1i64, "the warranty period is 12 months".to_string())];

        indexer.index_pages(&pages, "doc.pdf").await.unwrap();
        indexer.index_pages(&pages, "doc.pdf").await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
    }
}
