//! Retrieval tool: embeds a query, asks the vector store for the top-K
//! chunks, and serializes them into one context string for generation.

use std::sync::Arc;

use serde_json::json;

use super::store::{ChunkSearchResult, VectorStore};
use crate::core::errors::ApiError;
use crate::llm::types::ToolSpec;
use crate::llm::LlmProvider;

/// Tool name the dialogue model is allowed to invoke.
pub const RETRIEVE_TOOL_NAME: &str = "retrieve";

#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LlmProvider>,
    top_k: usize,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStore>, llm: Arc<dyn LlmProvider>, top_k: usize) -> Self {
        Self { store, llm, top_k }
    }

    /// Declaration handed to the Decide step; the model fills in `query`.
    pub fn tool_spec() -> ToolSpec {
        ToolSpec {
            name: RETRIEVE_TOOL_NAME,
            description: "Retrieve information related to a query.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query over the indexed documents."
                    }
                },
                "required": ["query"]
            }),
        }
    }

    /// Retrieve context for `query`. An empty index produces an empty
    /// string; that is a normal state, not a failure.
    pub async fn retrieve(&self, query: &str) -> Result<String, ApiError> {
        let embeddings = self.llm.embed(&[query.to_string()]).await?;
        let query_embedding = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Upstream("embedding response was empty".to_string()))?;

        let hits = self.store.search(&query_embedding, self.top_k).await?;
        Ok(serialize_snippets(&hits))
    }
}

/// Format snippets in descending similarity order, one block per snippet.
fn serialize_snippets(hits: &[ChunkSearchResult]) -> String {
    hits.iter()
        .map(|hit| {
            format!(
                "Source: {} (page {})\nContent: {}",
                hit.chunk.source, hit.chunk.page, hit.chunk.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{embed_text, ScriptedProvider};
    use crate::rag::store::testing::InMemoryVectorStore;
    use crate::rag::store::StoredChunk;

    fn chunk(id: &str, content: &str, page: i64) -> StoredChunk {
        StoredChunk {
            chunk_id: id.to_string(),
            content: content.to_string(),
            source: "manual.pdf".to_string(),
            page,
        }
    }

    #[test]
    fn snippets_serialize_with_source_and_content() {
        let hits = vec![
            ChunkSearchResult {
                chunk: chunk("a", "The warranty period is 12 months.", 4),
                score: 0.9,
            },
            ChunkSearchResult {
                chunk: chunk("b", "Returns require a receipt.", 5),
                score: 0.5,
            },
        ];

        let serialized = serialize_snippets(&hits);
        assert_eq!(
            serialized,
            "Source: manual.pdf (page 4)\nContent: The warranty period is 12 months.\n\n\
             Source: manual.pdf (page 5)\nContent: Returns require a receipt."
        );
    }

    #[test]
    fn no_hits_serialize_to_empty_string() {
        assert_eq!(serialize_snippets(&[]), "");
    }

    #[tokio::test]
    async fn empty_index_returns_empty_context() {
        let store = Arc::new(InMemoryVectorStore::new());
        let llm = Arc::new(ScriptedProvider::new(Vec::new(), Vec::new()));
        let retriever = Retriever::new(store, llm, 3);

        let context = retriever.retrieve("anything").await.unwrap();
        assert!(context.is_empty());
    }

    #[tokio::test]
    async fn retrieve_caps_results_at_top_k() {
        let items: Vec<(StoredChunk, Vec<f32>)> = (0..5)
            .map(|i| {
                let content = format!("warranty clause {}", i);
                let embedding = embed_text(&content);
                (chunk(&format!("c{}", i), &content, i + 1), embedding)
            })
            .collect();
        let store = Arc::new(InMemoryVectorStore::with_chunks(items));
        let llm = Arc::new(ScriptedProvider::new(Vec::new(), Vec::new()));
        let retriever = Retriever::new(store, llm, 3);

        let context = retriever.retrieve("warranty clause").await.unwrap();
        let blocks = context.split("\n\n").count();
        assert_eq!(blocks, 3);
        assert!(context.contains("Source: manual.pdf"));
    }

    #[test]
    fn tool_spec_names_the_retrieve_tool() {
        let spec = Retriever::tool_spec();
        assert_eq!(spec.name, RETRIEVE_TOOL_NAME);
        assert_eq!(spec.parameters["required"][0], "query");
    }
}
