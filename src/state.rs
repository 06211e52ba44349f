use std::sync::Arc;

use crate::core::config::{AppPaths, Settings};
use crate::core::errors::ApiError;
use crate::graph::{build_turn_graph, GraphRuntime};
use crate::history::ConversationStore;
use crate::llm::{LlmProvider, OpenAiCompatProvider};
use crate::rag::{DocumentIndexer, Retriever, SqliteVectorStore, VectorStore};

/// Global application state shared across all routes.
///
/// Constructed once at process start and passed by handle into the indexer,
/// retriever and turn graph; there are no module-level singletons.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub settings: Settings,
    pub llm: Arc<dyn LlmProvider>,
    pub vector_store: Arc<dyn VectorStore>,
    pub history: ConversationStore,
    pub indexer: DocumentIndexer,
    pub retriever: Retriever,
    pub graph: Arc<GraphRuntime>,
}

impl AppState {
    pub async fn initialize() -> Result<Arc<Self>, ApiError> {
        let paths = Arc::new(AppPaths::new());
        let settings = Settings::from_env();

        let history = ConversationStore::new(paths.history_db_path.clone()).await?;

        let vector_store: Arc<dyn VectorStore> =
            Arc::new(SqliteVectorStore::new(paths.vector_db_path.clone()).await?);

        let llm: Arc<dyn LlmProvider> = Arc::new(OpenAiCompatProvider::new(
            settings.llm_base_url.clone(),
            settings.llm_api_key.clone(),
            settings.chat_model.clone(),
            settings.embedding_model.clone(),
        ));

        let indexer = DocumentIndexer::new(&settings, vector_store.clone(), llm.clone());
        let retriever = Retriever::new(vector_store.clone(), llm.clone(), settings.top_k);

        let graph = Arc::new(build_turn_graph().map_err(ApiError::internal)?);

        Ok(Arc::new(AppState {
            paths,
            settings,
            llm,
            vector_store,
            history,
            indexer,
            retriever,
            graph,
        }))
    }
}
