use std::env;
use std::fs;
use std::path::PathBuf;

/// Filesystem layout for all persisted state.
///
/// Everything lives under a single data directory so the whole installation
/// can be moved or wiped by handling one path.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub user_data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub history_db_path: PathBuf,
    pub vector_db_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let user_data_dir = discover_user_data_dir();
        let log_dir = user_data_dir.join("logs");
        let upload_dir = user_data_dir.join("uploads");
        let history_db_path = user_data_dir.join("history.db");
        let vector_db_path = user_data_dir.join("vectors.db");

        for dir in [&user_data_dir, &log_dir, &upload_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            user_data_dir,
            log_dir,
            upload_dir,
            history_db_path,
            vector_db_path,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_user_data_dir() -> PathBuf {
    if let Ok(dir) = env::var("DOCCHAT_DATA_DIR") {
        return PathBuf::from(dir);
    }
    env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("data")
}

/// Runtime settings, read once at startup from the environment.
///
/// Chunking and retrieval constants default to the values the rest of the
/// pipeline was tuned for (1000-char chunks, 200-char overlap, top-3).
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the OpenAI-compatible model server.
    pub llm_base_url: String,
    /// Optional bearer token for the model server.
    pub llm_api_key: Option<String>,
    /// Model id used for both dialogue turns in a chat.
    pub chat_model: String,
    /// Model id used for embedding chunks and queries.
    pub embedding_model: String,
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of snippets returned per retrieval.
    pub top_k: usize,
}

impl Settings {
    pub fn from_env() -> Self {
        Settings {
            llm_base_url: env::var("DOCCHAT_LLM_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            llm_api_key: env::var("DOCCHAT_LLM_API_KEY")
                .ok()
                .or_else(|| env::var("OPENAI_API_KEY").ok()),
            chat_model: env::var("DOCCHAT_CHAT_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            embedding_model: env::var("DOCCHAT_EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            chunk_size: env_usize("DOCCHAT_CHUNK_SIZE", 1000),
            chunk_overlap: env_usize("DOCCHAT_CHUNK_OVERLAP", 200),
            top_k: env_usize("DOCCHAT_TOP_K", 3),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    parse_usize(env::var(key).ok(), default)
}

fn parse_usize(raw: Option<String>, default: usize) -> usize {
    raw.and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(default)
}
