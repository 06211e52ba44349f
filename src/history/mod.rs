//! Per-thread conversation memory.
//!
//! Every chat turn loads the full message history for its thread id and
//! appends the turn's new messages in one transaction when the turn
//! completes. Threads are created implicitly on first use and never deleted
//! here.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use crate::core::errors::ApiError;
use crate::llm::types::{ChatMessage, ToolCall, WireToolCall};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Result of a tool execution (retrieved context).
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "system" => Role::System,
            "assistant" => Role::Assistant,
            "tool" => Role::Tool,
            _ => Role::User,
        }
    }
}

/// One conversational utterance, append-only within a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub role: Role,
    pub content: String,
    /// Pending retrieval request, set on assistant messages that asked for a
    /// tool instead of answering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,
    /// Id of the tool call this message answers, set on `Role::Tool` messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ThreadMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_call: None,
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_call: None,
            tool_call_id: None,
        }
    }

    pub fn assistant_tool_call(call: ToolCall) -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            tool_call: Some(call),
            tool_call_id: None,
        }
    }

    pub fn tool_result(content: impl Into<String>, call_id: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call: None,
            tool_call_id: Some(call_id.into()),
        }
    }

    pub fn is_tool_result(&self) -> bool {
        self.role == Role::Tool
    }

    /// True for assistant messages that only carried a tool request; they
    /// have no user-visible content and are excluded from prompt replay.
    pub fn is_tool_call_only(&self) -> bool {
        self.role == Role::Assistant && self.tool_call.is_some()
    }

    /// Convert to the provider wire format.
    pub fn to_wire(&self) -> ChatMessage {
        ChatMessage {
            role: self.role.as_str().to_string(),
            content: if self.content.is_empty() && self.tool_call.is_some() {
                None
            } else {
                Some(self.content.clone())
            },
            tool_calls: self
                .tool_call
                .as_ref()
                .map(|call| vec![WireToolCall::from(call)]),
            tool_call_id: self.tool_call_id.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ConversationStore {
    pool: SqlitePool,
}

impl ConversationStore {
    pub async fn new(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to open history db: {}", e)))?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS threads (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                thread_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                tool_call JSON,
                tool_call_id TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY(thread_id) REFERENCES threads(id) ON DELETE CASCADE
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_thread_id ON messages(thread_id)")
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(())
    }

    /// Append a completed turn's messages in one transaction.
    ///
    /// The thread row is created on first use. Either all messages land or
    /// none do; interleaving with concurrent turns on the same thread is not
    /// otherwise serialized.
    pub async fn append(
        &self,
        thread_id: &str,
        messages: &[ThreadMessage],
    ) -> Result<(), ApiError> {
        if messages.is_empty() {
            return Ok(());
        }

        let now = chrono::Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        sqlx::query("INSERT OR IGNORE INTO threads (id, created_at, updated_at) VALUES (?, ?, ?)")
            .bind(thread_id)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;

        sqlx::query("UPDATE threads SET updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(thread_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;

        for message in messages {
            let tool_call_json = message
                .tool_call
                .as_ref()
                .map(|call| serde_json::to_string(call).unwrap_or_default());

            sqlx::query(
                "INSERT INTO messages (thread_id, role, content, tool_call, tool_call_id, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(thread_id)
            .bind(message.role.as_str())
            .bind(&message.content)
            .bind(tool_call_json)
            .bind(message.tool_call_id.as_deref())
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(())
    }

    /// Load the ordered message history for a thread. Unknown thread ids
    /// yield an empty history, not an error.
    pub async fn load(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ApiError> {
        let rows = sqlx::query(
            "SELECT role, content, tool_call, tool_call_id FROM messages
             WHERE thread_id = ? ORDER BY id ASC",
        )
        .bind(thread_id)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let messages = rows
            .iter()
            .map(|row| {
                let role: String = row.get("role");
                let tool_call: Option<String> = row.get("tool_call");
                ThreadMessage {
                    role: Role::from_str(&role),
                    content: row.get("content"),
                    tool_call: tool_call.and_then(|raw| serde_json::from_str(&raw).ok()),
                    tool_call_id: row.get("tool_call_id"),
                }
            })
            .collect();

        Ok(messages)
    }
}
