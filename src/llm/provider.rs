use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::{ChatOutcome, ChatRequest};
use crate::core::errors::ApiError;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// provider name (e.g. "openai_compat")
    fn name(&self) -> &str;

    /// chat completion (non-streaming); the model may answer or request a tool
    async fn chat(&self, request: ChatRequest) -> Result<ChatOutcome, ApiError>;

    /// chat completion (streaming); tool declarations are ignored here
    async fn stream_chat(
        &self,
        request: ChatRequest,
    ) -> Result<mpsc::Receiver<Result<String, ApiError>>, ApiError>;

    /// generate embeddings, one vector per input
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;
}
