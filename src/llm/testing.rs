//! Scripted provider for exercising the dialogue graph without a model server.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::provider::LlmProvider;
use super::types::{ChatOutcome, ChatRequest};
use crate::core::errors::ApiError;

/// Replays a fixed sequence of chat outcomes and streams canned fragments.
pub struct ScriptedProvider {
    outcomes: Mutex<VecDeque<ChatOutcome>>,
    stream_fragments: Vec<String>,
    /// Requests seen by `chat`, for assertions on prompt construction.
    pub chat_requests: Mutex<Vec<ChatRequest>>,
    /// Requests seen by `stream_chat`.
    pub stream_requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new(outcomes: Vec<ChatOutcome>, stream_fragments: Vec<&str>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            stream_fragments: stream_fragments.into_iter().map(String::from).collect(),
            chat_requests: Mutex::new(Vec::new()),
            stream_requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatOutcome, ApiError> {
        self.chat_requests.lock().unwrap().push(request);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ApiError::Upstream("scripted provider exhausted".to_string()))
    }

    async fn stream_chat(
        &self,
        request: ChatRequest,
    ) -> Result<mpsc::Receiver<Result<String, ApiError>>, ApiError> {
        self.stream_requests.lock().unwrap().push(request);
        let (tx, rx) = mpsc::channel(32);
        let fragments = self.stream_fragments.clone();
        tokio::spawn(async move {
            for fragment in fragments {
                if tx.send(Ok(fragment)).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        Ok(inputs.iter().map(|text| embed_text(text)).collect())
    }
}

/// Deterministic byte-histogram embedding. Similar strings produce similar
/// vectors, which is all the store tests need.
pub fn embed_text(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; 16];
    for byte in text.bytes() {
        vector[(byte % 16) as usize] += 1.0;
    }
    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}
