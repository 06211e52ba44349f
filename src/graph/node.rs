// Node trait and types
// Base abstraction for dialogue graph nodes

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::state::TurnState;
use crate::core::errors::ApiError;
use crate::llm::LlmProvider;
use crate::rag::Retriever;

/// Incremental output of a running turn. The streaming adapter decides what
/// reaches the external caller; nodes just tag what they produced.
#[derive(Debug, Clone)]
pub enum TurnEvent {
    /// A fragment of assistant text produced by the named node.
    Fragment { node: &'static str, text: String },
    /// The turn failed; no further fragments will follow.
    Error(String),
}

/// Context passed to nodes during execution.
pub struct NodeContext<'a> {
    pub llm: &'a Arc<dyn LlmProvider>,
    pub retriever: &'a Retriever,
    /// Channel for incremental turn output. Send failures mean the consumer
    /// went away; nodes ignore them and finish the turn.
    pub events: &'a mpsc::Sender<TurnEvent>,
}

/// Output from a node execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutput {
    /// Follow the default outgoing edge.
    Advance,
    /// Follow the edge matching this condition.
    Branch(String),
    /// Graph execution complete.
    Final,
}

/// Failure inside a node, attributed to the node that raised it. The wrapped
/// `ApiError` keeps the error taxonomy intact across the graph boundary.
#[derive(Debug, Error)]
#[error("graph error in {node_id}: {source}")]
pub struct GraphError {
    pub node_id: String,
    #[source]
    pub source: ApiError,
}

impl GraphError {
    pub fn new(node_id: impl Into<String>, source: ApiError) -> Self {
        Self {
            node_id: node_id.into(),
            source,
        }
    }

    /// Shorthand for model-capability faults raised inside a node.
    pub fn upstream(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(node_id, ApiError::Upstream(message.into()))
    }
}

impl From<GraphError> for ApiError {
    fn from(err: GraphError) -> Self {
        err.source
    }
}

/// All dialogue graph nodes implement this.
#[async_trait]
pub trait Node: Send + Sync {
    /// Unique identifier for this node.
    fn id(&self) -> &'static str;

    /// Execute the node logic.
    async fn execute(
        &self,
        state: &mut TurnState,
        ctx: &mut NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError>;
}
