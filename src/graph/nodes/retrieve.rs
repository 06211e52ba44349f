// Retrieve node
// Executes the retrieval requested by Decide and records the context as a
// tool-result message.

use async_trait::async_trait;
use serde_json::Value;

use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::TurnState;
use crate::history::ThreadMessage;

pub const RETRIEVE_NODE_ID: &str = "retrieve";

pub struct RetrieveNode;

impl RetrieveNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RetrieveNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for RetrieveNode {
    fn id(&self) -> &'static str {
        RETRIEVE_NODE_ID
    }

    async fn execute(
        &self,
        state: &mut TurnState,
        ctx: &mut NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let call = state
            .messages
            .last()
            .and_then(|message| message.tool_call.clone())
            .ok_or_else(|| {
                GraphError::upstream(self.id(), "entered retrieve without a pending tool call")
            })?;

        let arguments: Value = serde_json::from_str(&call.arguments).map_err(|e| {
            GraphError::upstream(self.id(), format!("malformed tool arguments: {}", e))
        })?;
        let query = arguments
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                GraphError::upstream(self.id(), "tool call is missing the 'query' argument")
            })?;

        let context = ctx
            .retriever
            .retrieve(query)
            .await
            .map_err(|e| GraphError::new(self.id(), e))?;

        if context.is_empty() {
            tracing::info!("Retrieval for '{}' found nothing (index may be empty)", query);
        }

        state.push(ThreadMessage::tool_result(context, call.id));
        Ok(NodeOutput::Advance)
    }
}
