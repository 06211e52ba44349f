// Decide node
// One model call bound to the retrieve tool: answer directly or request
// retrieval with a query.

use async_trait::async_trait;

use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput, TurnEvent};
use crate::graph::state::TurnState;
use crate::history::ThreadMessage;
use crate::llm::types::ChatRequest;
use crate::rag::retriever::{Retriever, RETRIEVE_TOOL_NAME};

pub const DECIDE_NODE_ID: &str = "decide";

pub struct DecideNode;

impl DecideNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DecideNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for DecideNode {
    fn id(&self) -> &'static str {
        DECIDE_NODE_ID
    }

    async fn execute(
        &self,
        state: &mut TurnState,
        ctx: &mut NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let messages = state.messages.iter().map(|m| m.to_wire()).collect();
        let request = ChatRequest::new(messages).with_tools(vec![Retriever::tool_spec()]);

        let outcome = ctx
            .llm
            .chat(request)
            .await
            .map_err(|e| GraphError::new(self.id(), e))?;

        if let Some(call) = outcome.tool_calls.into_iter().next() {
            if call.name != RETRIEVE_TOOL_NAME {
                return Err(GraphError::upstream(
                    self.id(),
                    format!("model requested unknown tool '{}'", call.name),
                ));
            }
            tracing::debug!("Retrieval requested: {}", call.arguments);
            state.push(ThreadMessage::assistant_tool_call(call));
            return Ok(NodeOutput::Branch(super::RETRIEVE_NODE_ID.to_string()));
        }

        // Direct answer, no retrieval needed. Tagged with this node's id so
        // the streaming adapter keeps it internal.
        let content = outcome.content.unwrap_or_default();
        let _ = ctx
            .events
            .send(TurnEvent::Fragment {
                node: self.id(),
                text: content.clone(),
            })
            .await;
        state.push(ThreadMessage::assistant(content));
        Ok(NodeOutput::Final)
    }
}
