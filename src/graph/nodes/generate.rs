// Generate node
// Grounds the final answer on the context retrieved this turn and streams it
// out fragment by fragment.

use async_trait::async_trait;

use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput, TurnEvent};
use crate::graph::state::TurnState;
use crate::history::ThreadMessage;
use crate::llm::types::{ChatMessage, ChatRequest};

pub const GENERATE_NODE_ID: &str = "generate";

const SYSTEM_INSTRUCTION: &str = "You are an assistant for question answering tasks. \
    Use the following pieces of retrieved context to answer the question. \
    If you don't know the answer, say that you don't know. \
    Use three sentences maximum and keep the answer concise.";

/// Substituted when generation is somehow entered without a tool result.
/// Admitting the gap beats hallucinating over an empty prompt.
const MISSING_CONTEXT: &str = "(no context was retrieved for this question)";

pub struct GenerateNode;

impl GenerateNode {
    pub fn new() -> Self {
        Self
    }

    fn build_prompt(state: &TurnState) -> Vec<ChatMessage> {
        let tool_results = state.trailing_tool_results();
        let context = if tool_results.is_empty() {
            MISSING_CONTEXT.to_string()
        } else {
            tool_results
                .iter()
                .map(|message| message.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        let system = format!("{}\n\n{}", SYSTEM_INSTRUCTION, context);

        // Replay the conversation minus tool plumbing: tool results are
        // already folded into the system message, and assistant messages
        // that only carried a tool call have nothing to say.
        let mut prompt = vec![ChatMessage::text("system", system)];
        prompt.extend(
            state
                .messages
                .iter()
                .filter(|m| !m.is_tool_result() && !m.is_tool_call_only())
                .map(|m| m.to_wire()),
        );
        prompt
    }
}

impl Default for GenerateNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for GenerateNode {
    fn id(&self) -> &'static str {
        GENERATE_NODE_ID
    }

    async fn execute(
        &self,
        state: &mut TurnState,
        ctx: &mut NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let request = ChatRequest::new(Self::build_prompt(state));

        let mut stream = ctx
            .llm
            .stream_chat(request)
            .await
            .map_err(|e| GraphError::new(self.id(), e))?;

        let mut answer = String::new();
        while let Some(fragment) = stream.recv().await {
            match fragment {
                Ok(text) => {
                    if text.is_empty() {
                        continue;
                    }
                    answer.push_str(&text);
                    let _ = ctx
                        .events
                        .send(TurnEvent::Fragment {
                            node: self.id(),
                            text,
                        })
                        .await;
                }
                Err(err) => {
                    return Err(GraphError::new(self.id(), err));
                }
            }
        }

        state.push(ThreadMessage::assistant(answer));
        Ok(NodeOutput::Final)
    }
}
