// Graph builder
// Wires the three-node turn graph: decide -> (retrieve -> generate) | end

use super::node::GraphError;
use super::nodes::{
    DecideNode, GenerateNode, RetrieveNode, DECIDE_NODE_ID, GENERATE_NODE_ID, RETRIEVE_NODE_ID,
};
use super::runtime::{GraphBuilder, GraphRuntime};

/// Build the dialogue turn graph.
///
/// `decide` either finishes the turn directly or branches to `retrieve`,
/// which always hands over to `generate`. Both `decide` and `generate`
/// terminate the graph themselves.
pub fn build_turn_graph() -> Result<GraphRuntime, GraphError> {
    GraphBuilder::new()
        .entry(DECIDE_NODE_ID)
        .max_steps(10)
        .node(Box::new(DecideNode::new()))
        .node(Box::new(RetrieveNode::new()))
        .node(Box::new(GenerateNode::new()))
        .conditional_edge(DECIDE_NODE_ID, RETRIEVE_NODE_ID, RETRIEVE_NODE_ID)
        .edge(RETRIEVE_NODE_ID, GENERATE_NODE_ID)
        .build()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use super::*;
    use crate::graph::node::{NodeContext, TurnEvent};
    use crate::graph::nodes::{DECIDE_NODE_ID, GENERATE_NODE_ID};
    use crate::graph::state::TurnState;
    use crate::history::Role;
    use crate::llm::testing::{embed_text, ScriptedProvider};
    use crate::llm::types::{ChatOutcome, ToolCall};
    use crate::llm::LlmProvider;
    use crate::rag::store::testing::InMemoryVectorStore;
    use crate::rag::store::StoredChunk;
    use crate::rag::Retriever;

    fn retrieval_call(query: &str) -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            name: "retrieve".to_string(),
            arguments: format!("{{\"query\":\"{}\"}}", query),
        }
    }

    fn warranty_store() -> Arc<InMemoryVectorStore> {
        let content = "The warranty period is 12 months.";
        Arc::new(InMemoryVectorStore::with_chunks(vec![(
            StoredChunk {
                chunk_id: "c1".to_string(),
                content: content.to_string(),
                source: "manual.pdf".to_string(),
                page: 4,
            },
            embed_text(content),
        )]))
    }

    async fn run_turn(
        llm: Arc<ScriptedProvider>,
        store: Arc<InMemoryVectorStore>,
        input: &str,
    ) -> (TurnState, Vec<TurnEvent>) {
        let provider: Arc<dyn LlmProvider> = llm;
        let retriever = Retriever::new(store, provider.clone(), 3);
        let (tx, mut rx) = mpsc::channel(32);

        let graph = build_turn_graph().unwrap();
        let mut state = TurnState::new("thread-1", Vec::new(), input);
        {
            let mut ctx = NodeContext {
                llm: &provider,
                retriever: &retriever,
                events: &tx,
            };
            graph.run(&mut state, &mut ctx).await.unwrap();
        }
        drop(tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        (state, events)
    }

    #[tokio::test]
    async fn retrieval_turn_appends_the_full_message_sequence() {
        let llm = Arc::new(ScriptedProvider::new(
            vec![ChatOutcome::tool_call(retrieval_call("warranty length"))],
            vec!["The warranty ", "is 12 months."],
        ));

        let (state, events) =
            run_turn(llm.clone(), warranty_store(), "How long is the warranty?").await;

        // The decide request offered the retrieval tool to the model.
        {
            let chat_requests = llm.chat_requests.lock().unwrap();
            assert_eq!(chat_requests.len(), 1);
            assert!(chat_requests[0].tools.iter().any(|t| t.name == "retrieve"));
        }

        let appended = state.appended();
        assert_eq!(appended.len(), 4);
        assert_eq!(appended[0].role, Role::User);
        assert!(appended[1].is_tool_call_only());
        assert!(appended[2].is_tool_result());
        assert!(appended[2].content.contains("12 months"));
        assert_eq!(appended[3].content, "The warranty is 12 months.");

        // Every streamed fragment came from the generate node.
        for event in &events {
            match event {
                TurnEvent::Fragment { node, .. } => assert_eq!(*node, GENERATE_NODE_ID),
                TurnEvent::Error(msg) => panic!("unexpected error event: {}", msg),
            }
        }
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn direct_answer_skips_retrieval_and_stays_internal() {
        let llm = Arc::new(ScriptedProvider::new(
            vec![ChatOutcome::answer("Hello! How can I help?")],
            Vec::new(),
        ));

        let (state, events) = run_turn(llm, warranty_store(), "hi there").await;

        let appended = state.appended();
        assert_eq!(appended.len(), 2);
        assert_eq!(appended[1].content, "Hello! How can I help?");

        // The decide-node fragment exists but is tagged as internal.
        assert_eq!(events.len(), 1);
        assert!(
            matches!(&events[0], TurnEvent::Fragment { node, .. } if *node == DECIDE_NODE_ID)
        );
    }

    #[tokio::test]
    async fn empty_index_turn_still_generates() {
        let llm = Arc::new(ScriptedProvider::new(
            vec![ChatOutcome::tool_call(retrieval_call("capital of France"))],
            vec!["I don't know based on the provided context."],
        ));
        let empty_store = Arc::new(InMemoryVectorStore::new());

        let (state, _events) =
            run_turn(llm.clone(), empty_store, "What is the capital of France?").await;

        let appended = state.appended();
        assert_eq!(appended.len(), 4);
        assert_eq!(appended[2].content, "");
        assert!(appended[3].content.contains("I don't know"));

        // The generate prompt saw an empty context, not a missing one.
        let stream_requests = llm.stream_requests.lock().unwrap();
        assert_eq!(stream_requests.len(), 1);
        assert_eq!(stream_requests[0].messages[0].role, "system");
    }

    #[tokio::test]
    async fn unknown_tool_fails_the_turn() {
        let llm = Arc::new(ScriptedProvider::new(
            vec![ChatOutcome::tool_call(ToolCall {
                id: "call_1".to_string(),
                name: "delete_everything".to_string(),
                arguments: "{}".to_string(),
            })],
            Vec::new(),
        ));
        let provider: Arc<dyn LlmProvider> = llm;
        let retriever = Retriever::new(Arc::new(InMemoryVectorStore::new()), provider.clone(), 3);
        let (tx, _rx) = mpsc::channel(32);

        let graph = build_turn_graph().unwrap();
        let mut state = TurnState::new("thread-1", Vec::new(), "question");
        let mut ctx = NodeContext {
            llm: &provider,
            retriever: &retriever,
            events: &tx,
        };

        let err = graph.run(&mut state, &mut ctx).await.unwrap_err();
        assert_eq!(err.node_id, DECIDE_NODE_ID);
        assert!(err.to_string().contains("delete_everything"));
    }

    #[tokio::test]
    async fn malformed_tool_arguments_fail_the_turn() {
        let llm = Arc::new(ScriptedProvider::new(
            vec![ChatOutcome::tool_call(ToolCall {
                id: "call_1".to_string(),
                name: "retrieve".to_string(),
                arguments: "not json".to_string(),
            })],
            Vec::new(),
        ));
        let provider: Arc<dyn LlmProvider> = llm;
        let retriever = Retriever::new(Arc::new(InMemoryVectorStore::new()), provider.clone(), 3);
        let (tx, _rx) = mpsc::channel(32);

        let graph = build_turn_graph().unwrap();
        let mut state = TurnState::new("thread-1", Vec::new(), "question");
        let mut ctx = NodeContext {
            llm: &provider,
            retriever: &retriever,
            events: &tx,
        };

        let err = graph.run(&mut state, &mut ctx).await.unwrap_err();
        assert_eq!(err.node_id, "retrieve");
    }
}
