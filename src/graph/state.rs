// Turn state threaded through the dialogue graph for one invocation.

use crate::history::ThreadMessage;

/// Working state for a single turn: the committed history of the thread plus
/// whatever messages this turn appends (tool request, tool result, answer).
/// Discarded once the appended suffix is persisted.
#[derive(Debug, Clone)]
pub struct TurnState {
    pub thread_id: String,
    pub messages: Vec<ThreadMessage>,
    /// Number of leading messages already persisted before this turn.
    committed: usize,
}

impl TurnState {
    /// Start a turn: prior history plus the incoming user message, which is
    /// part of this turn's append set.
    pub fn new(thread_id: impl Into<String>, history: Vec<ThreadMessage>, input: &str) -> Self {
        let committed = history.len();
        let mut messages = history;
        messages.push(ThreadMessage::user(input));
        Self {
            thread_id: thread_id.into(),
            messages,
            committed,
        }
    }

    pub fn push(&mut self, message: ThreadMessage) {
        self.messages.push(message);
    }

    /// Messages produced this turn, in order. This is what gets committed to
    /// conversation memory when the turn completes.
    pub fn appended(&self) -> &[ThreadMessage] {
        &self.messages[self.committed..]
    }

    /// The maximal contiguous run of tool-result messages at the end of the
    /// history, oldest first. Generation grounds its answer on exactly this
    /// run, not on tool results from earlier turns.
    pub fn trailing_tool_results(&self) -> Vec<&ThreadMessage> {
        let mut run: Vec<&ThreadMessage> = self
            .messages
            .iter()
            .rev()
            .take_while(|message| message.is_tool_result())
            .collect();
        run.reverse();
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ToolCall;

    fn call() -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            name: "retrieve".to_string(),
            arguments: "{\"query\":\"q\"}".to_string(),
        }
    }

    #[test]
    fn new_turn_appends_the_user_message() {
        let history = vec![
            ThreadMessage::user("earlier"),
            ThreadMessage::assistant("reply"),
        ];
        let state = TurnState::new("t", history, "follow-up");

        assert_eq!(state.messages.len(), 3);
        assert_eq!(state.appended().len(), 1);
        assert_eq!(state.appended()[0].content, "follow-up");
    }

    #[test]
    fn appended_tracks_everything_pushed_this_turn() {
        let mut state = TurnState::new("t", vec![ThreadMessage::user("old")], "new");
        state.push(ThreadMessage::assistant_tool_call(call()));
        state.push(ThreadMessage::tool_result("ctx", "call_1"));
        state.push(ThreadMessage::assistant("answer"));

        let appended = state.appended();
        assert_eq!(appended.len(), 4);
        assert_eq!(appended[3].content, "answer");
    }

    #[test]
    fn trailing_tool_results_stop_at_the_last_non_tool_message() {
        let mut state = TurnState::new("t", Vec::new(), "question");
        // A tool result from an earlier exchange, already buried.
        state.push(ThreadMessage::tool_result("stale", "call_0"));
        state.push(ThreadMessage::assistant("earlier answer"));
        state.push(ThreadMessage::assistant_tool_call(call()));
        state.push(ThreadMessage::tool_result("fresh-1", "call_1"));
        state.push(ThreadMessage::tool_result("fresh-2", "call_2"));

        let run = state.trailing_tool_results();
        assert_eq!(run.len(), 2);
        assert_eq!(run[0].content, "fresh-1");
        assert_eq!(run[1].content, "fresh-2");
    }

    #[test]
    fn trailing_tool_results_is_empty_without_tool_messages() {
        let state = TurnState::new("t", Vec::new(), "question");
        assert!(state.trailing_tool_results().is_empty());
    }
}
