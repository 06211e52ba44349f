//! Streaming response adapter.
//!
//! Converts the turn's internal event feed into the plain-text fragment
//! sequence the HTTP caller sees. Only generate-node fragments are surfaced;
//! decide and retrieve internals (tool calls, raw context) never leave the
//! process. The sequence ends when the turn task drops its sender.

use std::convert::Infallible;

use futures_util::stream::{self, Stream};
use tokio::sync::mpsc;

use crate::graph::nodes::GENERATE_NODE_ID;
use crate::graph::TurnEvent;

pub fn answer_fragments(
    rx: mpsc::Receiver<TurnEvent>,
) -> impl Stream<Item = Result<String, Infallible>> {
    stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Some(TurnEvent::Fragment { node, text }) if node == GENERATE_NODE_ID => {
                    return Some((Ok(text), rx));
                }
                // Internal step output; not for the caller.
                Some(TurnEvent::Fragment { .. }) => continue,
                Some(TurnEvent::Error(message)) => {
                    return Some((Ok(format!("[error] {}", message)), rx));
                }
                None => return None,
            }
        }
    })
}
