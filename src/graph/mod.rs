// Dialogue graph
// LangGraph-style StateGraph for the retrieve-or-answer turn loop

pub mod builder;
pub mod node;
pub mod nodes;
pub mod runtime;
pub mod state;

pub use builder::build_turn_graph;
pub use node::{GraphError, Node, NodeContext, NodeOutput, TurnEvent};
pub use runtime::GraphRuntime;
pub use state::TurnState;
