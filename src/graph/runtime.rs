// Graph runtime - petgraph based
// Executes the dialogue state machine one node at a time.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use super::node::{GraphError, Node, NodeContext, NodeOutput};
use super::state::TurnState;
use crate::core::errors::ApiError;

/// Edge condition for routing between nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdgeCondition {
    /// Default edge, taken on `NodeOutput::Advance`.
    Always,
    /// Taken when the node branches with this condition.
    On(String),
}

impl EdgeCondition {
    pub fn on(condition: impl Into<String>) -> Self {
        Self::On(condition.into())
    }
}

pub struct GraphRuntime {
    graph: DiGraph<Box<dyn Node>, EdgeCondition>,
    node_indices: HashMap<String, NodeIndex>,
    entry_node_id: String,
    max_steps: usize,
}

impl GraphRuntime {
    fn runtime_error(message: impl Into<String>) -> GraphError {
        GraphError::new("runtime", ApiError::Internal(message.into()))
    }

    /// Execute the graph to completion, mutating `state` as nodes run.
    pub async fn run(
        &self,
        state: &mut TurnState,
        ctx: &mut NodeContext<'_>,
    ) -> Result<(), GraphError> {
        let mut current_idx = *self
            .node_indices
            .get(&self.entry_node_id)
            .ok_or_else(|| Self::runtime_error(format!("entry node not found: {}", self.entry_node_id)))?;

        for _step in 0..self.max_steps {
            let node = self
                .graph
                .node_weight(current_idx)
                .ok_or_else(|| Self::runtime_error("node missing from graph"))?;

            tracing::debug!("Executing node: {}", node.id());
            match node.execute(state, ctx).await? {
                NodeOutput::Final => {
                    tracing::debug!("Turn complete at node: {}", node.id());
                    return Ok(());
                }
                NodeOutput::Advance => {
                    current_idx = self.next_node(current_idx, None)?;
                }
                NodeOutput::Branch(condition) => {
                    current_idx = self.next_node(current_idx, Some(&condition))?;
                }
            }
        }

        Err(Self::runtime_error(format!(
            "maximum steps ({}) exceeded",
            self.max_steps
        )))
    }

    fn next_node(
        &self,
        current_idx: NodeIndex,
        condition: Option<&str>,
    ) -> Result<NodeIndex, GraphError> {
        let current_id = self
            .graph
            .node_weight(current_idx)
            .map(|n| n.id())
            .unwrap_or("unknown");

        let edges: Vec<(NodeIndex, &EdgeCondition)> = self
            .graph
            .edges_directed(current_idx, Direction::Outgoing)
            .map(|edge| (edge.target(), edge.weight()))
            .collect();

        if let Some(cond) = condition {
            for (target, weight) in &edges {
                if matches!(weight, EdgeCondition::On(expected) if expected == cond) {
                    return Ok(*target);
                }
            }
        }

        for (target, weight) in &edges {
            if **weight == EdgeCondition::Always {
                if let Some(cond) = condition {
                    tracing::warn!(
                        "Condition '{}' unmatched at node '{}', taking default edge",
                        cond,
                        current_id
                    );
                }
                return Ok(*target);
            }
        }

        Err(Self::runtime_error(format!(
            "no matching edge from '{}' for condition {:?}",
            current_id, condition
        )))
    }
}

/// Fluent construction of a `GraphRuntime`.
pub struct GraphBuilder {
    graph: DiGraph<Box<dyn Node>, EdgeCondition>,
    node_indices: HashMap<String, NodeIndex>,
    entry_node_id: String,
    max_steps: usize,
    pending_edges: Vec<(String, String, EdgeCondition)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_indices: HashMap::new(),
            entry_node_id: String::new(),
            max_steps: 10,
            pending_edges: Vec::new(),
        }
    }

    pub fn entry(mut self, node_id: impl Into<String>) -> Self {
        self.entry_node_id = node_id.into();
        self
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn node(mut self, node: Box<dyn Node>) -> Self {
        let id = node.id().to_string();
        let index = self.graph.add_node(node);
        self.node_indices.insert(id, index);
        self
    }

    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.pending_edges
            .push((from.into(), to.into(), EdgeCondition::Always));
        self
    }

    pub fn conditional_edge(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        condition: impl Into<String>,
    ) -> Self {
        self.pending_edges
            .push((from.into(), to.into(), EdgeCondition::on(condition)));
        self
    }

    pub fn build(mut self) -> Result<GraphRuntime, GraphError> {
        for (from, to, condition) in self.pending_edges.drain(..) {
            let from_idx = *self.node_indices.get(&from).ok_or_else(|| {
                GraphRuntime::runtime_error(format!("source node not found: {}", from))
            })?;
            let to_idx = *self.node_indices.get(&to).ok_or_else(|| {
                GraphRuntime::runtime_error(format!("target node not found: {}", to))
            })?;
            self.graph.add_edge(from_idx, to_idx, condition);
        }

        if !self.node_indices.contains_key(&self.entry_node_id) {
            return Err(GraphRuntime::runtime_error(format!(
                "entry node not found: {}",
                self.entry_node_id
            )));
        }

        Ok(GraphRuntime {
            graph: self.graph,
            node_indices: self.node_indices,
            entry_node_id: self.entry_node_id,
            max_steps: self.max_steps,
        })
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
