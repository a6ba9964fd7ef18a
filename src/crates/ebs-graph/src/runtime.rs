//! The graph runtime: topological dispatch, delta streaming, cancellation, and the
//! recursion cap (§4.1).

use std::collections::HashMap;
use std::sync::Arc;

use ebs_core::{RunState, RunStateDelta};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::cancel::CancelToken;
use crate::edge::Edge;
use crate::error::{GraphError, Result};
use crate::node::{NodeExecutor, NodeId, END};

const DEFAULT_RECURSION_CAP: usize = 50;

/// One node visit's contribution to the run, as delivered to streaming subscribers.
#[derive(Debug, Clone)]
pub struct StepEvent {
    pub node: NodeId,
    pub delta: RunStateDelta,
}

/// A graph specialized to [`RunState`], generic only over the dependency-injected
/// context `C` each node receives (inference service, knowledge base, HIL registry —
/// never resolved via global lookups, per §9).
pub struct Graph<C> {
    nodes: HashMap<NodeId, Arc<dyn NodeExecutor<C>>>,
    edges: HashMap<NodeId, Edge>,
    entry: NodeId,
    recursion_cap: usize,
}

impl<C> Graph<C>
where
    C: Send + Sync + 'static,
{
    pub fn new(entry: impl Into<NodeId>) -> Self {
        Graph {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            entry: entry.into(),
            recursion_cap: DEFAULT_RECURSION_CAP,
        }
    }

    pub fn with_recursion_cap(mut self, cap: usize) -> Self {
        self.recursion_cap = cap;
        self
    }

    pub fn register_node(&mut self, name: impl Into<NodeId>, executor: Arc<dyn NodeExecutor<C>>) {
        self.nodes.insert(name.into(), executor);
    }

    /// Unconditional `from -> to`. Overwrites any existing edge from `from`: a node has
    /// exactly one outgoing edge, direct or conditional.
    pub fn add_edge(&mut self, from: impl Into<NodeId>, to: impl Into<NodeId>) {
        self.edges.insert(from.into(), Edge::Direct(to.into()));
    }

    pub fn add_conditional_edge(
        &mut self,
        from: impl Into<NodeId>,
        decider: crate::edge::Decider,
        branches: HashMap<String, NodeId>,
    ) {
        self.edges
            .insert(from.into(), Edge::Conditional { decider, branches });
    }

    /// Checks that every edge target (direct or conditional branch) names a registered
    /// node or `END`, and that the entry node is registered.
    pub fn validate(&self) -> Result<()> {
        if !self.nodes.contains_key(&self.entry) {
            return Err(GraphError::Validation(format!(
                "entry node '{}' is not registered",
                self.entry
            )));
        }
        for (from, edge) in &self.edges {
            if !self.nodes.contains_key(from) {
                return Err(GraphError::Validation(format!(
                    "edge source '{from}' is not a registered node"
                )));
            }
            match edge {
                Edge::Direct(to) => self.check_target(to)?,
                Edge::Conditional { branches, .. } => {
                    for to in branches.values() {
                        self.check_target(to)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn check_target(&self, to: &str) -> Result<()> {
        if to == END || self.nodes.contains_key(to) {
            Ok(())
        } else {
            Err(GraphError::Validation(format!(
                "edge target '{to}' is not a registered node"
            )))
        }
    }

    /// Drives the graph to completion without streaming: convenience wrapper over
    /// [`Graph::run_streaming`] for callers (tests, `force_synthesize`-style one-shots)
    /// that don't need per-node deltas.
    pub async fn run(&self, state: RunState, ctx: &C) -> Result<RunState> {
        let mut state = state;
        let mut visited = 0usize;
        let mut current = self.entry.clone();

        loop {
            if current == END {
                return Ok(state);
            }
            if visited >= self.recursion_cap {
                return Err(GraphError::RuntimeExhausted {
                    visited,
                    cap: self.recursion_cap,
                });
            }

            let delta = self.visit(&current, &state, ctx).await?;
            state.apply_delta(delta);
            current = self.next_node(&current, &state)?;
            visited += 1;
        }
    }

    /// Spawns the graph as a cooperative task, streaming a [`StepEvent`] per node
    /// visit over the returned receiver. The join handle resolves to the final merged
    /// state, or the terminal [`GraphError`] (cancellation included).
    pub fn run_streaming(
        self: Arc<Self>,
        state: RunState,
        ctx: Arc<C>,
        cancel: CancelToken,
    ) -> (mpsc::Receiver<StepEvent>, JoinHandle<Result<RunState>>)
    where
        RunState: Send + 'static,
    {
        let (tx, rx) = mpsc::channel(32);
        let handle = tokio::spawn(async move {
            let mut state = state;
            let mut visited = 0usize;
            let mut current = self.entry.clone();

            loop {
                if cancel.is_cancelled() {
                    tracing::warn!(node = %current, "run cancelled");
                    return Err(GraphError::Cancelled);
                }
                if current == END {
                    return Ok(state);
                }
                if visited >= self.recursion_cap {
                    tracing::error!(cap = self.recursion_cap, "recursion cap exhausted");
                    return Err(GraphError::RuntimeExhausted {
                        visited,
                        cap: self.recursion_cap,
                    });
                }

                let delta = self.visit(&current, &state, &ctx).await?;
                state.apply_delta(delta.clone());

                if tx
                    .send(StepEvent {
                        node: current.clone(),
                        delta,
                    })
                    .await
                    .is_err()
                {
                    tracing::debug!("step event receiver dropped; continuing run silently");
                }

                current = self.next_node(&current, &state)?;
                visited += 1;
            }
        });
        (rx, handle)
    }

    async fn visit(&self, node: &str, state: &RunState, ctx: &C) -> Result<RunStateDelta> {
        let executor = self
            .nodes
            .get(node)
            .ok_or_else(|| GraphError::Validation(format!("no executor registered for '{node}'")))?;

        let span = tracing::info_span!("node_visit", node = %node);
        let _enter = span.enter();

        executor.execute(state, ctx).await.map_err(|err| match err {
            GraphError::NodeExecution { node: n, source } => {
                GraphError::NodeExecution { node: n, source }
            }
            other => other,
        })
    }

    fn next_node(&self, current: &str, state: &RunState) -> Result<NodeId> {
        match self.edges.get(current) {
            None => Ok(END.to_string()),
            Some(Edge::Direct(to)) => Ok(to.clone()),
            Some(Edge::Conditional { decider, branches }) => {
                let label = decider(state);
                branches.get(&label).cloned().ok_or_else(|| {
                    GraphError::Validation(format!(
                        "conditional edge from '{current}' returned unmapped label '{label}'"
                    ))
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::FnNode;
    use ebs_core::EngineConfig;

    struct NoopContext;

    fn make_delta(entry: &str) -> RunStateDelta {
        RunStateDelta::new().with_history(entry.to_string())
    }

    #[tokio::test]
    async fn linear_graph_runs_to_end() {
        let mut graph: Graph<NoopContext> = Graph::new("a");
        graph.register_node(
            "a",
            Arc::new(FnNode::new(|_state| async { Ok(make_delta("[a] visited")) })),
        );
        graph.register_node(
            "b",
            Arc::new(FnNode::new(|_state| async { Ok(make_delta("[b] visited")) })),
        );
        graph.add_edge("a", "b");
        graph.add_edge("b", END);
        assert!(graph.validate().is_ok());

        let state = RunState::new("problem", EngineConfig::default());
        let final_state = graph.run(state, &NoopContext).await.unwrap();
        assert_eq!(final_state.history, vec!["[a] visited", "[b] visited"]);
    }

    #[tokio::test]
    async fn conditional_edge_routes_by_label() {
        let mut graph: Graph<NoopContext> = Graph::new("decide");
        graph.register_node(
            "decide",
            Arc::new(FnNode::new(|_state| async { Ok(RunStateDelta::new()) })),
        );
        graph.register_node(
            "yes_branch",
            Arc::new(FnNode::new(|_state| async { Ok(make_delta("[yes] visited")) })),
        );
        let mut branches = HashMap::new();
        branches.insert("yes".to_string(), "yes_branch".to_string());
        branches.insert("no".to_string(), END.to_string());
        graph.add_conditional_edge("decide", Arc::new(|_state| "yes".to_string()), branches);
        graph.add_edge("yes_branch", END);
        assert!(graph.validate().is_ok());

        let state = RunState::new("problem", EngineConfig::default());
        let final_state = graph.run(state, &NoopContext).await.unwrap();
        assert_eq!(final_state.history, vec!["[yes] visited"]);
    }

    #[tokio::test]
    async fn recursion_cap_terminates_infinite_loop() {
        let mut graph: Graph<NoopContext> = Graph::new("loop").with_recursion_cap(3);
        graph.register_node(
            "loop",
            Arc::new(FnNode::new(|_state| async { Ok(RunStateDelta::new()) })),
        );
        graph.add_edge("loop", "loop");

        let state = RunState::new("problem", EngineConfig::default());
        let result = graph.run(state, &NoopContext).await;
        assert!(matches!(result, Err(GraphError::RuntimeExhausted { .. })));
    }

    #[tokio::test]
    async fn validate_rejects_dangling_edge_target() {
        let mut graph: Graph<NoopContext> = Graph::new("a");
        graph.register_node(
            "a",
            Arc::new(FnNode::new(|_state| async { Ok(RunStateDelta::new()) })),
        );
        graph.add_edge("a", "missing");
        assert!(graph.validate().is_err());
    }

    #[tokio::test]
    async fn cancellation_stops_streaming_run_at_next_boundary() {
        let mut graph: Graph<NoopContext> = Graph::new("loop");
        graph.register_node(
            "loop",
            Arc::new(FnNode::new(|_state| async { Ok(RunStateDelta::new()) })),
        );
        graph.add_edge("loop", "loop");

        let cancel = CancelToken::new();
        cancel.cancel();
        let state = RunState::new("problem", EngineConfig::default());
        let (_rx, handle) = Arc::new(graph).run_streaming(state, Arc::new(NoopContext), cancel);
        let result = handle.await.unwrap();
        assert!(matches!(result, Err(GraphError::Cancelled)));
    }
}
