//! Edges: unconditional transitions and state-driven conditional routing.

use std::collections::HashMap;
use std::sync::Arc;

use ebs_core::RunState;

use crate::node::NodeId;

/// A decider inspects the (already-merged) state and returns a branch label, which is
/// resolved against a conditional edge's `branches` map to find the next node.
pub type Decider = Arc<dyn Fn(&RunState) -> String + Send + Sync>;

#[derive(Clone)]
pub enum Edge {
    /// Always transitions to the named node.
    Direct(NodeId),
    /// Transitions to `branches[decider(state)]`.
    Conditional {
        decider: Decider,
        branches: HashMap<String, NodeId>,
    },
}

impl std::fmt::Debug for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Edge::Direct(target) => f.debug_tuple("Direct").field(target).finish(),
            Edge::Conditional { branches, .. } => f
                .debug_struct("Conditional")
                .field("decider", &"<fn>")
                .field("branches", branches)
                .finish(),
        }
    }
}
