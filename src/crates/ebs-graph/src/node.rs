//! Node identity and the executor contract every agent node implements.

use async_trait::async_trait;
use ebs_core::{RunState, RunStateDelta};

use crate::error::GraphError;

pub type NodeId = String;

/// Virtual entry point. Not itself an executor; `Graph::entry` names the first real
/// node to run.
pub const START: &str = "__start__";

/// Virtual termination marker used as a conditional-edge branch target.
pub const END: &str = "__end__";

/// A single agent node. Generic over `C`, the dependency-injected context (inference
/// service, knowledge-base handle, HIL registry — see §9's design note on replacing
/// global singletons with an explicit context object), so this crate never needs to
/// know what a concrete engine context contains.
#[async_trait]
pub trait NodeExecutor<C>: Send + Sync {
    /// Reads `state` and the shared context, returning the partial update to merge.
    /// Provider failures must be caught here and turned into conservative defaults;
    /// only genuinely unexpected errors should propagate (§7).
    async fn execute(&self, state: &RunState, ctx: &C) -> Result<RunStateDelta, GraphError>;
}

/// Adapts a plain async closure into a [`NodeExecutor`], for simple nodes (and tests)
/// that don't need a struct of their own.
pub struct FnNode<F> {
    f: F,
}

impl<F> FnNode<F> {
    pub fn new(f: F) -> Self {
        FnNode { f }
    }
}

#[async_trait]
impl<C, F, Fut> NodeExecutor<C> for FnNode<F>
where
    C: Send + Sync,
    F: Fn(RunState) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<RunStateDelta, GraphError>> + Send,
{
    async fn execute(&self, state: &RunState, _ctx: &C) -> Result<RunStateDelta, GraphError> {
        (self.f)(state.clone()).await
    }
}
