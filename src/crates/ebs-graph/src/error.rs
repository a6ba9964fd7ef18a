//! Graph runtime error taxonomy, mirrored into [`ebs_core::EngineError`] at the
//! boundary so callers outside this crate see one unified error type (§7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    /// The graph structure itself is invalid (dangling edge target, missing entry node).
    #[error("graph validation failed: {0}")]
    Validation(String),

    /// A node raised while executing. Its delta is discarded; no partial state is merged.
    #[error("node '{node}' failed: {source}")]
    NodeExecution {
        node: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The visited-node count exceeded the configured recursion cap.
    #[error("runtime exhausted after {visited} node visits (cap: {cap})")]
    RuntimeExhausted { visited: usize, cap: usize },

    /// The caller requested cancellation; not treated as a failure.
    #[error("run cancelled")]
    Cancelled,
}

impl From<GraphError> for ebs_core::EngineError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Validation(msg) => ebs_core::EngineError::StateInvariant(msg),
            GraphError::NodeExecution { node, source } => {
                ebs_core::EngineError::NodeExecution { node, source }
            }
            GraphError::RuntimeExhausted { visited, .. } => {
                ebs_core::EngineError::RuntimeExhausted { visited }
            }
            GraphError::Cancelled => ebs_core::EngineError::Cancelled,
        }
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
