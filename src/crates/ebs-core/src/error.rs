//! Crate-wide error taxonomy.
//!
//! Mirrors the error hierarchy every node in the evolution graph is expected to raise
//! into: provider failures are caught and converted to conservative defaults by the node
//! itself (they never reach here), while [`EngineError`] carries only the errors that
//! should abort a run.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that terminate a run rather than being absorbed into a fallback value.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A required state field was missing or an invalid status transition was attempted.
    #[error("state invariant violated: {0}")]
    StateInvariant(String),

    /// A node raised instead of returning a conservative default.
    #[error("node '{node}' failed: {source}")]
    NodeExecution {
        node: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The graph runtime exceeded its recursion cap.
    #[error("runtime exhausted after {visited} node visits")]
    RuntimeExhausted { visited: usize },

    /// The run was cancelled by the caller. Not treated as a failure by callers, but
    /// still surfaced so supervisors can distinguish it from a genuine error.
    #[error("run cancelled")]
    Cancelled,

    /// Configuration failed to load or parse.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl EngineError {
    pub fn node_execution(
        node: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        EngineError::NodeExecution {
            node: node.into(),
            source: Box::new(source),
        }
    }
}
