//! # ebs-graph — the evolution engine's graph runtime
//!
//! A Pregel-style graph runtime specialized to [`ebs_core::RunState`]: nodes are
//! registered as [`NodeExecutor`] implementations, wired with [`Edge::Direct`] or
//! [`Edge::Conditional`] transitions, and driven to completion by [`Graph::run`] or
//! streamed node-by-node with [`Graph::run_streaming`].
//!
//! Unlike a general-purpose state-graph library, this crate does not need to be
//! generic over the state type — the nine agent nodes and their data model are fixed
//! — so it drops checkpointing, subgraphs, and the functional/message-graph APIs a
//! general framework would carry, keeping only what the recursion-cap, delta-merge,
//! and cancellation contract in the evolution engine's spec actually needs.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ebs_graph::{Graph, END};
//! use std::sync::Arc;
//!
//! let mut graph: Graph<MyContext> = Graph::new("task_decomposer");
//! graph.register_node("task_decomposer", Arc::new(TaskDecomposerNode));
//! graph.add_edge("task_decomposer", "researcher");
//! graph.validate()?;
//! let final_state = graph.run(initial_state, &context).await?;
//! ```

pub mod cancel;
pub mod edge;
pub mod error;
pub mod node;
pub mod runtime;

pub use cancel::CancelToken;
pub use edge::{Decider, Edge};
pub use error::{GraphError, Result};
pub use node::{FnNode, NodeExecutor, NodeId, END, START};
pub use runtime::{Graph, StepEvent};
