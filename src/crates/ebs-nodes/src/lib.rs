//! # ebs-nodes — the nine agent nodes of the evolutionary beam search loop
//!
//! Each node is a small [`ebs_graph::NodeExecutor<EngineContext>`] implementation; this
//! crate is the seam where `ebs-core`'s data model, `ebs-math`'s numerics, `ebs-llm`'s
//! provider abstraction, and `ebs-kb`'s archive meet the actual decompose → research →
//! distill → generate → judge → evolve → propagate → schedule → execute loop.
//!
//! [`graph::build_evolution_graph`] wires all nine into the topology the Supervisor
//! drives.

pub mod architect;
pub mod context;
pub mod convergence;
pub mod distiller;
pub mod evolution;
pub mod executor;
pub mod graph;
pub mod json_utils;
pub mod judge;
pub mod propagation;
pub mod researcher;
pub mod strategy_generator;
pub mod task_decomposer;

pub use architect::ArchitectScheduler;
pub use context::{EngineContext, ForceSynthesizeRequest};
pub use convergence::should_continue;
pub use distiller::{estimate_context_tokens, should_distill, GlobalDistiller, JudgeDistiller};
pub use evolution::Evolution;
pub use executor::Executor;
pub use graph::build_evolution_graph;
pub use judge::Judge;
pub use propagation::Propagation;
pub use researcher::{should_research_continue, Researcher};
pub use strategy_generator::StrategyGenerator;
pub use task_decomposer::TaskDecomposer;
