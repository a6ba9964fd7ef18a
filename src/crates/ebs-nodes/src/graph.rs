//! Wires the nine agent nodes into the evolutionary beam search loop, grounded on the
//! original's graph topology: decompose once, research until sufficient, distill,
//! generate the initial population, then loop judge → evolve → (converged? end :
//! propagate → schedule → execute → back to the judge distiller).

use std::collections::HashMap;
use std::sync::Arc;

use ebs_graph::{Graph, END};

use crate::architect::ArchitectScheduler;
use crate::context::EngineContext;
use crate::convergence::should_continue;
use crate::distiller::{GlobalDistiller, JudgeDistiller};
use crate::evolution::Evolution;
use crate::executor::Executor;
use crate::judge::Judge;
use crate::propagation::Propagation;
use crate::researcher::{should_research_continue, Researcher};
use crate::strategy_generator::StrategyGenerator;
use crate::task_decomposer::TaskDecomposer;

pub const TASK_DECOMPOSER: &str = "task_decomposer";
pub const RESEARCHER: &str = "researcher";
pub const DISTILLER: &str = "distiller";
pub const STRATEGY_GENERATOR: &str = "strategy_generator";
pub const DISTILLER_FOR_JUDGE: &str = "distiller_for_judge";
pub const JUDGE: &str = "judge";
pub const EVOLUTION: &str = "evolution";
pub const PROPAGATION: &str = "propagation";
pub const ARCHITECT_SCHEDULER: &str = "architect_scheduler";
pub const EXECUTOR: &str = "executor";

/// Builds the graph with `context` available to every node via dependency injection.
/// The returned graph still needs [`ebs_graph::Graph::validate`] before `run`/
/// `run_streaming`, same as any other graph this crate builds.
pub fn build_evolution_graph() -> Graph<EngineContext> {
    let mut graph: Graph<EngineContext> = Graph::new(TASK_DECOMPOSER);

    graph.register_node(TASK_DECOMPOSER, Arc::new(TaskDecomposer));
    graph.register_node(RESEARCHER, Arc::new(Researcher));
    graph.register_node(DISTILLER, Arc::new(GlobalDistiller));
    graph.register_node(STRATEGY_GENERATOR, Arc::new(StrategyGenerator));
    graph.register_node(DISTILLER_FOR_JUDGE, Arc::new(JudgeDistiller));
    graph.register_node(JUDGE, Arc::new(Judge));
    graph.register_node(EVOLUTION, Arc::new(Evolution));
    graph.register_node(PROPAGATION, Arc::new(Propagation));
    graph.register_node(ARCHITECT_SCHEDULER, Arc::new(ArchitectScheduler));
    graph.register_node(EXECUTOR, Arc::new(Executor));

    graph.add_edge(TASK_DECOMPOSER, RESEARCHER);

    let mut research_branches = HashMap::new();
    research_branches.insert("research_more".to_string(), RESEARCHER.to_string());
    research_branches.insert("proceed".to_string(), DISTILLER.to_string());
    graph.add_conditional_edge(RESEARCHER, Arc::new(should_research_continue), research_branches);

    graph.add_edge(DISTILLER, STRATEGY_GENERATOR);
    graph.add_edge(STRATEGY_GENERATOR, DISTILLER_FOR_JUDGE);
    graph.add_edge(DISTILLER_FOR_JUDGE, JUDGE);
    graph.add_edge(JUDGE, EVOLUTION);

    let mut convergence_branches = HashMap::new();
    convergence_branches.insert("continue".to_string(), PROPAGATION.to_string());
    convergence_branches.insert("end".to_string(), END.to_string());
    graph.add_conditional_edge(EVOLUTION, Arc::new(should_continue), convergence_branches);

    graph.add_edge(PROPAGATION, ARCHITECT_SCHEDULER);
    graph.add_edge(ARCHITECT_SCHEDULER, EXECUTOR);
    graph.add_edge(EXECUTOR, DISTILLER_FOR_JUDGE);

    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_validates() {
        let graph = build_evolution_graph();
        assert!(graph.validate().is_ok());
    }
}
