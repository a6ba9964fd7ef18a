//! The Run State: the single mutable record that flows through the graph.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::architect_decision::ArchitectDecision;
use crate::config::EngineConfig;
use crate::information_need::InformationNeed;
use crate::strategy::{Strategy, StrategyStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchStatus {
    Sufficient,
    Insufficient,
}

/// The state object every agent node reads from and returns a partial update to.
///
/// A node never mutates `RunState` directly; it returns a [`RunStateDelta`] that the
/// graph runtime merges in per the rule in [`RunState::apply_delta`]. This keeps the
/// runtime's delta-streaming contract (§4.1) honest: the delta the runtime emits to
/// subscribers is exactly what was merged, nothing more.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Namespaces knowledge-base archive filenames and tracing spans for this run.
    pub run_id: Uuid,
    pub problem_state: String,
    pub subtasks: Vec<String>,
    pub information_needs: Vec<InformationNeed>,
    pub strategies: Vec<Strategy>,
    pub research_context: String,
    pub research_status: ResearchStatus,
    pub research_iteration: u32,
    pub judge_context: String,
    pub architect_decisions: Vec<ArchitectDecision>,
    pub spatial_entropy: Option<f64>,
    pub prev_spatial_entropy: Option<f64>,
    pub effective_temperature: Option<f64>,
    pub normalized_temperature: Option<f64>,
    pub config: EngineConfig,
    pub history: Vec<String>,
    pub iteration_count: u32,
    pub report_version: u32,
    pub final_report: Option<String>,
}

impl RunState {
    /// Constructs the state the Supervisor hands to the graph on `start()`.
    pub fn new(problem_state: impl Into<String>, config: EngineConfig) -> Self {
        RunState {
            run_id: Uuid::new_v4(),
            problem_state: problem_state.into(),
            subtasks: Vec::new(),
            information_needs: Vec::new(),
            strategies: Vec::new(),
            research_context: String::new(),
            research_status: ResearchStatus::Insufficient,
            research_iteration: 0,
            judge_context: String::new(),
            architect_decisions: Vec::new(),
            spatial_entropy: None,
            prev_spatial_entropy: None,
            effective_temperature: None,
            normalized_temperature: None,
            config,
            history: Vec::new(),
            iteration_count: 0,
            report_version: 0,
            final_report: None,
        }
    }

    pub fn active_strategies(&self) -> impl Iterator<Item = &Strategy> {
        self.strategies.iter().filter(|s| s.status.is_active())
    }

    pub fn active_strategies_mut(&mut self) -> impl Iterator<Item = &mut Strategy> {
        self.strategies.iter_mut().filter(|s| s.status.is_active())
    }

    pub fn strategy_mut(&mut self, id: &str) -> Option<&mut Strategy> {
        self.strategies.iter_mut().find(|s| s.id == id)
    }

    pub fn has_active_strategy(&self) -> bool {
        self.strategies.iter().any(|s| s.status.is_active())
    }

    /// Merges a node's partial return into this state per the data model's merging
    /// rule: scalars overwrite, `history` concatenates, `strategies` (when present) is
    /// replaced wholesale (the node is responsible for carrying forward untouched
    /// strategies), `architect_decisions` overwrites (the Executor drains it to empty).
    pub fn apply_delta(&mut self, delta: RunStateDelta) {
        if let Some(v) = delta.problem_state {
            self.problem_state = v;
        }
        if let Some(v) = delta.subtasks {
            self.subtasks = v;
        }
        if let Some(v) = delta.information_needs {
            self.information_needs = v;
        }
        if let Some(v) = delta.strategies {
            self.strategies = v;
        }
        if let Some(v) = delta.research_context {
            self.research_context = v;
        }
        if let Some(v) = delta.research_status {
            self.research_status = v;
        }
        if let Some(v) = delta.research_iteration {
            self.research_iteration = v;
        }
        if let Some(v) = delta.judge_context {
            self.judge_context = v;
        }
        if let Some(v) = delta.architect_decisions {
            self.architect_decisions = v;
        }
        if delta.spatial_entropy.is_some() {
            self.spatial_entropy = delta.spatial_entropy;
        }
        if delta.prev_spatial_entropy.is_some() {
            self.prev_spatial_entropy = delta.prev_spatial_entropy;
        }
        if delta.effective_temperature.is_some() {
            self.effective_temperature = delta.effective_temperature;
        }
        if delta.normalized_temperature.is_some() {
            self.normalized_temperature = delta.normalized_temperature;
        }
        if let Some(v) = delta.iteration_count {
            self.iteration_count = v;
        }
        if let Some(v) = delta.report_version {
            self.report_version = v;
        }
        if delta.final_report.is_some() {
            self.final_report = delta.final_report;
        }
        self.history.extend(delta.history);
    }

    /// Checks the universal invariants from the testable-properties section that hold
    /// across the whole state (per-strategy invariants are checked by `Strategy`).
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for s in &self.strategies {
            if !seen.insert(s.id.as_str()) {
                return Err(format!("duplicate strategy id: {}", s.id));
            }
            s.check_invariants()?;
            if let Some(parent_id) = &s.parent_id {
                if !self.strategies.iter().any(|p| &p.id == parent_id) {
                    return Err(format!(
                        "strategy {} has dangling parent_id {}",
                        s.id, parent_id
                    ));
                }
            }
        }
        Ok(())
    }
}

/// A partial update returned by a single node visit. Every field but `history` is
/// optional; `None` means "unaffected by this node." `history` is additive by
/// construction, so it is a plain `Vec` rather than `Option<Vec>`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStateDelta {
    pub problem_state: Option<String>,
    pub subtasks: Option<Vec<String>>,
    pub information_needs: Option<Vec<InformationNeed>>,
    pub strategies: Option<Vec<Strategy>>,
    pub research_context: Option<String>,
    pub research_status: Option<ResearchStatus>,
    pub research_iteration: Option<u32>,
    pub judge_context: Option<String>,
    pub architect_decisions: Option<Vec<ArchitectDecision>>,
    pub spatial_entropy: Option<f64>,
    pub prev_spatial_entropy: Option<f64>,
    pub effective_temperature: Option<f64>,
    pub normalized_temperature: Option<f64>,
    pub iteration_count: Option<u32>,
    pub report_version: Option<u32>,
    pub final_report: Option<String>,
    #[serde(default)]
    pub history: Vec<String>,
}

impl RunStateDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(mut self, entry: impl Into<String>) -> Self {
        self.history.push(entry.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn history_concatenates_and_scalars_overwrite() {
        let mut state = RunState::new("problem", config());
        state.history.push("[Init] started".to_string());
        state.iteration_count = 1;

        let delta = RunStateDelta::new()
            .with_history("[Judge] scored")
            .with_history("[Judge] done");
        let mut delta = delta;
        delta.iteration_count = Some(2);
        state.apply_delta(delta);

        assert_eq!(state.history, vec!["[Init] started", "[Judge] scored", "[Judge] done"]);
        assert_eq!(state.iteration_count, 2);
    }

    #[test]
    fn strategies_replaced_wholesale_not_merged() {
        let mut state = RunState::new("problem", config());
        state.strategies.push(Strategy::new(
            "s1",
            "n",
            "r",
            "a",
            serde_json::json!({}),
            None,
            "[Gen] created",
        ));

        let mut delta = RunStateDelta::new();
        delta.strategies = Some(vec![]);
        state.apply_delta(delta);

        assert!(state.strategies.is_empty());
    }

    #[test]
    fn duplicate_ids_violate_invariants() {
        let mut state = RunState::new("problem", config());
        for _ in 0..2 {
            state.strategies.push(Strategy::new(
                "dup",
                "n",
                "r",
                "a",
                serde_json::json!({}),
                None,
                "[Gen] created",
            ));
        }
        assert!(state.check_invariants().is_err());
    }

    #[test]
    fn dangling_parent_id_violates_invariants() {
        let mut state = RunState::new("problem", config());
        state.strategies.push(Strategy::new(
            "child",
            "n",
            "r",
            "a",
            serde_json::json!({}),
            Some("ghost".to_string()),
            "[Gen] created",
        ));
        assert!(state.check_invariants().is_err());
    }

    #[test]
    fn active_strategies_filters_by_status() {
        let mut state = RunState::new("problem", config());
        let mut s1 = Strategy::new("s1", "n", "r", "a", serde_json::json!({}), None, "[Gen]");
        s1.status = StrategyStatus::Pruned;
        let s2 = Strategy::new("s2", "n", "r", "a", serde_json::json!({}), None, "[Gen]");
        state.strategies.push(s1);
        state.strategies.push(s2);

        let active: Vec<_> = state.active_strategies().map(|s| s.id.clone()).collect();
        assert_eq!(active, vec!["s2".to_string()]);
    }
}
