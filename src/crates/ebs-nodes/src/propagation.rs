//! Expands each strategy holding a child quota into that many independent children
//! (§4.10). Every child generation is its own inference call — one call per strategy,
//! not a batched request — grounded on the original's `propagate_strategy` shape.

use async_trait::async_trait;
use ebs_core::{RunState, RunStateDelta, Strategy, StrategyStatus, TemperatureCoupling};
use ebs_graph::{GraphError, NodeExecutor};
use ebs_llm::{GenerateRequest, GenerateResponse};
use uuid::Uuid;

use crate::context::EngineContext;
use crate::json_utils::parse_json_with_fallback;

pub struct Propagation;

#[async_trait]
impl NodeExecutor<EngineContext> for Propagation {
    async fn execute(&self, state: &RunState, ctx: &EngineContext) -> Result<RunStateDelta, GraphError> {
        let mut strategies = state.strategies.clone();
        let llm_temperature = calculate_llm_temperature(
            state.normalized_temperature.unwrap_or(0.0),
            state.config.temperature_coupling,
            state.config.manual_llm_temperature,
        );

        let explicit_quota = parents_have_explicit_quota(&strategies);
        let parents: Vec<usize> = parents_with_quota(&strategies, state.config.children_per_parent);
        let mut new_children = Vec::new();
        let mut total_generated = 0;

        for &parent_idx in &parents {
            let quota = if explicit_quota {
                strategies[parent_idx].child_quota
            } else {
                state.config.children_per_parent
            };
            let parent = strategies[parent_idx].clone();

            for _ in 0..quota {
                let child = generate_child(&parent, &state.problem_state, llm_temperature, ctx).await;
                new_children.push(child);
                total_generated += 1;
            }

            let parent = &mut strategies[parent_idx];
            parent.push_trajectory(format!("[Expanded] Generated {quota} children (quota was {quota})"));
            parent.status = StrategyStatus::Expanded;
            parent.child_quota = 0;
        }

        strategies.extend(new_children);

        Ok(RunStateDelta {
            strategies: Some(strategies),
            history: vec![format!("[Propagation] generated {total_generated} children across {} parents", parents.len())],
            ..RunStateDelta::new()
        })
    }
}

/// `auto` couples the creative temperature to `tau`, clipped to a sane LLM range;
/// `manual` ignores `tau` entirely and uses the configured constant.
fn calculate_llm_temperature(tau: f64, coupling: TemperatureCoupling, manual_temp: f64) -> f64 {
    match coupling {
        TemperatureCoupling::Manual => manual_temp,
        TemperatureCoupling::Auto => tau.clamp(0.0, 2.0),
    }
}

fn parents_have_explicit_quota(strategies: &[Strategy]) -> bool {
    strategies.iter().any(|s| s.status.is_active() && s.child_quota > 0)
}

/// Active strategies with `child_quota > 0`. Falls back to every active strategy
/// (quota supplied by `children_per_parent`) when Evolution has not yet run this round
/// and no strategy carries an explicit quota (§9 supplemented legacy fallback).
fn parents_with_quota(strategies: &[Strategy], children_per_parent: u32) -> Vec<usize> {
    let with_quota: Vec<usize> = strategies
        .iter()
        .enumerate()
        .filter(|(_, s)| s.status.is_active() && s.child_quota > 0)
        .map(|(i, _)| i)
        .collect();

    if !with_quota.is_empty() {
        return with_quota;
    }
    if children_per_parent == 0 {
        return Vec::new();
    }
    strategies
        .iter()
        .enumerate()
        .filter(|(_, s)| s.status.is_active())
        .map(|(i, _)| i)
        .collect()
}

async fn generate_child(parent: &Strategy, problem_state: &str, temperature: f64, ctx: &EngineContext) -> Strategy {
    let prompt = format!(
        "Generate a variant strategy that builds on the parent below, exploring a \
         distinct angle on the same problem. Respond with JSON: {{\"strategy_name\": \
         string, \"rationale\": string, \"initial_assumption\": string, \
         \"diff_summary\": string}}.\n\nProblem:\n{problem_state}\n\nParent strategy: \
         {}\nRationale: {}\nAssumption: {}",
        parent.name, parent.rationale, parent.assumption
    );
    let request = GenerateRequest::new(&ctx.model, prompt, temperature);

    let (name, rationale, assumption, diff_summary) = match ctx.inference.generate_json(request).await {
        Ok(response) => parse_child(&response, parent),
        Err(err) => {
            tracing::warn!(error = %err, parent = %parent.id, "propagation inference call failed, cloning parent assumption");
            (
                format!("{} (variant)", parent.name),
                parent.rationale.clone(),
                parent.assumption.clone(),
                "inference unavailable; cloned parent".to_string(),
            )
        }
    };

    let mut child = Strategy::new(
        Uuid::new_v4().to_string(),
        name,
        rationale,
        assumption,
        parent.milestones.clone(),
        Some(parent.id.clone()),
        format!("[Propagation] {diff_summary}"),
    );
    child.trajectory = parent.trajectory.clone();
    child.trajectory.push(format!("[Propagation] {diff_summary}"));
    child
}

fn parse_child(response: &GenerateResponse, parent: &Strategy) -> (String, String, String, String) {
    let Some(parsed) = parse_json_with_fallback(response) else {
        return (
            format!("{} (variant)", parent.name),
            parent.rationale.clone(),
            parent.assumption.clone(),
            "unparseable response; cloned parent".to_string(),
        );
    };

    let name = parsed["strategy_name"].as_str().unwrap_or(&parent.name).to_string();
    let rationale = parsed["rationale"].as_str().unwrap_or(&parent.rationale).to_string();
    let assumption = parsed["initial_assumption"].as_str().unwrap_or(&parent.assumption).to_string();
    let diff_summary = parsed["diff_summary"].as_str().unwrap_or("explored a variant direction").to_string();
    (name, rationale, assumption, diff_summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebs_core::EngineConfig;
    use ebs_kb::KnowledgeBase;
    use ebs_llm::MockInferenceService;
    use std::sync::Arc;

    async fn context_with(mock: MockInferenceService) -> EngineContext {
        let dir = tempfile::tempdir().unwrap();
        let kb = Arc::new(KnowledgeBase::open(dir.path(), Arc::new(MockInferenceService::new(4))).await.unwrap());
        EngineContext::new(Arc::new(mock), kb, "test-model")
    }

    fn active_with_quota(id: &str, quota: u32) -> Strategy {
        let mut s = Strategy::new(id, "n", "r", "a", serde_json::json!({"m": 1}), None, "[Gen]");
        s.child_quota = quota;
        s
    }

    #[tokio::test]
    async fn expands_parent_into_quota_children_and_finalizes_parent() {
        let mock = MockInferenceService::new(4).with_json_response(serde_json::json!({
            "strategy_name": "child", "rationale": "cr", "initial_assumption": "ca", "diff_summary": "tried X"
        }));
        let ctx = context_with(mock).await;
        let mut state = RunState::new("problem", EngineConfig::default());
        state.strategies.push(active_with_quota("p1", 1));

        let delta = Propagation.execute(&state, &ctx).await.unwrap();
        let strategies = delta.strategies.unwrap();
        assert_eq!(strategies.len(), 2);
        let parent = strategies.iter().find(|s| s.id == "p1").unwrap();
        assert_eq!(parent.status, StrategyStatus::Expanded);
        assert_eq!(parent.child_quota, 0);
        let child = strategies.iter().find(|s| s.id != "p1").unwrap();
        assert_eq!(child.parent_id, Some("p1".to_string()));
        assert!(child.status.is_active());
        assert_eq!(child.milestones, serde_json::json!({"m": 1}));
    }

    #[tokio::test]
    async fn falls_back_to_children_per_parent_when_no_quota_set() {
        let ctx = context_with(MockInferenceService::new(4)).await;
        let mut state = RunState::new("problem", EngineConfig::default());
        state.strategies.push(Strategy::new("p1", "n", "r", "a", serde_json::json!({}), None, "[Gen]"));

        let delta = Propagation.execute(&state, &ctx).await.unwrap();
        let strategies = delta.strategies.unwrap();
        let children = strategies.iter().filter(|s| s.parent_id.is_some()).count();
        assert_eq!(children as u32, state.config.children_per_parent);
    }

    #[test]
    fn manual_coupling_ignores_tau() {
        let temp = calculate_llm_temperature(1.9, TemperatureCoupling::Manual, 0.7);
        assert_eq!(temp, 0.7);
    }

    #[test]
    fn auto_coupling_clips_tau_to_range() {
        assert_eq!(calculate_llm_temperature(5.0, TemperatureCoupling::Auto, 1.0), 2.0);
        assert_eq!(calculate_llm_temperature(-1.0, TemperatureCoupling::Auto, 1.0), 0.0);
    }
}
