//! Produces the initial strategy population (§4.6). Runs once, right after the Global
//! Distiller, before any scoring or embedding happens.

use async_trait::async_trait;
use ebs_core::{RunState, RunStateDelta, Strategy};
use ebs_graph::{GraphError, NodeExecutor};
use ebs_llm::{GenerateRequest, GenerateResponse};
use uuid::Uuid;

use crate::context::EngineContext;
use crate::json_utils::parse_json_with_fallback;

const GENERATION_TEMPERATURE: f64 = 0.9;
const DEFAULT_POPULATION_SIZE: usize = 3;
const INITIAL_GENERATION_ENTRY: &str = "[StrategyGenerator] Initial generation";

pub struct StrategyGenerator;

#[async_trait]
impl NodeExecutor<EngineContext> for StrategyGenerator {
    async fn execute(&self, state: &RunState, ctx: &EngineContext) -> Result<RunStateDelta, GraphError> {
        let prompt = format!(
            "Generate {DEFAULT_POPULATION_SIZE} distinct initial strategies for the \
             following problem. Respond with a JSON array, each element: \
             {{\"strategy_name\": string, \"rationale\": string, \"initial_assumption\": \
             string, \"milestones\": [string]}}.\n\nProblem:\n{}",
            state.problem_state
        );
        let request = GenerateRequest::new(&ctx.model, prompt, GENERATION_TEMPERATURE);

        let strategies = match ctx.inference.generate_json(request).await {
            Ok(response) => parse_strategies(&response, &state.problem_state),
            Err(err) => {
                tracing::warn!(error = %err, "strategy generator inference call failed, using fallback population");
                fallback(&state.problem_state)
            }
        };

        let count = strategies.len();
        Ok(RunStateDelta {
            strategies: Some(strategies),
            history: vec![format!("[StrategyGenerator] generated {count} initial strategies")],
            ..RunStateDelta::new()
        })
    }
}

fn parse_strategies(response: &GenerateResponse, problem_state: &str) -> Vec<Strategy> {
    let Some(parsed) = parse_json_with_fallback(response) else {
        tracing::warn!("strategy generator response unparseable, using fallback population");
        return fallback(problem_state);
    };

    let items = match parsed.as_array() {
        Some(items) => items.clone(),
        None => vec![parsed],
    };

    let strategies: Vec<Strategy> = items
        .iter()
        .filter_map(|item| {
            let name = item["strategy_name"].as_str()?;
            let rationale = item["rationale"].as_str().unwrap_or("");
            let assumption = item["initial_assumption"].as_str().unwrap_or("");
            let milestones = item
                .get("milestones")
                .cloned()
                .unwrap_or_else(|| serde_json::json!([]));
            Some(Strategy::new(
                Uuid::new_v4().to_string(),
                name,
                rationale,
                assumption,
                milestones,
                None,
                INITIAL_GENERATION_ENTRY,
            ))
        })
        .collect();

    if strategies.is_empty() {
        return fallback(problem_state);
    }
    strategies
}

fn fallback(problem_state: &str) -> Vec<Strategy> {
    vec![Strategy::new(
        Uuid::new_v4().to_string(),
        "Direct approach",
        format!("Address the problem as stated: {problem_state}"),
        "No additional assumptions beyond the stated problem.",
        serde_json::json!([]),
        None,
        INITIAL_GENERATION_ENTRY,
    )]
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

    #[tokio::test]
    async fn generates_population_with_fresh_ids_and_empty_metrics() {
        let mock = MockInferenceService::new(4).with_json_response(serde_json::json!([
            {"strategy_name": "A", "rationale": "ra", "initial_assumption": "aa", "milestones": ["m1"]},
            {"strategy_name": "B", "rationale": "rb", "initial_assumption": "ab", "milestones": ["m2"]}
        ]));
        let ctx = context_with(mock).await;
        let state = RunState::new("problem", EngineConfig::default());

        let delta = StrategyGenerator.execute(&state, &ctx).await.unwrap();
        let strategies = delta.strategies.unwrap();
        assert_eq!(strategies.len(), 2);
        assert_ne!(strategies[0].id, strategies[1].id);
        for s in &strategies {
            assert_eq!(s.score, 0.0);
            assert!(s.embedding.is_none());
            assert!(s.status.is_active());
            assert_eq!(s.trajectory, vec![INITIAL_GENERATION_ENTRY.to_string()]);
        }
    }

    #[tokio::test]
    async fn falls_back_to_single_direct_strategy_on_unparseable_response() {
        let mock = MockInferenceService::new(4).with_raw_response("not json");
        let ctx = context_with(mock).await;
        let state = RunState::new("the problem", EngineConfig::default());

        let delta = StrategyGenerator.execute(&state, &ctx).await.unwrap();
        let strategies = delta.strategies.unwrap();
        assert_eq!(strategies.len(), 1);
        assert_eq!(strategies[0].name, "Direct approach");
    }
}
