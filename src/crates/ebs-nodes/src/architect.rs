//! Schedules Executor work for the round (§4.11): ranks active, already-expanded-this-
//! round strategies (`child_quota == 0`) by `ucb_score` and asks for a per-strategy
//! instruction, with an optional synthesis decision folding chosen strategies into a
//! report. Grounded on the original's ranked-prompt-then-parse shape.

use async_trait::async_trait;
use ebs_core::{ArchitectDecision, RunState, RunStateDelta};
use ebs_graph::{GraphError, NodeExecutor};
use ebs_llm::{GenerateRequest, GenerateResponse};

use crate::context::EngineContext;
use crate::json_utils::parse_json_with_fallback;

const SCHEDULING_TEMPERATURE: f64 = 0.3;

/// Sentinel `strategy_id` marking a synthesis decision (§9): the comma-joined target ids
/// live in `context_injection`, the synthesis prompt in `executor_instruction`.
const SYNTHESIS_SENTINEL: &str = "";

pub struct ArchitectScheduler;

#[async_trait]
impl NodeExecutor<EngineContext> for ArchitectScheduler {
    async fn execute(&self, state: &RunState, ctx: &EngineContext) -> Result<RunStateDelta, GraphError> {
        let mut decisions = Vec::new();

        if let Some(request) = ctx.take_force_synthesize() {
            decisions.push(ArchitectDecision::new(
                SYNTHESIS_SENTINEL,
                format!("Synthesize the following strategies into a report: {}", request.message),
                request.strategy_ids.join(","),
            ));
        }

        let mut ranked: Vec<&ebs_core::Strategy> = state
            .strategies
            .iter()
            .filter(|s| s.status.is_active() && s.child_quota == 0)
            .collect();
        ranked.sort_by(|a, b| {
            b.ucb_score
                .unwrap_or(f64::NEG_INFINITY)
                .partial_cmp(&a.ucb_score.unwrap_or(f64::NEG_INFINITY))
                .unwrap()
        });

        if ranked.is_empty() {
            return Ok(RunStateDelta {
                architect_decisions: Some(decisions),
                history: vec!["[Architect] no strategies ready for scheduling this round".to_string()],
                ..RunStateDelta::new()
            });
        }

        let summary = ranked
            .iter()
            .map(|s| format!("- {} (ucb: {:.3}): {}", s.name, s.ucb_score.unwrap_or(0.0), s.rationale))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Rank the following strategies and prepare an instruction for each, either \
             to refine its current direction or to spawn a variant. Respond with a JSON \
             array, each element: {{\"strategy_id\": string, \"executor_instruction\": \
             string, \"context_injection\": string}}.\n\nRanked strategies:\n{summary}"
        );
        let request = GenerateRequest::new(&ctx.model, prompt, SCHEDULING_TEMPERATURE);

        let scheduled = match ctx.inference.generate_json(request).await {
            Ok(response) => parse_decisions(&response, &ranked),
            Err(err) => {
                tracing::warn!(error = %err, "architect inference call failed, using generic instructions");
                fallback(&ranked)
            }
        };
        decisions.extend(scheduled);

        let count = decisions.len();
        Ok(RunStateDelta {
            architect_decisions: Some(decisions),
            history: vec![format!("[Architect] scheduled {count} decisions")],
            ..RunStateDelta::new()
        })
    }
}

fn parse_decisions(response: &GenerateResponse, ranked: &[&ebs_core::Strategy]) -> Vec<ArchitectDecision> {
    let Some(parsed) = parse_json_with_fallback(response) else {
        return fallback(ranked);
    };

    let items = match parsed.as_array() {
        Some(items) => items.clone(),
        None => vec![parsed],
    };

    let decisions: Vec<ArchitectDecision> = items
        .iter()
        .filter_map(|item| {
            let strategy_id = item["strategy_id"].as_str()?;
            let instruction = item["executor_instruction"].as_str().unwrap_or("Continue exploring this strategy direction.");
            let context_injection = item["context_injection"].as_str().unwrap_or("");
            Some(ArchitectDecision::new(strategy_id, instruction, context_injection))
        })
        .collect();

    if decisions.is_empty() {
        return fallback(ranked);
    }
    decisions
}

fn fallback(ranked: &[&ebs_core::Strategy]) -> Vec<ArchitectDecision> {
    ranked
        .iter()
        .map(|s| {
            ArchitectDecision::new(
                s.id.clone(),
                "Continue exploring this strategy direction.",
                format!("Core assumption: {}", s.assumption),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebs_core::{EngineConfig, Strategy};
    use ebs_kb::KnowledgeBase;
    use ebs_llm::MockInferenceService;
    use std::sync::Arc;

    async fn context_with(mock: MockInferenceService) -> EngineContext {
        let dir = tempfile::tempdir().unwrap();
        let kb = Arc::new(KnowledgeBase::open(dir.path(), Arc::new(MockInferenceService::new(4))).await.unwrap());
        EngineContext::new(Arc::new(mock), kb, "test-model")
    }

    fn ranked_strategy(id: &str, ucb: f64) -> Strategy {
        let mut s = Strategy::new(id, "n", "r", "a", serde_json::json!({}), None, "[Gen]");
        s.ucb_score = Some(ucb);
        s
    }

    #[tokio::test]
    async fn schedules_a_decision_per_ready_strategy() {
        let mock = MockInferenceService::new(4).with_json_response(serde_json::json!([
            {"strategy_id": "s1", "executor_instruction": "go", "context_injection": "ctx"}
        ]));
        let ctx = context_with(mock).await;
        let mut state = RunState::new("problem", EngineConfig::default());
        state.strategies.push(ranked_strategy("s1", 2.0));

        let delta = ArchitectScheduler.execute(&state, &ctx).await.unwrap();
        let decisions = delta.architect_decisions.unwrap();
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].strategy_id, "s1");
    }

    #[tokio::test]
    async fn skips_strategies_still_holding_a_child_quota() {
        let ctx = context_with(MockInferenceService::new(4)).await;
        let mut state = RunState::new("problem", EngineConfig::default());
        let mut s = ranked_strategy("s1", 1.0);
        s.child_quota = 2;
        state.strategies.push(s);

        let delta = ArchitectScheduler.execute(&state, &ctx).await.unwrap();
        assert!(delta.architect_decisions.unwrap().is_empty());
    }

    #[tokio::test]
    async fn force_synthesize_injects_sentinel_decision() {
        let ctx = context_with(MockInferenceService::new(4)).await;
        ctx.set_force_synthesize(crate::context::ForceSynthesizeRequest {
            strategy_ids: vec!["s1".to_string(), "s2".to_string()],
            message: "operator requested wrap-up".to_string(),
        });
        let state = RunState::new("problem", EngineConfig::default());

        let delta = ArchitectScheduler.execute(&state, &ctx).await.unwrap();
        let decisions = delta.architect_decisions.unwrap();
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].strategy_id, "");
        assert_eq!(decisions[0].context_injection, "s1,s2");
    }
}
