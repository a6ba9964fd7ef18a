//! Two distillation roles that prevent context rot (§4.5): the Global Distiller
//! compresses raw research into a brief once, before Strategy Generation; the Judge
//! Distiller produces a deterministic `judge_context` before every Judge visit.

use async_trait::async_trait;
use ebs_core::{RunState, RunStateDelta, Strategy, StrategyStatus};
use ebs_graph::{GraphError, NodeExecutor};
use ebs_llm::GenerateRequest;

use crate::context::EngineContext;
use crate::json_utils::estimate_tokens;

const DISTILL_TEMPERATURE: f64 = 0.2;
const BACKGROUND_MARKER: &str = "[background]";

/// Runs once, before the Strategy Generator. Replaces `research_context` with a short
/// brief and augments `problem_state` with a marked background section.
pub struct GlobalDistiller;

#[async_trait]
impl NodeExecutor<EngineContext> for GlobalDistiller {
    async fn execute(&self, state: &RunState, ctx: &EngineContext) -> Result<RunStateDelta, GraphError> {
        if state.research_context.is_empty() {
            return Ok(RunStateDelta::new());
        }

        let prompt = format!(
            "Distill the following research into a structured brief of at most 500 \
             tokens, covering: (1) core definitions and facts, (2) strengths/weaknesses \
             of existing approaches, (3) constraints or opportunities relevant to \
             strategy design. Problem:\n{}\n\nResearch:\n{}",
            state.problem_state, state.research_context
        );
        let request = GenerateRequest::new(&ctx.model, prompt, DISTILL_TEMPERATURE);

        let brief = match ctx.inference.generate_json(request).await {
            Ok(response) => response.as_raw_text(),
            Err(err) => {
                tracing::warn!(error = %err, "global distiller inference call failed, keeping raw research context");
                state.research_context.clone()
            }
        };

        let new_problem_state = format!("{}\n\n{}:\n{}", state.problem_state, BACKGROUND_MARKER, brief);

        Ok(RunStateDelta {
            problem_state: Some(new_problem_state),
            research_context: Some(brief),
            history: vec!["[Distiller] refined research context".to_string()],
            ..RunStateDelta::new()
        })
    }
}

/// Runs before every Judge visit. Pure function of `state` — no inference call — so
/// two consecutive runs on an unchanged state are textually identical (§8).
pub struct JudgeDistiller;

#[async_trait]
impl NodeExecutor<EngineContext> for JudgeDistiller {
    async fn execute(&self, state: &RunState, _ctx: &EngineContext) -> Result<RunStateDelta, GraphError> {
        Ok(RunStateDelta {
            judge_context: Some(generate_judge_context(state)),
            ..RunStateDelta::new()
        })
    }
}

/// Estimates whether the accumulated context exceeds `distill_threshold` (§4.5 item 3).
/// Exposed for callers that want to gate a distillation pass dynamically rather than
/// on the fixed per-Judge-visit schedule the graph wires unconditionally.
pub fn should_distill(state: &RunState) -> bool {
    estimate_context_tokens(state) > state.config.distill_threshold
}

pub fn estimate_context_tokens(state: &RunState) -> u32 {
    let mut total = estimate_tokens(&state.problem_state)
        + estimate_tokens(&state.research_context)
        + estimate_tokens(&state.judge_context);
    for s in &state.strategies {
        total += estimate_tokens(&s.rationale) + estimate_tokens(&s.assumption);
        for entry in &s.trajectory {
            total += estimate_tokens(entry);
        }
    }
    for entry in &state.history {
        total += estimate_tokens(entry);
    }
    total
}

fn generate_judge_context(state: &RunState) -> String {
    let mut problem = state.problem_state.as_str();
    if let Some(idx) = problem.find(BACKGROUND_MARKER) {
        problem = problem[..idx].trim();
    }
    let problem_summary: String = problem.chars().take(300).collect();

    let mut lines = vec![
        format!("## Problem\n{problem_summary}"),
        "\n## Status".to_string(),
        format!("- iteration: {}", state.iteration_count),
        format!("- tau: {:.3}", state.normalized_temperature.unwrap_or(0.0)),
        format!("- spatial_entropy: {:.4}", state.spatial_entropy.unwrap_or(0.0)),
        "\n## Strategies".to_string(),
        summarize_strategies(&state.strategies),
        "\n## Recent history".to_string(),
        summarize_history(&state.history, 5),
    ];
    lines.retain(|l| !l.is_empty());
    lines.join("\n")
}

fn summarize_strategies(strategies: &[Strategy]) -> String {
    if strategies.is_empty() {
        return "(none)".to_string();
    }

    let active: Vec<&Strategy> = strategies.iter().filter(|s| s.status.is_active()).collect();
    let pruned: Vec<&Strategy> = strategies
        .iter()
        .filter(|s| matches!(s.status, StrategyStatus::Pruned | StrategyStatus::PrunedError | StrategyStatus::PrunedSynthesized))
        .collect();
    let expanded: Vec<&Strategy> = strategies.iter().filter(|s| s.status == StrategyStatus::Expanded).collect();

    let mut lines = Vec::new();
    if !active.is_empty() {
        lines.push(format!("active ({}):", active.len()));
        for s in active.iter().take(5) {
            lines.push(format!("  - {} (score: {:.2})", s.name, s.score));
        }
    }
    if !pruned.is_empty() {
        lines.push(format!("pruned ({}):", pruned.len()));
        for s in pruned.iter().take(3) {
            let reason = s.trajectory.last().map(String::as_str).unwrap_or("(unknown)");
            let reason: String = reason.chars().take(80).collect();
            lines.push(format!("  - {}: {}", s.name, reason));
        }
    }
    if !expanded.is_empty() {
        lines.push(format!("expanded ({}):", expanded.len()));
        for s in expanded.iter().take(3) {
            lines.push(format!("  - {}", s.name));
        }
    }
    if lines.is_empty() {
        "(none)".to_string()
    } else {
        lines.join("\n")
    }
}

fn summarize_history(history: &[String], limit: usize) -> String {
    if history.is_empty() {
        return "(none)".to_string();
    }
    history
        .iter()
        .rev()
        .take(limit)
        .rev()
        .map(|entry| format!("- {entry}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebs_core::EngineConfig;
    use ebs_kb::KnowledgeBase;
    use ebs_llm::MockInferenceService;
    use std::sync::Arc;

    async fn context() -> EngineContext {
        let dir = tempfile::tempdir().unwrap();
        let kb = Arc::new(KnowledgeBase::open(dir.path(), Arc::new(MockInferenceService::new(4))).await.unwrap());
        EngineContext::new(Arc::new(MockInferenceService::new(4)), kb, "test-model")
    }

    #[tokio::test]
    async fn judge_distiller_is_deterministic_across_repeated_runs() {
        let ctx = context().await;
        let mut state = RunState::new("problem", EngineConfig::default());
        state.history.push("[Judge] scored".to_string());
        state.strategies.push(Strategy::new("s1", "n", "r", "a", serde_json::json!({}), None, "[Gen]"));

        let d1 = JudgeDistiller.execute(&state, &ctx).await.unwrap();
        let d2 = JudgeDistiller.execute(&state, &ctx).await.unwrap();
        assert_eq!(d1.judge_context, d2.judge_context);
    }

    #[tokio::test]
    async fn global_distiller_skips_when_no_research_context() {
        let ctx = context().await;
        let state = RunState::new("problem", EngineConfig::default());
        let delta = GlobalDistiller.execute(&state, &ctx).await.unwrap();
        assert!(delta.problem_state.is_none());
    }

    #[test]
    fn should_distill_trips_above_threshold() {
        let mut state = RunState::new("x".repeat(20_000), EngineConfig::default());
        state.config.distill_threshold = 100;
        assert!(should_distill(&state));
    }
}
