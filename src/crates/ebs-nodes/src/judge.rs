//! Scores every active strategy into `[0, 1]` using the Judge Distiller's `judge_context`
//! plus each strategy's own trajectory (§4.7). Never hard-prunes — that is soft pruning's
//! job in Evolution.

use async_trait::async_trait;
use ebs_core::{RunState, RunStateDelta};
use ebs_graph::{GraphError, NodeExecutor};
use ebs_llm::{GenerateRequest, GenerateResponse};

use crate::context::EngineContext;
use crate::json_utils::parse_json_with_fallback;

const JUDGE_TEMPERATURE: f64 = 0.1;

pub struct Judge;

#[async_trait]
impl NodeExecutor<EngineContext> for Judge {
    async fn execute(&self, state: &RunState, ctx: &EngineContext) -> Result<RunStateDelta, GraphError> {
        let mut strategies = state.strategies.clone();
        let mut scored = 0;

        for strategy in strategies.iter_mut().filter(|s| s.status.is_active()) {
            let trajectory_tail: Vec<&String> = strategy.trajectory.iter().rev().take(5).rev().collect();
            let prompt = format!(
                "Score the following strategy's progress on a scale of 0.0 to 1.0. \
                 Respond with JSON: {{\"score\": number}}.\n\nContext:\n{}\n\nStrategy: \
                 {}\nRationale: {}\nAssumption: {}\nRecent trajectory:\n{}",
                state.judge_context,
                strategy.name,
                strategy.rationale,
                strategy.assumption,
                trajectory_tail
                    .iter()
                    .map(|e| format!("- {e}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
            let request = GenerateRequest::new(&ctx.model, prompt, JUDGE_TEMPERATURE);

            let score = match ctx.inference.generate_json(request).await {
                Ok(response) => parse_score(&response).unwrap_or(strategy.score),
                Err(err) => {
                    tracing::warn!(error = %err, strategy = %strategy.id, "judge inference call failed, keeping prior score");
                    strategy.score
                }
            };
            strategy.score = score.clamp(0.0, 1.0);
            scored += 1;
        }

        Ok(RunStateDelta {
            strategies: Some(strategies),
            history: vec![format!("[Judge] scored {scored} active strategies")],
            ..RunStateDelta::new()
        })
    }
}

fn parse_score(response: &GenerateResponse) -> Option<f64> {
    let parsed = parse_json_with_fallback(response)?;
    parsed["score"].as_f64()
}
