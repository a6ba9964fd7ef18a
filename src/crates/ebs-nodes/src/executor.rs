//! Executes each of the round's scheduled decisions in turn (§4.12). Every decision
//! updates its strategy's trajectory; some additionally spawn a variant or fold a group
//! of strategies into a synthesis report. `architect_decisions` is always drained.

use async_trait::async_trait;
use ebs_core::{RunState, RunStateDelta, Strategy, StrategyStatus};
use ebs_graph::{GraphError, NodeExecutor};
use ebs_llm::{GenerateRequest, GenerateResponse};
use uuid::Uuid;

use crate::context::EngineContext;
use crate::json_utils::parse_json_with_fallback;

const EXECUTION_TEMPERATURE: f64 = 0.5;
const RESULT_SNIPPET_LEN: usize = 100;

pub struct Executor;

#[async_trait]
impl NodeExecutor<EngineContext> for Executor {
    async fn execute(&self, state: &RunState, ctx: &EngineContext) -> Result<RunStateDelta, GraphError> {
        let mut strategies = state.strategies.clone();
        let mut final_report = state.final_report.clone();
        let mut report_version = state.report_version;
        let mut history = Vec::new();

        for decision in &state.architect_decisions {
            if decision.strategy_id.is_empty() {
                let target_ids: Vec<String> = decision
                    .context_injection
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                report_version += 1;
                let report_section = synthesize(&strategies, &target_ids, &decision.executor_instruction, ctx).await;
                final_report = Some(match final_report {
                    Some(existing) => format!("{existing}\n\n## Report v{report_version}\n{report_section}"),
                    None => format!("## Report v{report_version}\n{report_section}"),
                });

                let mut archived = 0;
                for id in &target_ids {
                    if let Some(s) = strategies.iter_mut().find(|s| &s.id == id) {
                        s.status = StrategyStatus::PrunedSynthesized;
                        s.pruned_at_report_version = Some(report_version);
                        let rationale = format!("synthesized into report v{report_version}: {}", decision.executor_instruction);
                        if let Err(err) = ctx
                            .kb
                            .write_strategy_archive(s.name.clone(), rationale, s.score, report_section.clone(), report_version)
                            .await
                        {
                            tracing::warn!(error = %err, strategy = %s.id, "failed to archive synthesized strategy");
                        } else {
                            archived += 1;
                        }
                    }
                }
                history.push(format!("[Executor] synthesized {archived} strategies into report v{report_version}"));
                continue;
            }

            let Some(strategy_idx) = strategies.iter().position(|s| s.id == decision.strategy_id) else {
                tracing::warn!(strategy_id = %decision.strategy_id, "architect decision references unknown strategy, skipping");
                continue;
            };

            let prompt = format!(
                "Execute the following instruction against the strategy below. Respond \
                 with JSON: {{\"execution_result\": string, \"new_insights\": string, \
                 \"next_steps\": string, \"variant_strategy\": {{\"strategy_name\": \
                 string, \"rationale\": string, \"initial_assumption\": string}} | \
                 null}}.\n\nInstruction: {}\nContext: {}\n\nStrategy: {}\nRationale: \
                 {}\nAssumption: {}",
                decision.executor_instruction,
                decision.context_injection,
                strategies[strategy_idx].name,
                strategies[strategy_idx].rationale,
                strategies[strategy_idx].assumption,
            );
            let request = GenerateRequest::new(&ctx.model, prompt, EXECUTION_TEMPERATURE);

            let (execution_result, variant) = match ctx.inference.generate_json(request).await {
                Ok(response) => parse_execution(&response),
                Err(err) => {
                    tracing::warn!(error = %err, strategy = %decision.strategy_id, "executor inference call failed");
                    ("inference unavailable".to_string(), None)
                }
            };

            let snippet: String = execution_result.chars().take(RESULT_SNIPPET_LEN).collect();
            strategies[strategy_idx].push_trajectory(format!("[Executor] {snippet}..."));

            if let Some((name, rationale, assumption)) = variant {
                let parent_id = strategies[strategy_idx].id.clone();
                let parent_name = strategies[strategy_idx].name.clone();
                let milestones = strategies[strategy_idx].milestones.clone();
                let child = Strategy::new(
                    Uuid::new_v4().to_string(),
                    name,
                    rationale,
                    assumption,
                    milestones,
                    Some(parent_id),
                    format!("[Executor] Generated as variant of {parent_name}"),
                );
                strategies.push(child);
                history.push(format!("[Executor] refined {} and spawned a variant", decision.strategy_id));
            } else {
                history.push(format!("[Executor] refined {}", decision.strategy_id));
            }
        }

        Ok(RunStateDelta {
            strategies: Some(strategies),
            architect_decisions: Some(Vec::new()),
            final_report,
            report_version: Some(report_version),
            history,
            ..RunStateDelta::new()
        })
    }
}

fn parse_execution(response: &GenerateResponse) -> (String, Option<(String, String, String)>) {
    let Some(parsed) = parse_json_with_fallback(response) else {
        return (response.as_raw_text(), None);
    };

    let execution_result = parsed["execution_result"].as_str().unwrap_or("").to_string();
    let variant = parsed.get("variant_strategy").and_then(|v| {
        if v.is_null() {
            return None;
        }
        let name = v["strategy_name"].as_str()?;
        let rationale = v["rationale"].as_str().unwrap_or("");
        let assumption = v["initial_assumption"].as_str().unwrap_or("");
        Some((name.to_string(), rationale.to_string(), assumption.to_string()))
    });

    (execution_result, variant)
}

async fn synthesize(strategies: &[Strategy], target_ids: &[String], instruction: &str, ctx: &EngineContext) -> String {
    let summary = target_ids
        .iter()
        .filter_map(|id| strategies.iter().find(|s| &s.id == id))
        .map(|s| format!("- {} (score: {:.2}): {}", s.name, s.score, s.rationale))
        .collect::<Vec<_>>()
        .join("\n");
    let prompt = format!(
        "Synthesize the following strategies into a coherent report section. \
         Instruction: {instruction}\n\nStrategies:\n{summary}"
    );
    let request = GenerateRequest::new(&ctx.model, prompt, EXECUTION_TEMPERATURE);

    match ctx.inference.generate_json(request).await {
        Ok(response) => response.as_raw_text(),
        Err(err) => {
            tracing::warn!(error = %err, "synthesis inference call failed, falling back to raw summary");
            summary
        }
    }
}
