//! A single grounded call per visit, not a ReAct loop, so research cost stays bounded
//! (§4.4). Self-reflects on information sufficiency and loops via
//! `should_research_continue`.

use async_trait::async_trait;
use ebs_core::{ResearchStatus, RunState, RunStateDelta};
use ebs_graph::{GraphError, NodeExecutor};
use ebs_llm::{GenerateRequest, GenerateResponse, ToolDefinition};

use crate::context::EngineContext;
use crate::json_utils::parse_json_with_fallback;

const RESEARCH_TEMPERATURE: f64 = 0.4;

pub struct Researcher;

#[async_trait]
impl NodeExecutor<EngineContext> for Researcher {
    async fn execute(&self, state: &RunState, ctx: &EngineContext) -> Result<RunStateDelta, GraphError> {
        if state.research_iteration >= state.config.max_research_iterations {
            return Ok(RunStateDelta {
                research_status: Some(ResearchStatus::Sufficient),
                history: vec!["[Researcher] max iterations reached, proceeding with available context".to_string()],
                ..RunStateDelta::new()
            });
        }

        let needs_str = if state.information_needs.is_empty() {
            format!("- [5/5] {} (auto-generated)", state.problem_state)
        } else {
            state
                .information_needs
                .iter()
                .map(|n| format!("- [{}/5] {} ({:?})", n.priority, n.topic, n.need_type))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let prompt = format!(
            "Research the following information needs, with grounded web search if \
             available. Self-reflect on sufficiency. Respond with JSON: \
             {{\"research_context\": string, \"information_status\": \"sufficient\"|\
             \"insufficient\", \"missing_items\": [string]}}.\n\nProblem:\n{}\n\n\
             Information needs:\n{}",
            state.problem_state, needs_str
        );
        let request = GenerateRequest::new(&ctx.model, prompt, RESEARCH_TEMPERATURE)
            .with_tools(vec![ToolDefinition {
                name: "grounded_search".to_string(),
                description: "Web search grounding".to_string(),
            }]);

        let (research_context, status, missing_items) = match ctx.inference.generate_json(request).await {
            Ok(response) => parse_research(&response),
            Err(err) => {
                tracing::warn!(error = %err, "researcher inference call failed, proceeding with sufficient status");
                ("inference unavailable; proceeding without research".to_string(), ResearchStatus::Sufficient, Vec::new())
            }
        };

        let history_entry = if missing_items.is_empty() {
            "[Researcher] research complete".to_string()
        } else {
            format!("[Researcher] research incomplete, missing: {}", missing_items.join(", "))
        };

        Ok(RunStateDelta {
            research_context: Some(research_context),
            research_status: Some(status),
            research_iteration: Some(state.research_iteration + 1),
            history: vec![history_entry],
            ..RunStateDelta::new()
        })
    }
}

/// Bare JSON, then fenced block, then (to avoid deadlocking the research loop) the
/// raw text as `research_context` with `sufficient` status (§4.4).
fn parse_research(response: &GenerateResponse) -> (String, ResearchStatus, Vec<String>) {
    let Some(parsed) = parse_json_with_fallback(response) else {
        return (response.as_raw_text(), ResearchStatus::Sufficient, Vec::new());
    };

    let research_context = parsed["research_context"].as_str().unwrap_or("").to_string();
    let status = match parsed["information_status"].as_str() {
        Some("insufficient") => ResearchStatus::Insufficient,
        _ => ResearchStatus::Sufficient,
    };
    let missing_items = parsed["missing_items"]
        .as_array()
        .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();

    (research_context, status, missing_items)
}

/// The conditional edge out of the Researcher (§4.4).
pub fn should_research_continue(state: &RunState) -> String {
    let label = if state.research_iteration >= state.config.max_research_iterations {
        "proceed"
    } else if state.research_status == ResearchStatus::Insufficient {
        "research_more"
    } else {
        "proceed"
    };
    label.to_string()
}
