//! Breaks the problem into subtasks and an information-needs agenda for the
//! Researcher (§4.3). First node in the graph.

use async_trait::async_trait;
use ebs_core::{InformationNeed, InformationNeedType, RunState, RunStateDelta};
use ebs_graph::{GraphError, NodeExecutor};
use ebs_llm::{GenerateRequest, GenerateResponse};

use crate::context::EngineContext;
use crate::json_utils::parse_json_with_fallback;

const LOW_CREATIVITY_TEMPERATURE: f64 = 0.2;

pub struct TaskDecomposer;

#[async_trait]
impl NodeExecutor<EngineContext> for TaskDecomposer {
    async fn execute(&self, state: &RunState, ctx: &EngineContext) -> Result<RunStateDelta, GraphError> {
        let prompt = format!(
            "Decompose the following problem into subtasks and an information-needs \
             agenda. Respond with JSON: {{\"subtasks\": [string], \"information_needs\": \
             [{{\"topic\": string, \"type\": \"factual\"|\"procedural\"|\"conceptual\", \
             \"priority\": 1-5}}]}}.\n\nProblem:\n{}",
            state.problem_state
        );
        let request = GenerateRequest::new(&ctx.model, prompt, LOW_CREATIVITY_TEMPERATURE);

        let (subtasks, information_needs) = match ctx.inference.generate_json(request).await {
            Ok(response) => parse_decomposition(&response, &state.problem_state),
            Err(err) => {
                tracing::warn!(error = %err, "task decomposer inference call failed, using fallback");
                fallback(&state.problem_state)
            }
        };

        Ok(RunStateDelta {
            subtasks: Some(subtasks),
            information_needs: Some(information_needs),
            history: vec!["[TaskDecomposer] decomposed problem into subtasks".to_string()],
            ..RunStateDelta::new()
        })
    }
}

fn parse_decomposition(response: &GenerateResponse, problem_state: &str) -> (Vec<String>, Vec<InformationNeed>) {
    let Some(parsed) = parse_json_with_fallback(response) else {
        tracing::warn!("task decomposer response unparseable, using fallback");
        return fallback(problem_state);
    };

    let subtasks = parsed["subtasks"]
        .as_array()
        .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();

    let needs = parsed["information_needs"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let topic = item["topic"].as_str()?;
                    let need_type = match item["type"].as_str().unwrap_or("factual") {
                        "procedural" => InformationNeedType::Procedural,
                        "conceptual" => InformationNeedType::Conceptual,
                        _ => InformationNeedType::Factual,
                    };
                    let priority = item["priority"].as_u64().unwrap_or(3) as u8;
                    Some(InformationNeed::new(topic, need_type, priority))
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    if subtasks.is_empty() || needs.is_empty() {
        return fallback(problem_state);
    }
    (subtasks, needs)
}

fn fallback(problem_state: &str) -> (Vec<String>, Vec<InformationNeed>) {
    (vec![problem_state.to_string()], vec![InformationNeed::fallback(problem_state)])
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
    async fn decomposes_problem_into_subtasks_and_needs() {
        let mock = MockInferenceService::new(4).with_json_response(serde_json::json!({
            "subtasks": ["sub a", "sub b"],
            "information_needs": [{"topic": "topic a", "type": "procedural", "priority": 4}]
        }));
        let ctx = context_with(mock).await;
        let state = RunState::new("the problem", EngineConfig::default());

        let delta = TaskDecomposer.execute(&state, &ctx).await.unwrap();
        assert_eq!(delta.subtasks.unwrap(), vec!["sub a", "sub b"]);
        let needs = delta.information_needs.unwrap();
        assert_eq!(needs.len(), 1);
        assert_eq!(needs[0].priority, 4);
    }

    #[tokio::test]
    async fn falls_back_to_single_subtask_on_unparseable_response() {
        let mock = MockInferenceService::new(4).with_raw_response("not json at all");
        let ctx = context_with(mock).await;
        let state = RunState::new("the problem", EngineConfig::default());

        let delta = TaskDecomposer.execute(&state, &ctx).await.unwrap();
        assert_eq!(delta.subtasks.unwrap(), vec!["the problem"]);
        assert_eq!(delta.information_needs.unwrap().len(), 1);
    }
}
