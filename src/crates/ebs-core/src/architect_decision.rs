//! The Architect-Scheduler's output and the Executor's dispatch.

use serde::{Deserialize, Serialize};

/// One scheduled unit of Executor work. `strategy_id` is empty for a synthesis decision
/// that spans multiple strategies; the target ids are then packed comma-joined into
/// `context_injection` and the synthesis instruction goes in `executor_instruction`
/// (the tagged-variant shape §9 describes was tried and dropped in favor of this flat
/// sentinel encoding — see `DESIGN.md`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchitectDecision {
    pub strategy_id: String,
    pub executor_instruction: String,
    pub context_injection: String,
}

impl ArchitectDecision {
    pub fn new(
        strategy_id: impl Into<String>,
        executor_instruction: impl Into<String>,
        context_injection: impl Into<String>,
    ) -> Self {
        ArchitectDecision {
            strategy_id: strategy_id.into(),
            executor_instruction: executor_instruction.into(),
            context_injection: context_injection.into(),
        }
    }
}
