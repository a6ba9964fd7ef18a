//! Output of the TaskDecomposer: the research agenda for the Researcher.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InformationNeedType {
    Factual,
    Procedural,
    Conceptual,
}

/// A single research question, weighted by priority so the Researcher can focus its
/// (bounded) iteration budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InformationNeed {
    pub topic: String,
    #[serde(rename = "type")]
    pub need_type: InformationNeedType,
    /// 1 (lowest) through 5 (highest).
    pub priority: u8,
}

impl InformationNeed {
    pub fn new(topic: impl Into<String>, need_type: InformationNeedType, priority: u8) -> Self {
        InformationNeed {
            topic: topic.into(),
            need_type,
            priority: priority.clamp(1, 5),
        }
    }

    /// The fallback need TaskDecomposer emits when the inference service fails:
    /// a single factual need at maximum priority, scoped to the whole problem.
    pub fn fallback(problem_state: impl Into<String>) -> Self {
        InformationNeed::new(problem_state, InformationNeedType::Factual, 5)
    }
}
