//! Human-in-the-loop: a request broadcast to subscribers, answered either by
//! [`crate::Supervisor::submit_response`] or by a timeout sentinel (§4.14).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const HIL_TIMEOUT_SENTINEL: &str = "[No human response within timeout, proceeding with default]";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HilRequest {
    pub request_id: Uuid,
    pub agent: String,
    pub question: String,
    pub context: String,
    pub timeout_seconds: u64,
    pub created_at: DateTime<Utc>,
}

impl HilRequest {
    pub fn new(agent: impl Into<String>, question: impl Into<String>, context: impl Into<String>, timeout_seconds: u64) -> Self {
        HilRequest {
            request_id: Uuid::new_v4(),
            agent: agent.into(),
            question: question.into(),
            context: context.into(),
            timeout_seconds,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_request_gets_a_fresh_id_and_carries_its_fields() {
        let a = HilRequest::new("architect", "proceed?", "ctx", 30);
        let b = HilRequest::new("architect", "proceed?", "ctx", 30);
        assert_ne!(a.request_id, b.request_id);
        assert_eq!(a.timeout_seconds, 30);
        assert_eq!(a.question, "proceed?");
    }
}
