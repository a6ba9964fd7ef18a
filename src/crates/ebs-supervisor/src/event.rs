//! The WebSocket-shaped event every subscriber receives (§6's event schema): a `type`
//! tag and an opaque `data` payload. Builder functions mirror the shapes the Supervisor
//! contract names rather than exposing a generic constructor everywhere, grounded on the
//! teacher's `ExecutionEventBuilder`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::hil::HilRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "status")]
    Status,
    #[serde(rename = "state_update")]
    StateUpdate,
    #[serde(rename = "agent_start")]
    AgentStart,
    #[serde(rename = "agent_progress")]
    AgentProgress,
    #[serde(rename = "agent_complete")]
    AgentComplete,
    #[serde(rename = "final_report")]
    FinalReport,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "hil_required")]
    HilRequired,
    #[serde(rename = "HIL_FORCE_SYNTHESIZE")]
    HilForceSynthesize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub data: Value,
}

impl Event {
    fn new(event_type: EventType, data: Value) -> Self {
        Event { event_type, data }
    }

    pub fn status(status: &str) -> Self {
        Event::new(EventType::Status, json!(status))
    }

    pub fn state_update(delta: Value) -> Self {
        Event::new(EventType::StateUpdate, delta)
    }

    pub fn agent_start(agent: &str, message: &str) -> Self {
        Event::new(EventType::AgentStart, json!({ "agent": agent, "message": message }))
    }

    pub fn agent_progress(agent: &str, message: &str, detail: &[String]) -> Self {
        Event::new(
            EventType::AgentProgress,
            json!({ "agent": agent, "message": message, "detail": detail }),
        )
    }

    pub fn agent_complete(snapshot: Value) -> Self {
        Event::new(EventType::AgentComplete, snapshot)
    }

    pub fn final_report(report: &str) -> Self {
        Event::new(EventType::FinalReport, json!(report))
    }

    pub fn error(message: &str) -> Self {
        Event::new(EventType::Error, json!({ "message": message }))
    }

    pub fn hil_required(request: &HilRequest) -> Self {
        Event::new(EventType::HilRequired, serde_json::to_value(request).unwrap_or(Value::Null))
    }

    pub fn hil_force_synthesize(strategy_ids: &[String], message: &str) -> Self {
        Event::new(
            EventType::HilForceSynthesize,
            json!({ "strategy_ids": strategy_ids, "message": message }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_event_serializes_to_the_spec_shape() {
        let event = Event::status("started");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], json!("status"));
        assert_eq!(value["data"], json!("started"));
    }

    #[test]
    fn hil_force_synthesize_keeps_the_uppercase_wire_tag() {
        let event = Event::hil_force_synthesize(&["s1".to_string()], "wrap up");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], json!("HIL_FORCE_SYNTHESIZE"));
        assert_eq!(value["data"]["strategy_ids"], json!(["s1"]));
    }

    #[test]
    fn agent_progress_carries_agent_message_and_detail() {
        let detail = vec!["did a thing".to_string()];
        let event = Event::agent_progress("judge", "progress", &detail);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["data"]["agent"], json!("judge"));
        assert_eq!(value["data"]["detail"], json!(["did a thing"]));
    }
}
