//! The Simulation Supervisor (§4.14): owns at most one active run, fans its events out
//! to any number of subscribers, and answers human-in-the-loop requests. Grounded on the
//! teacher's `ExecutionStreamHandler` for the event-builder/active-flag shape, adapted
//! from single-consumer `mpsc` to a multi-subscriber `tokio::sync::broadcast` bus per the
//! fan-out requirement; the start/stop single-flight guard is original, built on
//! `ebs_graph::CancelToken` plus a mutex-guarded run slot (single-writer state, per §9).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use ebs_core::{EngineConfig, RunState};
use ebs_graph::{CancelToken, Graph, GraphError};
use ebs_nodes::EngineContext;
use tokio::sync::{broadcast, oneshot, Mutex};
use uuid::Uuid;

use crate::error::SupervisorError;
use crate::event::Event;
use crate::hil::{HilRequest, HIL_TIMEOUT_SENTINEL};

const EVENT_CHANNEL_CAPACITY: usize = 256;

struct ActiveRun {
    run_id: Uuid,
    cancel: CancelToken,
}

struct PendingHil {
    request: HilRequest,
    responder: Option<oneshot::Sender<String>>,
}

pub struct Supervisor {
    graph: Arc<Graph<EngineContext>>,
    context: Arc<EngineContext>,
    events_tx: broadcast::Sender<Event>,
    active: Mutex<Option<ActiveRun>>,
    hil: Mutex<HashMap<Uuid, PendingHil>>,
}

impl Supervisor {
    pub fn new(graph: Graph<EngineContext>, context: Arc<EngineContext>) -> Arc<Self> {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Supervisor {
            graph: Arc::new(graph),
            context,
            events_tx,
            active: Mutex::new(None),
            hil: Mutex::new(HashMap::new()),
        })
    }

    /// Subscribes to the event bus. Lagging subscribers skip ahead rather than stall
    /// the run; a subscriber that never polls is dropped by `tokio::sync::broadcast`
    /// once its buffer is exhausted, which satisfies "never blocking others" (§5).
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events_tx.subscribe()
    }

    /// The dependency-injected context this supervisor drives its graph with, exposed
    /// for callers that need to read the force-synthesize slot directly (e.g. tests).
    pub fn context(&self) -> &Arc<EngineContext> {
        &self.context
    }

    fn emit(&self, event: Event) {
        // No receivers is the only "failure" a broadcast send reports; log and move on.
        if self.events_tx.send(event).is_err() {
            tracing::debug!("no subscribers for supervisor event");
        }
    }

    /// Starts a run. Rejects if one is already in progress.
    pub async fn start(self: &Arc<Self>, problem: impl Into<String>, config: EngineConfig) -> Result<Uuid, SupervisorError> {
        let mut guard = self.active.lock().await;
        if guard.is_some() {
            return Err(SupervisorError::AlreadyRunning);
        }

        let state = RunState::new(problem, config);
        let run_id = state.run_id;
        let cancel = CancelToken::new();
        *guard = Some(ActiveRun { run_id, cancel: cancel.clone() });
        drop(guard);

        self.emit(Event::status("started"));

        let supervisor = self.clone();
        tokio::spawn(async move { supervisor.run_loop(state, cancel, run_id).await });

        Ok(run_id)
    }

    /// Drains `run_streaming`'s per-node events into the bus, then emits the terminal
    /// events and clears the run slot. The only writer of `active` once a run starts.
    async fn run_loop(self: Arc<Self>, state: RunState, cancel: CancelToken, run_id: Uuid) {
        let history_retention = state.config.history_retention;
        let (mut rx, handle) = self.graph.clone().run_streaming(state, self.context.clone(), cancel);

        let mut last_agent: Option<String> = None;
        while let Some(step) = rx.recv().await {
            if last_agent.as_deref() != Some(step.node.as_str()) {
                self.emit(Event::agent_start(&step.node, &format!("entering {}", step.node)));
                last_agent = Some(step.node.clone());
            }

            let delta_value = serde_json::to_value(&step.delta).unwrap_or(serde_json::Value::Null);
            self.emit(Event::state_update(delta_value));

            let detail = truncated_history(&step.delta.history, history_retention);
            self.emit(Event::agent_progress(&step.node, "progress", &detail));
        }

        match handle.await {
            Ok(Ok(final_state)) => {
                let mut snapshot = serde_json::to_value(&final_state).unwrap_or(serde_json::Value::Null);
                if let Some(history) = snapshot.get_mut("history") {
                    *history = serde_json::json!(truncated_history(&final_state.history, history_retention));
                }
                self.emit(Event::agent_complete(snapshot));
                self.emit(Event::status("completed"));
                if let Some(report) = &final_state.final_report {
                    self.emit(Event::final_report(report));
                }
            }
            Ok(Err(GraphError::Cancelled)) => {
                tracing::info!(run_id = %run_id, "run stopped by operator");
            }
            Ok(Err(err)) => {
                tracing::warn!(run_id = %run_id, error = %err, "run terminated with an error");
                self.emit(Event::error(&err.to_string()));
            }
            Err(join_err) => {
                tracing::error!(run_id = %run_id, error = %join_err, "run task panicked");
                self.emit(Event::error(&format!("run task panicked: {join_err}")));
            }
        }

        let mut guard = self.active.lock().await;
        if guard.as_ref().map(|run| run.run_id) == Some(run_id) {
            *guard = None;
        }
    }

    /// Cancels the in-progress run, if any.
    pub async fn stop(&self) -> Result<(), SupervisorError> {
        let guard = self.active.lock().await;
        match guard.as_ref() {
            None => Err(SupervisorError::NotRunning),
            Some(run) => {
                run.cancel.cancel();
                self.emit(Event::status("stopped"));
                Ok(())
            }
        }
    }

    pub async fn is_running(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Asks a human a question, blocking until a response arrives or `timeout` elapses.
    pub async fn ask_human(&self, question: impl Into<String>, context: impl Into<String>, agent: impl Into<String>, timeout: Duration) -> String {
        let request = HilRequest::new(agent, question, context, timeout.as_secs());
        let request_id = request.request_id;
        let (tx, rx) = oneshot::channel();

        self.hil.lock().await.insert(request_id, PendingHil { request: request.clone(), responder: Some(tx) });
        self.emit(Event::hil_required(&request));

        let response = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) | Err(_) => HIL_TIMEOUT_SENTINEL.to_string(),
        };

        self.hil.lock().await.remove(&request_id);
        response
    }

    /// Resolves a pending HIL request. Errors if no such request is outstanding.
    pub async fn submit_response(&self, request_id: Uuid, response: impl Into<String>) -> Result<(), SupervisorError> {
        let mut guard = self.hil.lock().await;
        let entry = guard.get_mut(&request_id).ok_or(SupervisorError::UnknownHilRequest(request_id))?;
        if let Some(responder) = entry.responder.take() {
            let _ = responder.send(response.into());
        }
        Ok(())
    }

    pub async fn pending_requests(&self) -> Vec<HilRequest> {
        self.hil.lock().await.values().map(|entry| entry.request.clone()).collect()
    }

    /// Operator command (§4.14): broadcasts the request and hands it to the Architect's
    /// shared slot so the next scheduling visit emits a synthesis decision for it.
    pub fn force_synthesize(&self, strategy_ids: Vec<String>, message: impl Into<String>) {
        let message = message.into();
        self.emit(Event::hil_force_synthesize(&strategy_ids, &message));
        self.context.set_force_synthesize(ebs_nodes::ForceSynthesizeRequest { strategy_ids, message });
    }
}

/// Keeps only the last `retention` entries, grounded on a rolling-log discipline rather
/// than any single source file (§9 supplemented feature; see `DESIGN.md`).
fn truncated_history(history: &[String], retention: usize) -> Vec<String> {
    if history.len() <= retention {
        return history.to_vec();
    }
    history[history.len() - retention..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::truncated_history;

    #[test]
    fn truncated_history_keeps_only_the_tail() {
        let history: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        let kept = truncated_history(&history, 3);
        assert_eq!(kept, vec!["7", "8", "9"]);
    }

    #[test]
    fn truncated_history_is_a_no_op_under_the_limit() {
        let history = vec!["a".to_string(), "b".to_string()];
        assert_eq!(truncated_history(&history, 50), history);
    }
}
