//! The dependency-injected context every node receives: the inference service, the
//! knowledge base, and the force-synthesize signal the Supervisor's operator command
//! writes into (§9's "global singletons → context object" design note).

use std::sync::{Arc, Mutex};

use ebs_kb::KnowledgeBase;
use ebs_llm::InferenceService;

/// An operator's `force_synthesize` command (§4.14), picked up by the Architect on its
/// next visit and cleared once consumed.
#[derive(Debug, Clone)]
pub struct ForceSynthesizeRequest {
    pub strategy_ids: Vec<String>,
    pub message: String,
}

pub struct EngineContext {
    pub inference: Arc<dyn InferenceService>,
    pub kb: Arc<KnowledgeBase>,
    /// Model identifier passed to every `generate_json` call. The core is provider-
    /// agnostic (§6); this is an opaque label the concrete `InferenceService` may use
    /// however it likes.
    pub model: String,
    pending_force_synthesize: Arc<Mutex<Option<ForceSynthesizeRequest>>>,
}

impl EngineContext {
    pub fn new(inference: Arc<dyn InferenceService>, kb: Arc<KnowledgeBase>, model: impl Into<String>) -> Self {
        EngineContext {
            inference,
            kb,
            model: model.into(),
            pending_force_synthesize: Arc::new(Mutex::new(None)),
        }
    }

    /// Shares the force-synthesize slot with a Supervisor so its operator command sets
    /// the same cell the Architect reads.
    pub fn force_synthesize_handle(&self) -> Arc<Mutex<Option<ForceSynthesizeRequest>>> {
        self.pending_force_synthesize.clone()
    }

    pub fn set_force_synthesize(&self, request: ForceSynthesizeRequest) {
        *self.pending_force_synthesize.lock().unwrap() = Some(request);
    }

    /// Takes and clears the pending request, if any, for this node visit.
    pub fn take_force_synthesize(&self) -> Option<ForceSynthesizeRequest> {
        self.pending_force_synthesize.lock().unwrap().take()
    }
}
