//! The single inter-op contract the evolution engine's core depends on (§6).

use async_trait::async_trait;
use serde_json::Value;

use crate::error::InferenceError;

/// A tool the provider may invoke while generating, e.g. grounded web search for the
/// Researcher (§4.4). Opaque beyond name/description: the core never inspects tool
/// call arguments itself, it only forwards the definition.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub tools: Option<Vec<ToolDefinition>>,
    pub temperature: f64,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, temperature: f64) -> Self {
        GenerateRequest {
            model: model.into(),
            prompt: prompt.into(),
            tools: None,
            temperature,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = Some(tools);
        self
    }
}

/// A provider's raw answer: either it cooperated and returned parsed JSON, or it
/// returned free text that the caller must parse itself (§4.4's fenced-block/raw-text
/// fallback ladder operates on this variant).
#[derive(Debug, Clone)]
pub enum GenerateResponse {
    Json(Value),
    Raw(String),
}

impl GenerateResponse {
    pub fn as_raw_text(&self) -> String {
        match self {
            GenerateResponse::Json(v) => v.to_string(),
            GenerateResponse::Raw(s) => s.clone(),
        }
    }
}

/// The provider boundary: text generation (optionally tool-augmented) and embeddings.
/// Implementations must be `Send + Sync` so a single instance can be shared across
/// concurrent node visits and Executor fan-out (§5).
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Generates a response to `request`. Implementations should attempt to return
    /// [`GenerateResponse::Json`] when the provider supports structured output, and
    /// fall back to `Raw` otherwise — callers are written to handle both.
    async fn generate_json(
        &self,
        request: GenerateRequest,
    ) -> Result<GenerateResponse, InferenceError>;

    /// Embeds `text` into the provider's vector space. Returns an empty vector on
    /// failure rather than an error: callers treat an empty embedding as "embedding
    /// unavailable" and degrade accordingly (e.g. `status = pruned_error` in Evolution),
    /// which keeps provider flakiness from ever aborting a run.
    async fn embed(&self, text: &str) -> Vec<f64>;
}
