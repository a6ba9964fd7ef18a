//! An adapter shim showing how a real provider crate plugs into [`InferenceService`].
//!
//! Wiring a live network provider is out of scope for this engine (§1) — the actual
//! HTTP/gRPC client, retries, and auth belong to a provider crate such as the
//! teacher's `llm::remote::claude` or `llm::local::ollama`. What belongs here is only
//! the seam: two narrow traits a provider implements, and a wrapper that composes them
//! into the wider [`InferenceService`] contract the engine depends on.

use async_trait::async_trait;

use crate::error::InferenceError;
use crate::traits::{GenerateRequest, GenerateResponse, InferenceService};

/// What a provider crate implements for text generation — the narrow slice of
/// `ChatModel` this engine actually needs.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, InferenceError>;
}

/// What a provider crate implements for embeddings.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, InferenceError>;
}

/// Composes a [`TextGenerator`] and an [`Embedder`] — which may be the same provider
/// or two different ones — into a single [`InferenceService`].
pub struct PassthroughInferenceService<G, E> {
    generator: G,
    embedder: E,
}

impl<G, E> PassthroughInferenceService<G, E> {
    pub fn new(generator: G, embedder: E) -> Self {
        PassthroughInferenceService { generator, embedder }
    }
}

#[async_trait]
impl<G, E> InferenceService for PassthroughInferenceService<G, E>
where
    G: TextGenerator,
    E: Embedder,
{
    async fn generate_json(
        &self,
        request: GenerateRequest,
    ) -> Result<GenerateResponse, InferenceError> {
        self.generator.generate(request).await
    }

    async fn embed(&self, text: &str) -> Vec<f64> {
        match self.embedder.embed(text).await {
            Ok(vector) => vector,
            Err(err) => {
                tracing::warn!(error = %err, "embedding call failed, returning empty vector");
                Vec::new()
            }
        }
    }
}
