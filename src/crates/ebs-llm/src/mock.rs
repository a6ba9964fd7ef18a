//! A deterministic test double for [`InferenceService`], in the style of the
//! teacher's own `#[cfg(test)]` mock providers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::InferenceError;
use crate::traits::{GenerateRequest, GenerateResponse, InferenceService};

/// Returns a queue of canned responses in order, falling back to an empty JSON object
/// once exhausted. Embeddings are deterministic hashes of the input text so tests can
/// assert on relative distances without depending on a real provider.
pub struct MockInferenceService {
    responses: Mutex<VecDeque<GenerateResponse>>,
    embedding_dim: usize,
    fail_embeddings: AtomicBool,
}

impl MockInferenceService {
    pub fn new(embedding_dim: usize) -> Self {
        MockInferenceService {
            responses: Mutex::new(VecDeque::new()),
            embedding_dim,
            fail_embeddings: AtomicBool::new(false),
        }
    }

    pub fn with_json_response(self, value: Value) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(GenerateResponse::Json(value));
        self
    }

    pub fn with_raw_response(self, text: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(GenerateResponse::Raw(text.into()));
        self
    }

    pub fn always_fail_embeddings(self) -> Self {
        self.fail_embeddings.store(true, Ordering::SeqCst);
        self
    }

    /// A stable pseudo-embedding: each dimension is a rotated hash of `text`, so equal
    /// inputs produce equal vectors and distinct inputs produce distinct (if
    /// unrealistic) ones.
    fn hash_embedding(&self, text: &str) -> Vec<f64> {
        let mut seed: u64 = 1469598103934665603;
        for byte in text.bytes() {
            seed ^= byte as u64;
            seed = seed.wrapping_mul(1099511628211);
        }
        (0..self.embedding_dim)
            .map(|i| {
                let mixed = seed.wrapping_add(i as u64).wrapping_mul(2654435761);
                ((mixed % 2000) as f64 / 1000.0) - 1.0
            })
            .collect()
    }
}

#[async_trait]
impl InferenceService for MockInferenceService {
    async fn generate_json(
        &self,
        _request: GenerateRequest,
    ) -> Result<GenerateResponse, InferenceError> {
        let mut queue = self.responses.lock().unwrap();
        Ok(queue
            .pop_front()
            .unwrap_or_else(|| GenerateResponse::Json(serde_json::json!({}))))
    }

    async fn embed(&self, text: &str) -> Vec<f64> {
        if self.fail_embeddings.load(Ordering::SeqCst) {
            return Vec::new();
        }
        self.hash_embedding(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn responses_are_served_in_order() {
        let mock = MockInferenceService::new(4)
            .with_json_response(serde_json::json!({"a": 1}))
            .with_raw_response("fallback text");

        let r1 = mock
            .generate_json(GenerateRequest::new("m", "p", 0.5))
            .await
            .unwrap();
        assert!(matches!(r1, GenerateResponse::Json(_)));

        let r2 = mock
            .generate_json(GenerateRequest::new("m", "p", 0.5))
            .await
            .unwrap();
        assert!(matches!(r2, GenerateResponse::Raw(_)));
    }

    #[tokio::test]
    async fn embeddings_are_deterministic() {
        let mock = MockInferenceService::new(8);
        let e1 = mock.embed("hello world").await;
        let e2 = mock.embed("hello world").await;
        let e3 = mock.embed("something else").await;
        assert_eq!(e1, e2);
        assert_ne!(e1, e3);
        assert_eq!(e1.len(), 8);
    }

    #[tokio::test]
    async fn failing_embeddings_return_empty() {
        let mock = MockInferenceService::new(8).always_fail_embeddings();
        assert!(mock.embed("anything").await.is_empty());
    }
}
