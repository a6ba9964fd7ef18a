//! # ebs-llm — the pluggable inference service boundary
//!
//! The engine depends on exactly one external capability: an [`InferenceService`] that
//! can generate structured (or raw) text and embed strings into a vector space. This
//! crate defines that contract, a deterministic [`MockInferenceService`] for tests, and
//! a [`PassthroughInferenceService`] shim showing how a real provider crate wires in —
//! the provider itself (network calls, auth, retries) is out of scope (§1).

pub mod error;
pub mod mock;
pub mod passthrough;
pub mod traits;

pub use error::InferenceError;
pub use mock::MockInferenceService;
pub use passthrough::{Embedder, PassthroughInferenceService, TextGenerator};
pub use traits::{GenerateRequest, GenerateResponse, InferenceService, ToolDefinition};
