use thiserror::Error;

/// Failures from the pluggable provider. Every caller in `ebs-nodes` is expected to
/// catch these locally and fall back to a conservative default (§7) rather than
/// letting them terminate a run — only [`ebs_core::EngineError`]-level failures do that.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("provider call failed: {0}")]
    Provider(String),

    #[error("provider returned a response that could not be interpreted as JSON or text")]
    Unparseable,
}
