use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::errors::DocketResult;

#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system_prompt: Option<String>,
    pub prompt: String,
    /// Temperature in [0, 2]; callers doing extraction passes use 0 for
    /// determinism.
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: None,
            prompt: prompt.into(),
            temperature: 0.0,
            max_output_tokens: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Abstraction over a hosted LLM. One-shot completion plus a token stream
/// for the query orchestrator (C11). Implementations own retry/backoff for
/// provider errors; this trait only distinguishes success from failure.
#[async_trait]
pub trait Llm: Send + Sync {
    async fn complete(&self, request: LlmRequest) -> DocketResult<LlmResponse>;

    /// Stream completion tokens as they arrive. The orchestrator re-batches
    /// these into fixed-size chunks for the client-facing event stream
    /// rather than relying on provider-chosen chunk boundaries.
    async fn stream(&self, request: LlmRequest) -> DocketResult<BoxStream<'static, DocketResult<String>>>;
}
