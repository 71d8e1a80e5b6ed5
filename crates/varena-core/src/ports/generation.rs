//! Generation gateway port: the single seam to text-generation back-ends.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

/// Errors that can occur in generation operations.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Http(String),

    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("backend returned empty output")]
    EmptyResponse,

    #[error("all configured backends failed: {0}")]
    AllBackendsFailed(String),

    #[error("stream error: {0}")]
    Stream(String),
}

/// Incremental text chunks from a streaming generation call.
pub type TextStream = BoxStream<'static, Result<String, GenerationError>>;

/// Port for text generation.
///
/// Implementations own their retry/timeout/rotation policy; callers see a
/// single call that either produces text or a [`GenerationError`] after all
/// fallbacks are exhausted. Empty output after retries is reported as
/// [`GenerationError::EmptyResponse`] so callers can substitute their own
/// fallback value.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    /// Generate a complete response for `prompt`.
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerationError>;

    /// Generate a response as a stream of incremental text chunks.
    ///
    /// Back-ends that cannot stream natively degrade to replaying a full
    /// response chunk by chunk; consumers cannot tell the difference.
    async fn generate_stream(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<TextStream, GenerationError>;

    /// Short display name of the active backend (for stage events and logs).
    fn model_name(&self) -> String;
}
