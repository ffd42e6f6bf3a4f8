use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    /// The engine answered with a non-success status.
    #[error("Engine failure -> HTTP Status {0}: {1}")]
    EngineFailure(u16, String),
    /// The engine could not be reached (connection refused, timeout, ...).
    #[error("Engine unreachable: {0}")]
    Unreachable(String),
    #[error("ParseError: {0}")]
    ParseError(String),
}

/// A text generation engine that continues a raw prompt.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Generate at most `max_tokens` tokens after `prompt`, stopping early at
    /// any of `stop`, and return only the generated text.
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: usize,
        stop: &[String],
    ) -> Result<String, CompletionError>;
}
