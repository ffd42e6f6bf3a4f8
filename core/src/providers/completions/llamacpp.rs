use crate::completion::{CompletionError, CompletionModel};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

const URL: &str = "http://localhost:8080/completion";

/// Client for a llama.cpp style `/completion` endpoint.
pub struct LlamaCppCompletionModel {
    api_url: String,
    client: reqwest::Client,
}

impl LlamaCppCompletionModel {
    #[must_use]
    pub fn new(api_url: Option<String>) -> Self {
        Self {
            api_url: api_url.unwrap_or(URL.to_string()),
            client: reqwest::Client::new(),
        }
    }

    /// Same as [`Self::new`] but every request is aborted after `timeout`,
    /// surfacing as [`CompletionError::Unreachable`].
    ///
    /// # Errors
    /// if the HTTP client can't be built
    pub fn with_timeout(api_url: Option<String>, timeout: Duration) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompletionError::Unreachable(e.to_string()))?;
        Ok(Self {
            api_url: api_url.unwrap_or(URL.to_string()),
            client,
        })
    }
}

#[derive(Serialize)]
struct LlamaCppRequest<'a> {
    prompt: &'a str,
    n_predict: usize,
    stop: &'a [String],
}

#[derive(Deserialize)]
struct LlamaCppResponse {
    content: String,
}

#[async_trait]
impl CompletionModel for LlamaCppCompletionModel {
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: usize,
        stop: &[String],
    ) -> Result<String, CompletionError> {
        let request_body = LlamaCppRequest {
            prompt,
            n_predict: max_tokens,
            stop,
        };

        let response = self
            .client
            .post(&self.api_url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!("completion engine at {} unreachable: {e}", self.api_url);
                CompletionError::Unreachable(e.to_string())
            })?;

        if response.status().is_success() {
            let response = response
                .json::<LlamaCppResponse>()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        error!("completion engine at {} timed out: {e}", self.api_url);
                        CompletionError::Unreachable(e.to_string())
                    } else {
                        CompletionError::ParseError(e.to_string())
                    }
                })?;
            debug!("completion engine generated {} bytes", response.content.len());
            Ok(response.content)
        } else {
            let status = response.status();
            let error_msg = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error (failed to read response body)".to_string());
            error!("completion engine failed with status {status}");

            Err(CompletionError::EngineFailure(status.as_u16(), error_msg))
        }
    }
}
