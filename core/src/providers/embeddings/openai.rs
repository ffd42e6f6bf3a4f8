use crate::embeddings::{EmbedderError, EmbeddingModel};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

const URL: &str = "https://api.openai.com/v1/embeddings";

/// Embeddings from an OpenAI compatible `/v1/embeddings` endpoint.
pub struct OpenAIEmbeddingModel {
    api_url: String,
    api_key: String,
    client: Client,
    model: String,
}

impl OpenAIEmbeddingModel {
    #[must_use]
    pub fn new(api_key: String, api_url: Option<String>, model: String) -> Self {
        Self {
            api_url: api_url.unwrap_or(URL.to_string()),
            api_key,
            client: Client::new(),
            model,
        }
    }
}

#[derive(Deserialize)]
struct OpenAIEmbeddingResponse {
    pub data: Vec<OpenAIEmbeddingData>,
}

#[derive(Deserialize)]
struct OpenAIEmbeddingData {
    pub embedding: Vec<f64>,
}

#[async_trait]
impl EmbeddingModel for OpenAIEmbeddingModel {
    async fn embed(&self, data: &str) -> Result<Vec<f64>, EmbedderError> {
        let request_body = json!({
                "input": data,
                "model": self.model,
        });
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| EmbedderError::RequestError(e.to_string()))?;

        if response.status().is_success() {
            let response = response
                .json::<OpenAIEmbeddingResponse>()
                .await
                .map_err(|e| EmbedderError::ParseError(e.to_string()))?;

            response
                .data
                .into_iter()
                .next()
                .map(|d| d.embedding)
                .ok_or(EmbedderError::ParseError(
                    "Response contained no embedding".to_string(),
                ))
        } else {
            let status = response.status();
            let error_message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            Err(EmbedderError::ProviderError(format!(
                "HTTP Status {}: {error_message}",
                status.as_u16()
            )))
        }
    }
}
