use axum::{http::StatusCode, response::IntoResponse, Json};
use corpusprompt::{completion::CompletionError, corpus::CorpusError, pipeline::PipelineError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("failed to process data")]
    EngineFailure,
    #[error("completion engine unreachable: {0}")]
    Unreachable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn missing_content() -> Self {
        ApiError::BadRequest("missing content".to_string())
    }
}

impl From<CorpusError> for ApiError {
    fn from(err: CorpusError) -> Self {
        match err {
            CorpusError::InvalidInput(_) => ApiError::missing_content(),
            CorpusError::Index(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidInput(_) => ApiError::missing_content(),
            PipelineError::Retrieval(e) => e.into(),
            PipelineError::Completion(CompletionError::Unreachable(msg)) => {
                ApiError::Unreachable(msg)
            }
            PipelineError::Completion(
                CompletionError::EngineFailure(..) | CompletionError::ParseError(_),
            ) => ApiError::EngineFailure,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::EngineFailure | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unreachable(_) => StatusCode::BAD_GATEWAY,
        };
        let message = match self {
            ApiError::BadRequest(msg) => msg,
            other => other.to_string(),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
