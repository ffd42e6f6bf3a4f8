use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, Method},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContentRequest {
    pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateRequest {
    pub old_content: Option<String>,
    pub new_content: Option<String>,
}

/// Creates the router with every route plus CORS and request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.allowed_origins);
    Router::new()
        .route("/health", get(health))
        .route("/process", post(process_input))
        .route("/add_document", post(add_document))
        .route("/get_documents", get(get_documents))
        .route("/update_document", post(update_document))
        .route("/delete_document", post(delete_document))
        .route("/clear_documents", get(clear_documents))
        .route("/query_document", post(query_document))
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let origins = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("ignoring invalid CORS origin `{origin}`: {e}");
                None
            }
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
}

/// `content` of a JSON body, an unparsable body counts as missing.
fn required_content(body: Result<Json<ContentRequest>, JsonRejection>) -> Result<String, ApiError> {
    body.ok()
        .and_then(|Json(request)| request.content)
        .ok_or_else(ApiError::missing_content)
}

async fn health(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let documents = state.store().len().await?;
    Ok(Json(json!({ "status": "ok", "documents": documents })))
}

async fn process_input(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ContentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let query = required_content(body)?;
    let answer = state.pipeline.process_query(&query).await?;
    Ok(Json(json!({ "content": answer })))
}

async fn add_document(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ContentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let content = required_content(body)?;
    state.store().add(&content).await?;
    Ok(Json(json!({ "message": "document added" })))
}

async fn get_documents(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let documents = state.store().list_all().await?;
    Ok(Json(json!({ "documents": documents })))
}

async fn update_document(
    State(state): State<Arc<AppState>>,
    body: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let (old_content, new_content) = body
        .ok()
        .and_then(|Json(request)| request.old_content.zip(request.new_content))
        .ok_or_else(ApiError::missing_content)?;
    state.store().update(&old_content, &new_content).await?;
    Ok(Json(json!({ "message": "document updated" })))
}

async fn delete_document(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ContentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let content = required_content(body)?;
    state.store().remove(&content).await?;
    Ok(Json(json!({ "message": "document removed" })))
}

async fn clear_documents(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    state.store().clear_all().await?;
    state.snapshots.persist(state.store()).await;
    Ok(Json(json!({ "message": "documents cleared" })))
}

async fn query_document(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ContentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let query = required_content(body)?;
    let results = state.pipeline.query_documents(&query).await?;
    Ok(Json(json!({ "results": results })))
}
