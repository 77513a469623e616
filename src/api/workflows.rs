//! Workflow store handlers

use crate::api::AppState;
use crate::core::{PromptRunner, PublishRequest};
use crate::utils::error::{ConnectError, ErrorCategory};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// PUT /connect/workflows, POST /fast_api/workflows
pub async fn save_workflow<R: PromptRunner + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<PublishRequest>,
) -> Result<Json<Value>, AppError> {
    tracing::info!("Saving workflow {}", req.name);
    state
        .executor
        .store()
        .save(&req.name, req.workflow)
        .await?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("Workflow '{}' saved.", req.name),
    })))
}

/// GET /connect/workflows/:name
pub async fn get_workflow<R: PromptRunner + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, AppError> {
    let summary = state.executor.store().summary(&name).await?;
    Ok(Json(json!({"status": "success", "workflow": summary})))
}

/// DELETE /connect/workflows/:name
pub async fn delete_workflow<R: PromptRunner + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, AppError> {
    tracing::info!("Deleting workflow {}", name);
    state.executor.store().delete(&name).await?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("Workflow '{}' deleted.", name),
    })))
}

/// POST /connect/workflows/:name
///
/// The body maps tags to input values; `_token` overrides the ComfyUI token
/// for this run only.
pub async fn execute_workflow<R: PromptRunner + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(name): Path<String>,
    Json(mut params): Json<Map<String, Value>>,
) -> Result<Json<Value>, AppError> {
    let token = match params.remove("_token") {
        Some(Value::String(token)) if !token.is_empty() => Some(token),
        _ => None,
    };

    tracing::info!("Running workflow {}", name);
    let result = state
        .executor
        .execute(&name, &params, token.as_deref())
        .await?;
    Ok(Json(json!({
        "status": "success",
        "workflow": name,
        "result": result,
    })))
}

/// GET /connect/workflow/cache_nodes
pub async fn cached_nodes<R: PromptRunner + 'static>(
    State(state): State<Arc<AppState<R>>>,
) -> Json<Value> {
    let nodes = state.executor.store().cached_nodes().await;
    Json(json!({"status": "success", "nodes": nodes}))
}

/// Axum 錯誤回應型別
pub struct AppError(ConnectError);

impl From<ConnectError> for AppError {
    fn from(err: ConnectError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match (&self.0, self.0.category()) {
            (ConnectError::WorkflowNotFound { .. }, _) => StatusCode::NOT_FOUND,
            (_, ErrorCategory::Input) => StatusCode::BAD_REQUEST,
            (_, ErrorCategory::Network) | (_, ErrorCategory::Upstream) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }

        (
            status,
            Json(json!({"status": "error", "message": self.0.to_string()})),
        )
            .into_response()
    }
}
