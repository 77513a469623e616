use crate::api::workflows::AppError;
use crate::api::AppState;
use crate::core::openapi::OpenApiGenerator;
use crate::core::PromptRunner;
use axum::{extract::State, response::Html, Json};
use serde_json::Value;
use std::sync::Arc;

const INDEX_HTML: &str = r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8">
  <script type="module" src="https://unpkg.com/rapidoc/dist/rapidoc-min.js"></script>
</head>
<body>
  <rapi-doc
    spec-url="/api/connect/openapi.json"
    theme="dark"
    show-info="false"
    allow-authentication="false"
    allow-server-selection="false">
  </rapi-doc>
</body>
</html>"#;

/// GET /connect
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /connect/openapi.json
pub async fn openapi_spec<R: PromptRunner + 'static>(
    State(state): State<Arc<AppState<R>>>,
) -> Result<Json<Value>, AppError> {
    let summaries = state.executor.store().summaries().await?;
    Ok(Json(OpenApiGenerator::new(&summaries).generate()))
}
