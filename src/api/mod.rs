//! HTTP API of the workflow store
//!
//! Receives published workflows and serves them as runnable endpoints.

pub mod docs;
pub mod workflows;

use crate::core::executor::WorkflowExecutor;
use crate::core::PromptRunner;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared handler state.
pub struct AppState<R: PromptRunner> {
    pub executor: WorkflowExecutor<R>,
}

/// Routes are reachable both at the root and under `/api`, the prefix the
/// editor's fetch wrapper adds.
pub fn create_router<R: PromptRunner + 'static>(state: Arc<AppState<R>>) -> Router {
    let routes = Router::new()
        .route("/connect", get(docs::index))
        .route("/connect/openapi.json", get(docs::openapi_spec::<R>))
        .route("/connect/workflows", put(workflows::save_workflow::<R>))
        .route("/fast_api/workflows", post(workflows::save_workflow::<R>))
        .route(
            "/connect/workflows/:name",
            get(workflows::get_workflow::<R>)
                .delete(workflows::delete_workflow::<R>)
                .post(workflows::execute_workflow::<R>),
        )
        .route(
            "/connect/workflow/cache_nodes",
            get(workflows::cached_nodes::<R>),
        )
        .with_state(state);

    Router::new()
        .nest("/api", routes.clone())
        .merge(routes)
        .layer(TraceLayer::new_for_http())
}
