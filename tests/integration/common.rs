//! Shared helpers for driving the router in-process.

use std::sync::Arc;

use athena_query_api::backend::{ExecutionContext, QueryBackend};
use athena_query_api::query::{PollSettings, QueryService};
use athena_query_api::server::{build_router, AppState};
use athena_query_api::template::TemplateStore;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub fn test_context() -> ExecutionContext {
    ExecutionContext {
        catalog: "AwsDataCatalog".to_string(),
        database: "analytics".to_string(),
        workgroup: "primary".to_string(),
    }
}

/// Builds a router over the given backend and optional template store.
pub fn router(backend: Arc<dyn QueryBackend>, templates: Option<TemplateStore>) -> Router {
    router_with_shutdown(backend, templates, CancellationToken::new())
}

pub fn router_with_shutdown(
    backend: Arc<dyn QueryBackend>,
    templates: Option<TemplateStore>,
    shutdown: CancellationToken,
) -> Router {
    let service = QueryService::new(backend, templates, test_context(), PollSettings::default());
    build_router(AppState::new(Arc::new(service), shutdown))
}

/// Posts a raw body and returns the status and parsed JSON response.
pub async fn post_raw(router: Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    post_raw(router, uri, &body.to_string()).await
}
