//! Route handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::response::{RunQueryTemplateRequest, RunS3QueryTemplateRequest};
use super::AppState;
use crate::error::ApiError;
use crate::query::{QueryRequest, QueryRun};
use crate::template::TemplateSource;

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /athena/run_query_template`
#[instrument(skip_all, name = "run_query_template")]
pub async fn run_query_template(
    State(state): State<AppState>,
    body: Result<Json<RunQueryTemplateRequest>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => return ApiError::invalid_request(rejection.body_text()).into_response(),
    };

    let request = QueryRequest {
        template: TemplateSource::Inline(body.template_query),
        data: body.template_data,
        parameters: body.parameters.unwrap_or_default(),
        wait_for_completion: body.wait_for_completion,
    };
    execute(&state, request).await
}

/// `POST /athena/run_s3_query_template`
#[instrument(skip_all, name = "run_s3_query_template")]
pub async fn run_s3_query_template(
    State(state): State<AppState>,
    body: Result<Json<RunS3QueryTemplateRequest>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => return ApiError::invalid_request(rejection.body_text()).into_response(),
    };

    let request = QueryRequest {
        template: TemplateSource::Named {
            name: body.template_name,
            patterns: body.template_parse_patterns,
        },
        data: body.template_data,
        parameters: body.parameters.unwrap_or_default(),
        wait_for_completion: body.wait_for_completion,
    };
    execute(&state, request).await
}

/// Runs a request and maps the result onto a response.
///
/// The cancel token is a child of the shutdown token. Its drop guard fires
/// when the client disconnects and axum drops this future mid-wait.
async fn execute(state: &AppState, request: QueryRequest) -> Response {
    let cancel = state.shutdown.child_token();
    let _guard = cancel.clone().drop_guard();

    match state.service.run(&request, &cancel).await {
        Ok(QueryRun::Completed(outcome)) if !outcome.state.is_success() => {
            ApiError::QueryNotSucceeded(outcome).into_response()
        }
        Ok(run) => {
            if let QueryRun::Completed(outcome) = &run {
                info!(
                    query_execution_id = %outcome.execution_id,
                    state = %outcome.state,
                    "query completed"
                );
            }
            run.into_response()
        }
        Err(err) => err.into_response(),
    }
}
