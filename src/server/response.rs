//! HTTP request and response bodies, and error-to-status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

use crate::error::{ApiError, PollError};
use crate::query::{ExecutionOutcome, QueryRun};

/// Body of `POST /athena/run_query_template`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryTemplateRequest {
    pub template_query: String,
    #[serde(default)]
    pub template_data: Value,
    #[serde(default)]
    pub parameters: Option<Vec<String>>,
    #[serde(default)]
    pub wait_for_completion: bool,
}

/// Body of `POST /athena/run_s3_query_template`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunS3QueryTemplateRequest {
    pub template_name: String,
    pub template_parse_patterns: Vec<String>,
    #[serde(default)]
    pub template_data: Value,
    #[serde(default)]
    pub parameters: Option<Vec<String>>,
    #[serde(default)]
    pub wait_for_completion: bool,
}

/// Body returned for a submission that was not awaited.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedResponse {
    pub query_execution_id: String,
}

/// Body returned on every failure.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ExecutionOutcome>,
}

impl IntoResponse for QueryRun {
    fn into_response(self) -> Response {
        match self {
            QueryRun::Submitted(handle) => (
                StatusCode::OK,
                Json(SubmittedResponse {
                    query_execution_id: handle.execution_id,
                }),
            )
                .into_response(),
            QueryRun::Completed(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        }
    }
}

impl ApiError {
    /// Returns the HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::Render(_) => StatusCode::BAD_REQUEST,
            Self::Submit(_) | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Poll(PollError::DescribeFailed { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Poll(PollError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            Self::Poll(PollError::Cancelled { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::QueryNotSucceeded(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Returns the caller-facing message, naming the stage that failed.
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidRequest(_) => "failed to parse request".to_string(),
            Self::Render(e) => format!("failed to {} template", e.stage),
            Self::Submit(_) => "failed to run query".to_string(),
            Self::Poll(PollError::DescribeFailed { .. }) => "failed to get query status".to_string(),
            Self::Poll(PollError::Timeout { .. }) => {
                "timed out waiting for query to complete".to_string()
            }
            Self::Poll(PollError::Cancelled { .. }) => {
                "request cancelled before query completed".to_string()
            }
            Self::QueryNotSucceeded(outcome) => {
                format!("query finished with state {}", outcome.state)
            }
            Self::Config(_) => "query templates are not configured".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}: {}", self.category(), self);
        } else {
            warn!("{}: {}", self.category(), self);
        }

        let message = self.public_message();
        let outcome = match self {
            Self::QueryNotSucceeded(outcome) => Some(outcome),
            _ => None,
        };

        (status, Json(ErrorResponse { message, outcome })).into_response()
    }
}
