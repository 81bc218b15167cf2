//! Query submission.

use tracing::{debug, info};

use crate::backend::{ExecutionContext, ExecutionHandle, QueryBackend, SubmitRequest};
use crate::error::ApiError;

/// Submits a rendered query and returns as soon as the backend accepts it.
///
/// Failures are never retried: every submission is a new, billable execution.
pub async fn submit(
    backend: &dyn QueryBackend,
    query: &str,
    context: &ExecutionContext,
    parameters: &[String],
) -> Result<ExecutionHandle, ApiError> {
    debug!(
        query_len = query.len(),
        parameter_count = parameters.len(),
        workgroup = %context.workgroup,
        "submitting query"
    );

    let handle = backend
        .submit(SubmitRequest {
            query,
            parameters,
            context,
        })
        .await
        .map_err(ApiError::Submit)?;

    info!(query_execution_id = %handle, "query submitted");
    Ok(handle)
}
