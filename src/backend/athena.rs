//! Amazon Athena backend.
//!
//! Implements the QueryBackend trait with StartQueryExecution and
//! GetQueryExecution.

use async_trait::async_trait;
use aws_sdk_athena::error::DisplayErrorContext;
use aws_sdk_athena::types::{QueryExecutionContext, QueryExecutionState};
use aws_sdk_athena::Client;
use tracing::debug;

use super::{
    BackendResult, ExecutionHandle, ExecutionState, ExecutionStatus, QueryBackend, SubmitRequest,
};
use crate::error::BackendError;

/// Athena query backend.
#[derive(Debug, Clone)]
pub struct AthenaBackend {
    client: Client,
}

impl AthenaBackend {
    /// Creates a backend around an existing Athena client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a backend using the default AWS credential and region chain.
    pub async fn from_env() -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&sdk_config))
    }
}

#[async_trait]
impl QueryBackend for AthenaBackend {
    async fn submit(&self, request: SubmitRequest<'_>) -> BackendResult<ExecutionHandle> {
        let ctx = request.context;

        // Empty settings fall back to the workgroup's defaults.
        let mut execution_context = QueryExecutionContext::builder();
        if !ctx.catalog.is_empty() {
            execution_context = execution_context.catalog(&ctx.catalog);
        }
        if !ctx.database.is_empty() {
            execution_context = execution_context.database(&ctx.database);
        }

        let mut call = self
            .client
            .start_query_execution()
            .query_string(request.query)
            .query_execution_context(execution_context.build());
        if !ctx.workgroup.is_empty() {
            call = call.work_group(&ctx.workgroup);
        }
        // Athena rejects an empty ExecutionParameters list.
        if !request.parameters.is_empty() {
            call = call.set_execution_parameters(Some(request.parameters.to_vec()));
        }

        let output = call
            .send()
            .await
            .map_err(|e| BackendError::new(DisplayErrorContext(&e).to_string()))?;

        let execution_id = output
            .query_execution_id()
            .ok_or_else(|| BackendError::new("Athena returned no query execution id"))?;
        debug!(query_execution_id = execution_id, "started Athena query");

        Ok(ExecutionHandle::new(execution_id))
    }

    async fn describe(&self, handle: &ExecutionHandle) -> BackendResult<ExecutionStatus> {
        let output = self
            .client
            .get_query_execution()
            .query_execution_id(&handle.execution_id)
            .send()
            .await
            .map_err(|e| BackendError::new(DisplayErrorContext(&e).to_string()))?;

        let execution = output
            .query_execution()
            .ok_or_else(|| BackendError::new("Athena returned no query execution"))?;
        let status = execution
            .status()
            .ok_or_else(|| BackendError::new("Athena returned no query execution status"))?;
        let state = status
            .state()
            .ok_or_else(|| BackendError::new("Athena returned no query execution state"))?;

        Ok(ExecutionStatus {
            state: convert_state(state)?,
            result_location: execution
                .result_configuration()
                .and_then(|c| c.output_location())
                .map(str::to_string),
            state_change_reason: status.state_change_reason().map(str::to_string),
        })
    }
}

fn convert_state(state: &QueryExecutionState) -> BackendResult<ExecutionState> {
    match state {
        QueryExecutionState::Queued => Ok(ExecutionState::Queued),
        QueryExecutionState::Running => Ok(ExecutionState::Running),
        QueryExecutionState::Succeeded => Ok(ExecutionState::Succeeded),
        QueryExecutionState::Failed => Ok(ExecutionState::Failed),
        QueryExecutionState::Cancelled => Ok(ExecutionState::Cancelled),
        other => Err(BackendError::new(format!(
            "unrecognized query execution state: {}",
            other.as_str()
        ))),
    }
}
