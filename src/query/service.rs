//! Query run orchestration: render, submit, then optionally wait.

use std::sync::Arc;

use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::poller::{await_completion, ExecutionOutcome, PollSettings};
use super::submitter::submit;
use crate::backend::{ExecutionContext, ExecutionHandle, QueryBackend};
use crate::error::Result;
use crate::template::{self, TemplateSource, TemplateStore};

/// A request to render and run one query.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub template: TemplateSource,
    pub data: Value,
    /// Positional bind values passed to the backend, in order.
    pub parameters: Vec<String>,
    pub wait_for_completion: bool,
}

/// Result of a query run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryRun {
    /// Submitted without waiting.
    Submitted(ExecutionHandle),
    /// Waited until the backend reported a terminal state.
    Completed(ExecutionOutcome),
}

/// Renders, submits and awaits queries against one backend.
///
/// Holds only immutable, shareable state; one instance serves every request.
pub struct QueryService {
    backend: Arc<dyn QueryBackend>,
    templates: Option<TemplateStore>,
    context: ExecutionContext,
    polling: PollSettings,
}

impl QueryService {
    pub fn new(
        backend: Arc<dyn QueryBackend>,
        templates: Option<TemplateStore>,
        context: ExecutionContext,
        polling: PollSettings,
    ) -> Self {
        Self {
            backend,
            templates,
            context,
            polling,
        }
    }

    /// Runs a query request.
    ///
    /// Rendering failures stop the run before anything reaches the backend.
    /// The wait deadline starts counting once the submission is accepted.
    pub async fn run(&self, request: &QueryRequest, cancel: &CancellationToken) -> Result<QueryRun> {
        let query = template::render(&request.template, self.templates.as_ref(), &request.data)
            .await?;
        debug!(query = %query, "rendered query template");

        let handle = submit(
            self.backend.as_ref(),
            &query,
            &self.context,
            &request.parameters,
        )
        .await?;

        if !request.wait_for_completion {
            return Ok(QueryRun::Submitted(handle));
        }

        let deadline = Instant::now() + self.polling.timeout;
        let outcome = await_completion(
            self.backend.as_ref(),
            &handle,
            deadline,
            self.polling.interval,
            cancel,
        )
        .await?;

        Ok(QueryRun::Completed(outcome))
    }
}
