//! Completion polling.
//!
//! Observes an execution at a fixed interval until the backend reports a
//! terminal state, the deadline passes, or the caller cancels.

use std::time::Duration;

use serde::Serialize;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::backend::{ExecutionHandle, ExecutionState, ExecutionStatus, QueryBackend};
use crate::error::PollError;

/// Default delay between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default time to wait for completion.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Polling cadence and budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

/// Terminal state of an execution as last reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    #[serde(rename = "queryExecutionId")]
    pub execution_id: String,
    #[serde(rename = "queryExecutionState")]
    pub state: ExecutionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_change_reason: Option<String>,
}

impl ExecutionOutcome {
    /// Builds the outcome from a terminal status, as reported.
    fn from_status(handle: &ExecutionHandle, status: ExecutionStatus) -> Self {
        Self {
            execution_id: handle.execution_id.clone(),
            state: status.state,
            result_location: status.result_location,
            state_change_reason: status.state_change_reason,
        }
    }
}

/// Waits until the execution reaches a terminal state or `deadline` passes.
///
/// Any terminal state is returned as-is; judging success is the caller's job.
/// A failed status call ends the wait immediately. `cancel` is checked before
/// each status call and interrupts both the call and the sleep.
pub async fn await_completion(
    backend: &dyn QueryBackend,
    handle: &ExecutionHandle,
    deadline: Instant,
    interval: Duration,
    cancel: &CancellationToken,
) -> Result<ExecutionOutcome, PollError> {
    let started = Instant::now();
    let cancelled = || PollError::Cancelled {
        execution_id: handle.execution_id.clone(),
    };

    while Instant::now() < deadline {
        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        let status = tokio::select! {
            biased;

            _ = cancel.cancelled() => return Err(cancelled()),
            result = backend.describe(handle) => result.map_err(|source| PollError::DescribeFailed {
                execution_id: handle.execution_id.clone(),
                source,
            })?,
        };

        if status.state.is_terminal() {
            debug!(
                query_execution_id = %handle,
                state = %status.state,
                elapsed = ?started.elapsed(),
                "query reached terminal state"
            );
            return Ok(ExecutionOutcome::from_status(handle, status));
        }

        info!(query_execution_id = %handle, state = %status.state, "query still running");

        tokio::select! {
            biased;

            _ = cancel.cancelled() => return Err(cancelled()),
            _ = sleep(interval) => {}
        }
    }

    Err(PollError::Timeout {
        execution_id: handle.execution_id.clone(),
        waited: started.elapsed(),
    })
}
