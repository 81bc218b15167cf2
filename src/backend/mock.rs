//! Mock query backends for testing.
//!
//! `MockQueryBackend` plays back a scripted sequence of statuses for every
//! execution it accepts, and records each submission for later inspection.

use super::{
    BackendResult, ExecutionContext, ExecutionHandle, ExecutionState, ExecutionStatus,
    QueryBackend, SubmitRequest,
};
use crate::error::BackendError;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A submission captured by the mock backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSubmission {
    pub execution_id: String,
    pub query: String,
    pub parameters: Vec<String>,
    pub context: ExecutionContext,
}

#[derive(Debug)]
struct Playback {
    remaining: VecDeque<ExecutionStatus>,
    last: ExecutionStatus,
}

impl Playback {
    fn next(&mut self) -> ExecutionStatus {
        if let Some(status) = self.remaining.pop_front() {
            self.last = status;
        }
        self.last.clone()
    }
}

#[derive(Debug, Default)]
struct MockState {
    next_id: u64,
    executions: HashMap<String, Playback>,
    submissions: Vec<RecordedSubmission>,
    describe_calls: usize,
}

/// A mock backend that returns predefined statuses.
///
/// Each describe call advances the execution one step through the script;
/// once the script is exhausted the final status repeats.
#[derive(Debug, Default)]
pub struct MockQueryBackend {
    script: Option<Vec<ExecutionStatus>>,
    state: Mutex<MockState>,
}

impl MockQueryBackend {
    /// Creates a mock whose executions go QUEUED, RUNNING, then SUCCEEDED
    /// with a result location derived from the execution id.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock that plays `script` for every submitted execution.
    pub fn with_script(script: Vec<ExecutionStatus>) -> Self {
        Self {
            script: Some(script),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Creates a mock whose executions never leave RUNNING.
    pub fn stuck_running() -> Self {
        Self::with_script(vec![ExecutionStatus::new(ExecutionState::Running)])
    }

    /// Returns every submission received so far, oldest first.
    pub fn submissions(&self) -> Vec<RecordedSubmission> {
        self.lock().submissions.clone()
    }

    /// Returns the number of describe calls received so far.
    pub fn describe_calls(&self) -> usize {
        self.lock().describe_calls
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn script_for(&self, execution_id: &str) -> Vec<ExecutionStatus> {
        match &self.script {
            Some(script) => script.clone(),
            None => vec![
                ExecutionStatus::new(ExecutionState::Queued),
                ExecutionStatus::new(ExecutionState::Running),
                ExecutionStatus::new(ExecutionState::Succeeded)
                    .with_result_location(format!("s3://mock-results/{execution_id}.csv")),
            ],
        }
    }
}

#[async_trait]
impl QueryBackend for MockQueryBackend {
    async fn submit(&self, request: SubmitRequest<'_>) -> BackendResult<ExecutionHandle> {
        let mut state = self.lock();
        state.next_id += 1;
        let execution_id = format!("mock-{:08}", state.next_id);

        let mut remaining: VecDeque<ExecutionStatus> = self.script_for(&execution_id).into();
        let last = remaining
            .front()
            .cloned()
            .unwrap_or_else(|| ExecutionStatus::new(ExecutionState::Queued));
        if remaining.is_empty() {
            remaining.push_back(last.clone());
        }

        state
            .executions
            .insert(execution_id.clone(), Playback { remaining, last });
        state.submissions.push(RecordedSubmission {
            execution_id: execution_id.clone(),
            query: request.query.to_string(),
            parameters: request.parameters.to_vec(),
            context: request.context.clone(),
        });

        Ok(ExecutionHandle::new(execution_id))
    }

    async fn describe(&self, handle: &ExecutionHandle) -> BackendResult<ExecutionStatus> {
        let mut state = self.lock();
        state.describe_calls += 1;
        state
            .executions
            .get_mut(&handle.execution_id)
            .map(Playback::next)
            .ok_or_else(|| {
                BackendError::new(format!(
                    "query execution {} was not found",
                    handle.execution_id
                ))
            })
    }
}

/// A backend whose submit or describe calls always fail.
#[derive(Debug)]
pub struct FailingQueryBackend {
    fail_submit: bool,
    message: String,
}

impl FailingQueryBackend {
    /// Creates a backend that rejects every submission.
    pub fn on_submit(message: impl Into<String>) -> Self {
        Self {
            fail_submit: true,
            message: message.into(),
        }
    }

    /// Creates a backend that accepts submissions but fails every describe.
    pub fn on_describe(message: impl Into<String>) -> Self {
        Self {
            fail_submit: false,
            message: message.into(),
        }
    }
}

#[async_trait]
impl QueryBackend for FailingQueryBackend {
    async fn submit(&self, _request: SubmitRequest<'_>) -> BackendResult<ExecutionHandle> {
        if self.fail_submit {
            return Err(BackendError::new(self.message.clone()));
        }
        Ok(ExecutionHandle::new("failing-00000001"))
    }

    async fn describe(&self, _handle: &ExecutionHandle) -> BackendResult<ExecutionStatus> {
        Err(BackendError::new(self.message.clone()))
    }
}
