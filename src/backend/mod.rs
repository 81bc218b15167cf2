//! Query backend abstraction.
//!
//! Provides a trait-based interface over an asynchronous query engine, so the
//! submit/poll core never depends on a concrete client.

mod athena;
mod mock;
mod types;

pub use athena::AthenaBackend;
pub use mock::{FailingQueryBackend, MockQueryBackend, RecordedSubmission};
pub use types::{
    ExecutionContext, ExecutionHandle, ExecutionState, ExecutionStatus, SubmitRequest,
};

use crate::error::BackendError;
use async_trait::async_trait;

/// Result type for backend calls.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Capability interface of an asynchronous query engine.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Starts an execution and returns its identifier without waiting for it.
    async fn submit(&self, request: SubmitRequest<'_>) -> BackendResult<ExecutionHandle>;

    /// Returns the current status of an execution.
    async fn describe(&self, handle: &ExecutionHandle) -> BackendResult<ExecutionStatus>;
}
