//! Error types for the query API.
//!
//! `ApiError` is the top-level error surfaced to request handlers. The
//! component errors (`RenderError`, `BackendError`, `PollError`) describe
//! which stage of a query run failed.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::query::ExecutionOutcome;

/// Stage of template rendering that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    /// Template text could not be parsed, or no stored files matched.
    Parse,
    /// The named template is absent from the parsed set.
    Lookup,
    /// Binding data into the template failed.
    Execute,
    /// Reading from the template store failed.
    Io,
}

impl RenderStage {
    /// Returns the stage as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::Lookup => "lookup",
            Self::Execute => "execute",
            Self::Io => "read",
        }
    }
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Template rendering failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to {stage} template: {message}")]
pub struct RenderError {
    pub stage: RenderStage,
    pub message: String,
}

impl RenderError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::new(RenderStage::Parse, msg)
    }

    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::new(RenderStage::Lookup, msg)
    }

    pub fn execute(msg: impl Into<String>) -> Self {
        Self::new(RenderStage::Execute, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(RenderStage::Io, msg)
    }

    fn new(stage: RenderStage, msg: impl Into<String>) -> Self {
        Self {
            stage,
            message: msg.into(),
        }
    }
}

/// Error returned by a query backend (transport failure or rejection).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Failure while waiting for an execution to reach a terminal state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    /// Fetching execution status failed.
    #[error("failed to describe query execution {execution_id}: {source}")]
    DescribeFailed {
        execution_id: String,
        source: BackendError,
    },

    /// The deadline passed before a terminal state was observed.
    #[error("query execution {execution_id} did not complete within {waited:?}")]
    Timeout {
        execution_id: String,
        waited: Duration,
    },

    /// The wait was cancelled by the caller.
    #[error("wait for query execution {execution_id} was cancelled")]
    Cancelled { execution_id: String },
}

impl PollError {
    /// Returns the execution the failed wait was observing.
    pub fn execution_id(&self) -> &str {
        match self {
            Self::DescribeFailed { execution_id, .. }
            | Self::Timeout { execution_id, .. }
            | Self::Cancelled { execution_id } => execution_id,
        }
    }
}

/// Main error type for query API operations.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request body could not be bound or is missing required fields.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Template rendering failed.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// The backend rejected or could not receive the submission.
    #[error("Submit error: {0}")]
    Submit(BackendError),

    /// Waiting for completion failed.
    #[error("Poll error: {0}")]
    Poll(#[from] PollError),

    /// The execution reached a terminal state other than SUCCEEDED.
    #[error("Query error: execution {} finished with state {}", .0.execution_id, .0.state)]
    QueryNotSucceeded(ExecutionOutcome),

    /// Configuration errors (invalid config file, missing template store, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Creates an invalid request error with the given message.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "Request Error",
            Self::Render(_) => "Render Error",
            Self::Submit(_) => "Submit Error",
            Self::Poll(_) => "Poll Error",
            Self::QueryNotSucceeded(_) => "Query Error",
            Self::Config(_) => "Configuration Error",
        }
    }
}

/// Result type alias using ApiError.
pub type Result<T> = std::result::Result<T, ApiError>;
