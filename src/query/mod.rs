//! Query submission and completion polling.
//!
//! This module isolates the render → submit → wait flow from the HTTP layer,
//! so it can be tested against a mock backend.

pub mod poller;
pub mod service;
pub mod submitter;

pub use crate::backend::{ExecutionHandle, ExecutionState};
pub use poller::{await_completion, ExecutionOutcome, PollSettings};
pub use service::{QueryRequest, QueryRun, QueryService};
pub use submitter::submit;
