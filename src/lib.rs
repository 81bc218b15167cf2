//! Athena query API - renders query templates and runs them on Amazon Athena.
//!
//! This library exposes the core modules for use by the binary and by
//! integration tests.

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod query;
pub mod server;
pub mod template;
