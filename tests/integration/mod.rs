//! Integration tests for the Athena query API.

pub mod common;
pub mod s3_template_test;
