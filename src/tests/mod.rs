//! Integration tests for the upload and query pipelines.
//!
//! These tests run the pipelines against a scripted mock backend, so the
//! polling and retry contracts are exercised without a network or real
//! delays.

pub mod pipeline_integration;
