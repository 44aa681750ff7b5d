//! askpdf: upload PDF documents to a hosted file-search store and answer
//! questions about them with retrieval-augmented generation.
//!
//! The crate is thin orchestration over the remote service: local
//! validation, an upload-tracking cache keyed by resolved path, bounded
//! fixed-interval polling for remote processing and import, and a
//! fixed-count retry wrapper around generation calls.

pub mod agent;
pub mod cli;
pub mod error;
pub mod poll;
pub mod protocol;
pub mod query;
pub mod remote;
pub mod settings;
pub mod tracking;
pub mod uploader;
pub mod validators;

#[cfg(test)]
mod tests;
