//! Error taxonomy for the upload and query pipelines.
//!
//! Validation and remote failures during uploads are caught at the upload
//! pipeline boundary and never escape it. Query failures propagate through
//! the retry wrapper and are only turned into user-facing strings at the
//! agent facade.

use crate::validators::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    /// Bad local input. Never retried.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The remote service reported a terminal failure while processing an
    /// uploaded file.
    #[error("remote processing failed for {name}: {message}")]
    RemoteProcessing { name: String, message: String },

    /// The import operation into the file-search store reported failure.
    #[error("import into store failed for {name}: {message}")]
    RemoteImport { name: String, message: String },

    /// A generation call failed, or its response could not be parsed.
    #[error("generation failed: {0}")]
    Generation(String),

    /// All retry attempts were used up. Wraps the last underlying cause.
    #[error("failed to get response after {attempts} attempts")]
    RetriesExhausted {
        attempts: usize,
        #[source]
        source: Box<AgentError>,
    },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response shape: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// Convenience constructor for generation failures from string-ish causes.
    pub fn generation(msg: impl Into<String>) -> Self {
        AgentError::Generation(msg.into())
    }
}
