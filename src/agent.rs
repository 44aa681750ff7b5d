//! Agent facade composing the upload and query pipelines.
//!
//! This is the system's only top-level error boundary: every method catches
//! errors from its delegates and converts them to a null/empty/error-string
//! result, so the command surface never sees an exception-like failure.

use crate::error::AgentError;
use crate::query::{QueryPipeline, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
use crate::remote::{FileSearchBackend, GeminiClient};
use crate::settings::Settings;
use crate::uploader::{FileSummary, UploadPipeline, UploadResult};
use crate::poll::PollConfig;
use log::{error, warn};
use std::path::Path;
use std::sync::Arc;

pub struct Agent<B> {
    uploader: UploadPipeline<B>,
    query: QueryPipeline<B>,
}

impl Agent<GeminiClient> {
    /// Build the agent against the hosted service. Fails only on unusable
    /// configuration; remote store initialization failure is degraded mode,
    /// not an error.
    pub async fn new(settings: &Settings) -> Result<Self, String> {
        settings
            .validate()
            .map_err(|e| format!("configuration error: {}", e))?;
        settings
            .ensure_dirs()
            .map_err(|e| format!("failed to create data directories: {}", e))?;
        let backend = Arc::new(GeminiClient::new(&settings.api_key));
        Ok(Self::with_backend(backend, settings, PollConfig::default()).await)
    }
}

impl<B: FileSearchBackend> Agent<B> {
    /// Backend-injected constructor, used by tests.
    pub async fn with_backend(backend: Arc<B>, settings: &Settings, poll: PollConfig) -> Self {
        let uploader = UploadPipeline::new(Arc::clone(&backend), settings, poll).await;
        let query = QueryPipeline::new(backend, &settings.model);
        Self { uploader, query }
    }

    pub async fn upload_file(&mut self, path: &Path) -> Option<UploadResult> {
        self.uploader.upload_file(path).await
    }

    pub async fn upload_directory(&mut self, dir: &Path) -> Vec<UploadResult> {
        self.uploader.upload_directory(dir).await
    }

    pub fn list_files(&self) -> Vec<FileSummary> {
        self.uploader.list_files()
    }

    pub fn get_file_count(&self) -> usize {
        self.uploader.file_count()
    }

    /// Answer a question, using the retry wrapper unless opted out. Any
    /// failure comes back as a ready-to-print message in `Err`; the typed
    /// error never crosses this boundary.
    pub async fn ask_question(&self, question: &str, use_retry: bool) -> Result<String, String> {
        let store_name = self.uploader.store_name();
        if store_name.is_none() {
            warn!(
                "no file search store available; answering without file context. \
                 Consider uploading PDF documents first."
            );
        }

        let result = if use_retry {
            self.query
                .ask_with_retry(question, store_name, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY)
                .await
        } else {
            self.query.ask_question(question, store_name, None).await
        };

        result.map_err(|e| {
            error!("error answering question: {}", e);
            format!("failed to generate response. {}", describe(&e))
        })
    }

    pub fn clear_cache(&mut self) -> bool {
        self.uploader.clear_cache()
    }
}

/// Include the wrapped cause for retry exhaustion; the wrapper message alone
/// does not say what went wrong.
fn describe(e: &AgentError) -> String {
    match e {
        AgentError::RetriesExhausted { source, .. } => format!("{} ({})", e, source),
        _ => e.to_string(),
    }
}
