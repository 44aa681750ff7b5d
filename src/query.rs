//! Question answering over the file-search store.
//!
//! This module handles:
//! - Prompt assembly (caller-supplied system prompt or the default template)
//! - The generation call with fixed sampling parameters
//! - Fixed-interval retry for transient remote failures
//!
//! Unlike the upload pipeline, errors here propagate to the caller; only the
//! agent facade turns them into user-facing strings.

use crate::error::AgentError;
use crate::protocol::GenerateContentRequest;
use crate::remote::FileSearchBackend;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

pub struct QueryPipeline<B> {
    backend: Arc<B>,
    model: String,
}

impl<B: FileSearchBackend> QueryPipeline<B> {
    pub fn new(backend: Arc<B>, model: &str) -> Self {
        info!("initialized query pipeline with model: {}", model);
        Self {
            backend,
            model: model.to_string(),
        }
    }

    /// Ask one question, grounded in `store_name` when available. Fails with
    /// a `Generation` error on any remote or response-parsing failure.
    pub async fn ask_question(
        &self,
        question: &str,
        store_name: Option<&str>,
        system_prompt: Option<&str>,
    ) -> Result<String, AgentError> {
        if store_name.is_none() {
            warn!("no file search store name provided; answering without file context");
        }

        let prompt = match system_prompt {
            Some(system) => format!("{}\n\nQuestion: {}", system, question),
            None => default_prompt(question),
        };
        info!("processing question: {}", preview(question));

        let response = self
            .backend
            .generate(&self.model, &GenerateContentRequest::for_prompt(&prompt, store_name))
            .await
            .map_err(|e| match e {
                e @ AgentError::Generation(_) => e,
                other => AgentError::generation(other.to_string()),
            })?;

        let answer = response
            .extract_text()
            .ok_or_else(|| AgentError::generation("response contained no text"))?;
        info!("successfully generated response");
        Ok(answer)
    }

    /// Retry wrapper around [`ask_question`]: up to `max_retries` attempts
    /// with a fixed sleep between them. No jitter, no backoff growth. After
    /// exhaustion, fails with `RetriesExhausted` wrapping the last cause.
    pub async fn ask_with_retry(
        &self,
        question: &str,
        store_name: Option<&str>,
        max_retries: usize,
        retry_delay: Duration,
    ) -> Result<String, AgentError> {
        let attempts = max_retries.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.ask_question(question, store_name, None).await {
                Ok(answer) => return Ok(answer),
                Err(e) => {
                    if attempt < attempts {
                        warn!(
                            "attempt {} failed: {}. Retrying in {:.1}s...",
                            attempt,
                            e,
                            retry_delay.as_secs_f64()
                        );
                        tokio::time::sleep(retry_delay).await;
                    } else {
                        error!("all {} attempts failed", attempts);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(AgentError::RetriesExhausted {
            attempts,
            source: Box::new(
                last_error.unwrap_or_else(|| AgentError::generation("no attempts were made")),
            ),
        })
    }
}

/// Default prompt template: frames the assistant's role and requires it to
/// say so when an answer is not grounded in the uploaded material.
fn default_prompt(question: &str) -> String {
    format!(
        "You are a document research assistant. Answer the following question \
         based on the provided documents.\n\n\
         Question: {}\n\n\
         Provide a clear, accurate, and comprehensive answer. If the information \
         is not available in the provided documents, state that clearly.",
        question
    )
}

/// First 100 characters of the question, for log lines.
fn preview(question: &str) -> String {
    let mut short: String = question.chars().take(100).collect();
    if short.len() < question.len() {
        short.push_str("...");
    }
    short
}
