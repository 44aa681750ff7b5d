//! Remote file-search service client.
//!
//! This module handles:
//! - The `FileSearchBackend` trait the pipelines are written against
//! - The reqwest implementation speaking the pinned v1beta REST contract
//!
//! Pipelines stay generic over the backend so tests can substitute a mock
//! without any network access.

use crate::error::AgentError;
use crate::protocol::{
    FileSearchStore, GenerateContentRequest, GenerateContentResponse, ListStoresResponse,
    RemoteFile, RemoteOperation, UploadFileResponse,
};
use log::debug;
use serde_json::json;
use std::path::Path;

const API_BASE: &str = "https://generativelanguage.googleapis.com";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Operations the remote document-search service exposes. One method per
/// endpoint of the pinned contract.
pub trait FileSearchBackend {
    fn upload_file(
        &self,
        path: &Path,
    ) -> impl std::future::Future<Output = Result<RemoteFile, AgentError>> + Send;

    fn get_file(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<RemoteFile, AgentError>> + Send;

    fn list_stores(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<FileSearchStore>, AgentError>> + Send;

    fn create_store(
        &self,
        display_name: &str,
    ) -> impl std::future::Future<Output = Result<FileSearchStore, AgentError>> + Send;

    fn import_file(
        &self,
        store_name: &str,
        file_name: &str,
    ) -> impl std::future::Future<Output = Result<RemoteOperation, AgentError>> + Send;

    fn get_operation(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<RemoteOperation, AgentError>> + Send;

    fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> impl std::future::Future<Output = Result<GenerateContentResponse, AgentError>> + Send;
}

/// reqwest-backed client for the hosted service.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, API_BASE)
    }

    /// Point the client at a different host. Used by integration tests.
    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, AgentError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AgentError::generation(format!(
            "remote call failed with status {}: {}",
            status, body
        )))
    }
}

impl FileSearchBackend for GeminiClient {
    async fn upload_file(&self, path: &Path) -> Result<RemoteFile, AgentError> {
        let bytes = tokio::fs::read(path).await?;
        debug!("uploading {} bytes from {:?}", bytes.len(), path);
        let response = self
            .http
            .post(self.url("/upload/v1beta/files"))
            .header(API_KEY_HEADER, &self.api_key)
            .header("X-Goog-Upload-Protocol", "raw")
            .header(reqwest::header::CONTENT_TYPE, "application/pdf")
            .body(bytes)
            .send()
            .await?;
        let envelope: UploadFileResponse = Self::check(response).await?.json().await?;
        Ok(envelope.file)
    }

    async fn get_file(&self, name: &str) -> Result<RemoteFile, AgentError> {
        let response = self
            .http
            .get(self.url(&format!("/v1beta/{}", name)))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn list_stores(&self) -> Result<Vec<FileSearchStore>, AgentError> {
        let response = self
            .http
            .get(self.url("/v1beta/fileSearchStores"))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        let listing: ListStoresResponse = Self::check(response).await?.json().await?;
        Ok(listing.file_search_stores)
    }

    async fn create_store(&self, display_name: &str) -> Result<FileSearchStore, AgentError> {
        let response = self
            .http
            .post(self.url("/v1beta/fileSearchStores"))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&json!({ "displayName": display_name }))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn import_file(
        &self,
        store_name: &str,
        file_name: &str,
    ) -> Result<RemoteOperation, AgentError> {
        let response = self
            .http
            .post(self.url(&format!("/v1beta/{}:importFile", store_name)))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&json!({ "fileName": file_name }))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn get_operation(&self, name: &str) -> Result<RemoteOperation, AgentError> {
        let response = self
            .http
            .get(self.url(&format!("/v1beta/{}", name)))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, AgentError> {
        let response = self
            .http
            .post(self.url(&format!("/v1beta/models/{}:generateContent", model)))
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }
}
