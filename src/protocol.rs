//! Wire types for the v1beta file-search REST contract.
//!
//! This module handles:
//! - File handles and their processing-state enum
//! - File-search store and import-operation shapes
//! - generateContent request/response bodies
//!
//! The schema is pinned against one contract version. Unknown enum values
//! deserialize into an explicit `Unknown` variant instead of being probed
//! for; callers log and treat them as unrecognized.

use serde::{Deserialize, Serialize};

/// Processing state of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    Processing,
    Active,
    Failed,
    StateUnspecified,
    #[serde(other)]
    Unknown,
}

/// Structured error payload attached to failed files and operations.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// A file handle as returned by the upload and get endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub name: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default = "default_file_state")]
    pub state: FileState,
    #[serde(default)]
    pub error: Option<RemoteStatus>,
}

fn default_file_state() -> FileState {
    FileState::StateUnspecified
}

impl RemoteFile {
    /// Best URI for tracking; the resource name doubles as one when the
    /// service omits a dedicated URI field.
    pub fn uri_or_name(&self) -> String {
        self.uri.clone().unwrap_or_else(|| self.name.clone())
    }
}

/// Envelope returned by the media-upload endpoint.
#[derive(Debug, Deserialize)]
pub struct UploadFileResponse {
    pub file: RemoteFile,
}

/// A file-search store handle.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSearchStore {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStoresResponse {
    #[serde(default)]
    pub file_search_stores: Vec<FileSearchStore>,
}

/// Long-running operation returned by an import request.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteOperation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<RemoteStatus>,
}

// ---- generateContent ----

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: i32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        // Fixed sampling parameters; not user-tunable.
        Self {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSearchTool {
    pub file_search_store_names: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub file_search: FileSearchTool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

impl GenerateContentRequest {
    /// Build a request for a single prompt, optionally grounded in a store.
    pub fn for_prompt(prompt: &str, store_name: Option<&str>) -> Self {
        let tools = store_name.map(|name| {
            vec![Tool {
                file_search: FileSearchTool {
                    file_search_store_names: vec![name.to_string()],
                },
            }]
        });
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig::default(),
            tools,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    /// Convenience text field. Not always populated by the service.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Extract plain answer text: the direct text field first, then the
    /// joined text parts of the first candidate.
    pub fn extract_text(&self) -> Option<String> {
        if let Some(text) = &self.text {
            if !text.is_empty() {
                return Some(text.clone());
            }
        }
        let candidate = self.candidates.first()?;
        let content = candidate.content.as_ref()?;
        if content.parts.is_empty() {
            return None;
        }
        let joined = content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        if joined.is_empty() {
            None
        } else {
            Some(joined)
        }
    }
}
