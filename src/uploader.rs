//! Upload pipeline: validate, dedupe against the tracking store, upload,
//! wait for remote processing, import into the file-search store, record.
//!
//! No error escapes this pipeline. Every failure path logs its cause and
//! returns `None` (or an empty batch), so callers never have to unwind a
//! half-finished upload.

use crate::error::AgentError;
use crate::poll::{self, ImportState, PollConfig};
use crate::protocol::{FileSearchStore, FileState};
use crate::remote::FileSearchBackend;
use crate::settings::Settings;
use crate::tracking::{TrackedFile, TrackingStore};
use crate::validators::{validate_directory, validate_pdf_file};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Remote identity of a successfully uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub name: String,
    pub uri: String,
}

/// One row of `list-files` output.
#[derive(Debug, Clone)]
pub struct FileSummary {
    pub original_path: String,
    pub name: String,
    pub uri: String,
    pub upload_date: String,
}

pub struct UploadPipeline<B> {
    backend: Arc<B>,
    tracking: TrackingStore,
    store: Option<FileSearchStore>,
    poll: PollConfig,
}

impl<B: FileSearchBackend> UploadPipeline<B> {
    /// Load the tracking store and resolve (or create) the remote
    /// file-search store. Store initialization failure is degraded mode,
    /// not an error: uploads still work, they just are not searchable.
    pub async fn new(backend: Arc<B>, settings: &Settings, poll: PollConfig) -> Self {
        let tracking = TrackingStore::load(settings.tracking_path());
        let store = init_store(backend.as_ref(), &settings.store_display_name).await;
        Self {
            backend,
            tracking,
            store,
            poll,
        }
    }

    /// Name of the remote store, for grounding queries. `None` in degraded
    /// mode.
    pub fn store_name(&self) -> Option<&str> {
        self.store.as_ref().map(|s| s.name.as_str())
    }

    /// Upload one PDF. Returns the remote name/URI, or `None` on any
    /// failure. Re-running on an unmodified file short-circuits to the
    /// tracked entry without any network call.
    pub async fn upload_file(&mut self, path: &Path) -> Option<UploadResult> {
        if let Err(e) = validate_pdf_file(path) {
            error!("{}", e);
            return None;
        }

        if self.tracking.is_tracked(path) {
            info!("file already uploaded: {}", file_label(path));
            let entry = self.tracking.get(path)?;
            return Some(UploadResult {
                name: entry.name.clone(),
                uri: entry.uri.clone(),
            });
        }

        match self.upload_and_import(path).await {
            Ok(result) => {
                info!(
                    "successfully uploaded: {} (uri: {})",
                    file_label(path),
                    result.uri
                );
                Some(result)
            }
            Err(e) => {
                error!("failed to upload {}: {}", file_label(path), e);
                None
            }
        }
    }

    async fn upload_and_import(&mut self, path: &Path) -> Result<UploadResult, AgentError> {
        info!("uploading file: {}", file_label(path));
        let mut file = self.backend.upload_file(path).await?;

        // Wait for remote processing to finish, bounded by the same ceiling
        // as the import wait. An unprocessed file cannot be imported.
        let max_polls = self.poll.max_polls();
        let mut polls = 0u32;
        while file.state == FileState::Processing {
            if polls >= max_polls {
                return Err(AgentError::RemoteProcessing {
                    name: file.name,
                    message: "processing did not finish within the wait ceiling".to_string(),
                });
            }
            tokio::time::sleep(self.poll.interval).await;
            polls += 1;
            file = self.backend.get_file(&file.name).await?;
        }
        if file.state == FileState::Failed {
            let message = file
                .error
                .map(|s| s.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(AgentError::RemoteProcessing {
                name: file.name,
                message,
            });
        }
        if file.state == FileState::Unknown {
            warn!("file {} reported an unrecognized state; continuing", file.name);
        }

        if let Some(store) = self.store.clone() {
            info!("importing file into store {}", store.name);
            match self.wait_for_import(&store.name, &file.name).await {
                Ok(ImportState::Imported) => info!("file import completed"),
                Ok(ImportState::TimedOut) => warn!(
                    "import of {} not confirmed within the wait ceiling; \
                     file uploaded but import is unconfirmed",
                    file.name
                ),
                Ok(other) => debug!("import wait ended in non-terminal state {:?}", other),
                Err(e @ AgentError::RemoteImport { .. }) => return Err(e),
                Err(e) => warn!(
                    "failed to confirm import: {}. File uploaded but may not be searchable.",
                    e
                ),
            }
        }

        let hash = TrackingStore::compute_file_hash(path)?;
        let result = UploadResult {
            name: file.name.clone(),
            uri: file.uri_or_name(),
        };
        self.tracking.insert(
            path,
            TrackedFile {
                name: result.name.clone(),
                uri: result.uri.clone(),
                hash,
                upload_date: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                original_path: path.display().to_string(),
                store_name: self.store.as_ref().map(|s| s.name.clone()),
            },
        );
        Ok(result)
    }

    /// Drive the import operation to a terminal state. An explicit remote
    /// failure becomes `RemoteImport`; everything else comes back as the
    /// terminal state reached.
    async fn wait_for_import(
        &self,
        store_name: &str,
        file_name: &str,
    ) -> Result<ImportState, AgentError> {
        let mut op = self.backend.import_file(store_name, file_name).await?;
        let mut polls = 0u32;
        let mut state = poll::advance(ImportState::Submitted, &op, polls, &self.poll);
        while !state.is_terminal() {
            tokio::time::sleep(self.poll.interval).await;
            polls += 1;
            op = self.backend.get_operation(&op.name).await?;
            state = poll::advance(state, &op, polls, &self.poll);
        }
        match state {
            ImportState::Failed(message) => Err(AgentError::RemoteImport {
                name: file_name.to_string(),
                message,
            }),
            other => Ok(other),
        }
    }

    /// Upload every `*.pdf` directly inside `dir` (non-recursive),
    /// sequentially. One file's failure never aborts the batch.
    pub async fn upload_directory(&mut self, dir: &Path) -> Vec<UploadResult> {
        if let Err(e) = validate_directory(dir) {
            error!("{}", e);
            return Vec::new();
        }

        let mut pdfs = list_pdfs(dir);
        pdfs.sort();
        if pdfs.is_empty() {
            warn!("no PDF files found in directory: {}", dir.display());
            return Vec::new();
        }
        info!("found {} PDF file(s) in {}", pdfs.len(), dir.display());

        let mut uploaded = Vec::new();
        for pdf in &pdfs {
            if let Some(result) = self.upload_file(pdf).await {
                uploaded.push(result);
            }
        }
        info!(
            "successfully uploaded {}/{} file(s)",
            uploaded.len(),
            pdfs.len()
        );
        uploaded
    }

    pub fn list_files(&self) -> Vec<FileSummary> {
        let mut files: Vec<FileSummary> = self
            .tracking
            .entries()
            .map(|(key, entry)| FileSummary {
                original_path: if entry.original_path.is_empty() {
                    key.clone()
                } else {
                    entry.original_path.clone()
                },
                name: entry.name.clone(),
                uri: entry.uri.clone(),
                upload_date: entry.upload_date.clone(),
            })
            .collect();
        files.sort_by(|a, b| a.original_path.cmp(&b.original_path));
        files
    }

    pub fn file_count(&self) -> usize {
        self.tracking.len()
    }

    /// Drop every tracked entry and the persisted cache file.
    pub fn clear_cache(&mut self) -> bool {
        match self.tracking.clear() {
            Ok(()) => {
                info!("file tracking cache cleared");
                true
            }
            Err(e) => {
                error!("failed to clear cache: {}", e);
                false
            }
        }
    }
}

/// Resolve the store by display name, create it when absent, fall back to
/// degraded mode when the remote surface is unavailable.
async fn init_store<B: FileSearchBackend>(
    backend: &B,
    display_name: &str,
) -> Option<FileSearchStore> {
    match backend.list_stores().await {
        Ok(stores) => {
            if let Some(store) = stores
                .into_iter()
                .find(|s| s.display_name.as_deref() == Some(display_name))
            {
                info!(
                    "using existing file search store: {} ({})",
                    display_name, store.name
                );
                return Some(store);
            }
        }
        Err(e) => debug!("could not list existing stores: {}", e),
    }

    info!("creating file search store: {}", display_name);
    match backend.create_store(display_name).await {
        Ok(store) => {
            info!("file search store ready: {}", store.name);
            Some(store)
        }
        Err(e) => {
            error!("failed to initialize file search store: {}", e);
            warn!("continuing without store; uploads will succeed but not be searchable");
            None
        }
    }
}

fn list_pdfs(dir: &Path) -> Vec<PathBuf> {
    let Ok(read) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    read.filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("pdf"))
                    .unwrap_or(false)
        })
        .collect()
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
