//! Application settings.
//!
//! Settings are assembled exactly once at process start from CLI flags and
//! their environment-variable fallbacks, then passed by reference into each
//! component constructor. There is no global settings state.

use std::path::PathBuf;

pub const DEFAULT_STORE_DISPLAY_NAME: &str = "pdf-documents";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub data_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    /// Display name of the remote file-search store.
    pub store_display_name: String,
    /// Model identifier for generation calls.
    pub model: String,
}

impl Settings {
    /// Path of the persisted upload-tracking file.
    pub fn tracking_path(&self) -> PathBuf {
        self.cache_dir.join("file_tracking.json")
    }

    /// Create the data and cache directories if they do not exist yet.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.cache_dir)?;
        Ok(())
    }

    /// Reject obviously unusable configuration before any remote call.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.trim().is_empty() {
            return Err("API key is not set".to_string());
        }
        if self.api_key.len() < 10 {
            return Err("API key appears to be invalid (too short)".to_string());
        }
        Ok(())
    }
}

/// Default data directory: `~/.askpdf/data`, falling back to `./data` when no
/// home directory can be resolved.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".askpdf").join("data"))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

/// Default cache directory: `~/.askpdf/cache`, falling back to `./.cache`.
pub fn default_cache_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".askpdf").join("cache"))
        .unwrap_or_else(|| PathBuf::from("./.cache"))
}
