//! Local input validation, performed before any remote call.

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("file does not exist: {0}")]
    NotFound(String),
    #[error("path is not a file: {0}")]
    NotAFile(String),
    #[error("file is not a PDF: {0}")]
    WrongType(String),
    #[error("file is empty: {0}")]
    Empty(String),
    #[error("directory does not exist: {0}")]
    DirNotFound(String),
    #[error("path is not a directory: {0}")]
    NotADirectory(String),
    #[error("directory is not readable: {0}")]
    Unreadable(String),
}

/// Check that `path` points at an existing, non-empty `.pdf` file.
/// Pure check, no side effects.
pub fn validate_pdf_file(path: &Path) -> Result<(), ValidationError> {
    let display = path.display().to_string();

    if !path.exists() {
        return Err(ValidationError::NotFound(display));
    }
    if !path.is_file() {
        return Err(ValidationError::NotAFile(display));
    }
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !is_pdf {
        return Err(ValidationError::WrongType(display));
    }
    let size = path
        .metadata()
        .map_err(|_| ValidationError::NotFound(display.clone()))?
        .len();
    if size == 0 {
        return Err(ValidationError::Empty(display));
    }
    Ok(())
}

/// Check that `path` is an existing, readable directory.
pub fn validate_directory(path: &Path) -> Result<(), ValidationError> {
    let display = path.display().to_string();

    if !path.exists() {
        return Err(ValidationError::DirNotFound(display));
    }
    if !path.is_dir() {
        return Err(ValidationError::NotADirectory(display));
    }
    // Probing with read_dir is the portable permission check.
    if std::fs::read_dir(path).is_err() {
        return Err(ValidationError::Unreadable(display));
    }
    Ok(())
}
