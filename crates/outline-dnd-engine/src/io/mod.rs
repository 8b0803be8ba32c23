use relative_path::RelativePath;
use std::fs;
use std::path::{Path, PathBuf};

use crate::editing::Document;
use crate::models::DocumentRef;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid notes directory: {0}")]
    InvalidNotesDir(String),
}

/// Load a markdown file under `notes_root` as an open document
pub fn read_document(relative_path: &RelativePath, notes_root: &Path) -> Result<Document, IoError> {
    let absolute_path = relative_path.to_path(notes_root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    let text = fs::read_to_string(&absolute_path)?;
    Ok(Document::new(
        DocumentRef::new(relative_path.to_relative_path_buf()),
        &text,
    ))
}

/// Write a document back to its file under `notes_root`
pub fn write_document(document: &Document, notes_root: &Path) -> Result<(), IoError> {
    let absolute_path = document.reference().relative_path().to_path(notes_root);

    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&absolute_path, document.text())?;
    log::debug!("Wrote {}", absolute_path.display());
    Ok(())
}

pub fn validate_notes_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidNotesDir(
            "Directory does not exist".to_string(),
        ));
    }

    Ok(())
}
