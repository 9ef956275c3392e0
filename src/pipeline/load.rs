//! Loader and saver: move a [`Document`] between disk and memory.
//!
//! Saving writes to a sibling temp file and renames it over the target, so a
//! failed serialisation never leaves a truncated `.docx` behind. That matters
//! here because the formatter writes back over the file it just read.

use crate::document::Document;
use crate::error::PolishError;
use crate::pipeline::input;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Open and parse the document at `path`.
///
/// # Errors
/// * [`PolishError::FileNotFound`] / [`PolishError::PermissionDenied`]
/// * [`PolishError::NotADocx`] when the file is not a ZIP package
/// * [`PolishError::CorruptDocument`] when the package cannot be parsed
pub async fn load_document(path: &Path) -> Result<Document, PolishError> {
    let path = input::resolve_local(path)?;

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => PolishError::PermissionDenied { path: path.clone() },
        _ => PolishError::FileNotFound { path: path.clone() },
    })?;

    let doc = Document::from_bytes(&bytes).map_err(|e| PolishError::CorruptDocument {
        path: path.clone(),
        detail: e.to_string(),
    })?;

    info!(
        "Loaded {}: {} paragraphs, {} tables",
        path.display(),
        doc.paragraph_count(),
        doc.table_count()
    );
    Ok(doc)
}

/// Serialise `doc` to `path`, replacing any existing file atomically.
pub async fn save_document(doc: Document, path: &Path) -> Result<(), PolishError> {
    let write_err = |source: std::io::Error| PolishError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let bytes = doc.into_bytes().map_err(|detail| {
        write_err(std::io::Error::new(std::io::ErrorKind::Other, detail))
    })?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::env::current_dir().map_err(write_err)?,
    };
    tokio::fs::create_dir_all(&parent).await.map_err(write_err)?;

    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| PolishError::Internal(format!("Save task panicked: {}", e)))?
    .map_err(write_err)?;

    debug!("Saved {}", path.display());
    Ok(())
}
