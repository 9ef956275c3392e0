//! Error types for the docpolish library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PolishError`] — **Fatal**: the local part of the pipeline cannot
//!   proceed (missing input, unparseable document, grammar engine failure
//!   under the `Halt` policy, output not writable). Returned as
//!   `Err(PolishError)` from the top-level `polish*` functions.
//!
//! * [`UploadError`] — **Non-fatal**: publishing the finished document to
//!   Confluence failed. The processed file is already on disk, so the error
//!   is stored in [`crate::output::UploadOutcome`] instead of aborting.
//!
//! Grammar engine failures use [`GrammarError`]; the corrector wraps them in
//! [`PolishError::Correction`] together with the paragraph's location.

use crate::document::NodeLocation;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docpolish library.
#[derive(Debug, Error)]
pub enum PolishError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a ZIP-based Office document.
    #[error("File is not a valid .docx package: '{path}'\nFirst bytes: {magic:?}")]
    NotADocx { path: PathBuf, magic: [u8; 4] },

    // ── Document errors ───────────────────────────────────────────────────
    /// The package is a ZIP but its WordprocessingML parts could not be parsed.
    #[error("Document '{path}' is corrupt: {detail}")]
    CorruptDocument { path: PathBuf, detail: String },

    // ── Correction errors ─────────────────────────────────────────────────
    /// The grammar engine failed on a specific paragraph.
    #[error("Grammar correction failed at {location}: {detail}")]
    Correction {
        location: NodeLocation,
        detail: String,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not serialise or write the output document.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PolishError {
    /// True for the errors that mean "the input is not a usable document".
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            PolishError::NotADocx { .. } | PolishError::CorruptDocument { .. }
        )
    }
}

/// A non-fatal error from the upload stage.
///
/// Local changes are never rolled back when one of these occurs.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum UploadError {
    /// One or more `CONFLUENCE_*` settings are missing.
    #[error("Confluence upload is not configured: {missing} not set")]
    NotConfigured { missing: String },

    /// The processed document could not be read back from disk.
    #[error("Failed to read '{path}' for upload: {detail}")]
    ReadFailed { path: PathBuf, detail: String },

    /// The request never produced an HTTP response.
    #[error("Upload request failed: {detail}")]
    Transport { detail: String },

    /// The server answered with a status other than 200/201.
    #[error("Upload failed: {status} {body}")]
    Rejected { status: u16, body: String },
}

/// Failure reported by a [`crate::grammar::GrammarChecker`].
#[derive(Debug, Clone, Error)]
pub enum GrammarError {
    /// The engine could not be reached.
    #[error("grammar engine '{engine}' unavailable: {detail}")]
    Unavailable { engine: String, detail: String },

    /// The engine answered with an error status.
    #[error("grammar engine returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The engine's answer could not be decoded.
    #[error("invalid response from grammar engine: {0}")]
    InvalidResponse(String),
}
