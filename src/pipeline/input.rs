//! Input resolution: validate the user-supplied path and derive the output name.
//!
//! A `.docx` file is a ZIP package, so every valid input starts with the
//! local-file-header signature `PK\x03\x04`. Checking it up front turns
//! "someone passed a PDF" into a [`PolishError::NotADocx`] with the offending
//! bytes instead of an opaque parser error.

use crate::error::PolishError;
use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// ZIP local file header signature.
pub const DOCX_MAGIC: [u8; 4] = *b"PK\x03\x04";

/// Suffix that replaces `.docx` in the output file name.
pub const OUTPUT_SUFFIX: &str = "_professional.docx";

/// Validate that `path` exists, is readable and looks like a `.docx` package.
pub fn resolve_local(path: &Path) -> Result<PathBuf, PolishError> {
    if !path.exists() {
        return Err(PolishError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && magic != DOCX_MAGIC {
                return Err(PolishError::NotADocx {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(PolishError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(PolishError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Resolved local document: {}", path.display());
    Ok(path.to_path_buf())
}

/// Derive the processed document's path from the input path.
///
/// Only the file name changes: a trailing `.docx` (any case) becomes
/// `_professional.docx`; any other name gets `_professional.docx` appended.
///
/// ```rust
/// use docpolish::pipeline::input::output_path_for;
/// use std::path::Path;
///
/// assert_eq!(
///     output_path_for(Path::new("reports/q3.docx")),
///     Path::new("reports/q3_professional.docx")
/// );
/// ```
pub fn output_path_for(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let split = name
        .len()
        .checked_sub(5)
        .and_then(|i| name.get(i..).map(|ext| (i, ext)));
    let stem = match split {
        Some((i, ext)) if ext.eq_ignore_ascii_case(".docx") => &name[..i],
        _ => name.as_str(),
    };

    let mut file_name = OsString::from(stem);
    file_name.push(OUTPUT_SUFFIX);
    input.with_file_name(file_name)
}
