//! Pipeline stages for polishing a `.docx` document.
//!
//! Each submodule implements one step. Stages share the in-memory
//! [`crate::document::Document`] by `&mut` and never run concurrently.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ load ──▶ correct ──▶ save ──▶ format ──▶ upload
//! (path)   (docx-rs) (grammar)  (disk)   (reload)   (Confluence)
//! ```
//!
//! 1. [`input`]   validate the path and derive the output name
//! 2. [`load`]    parse the package; also the atomic saver
//! 3. [`correct`] send each non-empty paragraph to the grammar engine
//! 4. [`format`]  reopen the saved file, restyle headings/titles/tables,
//!    write it back
//! 5. [`upload`]  attach the result to a Confluence page; the only stage
//!    whose failure is not fatal

pub mod correct;
pub mod format;
pub mod input;
pub mod load;
pub mod upload;
