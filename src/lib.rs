//! # docpolish
//!
//! Grammar-correct a Word document, give it a consistent look, and attach
//! the result to a Confluence page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! report.docx
//!  │
//!  ├─ 1. Load     parse the package with docx-rs
//!  ├─ 2. Correct  each non-empty paragraph through a grammar engine
//!  ├─ 3. Save     report_professional.docx (atomic write)
//!  ├─ 4. Format   headings blue + bold, titles centered, tables gridded
//!  └─ 5. Upload   multipart POST to the page's attachments (non-fatal)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docpolish::{polish, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // CONFLUENCE_BASE_URL / CONFLUENCE_API_TOKEN / CONFLUENCE_PAGE_ID
//!     let config = PipelineConfig::builder()
//!         .title("Release notes")
//!         .confluence_from_env()
//!         .build()?;
//!     let report = polish("report.docx", &config).await?;
//!     eprintln!(
//!         "{} paragraphs corrected, saved to {}",
//!         report.correction.corrected,
//!         report.output_path.display()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docpolish` binary (clap + anyhow + tracing-subscriber + dotenvy) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docpolish = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod grammar;
pub mod output;
pub mod pipeline;
pub mod polish;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConfluenceConfig, CorrectionErrorPolicy, PipelineConfig, PipelineConfigBuilder};
pub use document::{Document, NodeLocation, ParagraphExt, TableExt};
pub use error::{GrammarError, PolishError, UploadError};
pub use grammar::{apply_matches, GrammarChecker, GrammarMatch, LanguageToolChecker};
pub use output::{
    CorrectionStats, FormatStats, PolishReport, StageTimings, UploadOutcome, UploadReceipt,
};
pub use pipeline::format::{format_document, format_file};
pub use pipeline::upload::upload_attachment;
pub use polish::{polish, polish_sync};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback, Stage};
