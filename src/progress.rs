//! Progress-callback trait for pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves from stage to stage and as each paragraph
//! passes through the grammar engine. The CLI uses it to print the familiar
//! "Loading document..." lines and drive a spinner.
//!
//! # Example
//!
//! ```rust
//! use docpolish::{NodeLocation, PipelineConfig, PipelineProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     changed: AtomicUsize,
//! }
//!
//! impl PipelineProgressCallback for CountingCallback {
//!     fn on_paragraph_checked(&self, _location: &NodeLocation, changed: bool) {
//!         if changed {
//!             self.changed.fetch_add(1, Ordering::SeqCst);
//!         }
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { changed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::document::NodeLocation;
use crate::output::UploadOutcome;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// The pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Load,
    Correct,
    Format,
    Upload,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Load => "load",
            Stage::Correct => "correct",
            Stage::Format => "format",
            Stage::Upload => "upload",
        };
        f.write_str(s)
    }
}

/// Called by the pipeline as it runs.
///
/// Implementations must be `Send + Sync` so a config can cross threads.
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called before a stage starts.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called once the corrector knows how many paragraphs it will visit.
    ///
    /// # Arguments
    /// * `total` — number of paragraphs, empty ones included
    fn on_correction_start(&self, total: usize) {
        let _ = total;
    }

    /// Called after a non-empty paragraph went through the grammar engine.
    ///
    /// # Arguments
    /// * `location` — which paragraph
    /// * `changed`  — whether its text was replaced
    fn on_paragraph_checked(&self, location: &NodeLocation, changed: bool) {
        let _ = (location, changed);
    }

    /// Called when the grammar engine failed on a paragraph and the pipeline
    /// continues under the `Skip` policy.
    fn on_paragraph_error(&self, location: &NodeLocation, error: &str) {
        let _ = (location, error);
    }

    /// Called after a stage finished without a fatal error.
    fn on_stage_complete(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when the processed document has been written.
    fn on_document_saved(&self, path: &Path) {
        let _ = path;
    }

    /// Called with the result of the upload stage.
    fn on_upload_result(&self, outcome: &UploadOutcome) {
        let _ = outcome;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;
