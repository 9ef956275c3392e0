//! Result types returned by the pipeline.

use crate::document::NodeLocation;
use crate::error::UploadError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Summary of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolishReport {
    /// The document that was read.
    pub input_path: PathBuf,
    /// The processed document that was written (and uploaded).
    pub output_path: PathBuf,
    pub correction: CorrectionStats,
    pub formatting: FormatStats,
    pub upload: UploadOutcome,
    pub timings: StageTimings,
}

impl PolishReport {
    /// True when the document reached Confluence.
    pub fn uploaded(&self) -> bool {
        matches!(self.upload, UploadOutcome::Uploaded(_))
    }
}

/// What the corrector did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionStats {
    /// Paragraphs sent to the grammar engine.
    pub checked: usize,
    /// Paragraphs whose text was replaced.
    pub corrected: usize,
    /// Paragraphs left alone because their text was blank.
    pub skipped_empty: usize,
    /// Paragraphs the engine failed on (only non-empty under the `Skip` policy).
    pub failed: Vec<NodeLocation>,
}

/// What the formatter touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatStats {
    /// Heading paragraphs whose first run was styled.
    pub headings: usize,
    /// Title paragraphs centered.
    pub titles: usize,
    /// Tables given the grid style.
    pub tables: usize,
    /// Runs inside table cells set to black.
    pub table_runs: usize,
}

/// Result of the upload stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum UploadOutcome {
    /// Confluence accepted the attachment.
    Uploaded(UploadReceipt),
    /// The upload did not succeed; local output is kept.
    Failed(UploadError),
    /// Uploading was disabled for this run.
    Skipped,
}

/// Successful upload response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// 200 or 201.
    pub status: u16,
    /// Response body as returned by Confluence.
    pub body: String,
}

/// Wall-clock time spent per stage, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTimings {
    pub load_ms: u64,
    pub correct_ms: u64,
    pub format_ms: u64,
    pub upload_ms: u64,
    pub total_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_outcome_serialises_with_status_tag() {
        let failed = UploadOutcome::Failed(UploadError::Rejected {
            status: 403,
            body: "nope".into(),
        });
        let json = serde_json::to_string(&failed).unwrap();
        assert!(json.contains("\"status\":\"failed\""), "got: {json}");
        assert!(json.contains("403"), "got: {json}");

        let skipped = serde_json::to_string(&UploadOutcome::Skipped).unwrap();
        assert!(skipped.contains("skipped"), "got: {skipped}");
    }
}
