//! Top-level entry points: run the whole pipeline on one document.

use crate::config::PipelineConfig;
use crate::error::PolishError;
use crate::output::{CorrectionStats, PolishReport, StageTimings, UploadOutcome};
use crate::pipeline::{correct, format, input, load, upload};
use crate::progress::Stage;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Correct, format and upload the document at `input_path`.
///
/// The processed document is written next to the input (see
/// [`input::output_path_for`]) unless [`PipelineConfig::output_path`] is set.
///
/// # Returns
/// `Ok(PolishReport)` once the local file is written, even when the upload
/// failed (check [`PolishReport::upload`]).
///
/// # Errors
/// Returns `Err(PolishError)` only for fatal local errors:
/// - input missing, unreadable, or not a `.docx`
/// - grammar engine failure under [`crate::CorrectionErrorPolicy::Halt`]
/// - output not writable
pub async fn polish(
    input_path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<PolishReport, PolishError> {
    let total_start = Instant::now();
    let input_path = input_path.as_ref();
    let cb = config.progress_callback.as_ref();
    let mut timings = StageTimings::default();
    info!("Polishing {}", input_path.display());

    // ── Step 1: Load ─────────────────────────────────────────────────────
    if let Some(cb) = cb {
        cb.on_stage_start(Stage::Load);
    }
    let start = Instant::now();
    let mut doc = load::load_document(input_path).await?;
    timings.load_ms = elapsed_ms(start);
    if let Some(cb) = cb {
        cb.on_stage_complete(Stage::Load);
    }

    let output_path = config
        .output_path
        .clone()
        .unwrap_or_else(|| input::output_path_for(input_path));

    // ── Step 2: Correct ──────────────────────────────────────────────────
    let correction = if config.correct {
        let checker = correct::resolve_checker(config)?;
        if let Some(cb) = cb {
            cb.on_stage_start(Stage::Correct);
        }
        let start = Instant::now();
        let stats = correct::correct_document(&mut doc, &checker, config).await?;
        timings.correct_ms = elapsed_ms(start);
        if let Some(cb) = cb {
            cb.on_stage_complete(Stage::Correct);
        }
        stats
    } else {
        CorrectionStats::default()
    };

    // ── Step 3: Save corrected document ──────────────────────────────────
    load::save_document(doc, &output_path).await?;

    // ── Step 4: Format the saved file in place ───────────────────────────
    if let Some(cb) = cb {
        cb.on_stage_start(Stage::Format);
    }
    let start = Instant::now();
    let formatting = format::format_file(&output_path, &output_path).await?;
    timings.format_ms = elapsed_ms(start);
    if let Some(cb) = cb {
        cb.on_stage_complete(Stage::Format);
        cb.on_document_saved(&output_path);
    }
    info!("Document processed and saved as {}", output_path.display());

    // ── Step 5: Upload ───────────────────────────────────────────────────
    let upload = if config.upload {
        if let Some(cb) = cb {
            cb.on_stage_start(Stage::Upload);
        }
        let start = Instant::now();
        let outcome = upload_outcome(&output_path, config).await;
        timings.upload_ms = elapsed_ms(start);
        if let Some(cb) = cb {
            cb.on_upload_result(&outcome);
            cb.on_stage_complete(Stage::Upload);
        }
        outcome
    } else {
        UploadOutcome::Skipped
    };

    timings.total_ms = elapsed_ms(total_start);
    Ok(PolishReport {
        input_path: input_path.to_path_buf(),
        output_path,
        correction,
        formatting,
        upload,
        timings,
    })
}

/// Synchronous wrapper around [`polish`].
///
/// Creates a new tokio runtime internally. Do not call from within an
/// existing async context; use [`polish`] instead.
pub fn polish_sync(
    input_path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<PolishReport, PolishError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PolishError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(polish(input_path, config))
}

async fn upload_outcome(output_path: &Path, config: &PipelineConfig) -> UploadOutcome {
    let settings = match config.confluence_settings() {
        Ok(s) => s,
        Err(e) => {
            warn!("Skipping upload: {}", e);
            return UploadOutcome::Failed(e);
        }
    };
    let timeout = config.request_timeout_secs.map(Duration::from_secs);
    match upload::upload_attachment(output_path, &config.title, settings, timeout).await {
        Ok(receipt) => UploadOutcome::Uploaded(receipt),
        Err(e) => {
            warn!("{}", e);
            UploadOutcome::Failed(e)
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
