//! Corrector: run every text-bearing paragraph through the grammar engine.
//!
//! Paragraphs are visited in [`Document::text_locations`] order (body first,
//! then table cells) and sent to the engine one at a time. A paragraph whose
//! text is blank is never sent and never touched.
//!
//! When the engine returns different text the paragraph's content is
//! replaced as a whole (see [`ParagraphExt::set_text`]), which drops any
//! run-level bold/color on that paragraph.

use crate::config::{CorrectionErrorPolicy, PipelineConfig};
use crate::document::{Document, ParagraphExt};
use crate::error::PolishError;
use crate::grammar::GrammarChecker;
use crate::output::CorrectionStats;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Correct every non-empty paragraph of `doc` in place.
///
/// # Errors
/// Under [`CorrectionErrorPolicy::Halt`] the first engine failure is returned
/// as [`PolishError::Correction`] naming the paragraph; paragraphs corrected
/// before it keep their new text.
pub async fn correct_document(
    doc: &mut Document,
    checker: &Arc<dyn GrammarChecker>,
    config: &PipelineConfig,
) -> Result<CorrectionStats, PolishError> {
    let locations = doc.text_locations();
    let mut stats = CorrectionStats::default();

    if let Some(ref cb) = config.progress_callback {
        cb.on_correction_start(locations.len());
    }

    for location in &locations {
        let original = match doc.paragraph(location) {
            Some(p) => p.text(),
            None => continue,
        };

        if original.trim().is_empty() {
            stats.skipped_empty += 1;
            continue;
        }

        stats.checked += 1;
        let corrected = match checker.correct(&original).await {
            Ok(text) => text,
            Err(e) => {
                let detail = e.to_string();
                match config.on_correction_error {
                    CorrectionErrorPolicy::Halt => {
                        return Err(PolishError::Correction {
                            location: *location,
                            detail,
                        });
                    }
                    CorrectionErrorPolicy::Skip => {
                        warn!("{}: grammar check failed, left unchanged: {}", location, detail);
                        if let Some(ref cb) = config.progress_callback {
                            cb.on_paragraph_error(location, &detail);
                        }
                        stats.failed.push(*location);
                        continue;
                    }
                }
            }
        };

        let changed = corrected != original;
        if changed {
            if let Some(p) = doc.paragraph_mut(location) {
                p.set_text(&corrected);
            }
            stats.corrected += 1;
            debug!("{}: corrected", location);
        }

        if let Some(ref cb) = config.progress_callback {
            cb.on_paragraph_checked(location, changed);
        }
    }

    info!(
        "Grammar pass with '{}': {} checked, {} corrected, {} failed",
        checker.name(),
        stats.checked,
        stats.corrected,
        stats.failed.len()
    );
    Ok(stats)
}

/// Build the engine the config asks for.
pub fn resolve_checker(config: &PipelineConfig) -> Result<Arc<dyn GrammarChecker>, PolishError> {
    if let Some(ref checker) = config.checker {
        return Ok(Arc::clone(checker));
    }

    let timeout = config.request_timeout_secs.map(std::time::Duration::from_secs);
    let checker = crate::grammar::LanguageToolChecker::new(
        config.languagetool_url.clone(),
        config.language.clone(),
        timeout,
    )
    .map_err(|e| PolishError::InvalidConfig(e.to_string()))?;
    Ok(Arc::new(checker))
}
