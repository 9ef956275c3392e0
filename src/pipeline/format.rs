//! Formatter: apply the house style to headings, titles and tables.
//!
//! Paragraphs are matched on their style's display name, not its id, so
//! documents saved by a localized Word are handled too.
//!
//! Rules, applied in one pass over the document:
//! - `Heading*` paragraphs: the first run becomes dark blue (`#003399`) and
//!   bold. A heading with no runs gets an empty one so the style has a carrier.
//! - `Title` paragraphs: centered.
//! - Tables: grid style with single borders, every run in every cell black.
//!
//! Each rule sets absolute values, so formatting an already formatted
//! document changes nothing.

use crate::document::{Document, ParagraphExt, TableExt};
use crate::error::PolishError;
use crate::output::FormatStats;
use crate::pipeline::load::{load_document, save_document};
use docx_rs::Run;
use std::path::Path;
use tracing::info;

/// Heading accent color, `RRGGBB`.
pub const HEADING_COLOR: &str = "003399";
/// Table cell text color, `RRGGBB`.
pub const CELL_TEXT_COLOR: &str = "000000";

const HEADING_PREFIX: &str = "Heading";
const TITLE_STYLE: &str = "Title";

/// Format `doc` in place.
pub fn format_document(doc: &mut Document) -> FormatStats {
    let mut stats = FormatStats::default();

    let style_names: Vec<String> = doc
        .paragraphs()
        .map(|p| doc.style_name(p.style_id()))
        .collect();

    for (paragraph, style) in doc.paragraphs_mut().zip(style_names) {
        let is_heading = style.starts_with(HEADING_PREFIX);
        let is_title = style == TITLE_STYLE;
        if is_heading {
            paragraph.ensure_run();
            if let Some(run) = paragraph.first_run_mut() {
                restyle(run, |r| r.color(HEADING_COLOR).bold());
            }
            stats.headings += 1;
        } else if is_title {
            paragraph.center();
            stats.titles += 1;
        }
    }

    for table in doc.tables_mut() {
        table.apply_grid_style();
        for paragraph in table.cell_paragraphs_mut() {
            paragraph.for_each_run_mut(&mut |run| {
                restyle(run, |r| r.color(CELL_TEXT_COLOR));
                stats.table_runs += 1;
            });
        }
        stats.tables += 1;
    }

    stats
}

/// Load `input`, format it, and save the result to `output`.
///
/// `input` and `output` may be the same path.
pub async fn format_file(input: &Path, output: &Path) -> Result<FormatStats, PolishError> {
    let mut doc = load_document(input).await?;
    let stats = format_document(&mut doc);
    save_document(doc, output).await?;

    info!(
        "Formatted {}: {} headings, {} titles, {} tables ({} cell runs)",
        output.display(),
        stats.headings,
        stats.titles,
        stats.tables,
        stats.table_runs
    );
    Ok(stats)
}

/// Run a `docx-rs` builder method on a run held by reference.
fn restyle(run: &mut Run, f: impl FnOnce(Run) -> Run) {
    let taken = std::mem::replace(run, Run::new());
    *run = f(taken);
}
