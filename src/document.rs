//! In-memory document model shared by every pipeline stage.
//!
//! [`Document`] owns a parsed `docx-rs` tree. Stages receive it by `&mut`
//! and change text and style attributes of existing nodes in place; body
//! nodes the pipeline does not understand (bookmarks, content controls,
//! tables of contents) are carried through to the saved file unchanged.
//!
//! ## Addressing
//!
//! Paragraphs are addressed by [`NodeLocation`]: either the n-th paragraph
//! of the body, or a paragraph inside a table cell. The corrector walks
//! locations in [`Document::text_locations`] order, which is the order the
//! progress reporter and error messages use.

use docx_rs::{
    AlignmentType, BreakType, DocumentChild, Docx, Paragraph, ParagraphChild, Run, RunChild,
    Table, TableBorders, TableCell, TableCellContent, TableChild, TableRowChild,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;

/// Style id reported for paragraphs that carry no explicit style.
pub const DEFAULT_STYLE: &str = "Normal";

/// Position of one paragraph within a [`Document`]. All indices are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeLocation {
    /// The n-th paragraph of the document body (tables not counted).
    Body { paragraph: usize },
    /// A paragraph inside a table cell; `table` counts body tables only.
    TableCell {
        table: usize,
        row: usize,
        cell: usize,
        paragraph: usize,
    },
}

impl fmt::Display for NodeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeLocation::Body { paragraph } => write!(f, "body paragraph {}", paragraph + 1),
            NodeLocation::TableCell {
                table,
                row,
                cell,
                paragraph,
            } => write!(
                f,
                "table {}, row {}, cell {}, paragraph {}",
                table + 1,
                row + 1,
                cell + 1,
                paragraph + 1
            ),
        }
    }
}

/// Kind of a top-level body node, used to compare document shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Table,
    Other,
}

/// A parsed word-processing document.
#[derive(Debug)]
pub struct Document {
    docx: Docx,
}

impl Default for Document {
    fn default() -> Self {
        Self::from_docx(Docx::new())
    }
}

impl Document {
    /// Wrap an existing `docx-rs` tree.
    pub fn from_docx(docx: Docx) -> Self {
        Self { docx }
    }

    /// Parse a `.docx` package from memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, docx_rs::ReaderError> {
        docx_rs::read_docx(bytes).map(Self::from_docx)
    }

    /// Serialise into a `.docx` package, consuming the document.
    pub fn into_bytes(self) -> Result<Vec<u8>, String> {
        let mut buf = Cursor::new(Vec::new());
        self.docx
            .build()
            .pack(&mut buf)
            .map_err(|e| e.to_string())?;
        Ok(buf.into_inner())
    }

    pub fn as_docx(&self) -> &Docx {
        &self.docx
    }

    pub fn into_docx(self) -> Docx {
        self.docx
    }

    /// Body paragraphs in document order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> + '_ {
        self.docx.document.children.iter().filter_map(body_paragraph)
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> + '_ {
        self.docx
            .document
            .children
            .iter_mut()
            .filter_map(body_paragraph_mut)
    }

    /// Body tables in document order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> + '_ {
        self.docx.document.children.iter().filter_map(body_table)
    }

    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> + '_ {
        self.docx
            .document
            .children
            .iter_mut()
            .filter_map(body_table_mut)
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    pub fn table_count(&self) -> usize {
        self.tables().count()
    }

    /// Kinds of the top-level body nodes, in order.
    pub fn block_kinds(&self) -> Vec<BlockKind> {
        self.docx
            .document
            .children
            .iter()
            .map(|child| match child {
                DocumentChild::Paragraph(_) => BlockKind::Paragraph,
                DocumentChild::Table(_) => BlockKind::Table,
                _ => BlockKind::Other,
            })
            .collect()
    }

    /// Display name of the style `style_id` (`Heading 1`, `Title`, …).
    ///
    /// Word writes localized ids (`berschrift1`, `Titel`) but keeps the
    /// English built-in name, so rules should match on this. Falls back to
    /// the id when the document does not define the style.
    pub fn style_name(&self, style_id: &str) -> String {
        self.docx
            .styles
            .styles
            .iter()
            .find(|s| s.style_id == style_id)
            .and_then(|s| serde_json::to_value(&s.name).ok())
            .and_then(|v| v.as_str().filter(|n| !n.is_empty()).map(normalize_style_name))
            .unwrap_or_else(|| style_id.to_string())
    }

    /// Every text-bearing paragraph location: body paragraphs first, then
    /// table → row → cell → paragraph.
    pub fn text_locations(&self) -> Vec<NodeLocation> {
        let mut locations: Vec<NodeLocation> = (0..self.paragraph_count())
            .map(|paragraph| NodeLocation::Body { paragraph })
            .collect();

        for (t, table) in self.tables().enumerate() {
            for (r, row) in table.rows.iter().enumerate() {
                let TableChild::TableRow(row) = row;
                for (c, cell) in row.cells.iter().enumerate() {
                    let TableRowChild::TableCell(cell) = cell;
                    let count = cell.children.iter().filter_map(cell_paragraph).count();
                    locations.extend((0..count).map(|p| NodeLocation::TableCell {
                        table: t,
                        row: r,
                        cell: c,
                        paragraph: p,
                    }));
                }
            }
        }

        locations
    }

    pub fn paragraph(&self, location: &NodeLocation) -> Option<&Paragraph> {
        match *location {
            NodeLocation::Body { paragraph } => self.paragraphs().nth(paragraph),
            NodeLocation::TableCell {
                table,
                row,
                cell,
                paragraph,
            } => {
                let table = self.tables().nth(table)?;
                let TableChild::TableRow(tr) = table.rows.get(row)?;
                let TableRowChild::TableCell(tc) = tr.cells.get(cell)?;
                tc.children.iter().filter_map(cell_paragraph).nth(paragraph)
            }
        }
    }

    pub fn paragraph_mut(&mut self, location: &NodeLocation) -> Option<&mut Paragraph> {
        match *location {
            NodeLocation::Body { paragraph } => self.paragraphs_mut().nth(paragraph),
            NodeLocation::TableCell {
                table,
                row,
                cell,
                paragraph,
            } => {
                let table = self.tables_mut().nth(table)?;
                let TableChild::TableRow(tr) = table.rows.get_mut(row)?;
                let TableRowChild::TableCell(tc) = tr.cells.get_mut(cell)?;
                tc.children
                    .iter_mut()
                    .filter_map(cell_paragraph_mut)
                    .nth(paragraph)
            }
        }
    }
}

/// Capitalise the built-in names Word stores in lower case
/// (`heading 1` → `Heading 1`); other names pass through.
fn normalize_style_name(name: &str) -> String {
    let builtin = matches!(name, "caption" | "footer" | "header" | "title")
        || name
            .strip_prefix("heading ")
            .is_some_and(|n| n.len() == 1 && matches!(n.as_bytes()[0], b'1'..=b'9'));
    if !builtin {
        return name.to_string();
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ── Paragraph helpers ────────────────────────────────────────────────────

/// Read and write access to the parts of a paragraph the pipeline uses.
pub trait ParagraphExt {
    /// Style id (`Heading1`, `Title`, …) or [`DEFAULT_STYLE`].
    fn style_id(&self) -> &str;

    /// Concatenated run text. Tabs read as `\t`, breaks as `\n`; runs inside
    /// hyperlinks are included.
    fn text(&self) -> String;

    /// Number of direct runs (hyperlink runs are not counted).
    fn run_count(&self) -> usize;

    fn first_run_mut(&mut self) -> Option<&mut Run>;

    /// Append an empty run when the paragraph has none.
    fn ensure_run(&mut self);

    /// Apply `f` to every direct run.
    fn for_each_run_mut(&mut self, f: &mut dyn FnMut(&mut Run));

    /// Replace the whole paragraph content with a single unstyled run.
    fn set_text(&mut self, text: &str);

    fn center(&mut self);

    fn is_centered(&self) -> bool;
}

impl ParagraphExt for Paragraph {
    fn style_id(&self) -> &str {
        self.property
            .style
            .as_ref()
            .map(|s| s.val.as_str())
            .unwrap_or(DEFAULT_STYLE)
    }

    fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    fn run_count(&self) -> usize {
        self.children
            .iter()
            .filter(|c| matches!(c, ParagraphChild::Run(_)))
            .count()
    }

    fn first_run_mut(&mut self) -> Option<&mut Run> {
        self.children.iter_mut().find_map(|child| match child {
            ParagraphChild::Run(run) => {
                let run: &mut Run = run;
                Some(run)
            }
            _ => None,
        })
    }

    fn ensure_run(&mut self) {
        if self.run_count() == 0 {
            let taken = std::mem::replace(self, Paragraph::new());
            *self = taken.add_run(Run::new());
        }
    }

    fn for_each_run_mut(&mut self, f: &mut dyn FnMut(&mut Run)) {
        for child in self.children.iter_mut() {
            if let ParagraphChild::Run(run) = child {
                let run: &mut Run = run;
                f(run);
            }
        }
    }

    fn set_text(&mut self, text: &str) {
        // TODO: replace text run by run so bold/color survive; corrections
        // spanning a run boundary would then have to be split across runs.
        self.children.clear();
        let taken = std::mem::replace(self, Paragraph::new());
        *self = taken.add_run(text_run(text));
    }

    fn center(&mut self) {
        let taken = std::mem::replace(self, Paragraph::new());
        *self = taken.align(AlignmentType::Center);
    }

    fn is_centered(&self) -> bool {
        let centered = Paragraph::new().align(AlignmentType::Center).property.alignment;
        self.property.alignment.is_some() && self.property.alignment == centered
    }
}

/// Text of a single run, with the same tab/break mapping as [`ParagraphExt::text`].
pub fn run_text(run: &Run) -> String {
    let mut out = String::new();
    push_run_text(run, &mut out);
    out
}

fn collect_text(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run_text(run, out),
            ParagraphChild::Hyperlink(link) => collect_text(&link.children, out),
            _ => {}
        }
    }
}

fn push_run_text(run: &Run, out: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}

/// Build a run from plain text, turning `\t` and `\n` into tab and break
/// elements.
fn text_run(text: &str) -> Run {
    let mut run = Run::new();
    let mut pending = String::new();
    for ch in text.chars() {
        match ch {
            '\t' => run = flush_text(run, &mut pending).add_tab(),
            '\n' => run = flush_text(run, &mut pending).add_break(BreakType::TextWrapping),
            c => pending.push(c),
        }
    }
    flush_text(run, &mut pending)
}

fn flush_text(run: Run, pending: &mut String) -> Run {
    if pending.is_empty() {
        return run;
    }
    let run = run.add_text(pending.as_str());
    pending.clear();
    run
}

// ── Table helpers ────────────────────────────────────────────────────────

/// Style id of Word's built-in bordered grid table style.
pub const GRID_TABLE_STYLE: &str = "TableGrid";

pub trait TableExt {
    /// Cells per row, top to bottom.
    fn shape(&self) -> Vec<usize>;

    /// Every paragraph of every cell, row-major.
    fn cell_paragraphs_mut(&mut self) -> Vec<&mut Paragraph>;

    /// Set the grid table style and single-line borders on every edge.
    fn apply_grid_style(&mut self);
}

impl TableExt for Table {
    fn shape(&self) -> Vec<usize> {
        self.rows
            .iter()
            .map(|row| {
                let TableChild::TableRow(row) = row;
                row.cells.len()
            })
            .collect()
    }

    fn cell_paragraphs_mut(&mut self) -> Vec<&mut Paragraph> {
        let mut out = Vec::new();
        for row in self.rows.iter_mut() {
            let TableChild::TableRow(row) = row;
            for cell in row.cells.iter_mut() {
                let TableRowChild::TableCell(cell) = cell;
                out.extend(cell_paragraphs_mut(cell));
            }
        }
        out
    }

    fn apply_grid_style(&mut self) {
        let taken = std::mem::replace(self, Table::new(vec![]));
        *self = taken
            .style(GRID_TABLE_STYLE)
            .set_borders(TableBorders::new());
    }
}

fn cell_paragraphs_mut(cell: &mut TableCell) -> impl Iterator<Item = &mut Paragraph> + '_ {
    cell.children.iter_mut().filter_map(cell_paragraph_mut)
}

// ── Child projections ────────────────────────────────────────────────────

fn body_paragraph(child: &DocumentChild) -> Option<&Paragraph> {
    match child {
        DocumentChild::Paragraph(p) => {
            let p: &Paragraph = p;
            Some(p)
        }
        _ => None,
    }
}

fn body_paragraph_mut(child: &mut DocumentChild) -> Option<&mut Paragraph> {
    match child {
        DocumentChild::Paragraph(p) => {
            let p: &mut Paragraph = p;
            Some(p)
        }
        _ => None,
    }
}

fn body_table(child: &DocumentChild) -> Option<&Table> {
    match child {
        DocumentChild::Table(t) => {
            let t: &Table = t;
            Some(t)
        }
        _ => None,
    }
}

fn body_table_mut(child: &mut DocumentChild) -> Option<&mut Table> {
    match child {
        DocumentChild::Table(t) => {
            let t: &mut Table = t;
            Some(t)
        }
        _ => None,
    }
}

fn cell_paragraph(content: &TableCellContent) -> Option<&Paragraph> {
    match content {
        TableCellContent::Paragraph(p) => {
            let p: &Paragraph = p;
            Some(p)
        }
        _ => None,
    }
}

fn cell_paragraph_mut(content: &mut TableCellContent) -> Option<&mut Paragraph> {
    match content {
        TableCellContent::Paragraph(p) => {
            let p: &mut Paragraph = p;
            Some(p)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Style, StyleType, TableRow};

    fn sample() -> Document {
        let docx = Docx::new()
            .add_paragraph(
                Paragraph::new()
                    .style("Heading1")
                    .add_run(Run::new().add_text("intro ").bold())
                    .add_run(Run::new().add_text("section")),
            )
            .add_table(Table::new(vec![
                TableRow::new(vec![
                    TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text("a"))),
                    TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text("b"))),
                ]),
                TableRow::new(vec![
                    TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text("c"))),
                    TableCell::new()
                        .add_paragraph(Paragraph::new().add_run(Run::new().add_text("d")))
                        .add_paragraph(Paragraph::new().add_run(Run::new().add_text("e"))),
                ]),
            ]))
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("closing")));
        Document::from_docx(docx)
    }

    #[test]
    fn locations_visit_body_then_tables() {
        let doc = sample();
        let locations = doc.text_locations();
        assert_eq!(locations.len(), 2 + 5);
        assert_eq!(locations[0], NodeLocation::Body { paragraph: 0 });
        assert_eq!(locations[1], NodeLocation::Body { paragraph: 1 });
        assert_eq!(
            locations[2],
            NodeLocation::TableCell {
                table: 0,
                row: 0,
                cell: 0,
                paragraph: 0
            }
        );
        assert_eq!(
            locations[6],
            NodeLocation::TableCell {
                table: 0,
                row: 1,
                cell: 1,
                paragraph: 1
            }
        );
    }

    #[test]
    fn paragraph_lookup_by_location() {
        let doc = sample();
        let body = doc.paragraph(&NodeLocation::Body { paragraph: 1 }).unwrap();
        assert_eq!(body.text(), "closing");

        let cell = doc
            .paragraph(&NodeLocation::TableCell {
                table: 0,
                row: 1,
                cell: 1,
                paragraph: 1,
            })
            .unwrap();
        assert_eq!(cell.text(), "e");

        assert!(doc
            .paragraph(&NodeLocation::TableCell {
                table: 3,
                row: 0,
                cell: 0,
                paragraph: 0
            })
            .is_none());
    }

    #[test]
    fn text_concatenates_runs() {
        let p = Paragraph::new()
            .add_run(Run::new().add_text("see"))
            .add_run(Run::new().add_tab().add_text("the"))
            .add_run(Run::new().add_text(" docs"));
        assert_eq!(p.text(), "see\tthe docs");
        assert_eq!(p.run_count(), 3);
    }

    #[test]
    fn style_id_defaults_to_normal() {
        let plain = Paragraph::new();
        assert_eq!(plain.style_id(), DEFAULT_STYLE);
        let title = Paragraph::new().style("Title");
        assert_eq!(title.style_id(), "Title");
    }

    #[test]
    fn set_text_collapses_runs() {
        let mut doc = sample();
        let loc = NodeLocation::Body { paragraph: 0 };
        let p = doc.paragraph_mut(&loc).unwrap();
        p.set_text("Intro section");
        assert_eq!(p.run_count(), 1);
        assert_eq!(p.text(), "Intro section");
        assert_eq!(p.style_id(), "Heading1");
        // the bold of the first original run is gone
        let first = p.first_run_mut().unwrap();
        assert_eq!(first.run_property.bold, None);
    }

    #[test]
    fn set_text_keeps_tabs_and_breaks() {
        let mut p = Paragraph::new();
        p.set_text("a\tb\nc");
        assert_eq!(p.text(), "a\tb\nc");
    }

    #[test]
    fn ensure_run_only_adds_when_empty() {
        let mut p = Paragraph::new();
        p.ensure_run();
        p.ensure_run();
        assert_eq!(p.run_count(), 1);
        assert_eq!(p.text(), "");
    }

    #[test]
    fn center_is_observable() {
        let mut p = Paragraph::new().style("Title");
        assert!(!p.is_centered());
        p.center();
        assert!(p.is_centered());
        assert_eq!(p.style_id(), "Title");
    }

    #[test]
    fn table_shape_and_cell_paragraphs() {
        let mut doc = sample();
        let table = doc.tables_mut().next().unwrap();
        assert_eq!(table.shape(), vec![2, 2]);
        assert_eq!(table.cell_paragraphs_mut().len(), 5);
    }

    #[test]
    fn block_kinds_keep_order() {
        let doc = sample();
        assert_eq!(
            doc.block_kinds(),
            vec![BlockKind::Paragraph, BlockKind::Table, BlockKind::Paragraph]
        );
    }

    #[test]
    fn style_name_follows_style_definitions() {
        let doc = Document::from_docx(
            Docx::new()
                .add_style(Style::new("berschrift1", StyleType::Paragraph).name("heading 1"))
                .add_style(Style::new("Titel", StyleType::Paragraph).name("Title"))
                .add_style(Style::new("Notiz", StyleType::Paragraph).name("heading notes")),
        );
        assert_eq!(doc.style_name("berschrift1"), "Heading 1");
        assert_eq!(doc.style_name("Titel"), "Title");
        assert_eq!(doc.style_name("Notiz"), "heading notes");
        // undefined styles fall back to the id
        assert_eq!(doc.style_name("Heading2"), "Heading2");
    }

    #[test]
    fn location_display_is_one_based() {
        let loc = NodeLocation::Body { paragraph: 0 };
        assert_eq!(loc.to_string(), "body paragraph 1");
    }
}
