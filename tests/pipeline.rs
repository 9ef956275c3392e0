//! End-to-end tests for the docpolish pipeline.
//!
//! Documents are built with docx-rs, the grammar engine is a fake, and
//! Confluence is an axum server on a random local port that records what it
//! receives. No external services are needed.

use async_trait::async_trait;
use axum::extract::{Multipart, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use docpolish::pipeline::load::{load_document, save_document};
use docpolish::pipeline::upload::DOCX_MIME;
use docpolish::{
    polish, ConfluenceConfig, CorrectionErrorPolicy, Document, GrammarChecker, GrammarError,
    GrammarMatch, NodeLocation, ParagraphExt, PipelineConfig, PipelineProgressCallback,
    PolishError, Stage, TableExt, UploadError, UploadOutcome,
};
use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Fixes a fixed list of misspellings; fails on any text containing "BOOM".
struct FakeChecker;

const FIXES: &[(&str, &str)] = &[("Introductoin", "Introduction"), ("recieve", "receive")];

#[async_trait]
impl GrammarChecker for FakeChecker {
    fn name(&self) -> &str {
        "fake"
    }

    async fn check(&self, text: &str) -> Result<Vec<GrammarMatch>, GrammarError> {
        if text.contains("BOOM") {
            return Err(GrammarError::Unavailable {
                engine: "fake".into(),
                detail: "connection refused".into(),
            });
        }
        let mut matches = Vec::new();
        for (wrong, right) in FIXES {
            for (i, _) in text.match_indices(wrong) {
                matches.push(GrammarMatch::new(i, wrong.len(), *right));
            }
        }
        Ok(matches)
    }
}

fn cell(text: &str) -> TableCell {
    TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text(text).color("FF0000")))
}

fn report_docx(extra: Option<&str>) -> Document {
    let mut docx = Docx::new()
        .add_paragraph(
            Paragraph::new()
                .style("Title")
                .add_run(Run::new().add_text("Quarterly report")),
        )
        .add_paragraph(
            Paragraph::new()
                .style("Heading1")
                .add_run(Run::new().add_text("Introductoin")),
        )
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text("We recieve feedback.")))
        .add_paragraph(Paragraph::new())
        .add_table(Table::new(vec![
            TableRow::new(vec![cell("Name"), cell("Value")]),
            TableRow::new(vec![cell("alpha"), cell("1")]),
        ]));
    if let Some(text) = extra {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(text)));
    }
    Document::from_docx(docx)
}

async fn write_input(dir: &Path, doc: Document) -> PathBuf {
    let path = dir.join("report.docx");
    save_document(doc, &path).await.unwrap();
    path
}

fn base_config() -> docpolish::PipelineConfigBuilder {
    PipelineConfig::builder().checker(Arc::new(FakeChecker))
}

// ── Mock Confluence ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
struct Captured {
    page_id: String,
    authorization: Option<String>,
    atlassian_token: Option<String>,
    query: HashMap<String, String>,
    field_name: Option<String>,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone)]
struct MockState {
    captured: Arc<Mutex<Vec<Captured>>>,
    status: StatusCode,
}

async fn attach(
    State(state): State<MockState>,
    axum::extract::Path(page_id): axum::extract::Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> (StatusCode, String) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let mut captured = Captured {
        page_id,
        authorization: header("authorization"),
        atlassian_token: header("x-atlassian-token"),
        query,
        ..Default::default()
    };

    while let Some(field) = multipart.next_field().await.unwrap() {
        captured.field_name = field.name().map(str::to_string);
        captured.file_name = field.file_name().map(str::to_string);
        captured.content_type = field.content_type().map(str::to_string);
        captured.bytes = field.bytes().await.unwrap().to_vec();
    }

    state.captured.lock().unwrap().push(captured);
    let body = if state.status.is_success() {
        r#"{"results":[{"id":"att1"}]}"#.to_string()
    } else {
        "Forbidden".to_string()
    };
    (state.status, body)
}

/// Start a mock Confluence answering with `status`; returns its base URL.
async fn mock_confluence(status: StatusCode) -> (String, Arc<Mutex<Vec<Captured>>>) {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/rest/api/content/:page_id/child/attachment", post(attach))
        .with_state(MockState {
            captured: Arc::clone(&captured),
            status,
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), captured)
}

#[derive(Default)]
struct StageRecorder {
    events: Mutex<Vec<String>>,
}

impl PipelineProgressCallback for StageRecorder {
    fn on_stage_start(&self, stage: Stage) {
        self.events.lock().unwrap().push(format!("start {stage}"));
    }

    fn on_stage_complete(&self, stage: Stage) {
        self.events.lock().unwrap().push(format!("done {stage}"));
    }

    fn on_upload_result(&self, outcome: &UploadOutcome) {
        let tag = match outcome {
            UploadOutcome::Uploaded(_) => "uploaded",
            UploadOutcome::Failed(_) => "failed",
            UploadOutcome::Skipped => "skipped",
        };
        self.events.lock().unwrap().push(tag.to_string());
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_run_corrects_formats_and_uploads() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), report_docx(None)).await;
    let (base_url, captured) = mock_confluence(StatusCode::OK).await;
    let recorder = Arc::new(StageRecorder::default());

    let config = base_config()
        .confluence(ConfluenceConfig::new(base_url, "tok", "12345"))
        .progress_callback(Arc::clone(&recorder) as Arc<dyn PipelineProgressCallback>)
        .build()
        .unwrap();

    let report = polish(&input, &config).await.unwrap();

    // Output location and stats
    let expected_output = dir.path().join("report_professional.docx");
    assert_eq!(report.output_path, expected_output);
    assert!(expected_output.exists());
    assert_eq!(report.correction.corrected, 2);
    assert_eq!(report.correction.skipped_empty, 1);
    assert_eq!(report.formatting.headings, 1);
    assert_eq!(report.formatting.titles, 1);
    assert_eq!(report.formatting.tables, 1);
    assert!(report.uploaded());

    // Document content
    let mut doc = load_document(&expected_output).await.unwrap();
    let texts: Vec<String> = doc.paragraphs().map(|p| p.text()).collect();
    assert_eq!(
        texts,
        vec!["Quarterly report", "Introduction", "We receive feedback.", ""]
    );
    assert!(doc.paragraphs().next().unwrap().is_centered());
    let heading = doc.paragraph_mut(&NodeLocation::Body { paragraph: 1 }).unwrap();
    assert_eq!(heading.style_id(), "Heading1");
    let run = heading.first_run_mut().unwrap();
    assert_eq!(run.run_property.color, Run::new().color("003399").run_property.color);
    assert_eq!(run.run_property.bold, Run::new().bold().run_property.bold);
    let table = doc.tables().next().unwrap();
    assert_eq!(table.shape(), vec![2, 2]);
    assert!(serde_json::to_string(table).unwrap().contains("TableGrid"));

    // The input is untouched
    let original = load_document(&input).await.unwrap();
    assert_eq!(
        original.paragraphs().nth(1).unwrap().text(),
        "Introductoin"
    );

    // Exactly one well-formed request
    let requests = captured.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.page_id, "12345");
    assert_eq!(req.authorization.as_deref(), Some("Bearer tok"));
    assert_eq!(req.atlassian_token.as_deref(), Some("no-check"));
    assert_eq!(req.query.get("minorEdit").map(String::as_str), Some("true"));
    assert_eq!(
        req.query.get("comment").map(String::as_str),
        Some("Automated upload: Knowledge Article")
    );
    assert_eq!(req.field_name.as_deref(), Some("file"));
    assert_eq!(req.file_name.as_deref(), Some("report_professional.docx"));
    assert_eq!(req.content_type.as_deref(), Some(DOCX_MIME));
    assert_eq!(req.bytes, std::fs::read(&expected_output).unwrap());

    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec![
            "start load",
            "done load",
            "start correct",
            "done correct",
            "start format",
            "done format",
            "start upload",
            "uploaded",
            "done upload",
        ]
    );
}

#[tokio::test]
async fn rejected_upload_keeps_local_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), report_docx(None)).await;
    let (base_url, captured) = mock_confluence(StatusCode::FORBIDDEN).await;

    let config = base_config()
        .title("Release notes")
        .confluence(ConfluenceConfig::new(base_url, "tok", "7"))
        .build()
        .unwrap();

    let report = polish(&input, &config).await.unwrap();

    match &report.upload {
        UploadOutcome::Failed(e @ UploadError::Rejected { status: 403, .. }) => {
            assert!(e.to_string().contains("403"), "got: {e}");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(report.output_path.exists());
    let requests = captured.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].query.get("comment").map(String::as_str),
        Some("Automated upload: Release notes")
    );
}

#[tokio::test]
async fn missing_confluence_settings_still_write_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), report_docx(None)).await;

    let config = base_config().build().unwrap();
    let report = polish(&input, &config).await.unwrap();

    assert!(matches!(
        report.upload,
        UploadOutcome::Failed(UploadError::NotConfigured { .. })
    ));
    assert!(dir.path().join("report_professional.docx").exists());
}

#[tokio::test]
async fn disabled_upload_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), report_docx(None)).await;
    let output = dir.path().join("out/custom.docx");

    let config = base_config()
        .upload(false)
        .output_path(&output)
        .build()
        .unwrap();
    let report = polish(&input, &config).await.unwrap();

    assert!(matches!(report.upload, UploadOutcome::Skipped));
    assert_eq!(report.output_path, output);
    assert!(output.exists());
}

#[tokio::test]
async fn halted_correction_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), report_docx(Some("this will BOOM"))).await;

    let config = base_config().upload(false).build().unwrap();
    let err = polish(&input, &config).await.unwrap_err();

    match err {
        PolishError::Correction { location, .. } => {
            assert_eq!(location, NodeLocation::Body { paragraph: 4 });
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!dir.path().join("report_professional.docx").exists());
}

#[tokio::test]
async fn skipped_correction_errors_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), report_docx(Some("this will BOOM"))).await;

    let config = base_config()
        .upload(false)
        .on_correction_error(CorrectionErrorPolicy::Skip)
        .build()
        .unwrap();
    let report = polish(&input, &config).await.unwrap();

    assert_eq!(report.correction.failed, vec![NodeLocation::Body { paragraph: 4 }]);
    assert_eq!(report.correction.corrected, 2);
    let doc = load_document(&report.output_path).await.unwrap();
    assert_eq!(doc.paragraphs().nth(4).unwrap().text(), "this will BOOM");
}

#[tokio::test]
async fn non_docx_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("notes.docx");
    std::fs::write(&input, b"plain text, not a package").unwrap();

    let config = base_config().upload(false).build().unwrap();
    let err = polish(&input, &config).await.unwrap_err();

    assert!(err.is_format_error(), "got: {err}");
    assert!(!dir.path().join("notes_professional.docx").exists());
}

#[tokio::test]
async fn report_serialises_to_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), report_docx(None)).await;

    let config = base_config().upload(false).build().unwrap();
    let report = polish(&input, &config).await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["correction"]["corrected"], 2);
    assert_eq!(json["upload"]["status"], "skipped");
}
