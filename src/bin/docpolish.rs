//! CLI binary for docpolish.
//!
//! A thin shim over the library crate that maps CLI flags and the
//! `CONFLUENCE_*` environment to `PipelineConfig` and prints progress.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use docpolish::grammar::{DEFAULT_LANGUAGE, DEFAULT_LANGUAGETOOL_URL};
use docpolish::{
    polish, CorrectionErrorPolicy, NodeLocation, PipelineConfig, PipelineProgressCallback,
    ProgressCallback, Stage, UploadError, UploadOutcome,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Prints one line per stage and shows a spinner while paragraphs are
/// being checked.
struct CliProgressCallback {
    /// Spinner for the correction stage; None outside of it.
    spinner: Mutex<Option<ProgressBar>>,
    checked: AtomicUsize,
    corrected: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            spinner: Mutex::new(None),
            checked: AtomicUsize::new(0),
            corrected: AtomicUsize::new(0),
        })
    }

    /// Print above the spinner when it is running, plainly otherwise.
    fn line(&self, msg: String) {
        match self.spinner.lock().ok().and_then(|s| s.clone()) {
            Some(bar) => bar.println(msg),
            None => println!("{msg}"),
        }
    }

    fn start_spinner(&self, total: usize) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Checking");
        bar.set_message(format!("0/{total} paragraphs"));
        bar.enable_steady_tick(Duration::from_millis(80));
        if let Ok(mut slot) = self.spinner.lock() {
            *slot = Some(bar);
        }
    }

    fn stop_spinner(&self) {
        if let Some(bar) = self.spinner.lock().ok().and_then(|mut s| s.take()) {
            bar.finish_and_clear();
        }
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        match stage {
            Stage::Load => self.line("Loading document...".into()),
            Stage::Correct => self.line("Correcting grammar and spelling...".into()),
            Stage::Format => self.line("Enhancing formatting...".into()),
            Stage::Upload => self.line("Uploading to Confluence...".into()),
        }
    }

    fn on_correction_start(&self, total: usize) {
        self.start_spinner(total);
    }

    fn on_paragraph_checked(&self, _location: &NodeLocation, changed: bool) {
        let checked = self.checked.fetch_add(1, Ordering::SeqCst) + 1;
        let corrected = if changed {
            self.corrected.fetch_add(1, Ordering::SeqCst) + 1
        } else {
            self.corrected.load(Ordering::SeqCst)
        };
        if let Some(bar) = self.spinner.lock().ok().and_then(|s| s.clone()) {
            bar.set_message(format!("{checked} checked, {corrected} corrected"));
        }
    }

    fn on_paragraph_error(&self, location: &NodeLocation, error: &str) {
        self.line(format!("  {} {}  {}", red("✗"), location, dim(error)));
    }

    fn on_stage_complete(&self, stage: Stage) {
        if stage == Stage::Correct {
            self.stop_spinner();
            self.line(format!(
                "  {} {} paragraphs checked, {} corrected",
                green("✓"),
                self.checked.load(Ordering::SeqCst),
                self.corrected.load(Ordering::SeqCst)
            ));
        }
    }

    fn on_document_saved(&self, path: &Path) {
        self.line(format!(
            "Document processed and saved as {}",
            bold(&path.display().to_string())
        ));
    }

    fn on_upload_result(&self, outcome: &UploadOutcome) {
        match outcome {
            UploadOutcome::Uploaded(_) => self.line(green("Upload successful!")),
            UploadOutcome::Failed(e @ UploadError::Rejected { .. }) => {
                self.line(red(&e.to_string()))
            }
            UploadOutcome::Failed(e) => self.line(red(&format!("Upload failed: {e}"))),
            UploadOutcome::Skipped => {}
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Correct, format and upload
  docpolish report.docx

  # Local processing only
  docpolish --no-upload report.docx

  # Custom attachment title, keep going when the grammar engine hiccups
  docpolish --title "Release notes" --on-correction-error skip notes.docx

  # Machine-readable summary
  docpolish --json report.docx > report.json

ENVIRONMENT VARIABLES (also read from ./.env):
  CONFLUENCE_BASE_URL     Confluence base URL, e.g. https://wiki.example.com
  CONFLUENCE_API_TOKEN    Personal access token (sent as Bearer)
  CONFLUENCE_PAGE_ID      Page that receives the attachment
  LANGUAGETOOL_URL        LanguageTool server (default http://localhost:8081)
  RUST_LOG                Override the log filter
"#;

/// Grammar-correct, format and publish a Word document.
#[derive(Parser, Debug)]
#[command(
    name = "docpolish",
    version,
    about = "Grammar-correct, format and publish a Word document to Confluence",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// The .docx file to process.
    input: Option<PathBuf>,

    /// Attachment title used in the upload comment.
    #[arg(long, default_value = docpolish::config::DEFAULT_TITLE)]
    title: String,

    /// Write the processed document here instead of <name>_professional.docx.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Language code for the grammar engine.
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    language: String,

    /// LanguageTool server URL.
    #[arg(long, env = "LANGUAGETOOL_URL", default_value = DEFAULT_LANGUAGETOOL_URL)]
    languagetool_url: String,

    /// What to do when the grammar engine fails on a paragraph.
    #[arg(long, value_enum, default_value = "halt")]
    on_correction_error: PolicyArg,

    /// Skip the Confluence upload.
    #[arg(long)]
    no_upload: bool,

    /// Per-request timeout in seconds for grammar checks and the upload.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Print the run report as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum PolicyArg {
    Halt,
    Skip,
}

impl From<PolicyArg> for CorrectionErrorPolicy {
    fn from(v: PolicyArg) -> Self {
        match v {
            PolicyArg::Halt => CorrectionErrorPolicy::Halt,
            PolicyArg::Skip => CorrectionErrorPolicy::Skip,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the variables may come from the real environment.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress lines cover normal runs; library logs only surface
    // warnings unless asked for.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Argument checks ──────────────────────────────────────────────────
    let Some(input) = cli.input.clone() else {
        Cli::command().print_help().context("Failed to print usage")?;
        println!();
        return Ok(());
    };

    if !input.exists() {
        println!("{}", red(&format!("File not found: {}", input.display())));
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.json;
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn PipelineProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run pipeline ─────────────────────────────────────────────────────
    let report = polish(&input, &config)
        .await
        .with_context(|| format!("Failed to process '{}'", input.display()))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!(
            "{}",
            dim(&format!(
                "{}ms total (load {}ms, correct {}ms, format {}ms, upload {}ms)",
                report.timings.total_ms,
                report.timings.load_ms,
                report.timings.correct_ms,
                report.timings.format_ms,
                report.timings.upload_ms
            ))
        );
    }

    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .title(cli.title.clone())
        .language(cli.language.clone())
        .languagetool_url(cli.languagetool_url.clone())
        .on_correction_error(cli.on_correction_error.clone().into())
        .upload(!cli.no_upload);

    if !cli.no_upload {
        builder = builder.confluence_from_env();
    }
    if let Some(ref output) = cli.output {
        builder = builder.output_path(output.clone());
    }
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
