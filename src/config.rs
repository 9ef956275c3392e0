//! Configuration types for the polishing pipeline.
//!
//! Pipeline behaviour is controlled through [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`]. Confluence credentials live in a separate
//! [`ConfluenceConfig`] so they can be read from the environment once, at
//! process start, and passed down explicitly.

use crate::error::{PolishError, UploadError};
use crate::grammar::{GrammarChecker, DEFAULT_LANGUAGE, DEFAULT_LANGUAGETOOL_URL};
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable holding the Confluence base URL.
pub const ENV_BASE_URL: &str = "CONFLUENCE_BASE_URL";
/// Environment variable holding the Confluence bearer token.
pub const ENV_API_TOKEN: &str = "CONFLUENCE_API_TOKEN";
/// Environment variable holding the target page id.
pub const ENV_PAGE_ID: &str = "CONFLUENCE_PAGE_ID";

/// Attachment title used when none is given.
pub const DEFAULT_TITLE: &str = "Knowledge Article";

/// Configuration for one pipeline run.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use docpolish::{CorrectionErrorPolicy, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .language("en-GB")
///     .on_correction_error(CorrectionErrorPolicy::Skip)
///     .title("Release notes")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Language code sent to the grammar engine. Default: `en-US`.
    pub language: String,

    /// LanguageTool server URL. Default: `http://localhost:8081`.
    pub languagetool_url: String,

    /// Pre-constructed grammar engine. Takes precedence over `languagetool_url`.
    pub checker: Option<Arc<dyn GrammarChecker>>,

    /// What to do when the grammar engine fails on a paragraph. Default: halt.
    pub on_correction_error: CorrectionErrorPolicy,

    /// Run the grammar stage at all. Default: true.
    pub correct: bool,

    /// Upload the result to Confluence. Default: true.
    pub upload: bool,

    /// Attachment title; the upload comment reads `Automated upload: {title}`.
    pub title: String,

    /// Where to write the processed document. If None, derived from the input
    /// name (`report.docx` → `report_professional.docx`).
    pub output_path: Option<PathBuf>,

    /// Per-request timeout for the grammar engine and the upload, in seconds.
    /// If None, the HTTP client's default applies.
    pub request_timeout_secs: Option<u64>,

    /// Confluence settings. If None the upload stage reports `NotConfigured`.
    pub confluence: Option<ConfluenceConfig>,

    /// Why the Confluence settings are absent, when they are.
    pub confluence_missing: Option<String>,

    /// Progress events receiver.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            languagetool_url: DEFAULT_LANGUAGETOOL_URL.to_string(),
            checker: None,
            on_correction_error: CorrectionErrorPolicy::default(),
            correct: true,
            upload: true,
            title: DEFAULT_TITLE.to_string(),
            output_path: None,
            request_timeout_secs: None,
            confluence: None,
            confluence_missing: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("language", &self.language)
            .field("languagetool_url", &self.languagetool_url)
            .field("checker", &self.checker.as_ref().map(|c| c.name().to_string()))
            .field("on_correction_error", &self.on_correction_error)
            .field("correct", &self.correct)
            .field("upload", &self.upload)
            .field("title", &self.title)
            .field("output_path", &self.output_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("confluence", &self.confluence)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Confluence settings, or the reason the upload cannot run.
    pub fn confluence_settings(&self) -> Result<&ConfluenceConfig, UploadError> {
        self.confluence.as_ref().ok_or_else(|| UploadError::NotConfigured {
            missing: self
                .confluence_missing
                .clone()
                .unwrap_or_else(|| "Confluence settings".to_string()),
        })
    }
}

/// Builder for [`PipelineConfig`].
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl fmt::Debug for PipelineConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl PipelineConfigBuilder {
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = language.into();
        self
    }

    pub fn languagetool_url(mut self, url: impl Into<String>) -> Self {
        self.config.languagetool_url = url.into();
        self
    }

    pub fn checker(mut self, checker: Arc<dyn GrammarChecker>) -> Self {
        self.config.checker = Some(checker);
        self
    }

    pub fn on_correction_error(mut self, policy: CorrectionErrorPolicy) -> Self {
        self.config.on_correction_error = policy;
        self
    }

    pub fn correct(mut self, v: bool) -> Self {
        self.config.correct = v;
        self
    }

    pub fn upload(mut self, v: bool) -> Self {
        self.config.upload = v;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = Some(path.into());
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    pub fn confluence(mut self, settings: ConfluenceConfig) -> Self {
        self.config.confluence = Some(settings);
        self.config.confluence_missing = None;
        self
    }

    /// Take Confluence settings from [`ConfluenceConfig::from_env`], keeping
    /// the missing-variable message for the upload stage on failure.
    pub fn confluence_from_env(mut self) -> Self {
        match ConfluenceConfig::from_env() {
            Ok(settings) => {
                self.config.confluence = Some(settings);
                self.config.confluence_missing = None;
            }
            Err(UploadError::NotConfigured { missing }) => {
                self.config.confluence = None;
                self.config.confluence_missing = Some(missing);
            }
            Err(other) => {
                self.config.confluence = None;
                self.config.confluence_missing = Some(other.to_string());
            }
        }
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, PolishError> {
        let c = &self.config;
        if c.language.trim().is_empty() {
            return Err(PolishError::InvalidConfig(
                "Language code must not be empty".into(),
            ));
        }
        if c.correct && c.checker.is_none() && !is_http_url(&c.languagetool_url) {
            return Err(PolishError::InvalidConfig(format!(
                "LanguageTool URL must start with http:// or https://, got '{}'",
                c.languagetool_url
            )));
        }
        if c.request_timeout_secs == Some(0) {
            return Err(PolishError::InvalidConfig(
                "Request timeout must be ≥ 1 second".into(),
            ));
        }
        if let Some(ref output) = c.output_path {
            if output.as_os_str().is_empty() {
                return Err(PolishError::InvalidConfig("Output path is empty".into()));
            }
        }
        Ok(self.config)
    }
}

fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

// ── Confluence ───────────────────────────────────────────────────────────

/// Where and as whom to upload.
#[derive(Clone, PartialEq, Eq)]
pub struct ConfluenceConfig {
    /// Base URL of the Confluence instance, e.g. `https://wiki.example.com`.
    pub base_url: String,
    /// Personal access token sent as `Authorization: Bearer …`.
    pub api_token: String,
    /// Id of the page that receives the attachment.
    pub page_id: String,
}

impl ConfluenceConfig {
    pub fn new(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        page_id: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: api_token.into(),
            page_id: page_id.into(),
        }
    }

    /// Read `CONFLUENCE_BASE_URL`, `CONFLUENCE_API_TOKEN` and
    /// `CONFLUENCE_PAGE_ID` from the process environment.
    pub fn from_env() -> Result<Self, UploadError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`] but reading through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, UploadError> {
        let mut missing = Vec::new();
        let mut read = |key: &'static str| match lookup(key) {
            Some(v) if !v.trim().is_empty() => v,
            _ => {
                missing.push(key);
                String::new()
            }
        };
        let base_url = read(ENV_BASE_URL);
        let api_token = read(ENV_API_TOKEN);
        let page_id = read(ENV_PAGE_ID);

        if !missing.is_empty() {
            return Err(UploadError::NotConfigured {
                missing: missing.join(", "),
            });
        }
        Ok(Self::new(base_url, api_token, page_id))
    }

    /// `{base_url}/rest/api/content/{page_id}/child/attachment`
    pub fn attachment_url(&self) -> String {
        format!(
            "{}/rest/api/content/{}/child/attachment",
            self.base_url.trim_end_matches('/'),
            self.page_id
        )
    }
}

impl fmt::Debug for ConfluenceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfluenceConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"<redacted>")
            .field("page_id", &self.page_id)
            .finish()
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What the corrector does when the grammar engine fails on a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CorrectionErrorPolicy {
    /// Stop the pipeline with [`PolishError::Correction`]. (default)
    #[default]
    Halt,
    /// Log, leave the paragraph as it is, and continue.
    Skip,
}
