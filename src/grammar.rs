//! Grammar and spelling correction engines.
//!
//! The corrector only needs "text in, corrected text out". [`GrammarChecker`]
//! is that seam: the default implementation talks to a LanguageTool server,
//! tests and library callers can inject their own through
//! [`crate::config::PipelineConfigBuilder::checker`].
//!
//! ## Applying matches
//!
//! Engines report problems as [`GrammarMatch`]es (offset, length, suggested
//! replacements) rather than a rewritten string. [`apply_matches`] rewrites
//! the text using the first suggestion of each match. Offsets are UTF-16 code
//! units because that is what LanguageTool reports.

use crate::error::GrammarError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default LanguageTool endpoint when none is configured.
pub const DEFAULT_LANGUAGETOOL_URL: &str = "http://localhost:8081";

/// Default language code passed to the engine.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// One problem reported by a grammar engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarMatch {
    /// Start of the problem, in UTF-16 code units.
    pub offset: usize,
    /// Length of the problem, in UTF-16 code units.
    pub length: usize,
    /// Suggested replacements, best first.
    pub replacements: Vec<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub rule_id: String,
}

impl GrammarMatch {
    pub fn new(offset: usize, length: usize, replacement: impl Into<String>) -> Self {
        Self {
            offset,
            length,
            replacements: vec![replacement.into()],
            message: String::new(),
            rule_id: String::new(),
        }
    }
}

/// A grammar/spelling engine.
///
/// Calls are independent from the caller's point of view; engines are free
/// to cache loaded rules internally.
#[async_trait]
pub trait GrammarChecker: Send + Sync {
    /// Short engine name used in logs and errors.
    fn name(&self) -> &str;

    /// Report the problems found in `text`.
    async fn check(&self, text: &str) -> Result<Vec<GrammarMatch>, GrammarError>;

    /// Return `text` with every applicable suggestion applied.
    async fn correct(&self, text: &str) -> Result<String, GrammarError> {
        let matches = self.check(text).await?;
        Ok(apply_matches(text, &matches))
    }
}

/// Apply the first replacement of each match to `text`.
///
/// Matches are applied in offset order. A match is skipped when it has no
/// replacement, reaches past the end of the text, or overlaps a match that
/// was already applied.
pub fn apply_matches(text: &str, matches: &[GrammarMatch]) -> String {
    let units: Vec<u16> = text.encode_utf16().collect();

    let mut ordered: Vec<&GrammarMatch> = matches
        .iter()
        .filter(|m| !m.replacements.is_empty())
        .collect();
    ordered.sort_by_key(|m| m.offset);

    let mut out: Vec<u16> = Vec::with_capacity(units.len());
    let mut cursor = 0usize;
    for m in ordered {
        let end = match m.offset.checked_add(m.length) {
            Some(end) if m.offset >= cursor && end <= units.len() => end,
            _ => {
                debug!(
                    "Skipping grammar match at {}+{} (rule '{}')",
                    m.offset, m.length, m.rule_id
                );
                continue;
            }
        };
        if splits_surrogate(&units, m.offset) || splits_surrogate(&units, end) {
            debug!("Skipping grammar match inside a surrogate pair at {}", m.offset);
            continue;
        }
        out.extend_from_slice(&units[cursor..m.offset]);
        out.extend(m.replacements[0].encode_utf16());
        cursor = end;
    }
    out.extend_from_slice(&units[cursor..]);

    String::from_utf16_lossy(&out)
}

/// True when `index` falls between the two halves of a surrogate pair.
fn splits_surrogate(units: &[u16], index: usize) -> bool {
    index > 0
        && index < units.len()
        && (0xDC00..=0xDFFF).contains(&units[index])
        && (0xD800..=0xDBFF).contains(&units[index - 1])
}

// ── LanguageTool ─────────────────────────────────────────────────────────

/// Client for the LanguageTool HTTP API (`POST /v2/check`).
pub struct LanguageToolChecker {
    client: reqwest::Client,
    base_url: String,
    language: String,
}

impl LanguageToolChecker {
    /// Create a client for the server at `base_url` checking `language`.
    pub fn new(
        base_url: impl Into<String>,
        language: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, GrammarError> {
        let base_url = base_url.into();
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build().map_err(|e| GrammarError::Unavailable {
            engine: "languagetool".into(),
            detail: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            language: language.into(),
        })
    }

    pub fn check_url(&self) -> String {
        format!("{}/v2/check", self.base_url)
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    #[serde(default)]
    matches: Vec<WireMatch>,
}

#[derive(Debug, Deserialize)]
struct WireMatch {
    offset: usize,
    length: usize,
    #[serde(default)]
    message: String,
    #[serde(default)]
    replacements: Vec<WireReplacement>,
    rule: Option<WireRule>,
}

#[derive(Debug, Deserialize)]
struct WireReplacement {
    value: String,
}

#[derive(Debug, Deserialize)]
struct WireRule {
    id: String,
}

impl From<WireMatch> for GrammarMatch {
    fn from(m: WireMatch) -> Self {
        GrammarMatch {
            offset: m.offset,
            length: m.length,
            replacements: m.replacements.into_iter().map(|r| r.value).collect(),
            message: m.message,
            rule_id: m.rule.map(|r| r.id).unwrap_or_default(),
        }
    }
}

/// Decode a `/v2/check` response body.
pub fn parse_check_response(body: &str) -> Result<Vec<GrammarMatch>, GrammarError> {
    let parsed: CheckResponse =
        serde_json::from_str(body).map_err(|e| GrammarError::InvalidResponse(e.to_string()))?;
    Ok(parsed.matches.into_iter().map(GrammarMatch::from).collect())
}

#[async_trait]
impl GrammarChecker for LanguageToolChecker {
    fn name(&self) -> &str {
        "languagetool"
    }

    async fn check(&self, text: &str) -> Result<Vec<GrammarMatch>, GrammarError> {
        let params = [("text", text), ("language", self.language.as_str())];
        let response = self
            .client
            .post(self.check_url())
            .form(&params)
            .send()
            .await
            .map_err(|e| GrammarError::Unavailable {
                engine: self.name().to_string(),
                detail: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GrammarError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            return Err(GrammarError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let matches = parse_check_response(&body)?;
        debug!("LanguageTool reported {} matches", matches.len());
        Ok(matches)
    }
}
