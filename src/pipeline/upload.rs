//! Uploader: attach the processed document to a Confluence page.
//!
//! One multipart `POST` to the page's attachment endpoint, authenticated with
//! a bearer token. Nothing is retried; every failure comes back as an
//! [`UploadError`] so the caller can report it without losing local work.

use crate::config::ConfluenceConfig;
use crate::error::UploadError;
use crate::output::UploadReceipt;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// MIME type of a WordprocessingML package.
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Upload `path` as an attachment to the configured page.
///
/// The request carries `minorEdit=true` and the comment
/// `Automated upload: {title}`. Only 200 and 201 count as success.
pub async fn upload_attachment(
    path: &Path,
    title: &str,
    settings: &ConfluenceConfig,
    timeout: Option<Duration>,
) -> Result<UploadReceipt, UploadError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| UploadError::ReadFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.docx".to_string());

    let part = Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(DOCX_MIME)
        .map_err(transport)?;
    let form = Form::new().part("file", part);

    let mut builder = reqwest::Client::builder();
    if let Some(t) = timeout {
        builder = builder.timeout(t);
    }
    let client = builder.build().map_err(transport)?;

    let url = settings.attachment_url();
    let comment = format!("Automated upload: {}", title);
    debug!("POST {} ({})", url, comment);

    let response = client
        .post(&url)
        .bearer_auth(&settings.api_token)
        .header("X-Atlassian-Token", "no-check")
        .query(&[("minorEdit", "true"), ("comment", comment.as_str())])
        .multipart(form)
        .send()
        .await
        .map_err(transport)?;

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    if matches!(status, 200 | 201) {
        info!("Uploaded {} to page {}", path.display(), settings.page_id);
        Ok(UploadReceipt { status, body })
    } else {
        warn!("Confluence rejected upload with HTTP {}", status);
        Err(UploadError::Rejected { status, body })
    }
}

fn transport(e: reqwest::Error) -> UploadError {
    UploadError::Transport {
        detail: e.to_string(),
    }
}
