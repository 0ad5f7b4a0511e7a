// Export orchestration: validates a session snapshot, renders off the async
// runtime and hands back a downloadable artifact.
pub mod bulk;
pub mod numbering;

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{error, info};

use crate::error::ExportError;
use crate::model::{CertificateData, TextElement};
use crate::pdf::fonts::FontLibrary;
use crate::pdf::render_certificate;
use crate::pdf::template::Template;
use bulk::{bulk_archive_name, certificate_file_name, parse_recipients, sequence_recipients};

/// Everything an export needs, copied out of the session so rendering runs
/// without holding the session lock.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub template: Option<Template>,
    pub elements: Vec<TextElement>,
    pub data: CertificateData,
    /// Editor pixel width at the moment the export was requested.
    pub canvas_width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportKind {
    Single,
    Bulk { recipients: String },
}

#[derive(Debug)]
pub struct ExportArtifact {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportJob {
    fn template(&self) -> Result<&Template, ExportError> {
        self.template.as_ref().ok_or(ExportError::MissingTemplate)
    }

    fn render(
        &self,
        template: &Template,
        data: &CertificateData,
        fonts: &FontLibrary,
    ) -> Result<Vec<u8>, ExportError> {
        let rendered =
            render_certificate(template, &self.elements, data, self.canvas_width, fonts)?;
        Ok(rendered.bytes)
    }
}

/// One certificate for the session's current recipient.
pub fn export_single(job: &ExportJob, fonts: &FontLibrary) -> Result<ExportArtifact, ExportError> {
    let template = job.template()?;
    let name = job.data.recipient_name.trim();
    if name.is_empty() {
        return Err(ExportError::MissingRecipientName);
    }

    let bytes = job.render(template, &job.data, fonts)?;
    Ok(ExportArtifact {
        file_name: certificate_file_name(name),
        content_type: "application/pdf",
        bytes,
    })
}

/// A ZIP with one certificate per comma-separated recipient, numbered in list
/// order from the session's certificate number.
pub fn export_bulk(
    job: &ExportJob,
    raw_recipients: &str,
    fonts: &FontLibrary,
    today: NaiveDate,
) -> Result<ExportArtifact, ExportError> {
    let template = job.template()?;
    let recipients = parse_recipients(raw_recipients);
    if recipients.is_empty() {
        return Err(ExportError::EmptyBulkList);
    }

    let bytes = sequence_recipients(&job.data, &recipients, |data| {
        job.render(template, data, fonts)
    })?;
    Ok(ExportArtifact {
        file_name: bulk_archive_name(today),
        content_type: "application/zip",
        bytes,
    })
}

/// Runs an export on the blocking pool and logs its start, completion or
/// failure.
pub async fn run_export(
    job: ExportJob,
    kind: ExportKind,
    fonts: Arc<FontLibrary>,
) -> Result<ExportArtifact, ExportError> {
    let label = match &kind {
        ExportKind::Single => "single",
        ExportKind::Bulk { .. } => "bulk",
    };
    info!(kind = label, canvas_width = job.canvas_width, "export started");

    let result = tokio::task::spawn_blocking(move || match kind {
        ExportKind::Single => export_single(&job, &fonts),
        ExportKind::Bulk { recipients } => {
            export_bulk(&job, &recipients, &fonts, Utc::now().date_naive())
        }
    })
    .await
    .map_err(|e| ExportError::Join(e.to_string()))
    .and_then(|r| r);

    match &result {
        Ok(artifact) => info!(
            kind = label,
            file = %artifact.file_name,
            bytes = artifact.bytes.len(),
            "export finished"
        ),
        Err(e) => error!(kind = label, error = %e, "export failed"),
    }
    result
}
