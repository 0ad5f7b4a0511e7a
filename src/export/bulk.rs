use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::sync::OnceLock;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::numbering::increment_certificate_number;
use crate::error::ExportError;
use crate::model::CertificateData;

static UNSAFE_RUN: OnceLock<Regex> = OnceLock::new();

/// Splits the comma-separated recipient list, trimming entries and dropping
/// empty ones.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// `Certificate_<name>.pdf` with whitespace runs and path or quote
/// characters replaced by `_`.
pub fn certificate_file_name(recipient: &str) -> String {
    let re = UNSAFE_RUN.get_or_init(|| {
        Regex::new(r#"[\s/\\"]+"#).expect("file name pattern is valid")
    });
    format!("Certificate_{}.pdf", re.replace_all(recipient.trim(), "_"))
}

pub fn bulk_archive_name(date: NaiveDate) -> String {
    format!("Certificates_Bulk_{}.zip", date.format("%Y-%m-%d"))
}

/// In-memory ZIP of rendered certificates.
pub struct CertificateArchive {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    names: HashSet<String>,
}

impl Default for CertificateArchive {
    fn default() -> Self {
        Self::new()
    }
}

impl CertificateArchive {
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            names: HashSet::new(),
        }
    }

    /// Adds one certificate and returns the entry name it was stored under.
    /// Repeated recipient names get `_2`, `_3`, ... so no entry is lost.
    pub fn add(&mut self, recipient: &str, pdf: &[u8]) -> Result<String, ExportError> {
        let base = certificate_file_name(recipient);
        let mut name = base.clone();
        let mut n = 1;
        while self.names.contains(&name) {
            n += 1;
            name = format!("{}_{}.pdf", base.trim_end_matches(".pdf"), n);
        }

        let options = SimpleFileOptions::default().unix_permissions(0o644);
        self.zip.start_file(name.clone(), options)?;
        self.zip.write_all(pdf)?;
        self.names.insert(name.clone());
        Ok(name)
    }

    pub fn finish(self) -> Result<Vec<u8>, ExportError> {
        Ok(self.zip.finish()?.into_inner())
    }
}

/// Renders one certificate per recipient, in list order, numbering them from
/// `base.certificate_number` upward, and packs them into one archive.
///
/// `render` is called once per recipient with that recipient's data; the
/// first failure aborts the run.
pub fn sequence_recipients<F>(
    base: &CertificateData,
    recipients: &[String],
    mut render: F,
) -> Result<Vec<u8>, ExportError>
where
    F: FnMut(&CertificateData) -> Result<Vec<u8>, ExportError>,
{
    if recipients.is_empty() {
        return Err(ExportError::EmptyBulkList);
    }

    let mut archive = CertificateArchive::new();
    let mut number = base.certificate_number.clone();
    for recipient in recipients {
        let data = base.for_recipient(recipient, &number);
        let pdf = render(&data)?;
        let entry = archive.add(recipient, &pdf)?;
        debug!(%entry, certificate_number = %number, "added certificate to archive");
        number = increment_certificate_number(&number);
    }
    archive.finish()
}
