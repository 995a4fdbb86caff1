// Report file writer

use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use twofile_recon::report::render_report;
use twofile_recon::{DetectedError, ReconError, ReportSink};

use crate::charset::{encode, resolve_charset};

/// Writes the rendered report to one file, replacing any previous content.
/// Characters the report charset cannot represent are written as `?`.
#[derive(Debug, Clone)]
pub struct CsvReportWriter {
    path: PathBuf,
    encoding: &'static Encoding,
}

impl CsvReportWriter {
    /// Fails on an unknown charset label, before anything is run.
    pub fn new(path: impl Into<PathBuf>, charset: &str) -> Result<Self, ReconError> {
        Ok(Self {
            path: path.into(),
            encoding: resolve_charset(charset)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for CsvReportWriter {
    fn write_report(&mut self, errors: &[DetectedError]) -> Result<(), ReconError> {
        let write_err = |message: String| ReconError::ReportWrite {
            path: self.path.display().to_string(),
            message,
        };

        let mut text = render_report(errors).join("\n");
        text.push('\n');
        let (bytes, had_errors) = encode(&text, self.encoding);
        if had_errors {
            log::warn!(
                "{}: characters not representable in {} were written as '?'",
                self.path.display(),
                self.encoding.name()
            );
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        std::fs::write(&self.path, bytes).map_err(|e| write_err(e.to_string()))?;

        log::info!("report with {} difference(s) written to {}", errors.len(), self.path.display());
        Ok(())
    }
}
