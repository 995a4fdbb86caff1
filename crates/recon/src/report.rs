use crate::detected::{format_list, DetectedError};
use crate::error::ReconError;

/// First line of every report.
pub const REPORT_HEADER: &str =
    "#, reason, primaryKeyA, valueA, titleColumnA, fileA, primaryKeyB, valueB, titleColumnB, fileB, testFolder";

/// Receives the ordered findings of a run.
pub trait ReportSink {
    fn write_report(&mut self, errors: &[DetectedError]) -> Result<(), ReconError>;
}

/// Keeps the rendered report in memory.
#[derive(Debug, Default)]
pub struct MemoryReport {
    pub lines: Vec<String>,
    pub writes: usize,
}

impl ReportSink for MemoryReport {
    fn write_report(&mut self, errors: &[DetectedError]) -> Result<(), ReconError> {
        self.lines = render_report(errors);
        self.writes += 1;
        Ok(())
    }
}

/// One report line for the `n`th (1-based) finding. Fields are written as
/// is: unset fields are empty and nothing is quoted.
pub fn render_line(n: usize, error: &DetectedError) -> String {
    let list = |columns: Option<&[String]>| columns.map(format_list::<String>).unwrap_or_default();
    [
        n.to_string(),
        error.reason().to_string(),
        error.primary_key_a().unwrap_or_default().to_string(),
        error.value_a().unwrap_or_default().to_string(),
        list(error.title_columns_a()),
        error.file_a().unwrap_or_default().to_string(),
        error.primary_key_b().unwrap_or_default().to_string(),
        error.value_b().unwrap_or_default().to_string(),
        list(error.title_columns_b()),
        error.file_b().unwrap_or_default().to_string(),
        error.test_folder().unwrap_or_default().to_string(),
    ]
    .join(",")
}

/// Header plus one line per finding.
pub fn render_report(errors: &[DetectedError]) -> Vec<String> {
    let mut lines = Vec::with_capacity(errors.len() + 1);
    lines.push(REPORT_HEADER.to_string());
    lines.extend(errors.iter().enumerate().map(|(i, e)| render_line(i + 1, e)));
    lines
}
