// CSV row source

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use twofile_recon::{ReconError, Row, RowSource, SourceRef};

use crate::charset::{decode, resolve_charset};

/// Reads `base_dir/folder/file` as a header-delimited CSV table.
#[derive(Debug, Clone)]
pub struct CsvSource {
    base_dir: PathBuf,
    delimiter: u8,
}

impl CsvSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn path_of(&self, source: &SourceRef<'_>) -> PathBuf {
        self.base_dir.join(source.folder).join(source.file)
    }
}

impl RowSource for CsvSource {
    fn read_rows(&self, source: &SourceRef<'_>) -> Result<Vec<Row>, ReconError> {
        let path = self.path_of(source);
        let encoding = resolve_charset(source.charset)?;
        let bytes = read_file(&path)?;

        let (text, had_errors) = decode(&bytes, encoding);
        if had_errors {
            log::warn!(
                "{}: bytes not valid {} were replaced with U+FFFD",
                path.display(),
                encoding.name()
            );
        }

        let rows = parse_rows(&text, self.delimiter).map_err(|message| ReconError::SourceParse {
            path: path.display().to_string(),
            message,
        })?;
        log::debug!(
            "read {} ({}, {} bytes): {} row(s)",
            path.display(),
            encoding.name(),
            bytes.len(),
            rows.len()
        );
        Ok(rows)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, ReconError> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ReconError::SourceNotFound {
            path: path.display().to_string(),
        },
        _ => ReconError::SourceRead {
            path: path.display().to_string(),
            message: e.to_string(),
        },
    })
}

/// First record is the header; every following record is one row.
/// Short records lack the trailing columns, extra fields are dropped.
pub fn parse_rows(content: &str, delimiter: u8) -> Result<Vec<Row>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let header: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(String::from)
        .collect();

    let mut seen = HashSet::new();
    for column in &header {
        if !seen.insert(column.as_str()) {
            return Err(format!("duplicate column '{column}' in header"));
        }
    }

    let header: Arc<[String]> = header.into();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        rows.push(Row::new(header.clone(), record.iter().map(String::from).collect()));
    }
    Ok(rows)
}
