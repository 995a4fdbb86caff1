use std::fmt;

use crate::model::Side;
use crate::rule::ColumnMissing;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty key list, bad ordering, etc.).
    ConfigValidation(String),
    /// Source file does not exist.
    SourceNotFound { path: String },
    /// Source file exists but cannot be read.
    SourceRead { path: String, message: String },
    /// Source file is not a well-formed header-delimited table.
    SourceParse { path: String, message: String },
    /// Charset label not known to the decoder.
    UnknownCharset(String),
    /// A key column is absent from a row while building the index.
    KeyColumnMissing { side: Side, source: String, column: String },
    /// A rule column is absent and the hooks escalated it.
    ColumnMissing(ColumnMissing),
    /// Duplicate keys found and the hooks asked to stop before the join.
    DuplicatesFound { count: usize },
    /// Report could not be written.
    ReportWrite { path: String, message: String },
    /// A custom hook aborted the run.
    Aborted(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::SourceNotFound { path } => write!(f, "file [{path}] is not found"),
            Self::SourceRead { path, message } => {
                write!(f, "error reading file [{path}]: {message}")
            }
            Self::SourceParse { path, message } => {
                write!(f, "cannot parse file [{path}]: {message}")
            }
            Self::UnknownCharset(label) => write!(f, "unknown charset: {label}"),
            Self::KeyColumnMissing { side, source, column } => {
                write!(f, "file {side} ({source}): key column '{column}' is not found")
            }
            Self::ColumnMissing(failure) => write!(f, "{failure}"),
            Self::DuplicatesFound { count } => write!(
                f,
                "duplication is found ({count} record(s)): stop progress, check the report for details"
            ),
            Self::ReportWrite { path, message } => {
                write!(f, "fail to write report into file [{path}]: {message}")
            }
            Self::Aborted(msg) => write!(f, "run aborted: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
