//! CLI Exit Code Registry
//!
//! Single source of truth for the exit codes of `twofile`. Scripts rely on
//! them, so existing values never change meaning.
//!
//! | Code | Meaning                                             |
//! |------|-----------------------------------------------------|
//! | 0    | Run completed, no differences                       |
//! | 1    | Run completed, differences found (report written)   |
//! | 2    | Usage error, config file cannot be read             |
//! | 3    | Duplicate keys found and the policy stops the run   |
//! | 4    | A rule column is missing and the policy escalates   |
//! | 5    | Source file missing, unreadable or not a CSV table  |
//! | 6    | Invalid config (parse, validation, unknown charset) |
//! | 7    | Report cannot be written                            |
//! | 8    | A key column is missing from a source row           |

use twofile_recon::ReconError;

/// Success - no differences were found.
pub const EXIT_SUCCESS: u8 = 0;

/// Differences found. Like `diff(1)`, exit 1 means "files differ".
/// Also used for run aborts raised by custom hooks.
pub const EXIT_DIFFERENCES: u8 = 1;

/// Usage error - bad arguments, unreadable config file.
pub const EXIT_USAGE: u8 = 2;

/// Duplicate keys found with `stop_on_duplicates = true`.
/// The report holds the duplicates; no comparison was made.
pub const EXIT_DUPLICATES: u8 = 3;

/// Column missing during rule evaluation, escalated.
pub const EXIT_COLUMN_MISSING: u8 = 4;

/// Source file not found, unreadable or unparsable.
pub const EXIT_SOURCE: u8 = 5;

/// Config parse or validation error.
pub const EXIT_INVALID_CONFIG: u8 = 6;

/// Report file cannot be written.
pub const EXIT_REPORT_WRITE: u8 = 7;

/// Key column missing while indexing a source.
pub const EXIT_KEY_COLUMN_MISSING: u8 = 8;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) | ReconError::UnknownCharset(_) => {
            EXIT_INVALID_CONFIG
        }
        ReconError::SourceNotFound { .. } | ReconError::SourceRead { .. } | ReconError::SourceParse { .. } => {
            EXIT_SOURCE
        }
        ReconError::KeyColumnMissing { .. } => EXIT_KEY_COLUMN_MISSING,
        ReconError::ColumnMissing(_) => EXIT_COLUMN_MISSING,
        ReconError::DuplicatesFound { .. } => EXIT_DUPLICATES,
        ReconError::ReportWrite { .. } => EXIT_REPORT_WRITE,
        ReconError::Aborted(_) => EXIT_DIFFERENCES,
    }
}
