//! Detection-point callbacks.
//!
//! The index builder and the match engine call a [`DifferenceHooks`] for every
//! finding before it is appended to the results. A hook fills the record's
//! context through the [`Enrichment`] handle and may abort the run by
//! returning an error. Hooks hold no per-run state: everything they need
//! about the run arrives in the [`RunContext`].

use serde::Deserialize;

use crate::detected::{format_list, Enrichment};
use crate::error::ReconError;
use crate::model::{Row, Side};
use crate::rule::ColumnMissing;

/// Per-run labels passed to every hook call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    pub file_a: String,
    pub file_b: String,
    pub test_folder: String,
    pub key_columns_a: Vec<String>,
    pub key_columns_b: Vec<String>,
}

impl RunContext {
    pub fn file(&self, side: Side) -> &str {
        match side {
            Side::A => &self.file_a,
            Side::B => &self.file_b,
        }
    }

    pub fn key_columns(&self, side: Side) -> &[String] {
        match side {
            Side::A => &self.key_columns_a,
            Side::B => &self.key_columns_b,
        }
    }
}

/// A matched pair whose values disagree under one rule.
#[derive(Debug, Clone, Copy)]
pub struct ValueMismatch<'a> {
    pub key: &'a str,
    pub keys_a: &'a [String],
    pub keys_b: &'a [String],
    pub value_a: &'a str,
    pub value_b: &'a str,
}

/// One of the two rows of a key collision.
#[derive(Debug, Clone)]
pub struct DuplicateKey<'a> {
    pub side: Side,
    pub key: &'a str,
    pub key_columns: &'a [String],
    pub key_values: Vec<&'a str>,
    pub row: &'a Row,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

pub trait DifferenceHooks: Send + Sync {
    /// The error's kind names the side the key is missing from; its primary
    /// key for the other side is already set.
    fn on_key_missing(&self, ctx: &RunContext, error: &mut Enrichment<'_>) -> Result<(), ReconError> {
        enrich_key_missing(ctx, error);
        Ok(())
    }

    fn on_value_mismatch(
        &self,
        ctx: &RunContext,
        error: &mut Enrichment<'_>,
        mismatch: &ValueMismatch<'_>,
    ) -> Result<(), ReconError> {
        enrich_value_mismatch(ctx, error, mismatch);
        Ok(())
    }

    /// Escalates by default. Return `Ok` to keep the finding and go on.
    fn on_column_missing(
        &self,
        _ctx: &RunContext,
        _error: &mut Enrichment<'_>,
        failure: &ColumnMissing,
    ) -> Result<(), ReconError> {
        Err(ReconError::ColumnMissing(failure.clone()))
    }

    fn on_duplicate_key(
        &self,
        ctx: &RunContext,
        error: &mut Enrichment<'_>,
        duplicate: &DuplicateKey<'_>,
    ) -> Result<(), ReconError> {
        enrich_duplicate_key(ctx, error, duplicate);
        Ok(())
    }

    /// Checked after both indices are built. When true and any duplicate was
    /// found, the run writes what it has and stops before the join.
    fn should_stop_on_duplicates_found(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Default enrichment
// ---------------------------------------------------------------------------

fn enrich_labels(ctx: &RunContext, error: &mut Enrichment<'_>) {
    error
        .set_file_a(ctx.file_a.as_str())
        .set_file_b(ctx.file_b.as_str())
        .set_test_folder(ctx.test_folder.as_str());
}

pub fn enrich_key_missing(ctx: &RunContext, error: &mut Enrichment<'_>) {
    enrich_labels(ctx, error);
    error
        .set_title_columns_a(&ctx.key_columns_a)
        .set_title_columns_b(&ctx.key_columns_b);
}

pub fn enrich_value_mismatch(ctx: &RunContext, error: &mut Enrichment<'_>, mismatch: &ValueMismatch<'_>) {
    enrich_labels(ctx, error);
    error
        .set_title_columns_a(mismatch.keys_a)
        .set_title_columns_b(mismatch.keys_b)
        .set_primary_key_a(mismatch.key)
        .set_primary_key_b(mismatch.key)
        .set_value_a(mismatch.value_a)
        .set_value_b(mismatch.value_b);
}

pub fn enrich_column_missing(ctx: &RunContext, error: &mut Enrichment<'_>, failure: &ColumnMissing) {
    enrich_labels(ctx, error);
    error
        .set_title_columns_a(&failure.keys_a)
        .set_title_columns_b(&failure.keys_b)
        .set_primary_key_a(failure.key.as_str())
        .set_primary_key_b(failure.key.as_str());
}

/// Duplicates from either file are written to the A columns, labelled with
/// the folder-prefixed path of the file they came from. `testFolder` stays empty.
pub fn enrich_duplicate_key(ctx: &RunContext, error: &mut Enrichment<'_>, duplicate: &DuplicateKey<'_>) {
    error
        .set_file_a(format!("{}{}", ctx.test_folder, ctx.file(duplicate.side)))
        .set_title_columns_a(duplicate.key_columns)
        .set_value_a(format_list(&duplicate.key_values));
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

/// Default enrichment everywhere; column-missing escalates; duplicates
/// never stop the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl DifferenceHooks for DefaultHooks {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnMissingPolicy {
    /// Abort the run with [`ReconError::ColumnMissing`].
    #[default]
    Escalate,
    /// Record a `column is not found` finding and continue.
    Report,
}

/// Default enrichment with the two policy decisions made configurable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicyHooks {
    pub column_missing: ColumnMissingPolicy,
    pub stop_on_duplicates: bool,
}

impl DifferenceHooks for PolicyHooks {
    fn on_column_missing(
        &self,
        ctx: &RunContext,
        error: &mut Enrichment<'_>,
        failure: &ColumnMissing,
    ) -> Result<(), ReconError> {
        match self.column_missing {
            ColumnMissingPolicy::Escalate => Err(ReconError::ColumnMissing(failure.clone())),
            ColumnMissingPolicy::Report => {
                log::warn!("{failure}");
                enrich_column_missing(ctx, error, failure);
                Ok(())
            }
        }
    }

    fn should_stop_on_duplicates_found(&self) -> bool {
        self.stop_on_duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detected::{DetectedError, ErrorKind};

    fn ctx() -> RunContext {
        RunContext {
            file_a: "fileA.csv".into(),
            file_b: "fileB.csv".into(),
            test_folder: "run1/".into(),
            key_columns_a: vec!["id".into()],
            key_columns_b: vec!["client_ID".into()],
        }
    }

    fn failure() -> ColumnMissing {
        ColumnMissing {
            key: "7".into(),
            side: Side::B,
            column: "position".into(),
            keys_a: vec!["title".into()],
            keys_b: vec!["position".into()],
            row: [("client_ID", "7")].into_iter().collect(),
        }
    }

    #[test]
    fn key_missing_gets_labels_and_key_columns() {
        let mut err = DetectedError::new(ErrorKind::KeyMissingInOther { side: Side::B });
        DefaultHooks
            .on_key_missing(&ctx(), &mut Enrichment::new(&mut err))
            .unwrap();
        assert_eq!(err.file_a(), Some("fileA.csv"));
        assert_eq!(err.file_b(), Some("fileB.csv"));
        assert_eq!(err.test_folder(), Some("run1/"));
        assert_eq!(err.title_columns_a(), Some(&["id".to_string()][..]));
        assert_eq!(err.title_columns_b(), Some(&["client_ID".to_string()][..]));
        assert_eq!(err.value_a(), None);
    }

    #[test]
    fn value_mismatch_gets_key_and_values() {
        let keys_a = vec!["title".to_string()];
        let keys_b = vec!["position".to_string()];
        let mismatch = ValueMismatch {
            key: "1",
            keys_a: &keys_a,
            keys_b: &keys_b,
            value_a: "staff",
            value_b: "NULL",
        };
        let mut err = DetectedError::new(ErrorKind::ValueMismatch);
        DefaultHooks
            .on_value_mismatch(&ctx(), &mut Enrichment::new(&mut err), &mismatch)
            .unwrap();
        assert_eq!(err.primary_key_a(), Some("1"));
        assert_eq!(err.primary_key_b(), Some("1"));
        assert_eq!(err.value_a(), Some("staff"));
        assert_eq!(err.value_b(), Some("NULL"));
        assert_eq!(err.title_columns_b(), Some(&keys_b[..]));
    }

    #[test]
    fn default_column_missing_escalates() {
        let mut err = DetectedError::new(ErrorKind::ColumnMissing);
        let result = DefaultHooks.on_column_missing(&ctx(), &mut Enrichment::new(&mut err), &failure());
        assert!(matches!(result, Err(ReconError::ColumnMissing(f)) if f.column == "position"));
    }

    #[test]
    fn policy_can_report_column_missing() {
        let hooks = PolicyHooks {
            column_missing: ColumnMissingPolicy::Report,
            stop_on_duplicates: true,
        };
        let mut err = DetectedError::new(ErrorKind::ColumnMissing);
        hooks
            .on_column_missing(&ctx(), &mut Enrichment::new(&mut err), &failure())
            .unwrap();
        assert_eq!(err.primary_key_a(), Some("7"));
        assert_eq!(err.title_columns_a(), Some(&["title".to_string()][..]));
        assert!(hooks.should_stop_on_duplicates_found());
        assert!(!DefaultHooks.should_stop_on_duplicates_found());
    }

    #[test]
    fn duplicate_from_file_b_fills_a_columns() {
        let row: Row = [("client_ID", "7"), ("branch", "X")].into_iter().collect();
        let columns = vec!["client_ID".to_string(), "branch".to_string()];
        let duplicate = DuplicateKey {
            side: Side::B,
            key: "7X",
            key_columns: &columns,
            key_values: vec!["7", "X"],
            row: &row,
        };
        let mut err = DetectedError::new(ErrorKind::DuplicateKeyIgnored);
        DefaultHooks
            .on_duplicate_key(&ctx(), &mut Enrichment::new(&mut err), &duplicate)
            .unwrap();
        assert_eq!(err.file_a(), Some("run1/fileB.csv"));
        assert_eq!(err.value_a(), Some("[7, X]"));
        assert_eq!(err.title_columns_a(), Some(&columns[..]));
        assert_eq!(err.file_b(), None);
        assert_eq!(err.value_b(), None);
        assert_eq!(err.title_columns_b(), None);
        assert_eq!(err.test_folder(), None);
    }
}
