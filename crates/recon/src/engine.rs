use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::detected::{DetectedError, ErrorKind};
use crate::error::ReconError;
use crate::hooks::{DefaultHooks, DifferenceHooks, RunContext};
use crate::index::KeyedRowIndex;
use crate::key::{KeyOrder, KeySpec};
use crate::matcher::compare;
use crate::model::{Row, Side};
use crate::report::{render_line, ReportSink};
use crate::rule::ComparisonRule;

/// Charset used for sources and the report unless configured otherwise.
pub const DEFAULT_CHARSET: &str = "ISO-8859-1";

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// One input file and how its rows are keyed.
#[derive(Debug, Clone)]
pub struct SideSpec {
    pub file: String,
    pub key: KeySpec,
    pub charset: String,
}

impl SideSpec {
    pub fn new(file: impl Into<String>, key: KeySpec) -> Self {
        Self {
            file: file.into(),
            key,
            charset: DEFAULT_CHARSET.to_string(),
        }
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }
}

/// Everything a run needs, fixed before it starts.
#[derive(Clone)]
pub struct RunConfig {
    pub name: String,
    pub test_folder: String,
    pub side_a: SideSpec,
    pub side_b: SideSpec,
    pub key_order: KeyOrder,
    pub rules: Vec<ComparisonRule>,
    pub hooks: Arc<dyn DifferenceHooks>,
}

impl RunConfig {
    pub fn new(side_a: SideSpec, side_b: SideSpec, rules: Vec<ComparisonRule>) -> Self {
        Self {
            name: "twofile".to_string(),
            test_folder: String::new(),
            side_a,
            side_b,
            key_order: KeyOrder::default(),
            rules,
            hooks: Arc::new(DefaultHooks),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_test_folder(mut self, folder: impl Into<String>) -> Self {
        self.test_folder = folder.into();
        self
    }

    pub fn with_key_order(mut self, order: KeyOrder) -> Self {
        self.key_order = order;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn DifferenceHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn side(&self, side: Side) -> &SideSpec {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }

    pub fn context(&self) -> RunContext {
        RunContext {
            file_a: self.side_a.file.clone(),
            file_b: self.side_b.file.clone(),
            test_folder: self.test_folder.clone(),
            key_columns_a: self.side_a.key.columns.clone(),
            key_columns_b: self.side_b.key.columns.clone(),
        }
    }
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("name", &self.name)
            .field("test_folder", &self.test_folder)
            .field("side_a", &self.side_a)
            .field("side_b", &self.side_b)
            .field("key_order", &self.key_order)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Row source
// ---------------------------------------------------------------------------

/// Where one side's rows come from.
#[derive(Debug, Clone, Copy)]
pub struct SourceRef<'a> {
    pub folder: &'a str,
    pub file: &'a str,
    pub charset: &'a str,
}

pub trait RowSource {
    fn read_rows(&self, source: &SourceRef<'_>) -> Result<Vec<Row>, ReconError>;
}

/// Rows keyed by file label, for code-built runs.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<Row>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, file: impl Into<String>, rows: Vec<Row>) -> Self {
        self.files.insert(file.into(), rows);
        self
    }
}

impl RowSource for MemorySource {
    fn read_rows(&self, source: &SourceRef<'_>) -> Result<Vec<Row>, ReconError> {
        self.files
            .get(source.file)
            .cloned()
            .ok_or_else(|| ReconError::SourceNotFound {
                path: format!("{}{}", source.folder, source.file),
            })
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub name: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub rows_a: usize,
    pub rows_b: usize,
    pub keys_a: usize,
    pub keys_b: usize,
    pub duplicates: usize,
    pub missing_in_a: usize,
    pub missing_in_b: usize,
    pub value_mismatches: usize,
    pub column_missing: usize,
    pub total: usize,
}

impl RunSummary {
    fn count(&mut self, errors: &[DetectedError]) {
        for error in errors {
            match error.kind() {
                ErrorKind::DuplicateKeyIgnored => self.duplicates += 1,
                ErrorKind::KeyMissingInOther { side: Side::A } => self.missing_in_a += 1,
                ErrorKind::KeyMissingInOther { side: Side::B } => self.missing_in_b += 1,
                ErrorKind::ValueMismatch => self.value_mismatches += 1,
                ErrorKind::ColumnMissing => self.column_missing += 1,
            }
        }
        self.total = errors.len();
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub meta: RunMeta,
    pub summary: RunSummary,
    pub errors: Vec<DetectedError>,
}

impl RunOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Read both sides, index them, apply the duplicate policy, compare, and
/// hand the findings to `sink`. A clean run writes no report.
pub fn run(
    config: &RunConfig,
    source: &dyn RowSource,
    sink: &mut dyn ReportSink,
) -> Result<RunOutcome, ReconError> {
    let ctx = config.context();
    let hooks = config.hooks.as_ref();
    let mut summary = RunSummary::default();

    let rows_a = read_side(config, Side::A, source)?;
    let rows_b = read_side(config, Side::B, source)?;
    summary.rows_a = rows_a.len();
    summary.rows_b = rows_b.len();

    let (index_a, mut errors) =
        KeyedRowIndex::build(rows_a, Side::A, &config.side_a.key, &config.key_order, hooks, &ctx)?;
    let (index_b, duplicates_b) =
        KeyedRowIndex::build(rows_b, Side::B, &config.side_b.key, &config.key_order, hooks, &ctx)?;
    errors.extend(duplicates_b);
    summary.keys_a = index_a.len();
    summary.keys_b = index_b.len();

    if !errors.is_empty() && hooks.should_stop_on_duplicates_found() {
        log_findings(&errors);
        sink.write_report(&errors)?;
        return Err(ReconError::DuplicatesFound { count: errors.len() });
    }

    errors.extend(compare(&index_a, &index_b, &config.rules, hooks, &ctx)?);
    summary.count(&errors);

    if errors.is_empty() {
        log::info!("No differences were found");
    } else {
        log_findings(&errors);
        sink.write_report(&errors)?;
    }

    Ok(RunOutcome {
        meta: RunMeta {
            name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        errors,
    })
}

fn read_side(config: &RunConfig, side: Side, source: &dyn RowSource) -> Result<Vec<Row>, ReconError> {
    let spec = config.side(side);
    let rows = source.read_rows(&SourceRef {
        folder: &config.test_folder,
        file: &spec.file,
        charset: &spec.charset,
    })?;
    log::debug!("file {side} ({}): {} row(s) read", spec.file, rows.len());
    Ok(rows)
}

fn log_findings(errors: &[DetectedError]) {
    log::warn!("{} difference(s) found", errors.len());
    for (i, error) in errors.iter().enumerate() {
        log::debug!("{}", render_line(i + 1, error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::PolicyHooks;
    use crate::report::MemoryReport;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs.iter().copied().collect()
    }

    fn config() -> RunConfig {
        RunConfig::new(
            SideSpec::new("a.csv", KeySpec::single("id")),
            SideSpec::new("b.csv", KeySpec::single("id")),
            vec![ComparisonRule::single("v", "v")],
        )
    }

    #[test]
    fn clean_run_writes_no_report() {
        let source = MemorySource::new()
            .with_file("a.csv", vec![row(&[("id", "1"), ("v", "x")])])
            .with_file("b.csv", vec![row(&[("id", "1"), ("v", "x")])]);
        let mut sink = MemoryReport::default();
        let outcome = run(&config(), &source, &mut sink).unwrap();
        assert!(outcome.is_clean());
        assert_eq!(sink.writes, 0);
        assert_eq!(outcome.summary.keys_a, 1);
    }

    #[test]
    fn findings_are_ordered_duplicates_first() {
        let source = MemorySource::new()
            .with_file(
                "a.csv",
                vec![
                    row(&[("id", "1"), ("v", "x")]),
                    row(&[("id", "2"), ("v", "x")]),
                    row(&[("id", "2"), ("v", "y")]),
                ],
            )
            .with_file(
                "b.csv",
                vec![row(&[("id", "1"), ("v", "z")]), row(&[("id", "3"), ("v", "x")])],
            );
        let mut sink = MemoryReport::default();
        let outcome = run(&config(), &source, &mut sink).unwrap();
        let kinds: Vec<_> = outcome.errors.iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ErrorKind::DuplicateKeyIgnored,
                ErrorKind::DuplicateKeyIgnored,
                ErrorKind::ValueMismatch,
                ErrorKind::KeyMissingInOther { side: Side::A },
            ]
        );
        assert_eq!(outcome.summary.duplicates, 2);
        assert_eq!(outcome.summary.total, 4);
        assert_eq!(sink.lines.len(), 5);
        assert_eq!(outcome.meta.engine_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn duplicate_stop_writes_then_fails() {
        let source = MemorySource::new()
            .with_file("a.csv", vec![row(&[("id", "1"), ("v", "x")])])
            .with_file(
                "b.csv",
                vec![row(&[("id", "9"), ("v", "x")]), row(&[("id", "9"), ("v", "y")])],
            );
        let hooks = PolicyHooks {
            stop_on_duplicates: true,
            ..Default::default()
        };
        let config = config().with_test_folder("run1/").with_hooks(Arc::new(hooks));
        let mut sink = MemoryReport::default();
        let err = run(&config, &source, &mut sink).unwrap_err();
        assert!(matches!(err, ReconError::DuplicatesFound { count: 2 }));
        assert_eq!(sink.writes, 1);
        // Header plus the two duplicates; no join results.
        assert_eq!(sink.lines.len(), 3);
        assert_eq!(sink.lines[1], "1,Duplication is found: value is ignored,,[9],[id],run1/b.csv,,,,,");
        assert_eq!(sink.lines[2], "2,Duplication is found: value is ignored,,[9],[id],run1/b.csv,,,,,");
    }

    #[test]
    fn duplicate_stop_without_duplicates_runs_the_join() {
        let source = MemorySource::new()
            .with_file("a.csv", vec![row(&[("id", "1"), ("v", "x")])])
            .with_file("b.csv", vec![]);
        let config = config().with_hooks(Arc::new(PolicyHooks {
            stop_on_duplicates: true,
            ..Default::default()
        }));
        let outcome = run(&config, &source, &mut MemoryReport::default()).unwrap();
        assert_eq!(outcome.summary.missing_in_b, 1);
    }

    #[test]
    fn missing_source_is_fatal() {
        let source = MemorySource::new().with_file("a.csv", vec![]);
        let err = run(&config().with_test_folder("dir/"), &source, &mut MemoryReport::default()).unwrap_err();
        assert!(matches!(err, ReconError::SourceNotFound { ref path } if path == "dir/b.csv"));
    }
}
