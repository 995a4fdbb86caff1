//! `twofile-recon`: Keyed two-source reconciliation engine.
//!
//! Indexes two row sets by composite key, joins them, and evaluates
//! per-field comparison rules, producing an ordered list of findings.
//! Reading and writing files is left to the `RowSource` and `ReportSink`
//! implementations of the caller.

pub mod config;
pub mod detected;
pub mod engine;
pub mod error;
pub mod hooks;
pub mod index;
pub mod key;
pub mod matcher;
pub mod model;
pub mod report;
pub mod rule;

pub use config::ReconConfig;
pub use detected::{DetectedError, Enrichment, ErrorKind};
pub use engine::{run, RowSource, RunConfig, RunOutcome, SideSpec, SourceRef, DEFAULT_CHARSET};
pub use error::ReconError;
pub use hooks::{DefaultHooks, DifferenceHooks, PolicyHooks, RunContext};
pub use index::KeyedRowIndex;
pub use key::{KeyOrder, KeySpec};
pub use matcher::compare;
pub use model::{Row, Side};
pub use report::{ReportSink, REPORT_HEADER};
pub use rule::{ComparisonRule, ValueExtractor, ValuePredicate};
