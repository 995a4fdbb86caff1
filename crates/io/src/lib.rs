// File I/O for reconciliation runs: CSV sources and the report file

pub mod charset;
pub mod csv;
pub mod report;

pub use crate::csv::CsvSource;
pub use charset::resolve_charset;
pub use report::CsvReportWriter;
