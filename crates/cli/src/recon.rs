//! `twofile run` / `twofile validate`: config-driven two-file reconciliation.

use std::path::{Path, PathBuf};

use serde::Serialize;
use twofile_io::{CsvReportWriter, CsvSource};
use twofile_recon::engine::{RunOutcome, RunSummary};
use twofile_recon::{DetectedError, ReconConfig, ReconError};

use crate::exit_codes::EXIT_DIFFERENCES;
use crate::CliError;

/// JSON summary printed with `--json`.
#[derive(Serialize)]
struct RunJson<'a> {
    name: &'a str,
    engine_version: &'a str,
    run_at: &'a str,
    status: &'static str,
    file_a: &'a str,
    file_b: &'a str,
    report: Option<String>,
    summary: &'a RunSummary,
    errors: &'a [DetectedError],
}

fn load_config(config_path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| CliError::usage(format!("cannot read config {}: {e}", config_path.display())))?;
    ReconConfig::from_toml(&config_str).map_err(CliError::recon)
}

/// Files are resolved relative to the config file's directory by default.
fn config_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn cmd_run(
    config_path: PathBuf,
    base_dir: Option<PathBuf>,
    report: Option<PathBuf>,
    json_output: bool,
) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let base_dir = base_dir.unwrap_or_else(|| config_dir(&config_path));
    let report_path = report.unwrap_or_else(|| base_dir.join(&config.test_folder).join(&config.report));

    let run_config = config.to_run_config();
    let source = CsvSource::new(&base_dir);
    let mut writer = CsvReportWriter::new(&report_path, &config.report_charset).map_err(CliError::recon)?;

    log::info!(
        "{}: comparing {} with {}",
        config.name,
        config.file_a.file,
        config.file_b.file
    );

    let outcome = match twofile_recon::run(&run_config, &source, &mut writer) {
        Ok(outcome) => outcome,
        Err(err @ ReconError::DuplicatesFound { .. }) => {
            return Err(CliError::recon(err).with_hint(format!(
                "duplicates are listed in {}; set stop_on_duplicates = false to compare anyway",
                report_path.display()
            )));
        }
        Err(err) => return Err(CliError::recon(err)),
    };

    let report_written = (!outcome.is_clean()).then(|| report_path.display().to_string());

    if json_output {
        print_json(&config, &outcome, report_written.clone())?;
    }
    print_summary(&config.name, &outcome, report_written.as_deref());

    if outcome.is_clean() {
        Ok(())
    } else {
        Err(CliError::new(EXIT_DIFFERENCES, "differences found"))
    }
}

fn print_json(config: &ReconConfig, outcome: &RunOutcome, report: Option<String>) -> Result<(), CliError> {
    let doc = RunJson {
        name: &outcome.meta.name,
        engine_version: &outcome.meta.engine_version,
        run_at: &outcome.meta.run_at,
        status: if outcome.is_clean() { "clean" } else { "differences" },
        file_a: &config.file_a.file,
        file_b: &config.file_b.file,
        report,
        summary: &outcome.summary,
        errors: &outcome.errors,
    };
    let json_str = serde_json::to_string_pretty(&doc)
        .map_err(|e| CliError::new(EXIT_DIFFERENCES, format!("JSON serialization error: {e}")))?;
    println!("{json_str}");
    Ok(())
}

/// Human summary to stderr.
fn print_summary(name: &str, outcome: &RunOutcome, report: Option<&str>) {
    let s = &outcome.summary;
    eprintln!(
        "{name}: A {} row(s), {} key(s); B {} row(s), {} key(s)",
        s.rows_a, s.keys_a, s.rows_b, s.keys_b
    );
    if outcome.is_clean() {
        eprintln!("no differences");
        return;
    }
    eprintln!(
        "{} difference(s): {} value mismatches, {} missing in A, {} missing in B, {} duplicates, {} columns missing",
        s.total, s.value_mismatches, s.missing_in_a, s.missing_in_b, s.duplicates, s.column_missing
    );
    if let Some(report) = report {
        eprintln!("report: {report}");
    }
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    println!(
        "{}: {} [{}] vs {} [{}], {} rule(s), report {}",
        config.name,
        config.file_a.file,
        config.file_a.keys.join(", "),
        config.file_b.file,
        config.file_b.keys.join(", "),
        config.rules.len(),
        config.report
    );
    Ok(())
}
