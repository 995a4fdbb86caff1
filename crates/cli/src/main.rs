// twofile CLI - keyed two-file reconciliation runs

mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use twofile_recon::ReconError;

use exit_codes::{recon_exit_code, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "twofile")]
#[command(about = "Reconcile two keyed CSV files under per-field comparison rules")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Increase log detail (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare the two files named in a TOML config and write the report
    #[command(after_help = "\
Examples:
  twofile run clients.toml
  twofile run clients.toml --json
  twofile run clients.toml --base-dir /data/exports --report /tmp/clients-report.csv
  twofile -v run clients.toml

Exit codes:
  0 no differences, 1 differences found, 3 duplicates (stop_on_duplicates),
  4 column missing, 5 source error, 6 invalid config, 7 report write, 8 key column missing")]
    Run {
        /// Path to the TOML config file
        config: PathBuf,

        /// Directory the files are resolved against [default: the config file's directory]
        #[arg(long, env = "TWOFILE_BASE_DIR")]
        base_dir: Option<PathBuf>,

        /// Write the report here instead of <base-dir>/<test_folder>/<report>
        #[arg(long)]
        report: Option<PathBuf>,

        /// Print a JSON summary to stdout
        #[arg(long)]
        json: bool,
    },

    /// Parse and validate a config without reading any file
    #[command(after_help = "\
Examples:
  twofile validate clients.toml")]
    Validate {
        /// Path to the TOML config file
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("TWOFILE_COMMIT"), ")",
        "\nengine:  twofile-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TWOFILE_TARGET"),
    )
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .parse_default_env()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Run {
            config,
            base_dir,
            report,
            json,
        } => recon::cmd_run(config, base_dir, report, json),
        Commands::Validate { config } => recon::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    /// Engine error with its registry exit code and, where useful, a hint.
    pub fn recon(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::UnknownCharset(_) => Some("use a WHATWG label such as UTF-8, ISO-8859-1 or windows-1251".to_string()),
            ReconError::KeyColumnMissing { .. } => Some("check keys in [file_a]/[file_b] against the CSV header".to_string()),
            ReconError::ColumnMissing(_) => {
                Some("set column_missing = \"report\" under [policy] to record it and continue".to_string())
            }
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
