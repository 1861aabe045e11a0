//! CLI module for the systest harness
//!
//! ## Usage
//!
//! ```text
//! systest <RUN_TESTS> <KEEP_OUTPUT> [TAG] [OPTIONS]
//! ```
//!
//! `RUN_TESTS` and `KEEP_OUTPUT` are boolean-like strings: `true` (any case) enables them, every other value
//! disables them. `TAG` restricts discovery to source files starting with it.
//!
//! ## Modules
//!
//! - `harness` - Driver loop, reporter trait and run summary
//! - `harness_interfaces` - External tool boundary
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod harness;
pub mod harness_interfaces;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser};
use systest_core::{Convention, PairingRule};

use crate::config::{DEFAULT_FIXTURES_DIR, DEFAULT_MAKE_PROGRAM, DEFAULT_MAKE_TARGET, HarnessConfig};
use harness::{ConsoleReporter, HarnessDriver};
use harness_interfaces::MakeExecutor;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Run system-test fixtures through the analyzer and summarize the results
#[derive(Parser, Debug)]
#[command(name = "systest")]
#[command(version)]
#[command(about = "Run system-test fixtures through the analyzer and summarize the results", long_about = None)]
pub struct Cli {
    /// Invoke the external tool for every fixture pair ("true" to enable)
    #[arg(value_name = "RUN_TESTS", required = true, action = ArgAction::Set, value_parser = parse_flag)]
    pub run_tests: bool,

    /// Keep generated output logs after the run ("true" to keep)
    #[arg(value_name = "KEEP_OUTPUT", required = true, action = ArgAction::Set, value_parser = parse_flag)]
    pub keep_output: bool,

    /// Only pair source files starting with this tag (default: iter)
    #[arg(value_name = "TAG")]
    pub tag: Option<String>,

    /// Root of the fixture tree, relative to the working directory
    #[arg(long, value_name = "DIR", default_value = DEFAULT_FIXTURES_DIR)]
    pub fixtures_dir: PathBuf,

    /// Directory the build tool runs in
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub work_dir: PathBuf,

    /// Report file (default: <fixtures-dir>/results.txt)
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Fixture naming convention: tagged (<tag>*_source.txt) or prefixed (source_*)
    #[arg(long, value_name = "RULE", default_value = "tagged", value_parser = parse_rule)]
    pub convention: PairingRule,

    /// Report expected and completed test-case counts per fixture
    #[arg(long)]
    pub count_cases: bool,

    /// Build program to invoke
    #[arg(long = "make", value_name = "PROGRAM", default_value = DEFAULT_MAKE_PROGRAM)]
    pub make_program: String,

    /// Build target that runs the analyzer
    #[arg(long = "target", value_name = "TARGET", default_value = DEFAULT_MAKE_TARGET)]
    pub make_target: String,

    /// Show debug-level harness logs on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// `true` in any letter case is true; anything else is false.
fn parse_flag(s: &str) -> Result<bool, String> {
    Ok(s.eq_ignore_ascii_case("true"))
}

fn parse_rule(s: &str) -> Result<PairingRule, String> {
    PairingRule::from_name(s).ok_or_else(|| format!("unknown convention '{}' (expected 'tagged' or 'prefixed')", s))
}

impl Cli {
    /// Build the harness configuration these arguments describe.
    pub fn to_config(&self) -> HarnessConfig {
        let mut convention = Convention::new(self.convention).with_case_counting(self.count_cases);
        if let Some(tag) = &self.tag {
            convention = convention.with_tag(tag.clone());
        }

        let config = HarnessConfig::new()
            .with_run_tests(self.run_tests)
            .with_keep_output(self.keep_output)
            .with_work_dir(&self.work_dir)
            .with_fixtures_dir(&self.fixtures_dir)
            .with_convention(convention)
            .with_tool(&self.make_program, &self.make_target);

        match &self.report {
            Some(report) => config.with_report_path(report),
            None => config,
        }
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(filter)
        .try_init();
}

/// Execute the harness and return its exit code.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let config = cli.to_config();
    let executor = MakeExecutor::new(&config.make_program, &config.make_target);
    let mut reporter = ConsoleReporter::new();

    let summary = HarnessDriver::new(&config, &executor)
        .run(&mut reporter)
        .map_err(|e| CliError::failure(format!("{:?}", miette::Report::new(e))))?;

    if summary.has_errors() {
        // Per-fixture errors were already printed with the summary
        Err(CliError::new("", ExitCode::FAILURE))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

// ============================================================================
// Tests
// ============================================================================
