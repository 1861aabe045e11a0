//! Harness driver
//!
//! ## HarnessReporter Trait
//!
//! Console output goes through the `HarnessReporter` trait, separate from the driver loop, so tests can record
//! events and other output formats can be added by implementing the trait.
//!
//! ## Failure Boundary
//!
//! Each fixture runs inside its own boundary. A tool that fails or leaves no fresh log behind, an unreadable query
//! file, or a log that does not parse is recorded against that fixture and the run continues. Discovery and report I/O errors abort.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use systest_core::{ParsedResult, parse_log};

use super::harness_interfaces::FixtureExecutor;
use crate::config::HarnessConfig;
use crate::discovery::{FixtureDiscoverer, FixtureIndex, FixturePair};
use crate::errors::HarnessError;
use crate::report::ReportWriter;

// ============================================================================
// Harness Reporter Trait
// ============================================================================

/// Trait for reporting harness progress.
pub trait HarnessReporter {
    /// Called once discovery has paired every fixture
    fn on_discovery_complete(&mut self, index: &FixtureIndex);

    /// Called before the external tool runs for a fixture
    fn on_fixture_start(&mut self, pair: &FixturePair);

    /// Called after a fixture has been run and parsed (or failed)
    fn on_fixture_complete(&mut self, pair: &FixturePair, outcome: &FixtureOutcome);

    /// Called when the run is over
    fn on_run_complete(&mut self, summary: &HarnessSummary);
}

/// Result of processing one fixture.
#[derive(Debug)]
pub enum FixtureOutcome {
    /// The log was parsed and a report block written
    Reported(ParsedResult),
    /// The fixture could not be processed
    Failed(HarnessError),
}

/// Summary of a harness run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarnessSummary {
    /// Fixture pairs found by discovery
    pub discovered: usize,
    /// Source files without a query companion
    pub unmatched: usize,
    /// Fixtures with a report block
    pub reported: usize,
    /// Reported fixtures without failed cases
    pub passed: usize,
    /// Failed cases across all reported fixtures
    pub failed_cases: usize,
    /// Fixtures lost to a tool failure or malformed log
    pub errored: usize,
    /// Output logs deleted during cleanup
    pub outputs_removed: usize,
    pub duration: Duration,
}

impl HarnessSummary {
    /// True when some fixture could not be processed.
    pub fn has_errors(&self) -> bool {
        self.errored > 0
    }
}

/// Default console reporter
#[derive(Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

impl HarnessReporter for ConsoleReporter {
    fn on_discovery_complete(&mut self, index: &FixtureIndex) {
        for pair in index.pairs() {
            println!("{}", pair.source_path().display());
        }
        println!(
            "collected {} fixture pair(s) in {} director{}",
            index.len(),
            index.groups().len(),
            if index.groups().len() == 1 { "y" } else { "ies" }
        );
    }

    fn on_fixture_start(&mut self, pair: &FixturePair) {
        println!("{} {} {}", pair.source_file, pair.query_file, pair.prefix);
    }

    fn on_fixture_complete(&mut self, pair: &FixturePair, outcome: &FixtureOutcome) {
        let status = match outcome {
            FixtureOutcome::Reported(result) if result.all_passed() => "\x1b[32mPASSED\x1b[0m".to_string(),
            FixtureOutcome::Reported(result) => {
                format!("\x1b[31mFAILED\x1b[0m ({} case(s))", result.failed_count())
            }
            FixtureOutcome::Failed(_) => "\x1b[31mERROR\x1b[0m".to_string(),
        };
        println!("{} {}", pair.source_path().display(), status);

        if let FixtureOutcome::Failed(err) = outcome {
            eprintln!("\x1b[31m{}\x1b[0m", err);
            if let Some(source) = std::error::Error::source(err) {
                eprintln!("  caused by: {}", source);
            }
        }
    }

    fn on_run_complete(&mut self, summary: &HarnessSummary) {
        let color = if summary.failed_cases > 0 || summary.has_errors() {
            "\x1b[1;31m"
        } else {
            "\x1b[1;32m"
        };

        let mut parts = vec![format!("{} reported", summary.reported)];
        if summary.passed > 0 {
            parts.push(format!("{} passed", summary.passed));
        }
        if summary.failed_cases > 0 {
            parts.push(format!("{} failed case(s)", summary.failed_cases));
        }
        if summary.errored > 0 {
            parts.push(format!("{} error(s)", summary.errored));
        }
        if summary.unmatched > 0 {
            parts.push(format!("{} unmatched", summary.unmatched));
        }

        println!();
        println!(
            "{}====== {} in {:.2}s ======\x1b[0m",
            color,
            parts.join(", "),
            summary.duration.as_secs_f64()
        );
    }
}

// ============================================================================
// Driver
// ============================================================================

/// Drives discovery, execution, parsing, reporting and cleanup for one run.
pub struct HarnessDriver<'a> {
    config: &'a HarnessConfig,
    executor: &'a dyn FixtureExecutor,
}

impl<'a> HarnessDriver<'a> {
    pub fn new(config: &'a HarnessConfig, executor: &'a dyn FixtureExecutor) -> Self {
        Self { config, executor }
    }

    /// Run the harness.
    ///
    /// ## Errors
    ///
    /// Returns an error when discovery fails or the report cannot be written. Fixture failures are counted in
    /// the summary instead.
    #[tracing::instrument(skip_all, fields(root = %self.config.fixtures_root().display()))]
    pub fn run(&self, reporter: &mut dyn HarnessReporter) -> Result<HarnessSummary, HarnessError> {
        let start = Instant::now();
        let root = self.config.fixtures_root();

        let index = FixtureDiscoverer::new(self.config.convention.clone()).discover(&root, &self.config.work_dir)?;
        reporter.on_discovery_complete(&index);

        let mut summary = HarnessSummary {
            discovered: index.len(),
            unmatched: index.unmatched().len(),
            ..HarnessSummary::default()
        };

        let mut outputs = Vec::new();
        let result = self.process_all(&index, reporter, &mut summary, &mut outputs);

        if !self.config.keep_output {
            summary.outputs_removed = remove_outputs(&outputs);
        }
        result?;

        summary.duration = start.elapsed();
        tracing::info!(
            reported = summary.reported,
            errored = summary.errored,
            failed_cases = summary.failed_cases,
            "harness run finished"
        );
        reporter.on_run_complete(&summary);
        Ok(summary)
    }

    /// Process every fixture in discovery order, writing the report as it goes.
    fn process_all(
        &self,
        index: &FixtureIndex,
        reporter: &mut dyn HarnessReporter,
        summary: &mut HarnessSummary,
        outputs: &mut Vec<PathBuf>,
    ) -> Result<(), HarnessError> {
        let mut report = ReportWriter::create(&self.config.report_file())?;

        if !self.config.run_tests {
            tracing::debug!("external tool disabled; report left empty");
            return report.finish();
        }

        for pair in index.pairs() {
            reporter.on_fixture_start(pair);
            outputs.push(self.config.work_dir.join(pair.output_path()));

            let outcome = match self.run_fixture(pair) {
                Ok(result) => {
                    report.append(pair, &result, self.config.convention.count_cases)?;
                    summary.reported += 1;
                    summary.failed_cases += result.failed_count();
                    if result.all_passed() {
                        summary.passed += 1;
                    }
                    FixtureOutcome::Reported(result)
                }
                Err(err) if err.is_fixture_scoped() => {
                    tracing::warn!(source = %pair.source_path().display(), error = %err, "fixture failed");
                    summary.errored += 1;
                    FixtureOutcome::Failed(err)
                }
                Err(err) => return Err(err),
            };
            reporter.on_fixture_complete(pair, &outcome);
        }

        report.finish()
    }

    /// Run the tool for one fixture and parse its log.
    fn run_fixture(&self, pair: &FixturePair) -> Result<ParsedResult, HarnessError> {
        let work_dir = &self.config.work_dir;
        let log_path = work_dir.join(pair.output_path());

        // A log left by an earlier run must not stand in for this one
        match fs::remove_file(&log_path) {
            Ok(()) => tracing::debug!(path = %log_path.display(), "removed stale output log"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(HarnessError::ExternalTool {
                    source_file: pair.source_path(),
                    reason: format!("cannot remove stale output log {}: {}", pair.output_path().display(), e),
                });
            }
        }

        self.executor.execute(pair, work_dir)?;

        let log_text = fs::read_to_string(&log_path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => HarnessError::ExternalTool {
                source_file: pair.source_path(),
                reason: format!("no output log at {}", pair.output_path().display()),
            },
            _ => HarnessError::ExternalTool {
                source_file: pair.source_path(),
                reason: format!("cannot read output log {}: {}", pair.output_path().display(), e),
            },
        })?;

        let query_text = if self.config.convention.count_cases {
            let query_path = work_dir.join(pair.query_path());
            let text = fs::read_to_string(&query_path).map_err(|source| HarnessError::FixtureRead {
                path: pair.query_path(),
                source,
            })?;
            Some(text)
        } else {
            None
        };

        parse_log(&log_text, query_text.as_deref(), &self.config.layout).map_err(|source| HarnessError::MalformedLog {
            path: pair.output_path(),
            source,
        })
    }
}

/// Delete every output log that still exists; returns how many were removed.
fn remove_outputs(outputs: &[PathBuf]) -> usize {
    let mut removed = 0;
    for path in outputs {
        if !path.exists() {
            continue;
        }
        match fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not remove output log"),
        }
    }
    removed
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write(path: &Path, text: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn test_remove_outputs_skips_missing_files() {
        let tmp = tempfile::tempdir().unwrap();
        let present = tmp.path().join("a_out.txt");
        let missing = tmp.path().join("b_out.txt");
        write(&present, "log");

        assert_eq!(remove_outputs(&[present.clone(), missing]), 1);
        assert!(!present.exists());
    }

    #[test]
    fn test_summary_has_errors() {
        let summary = HarnessSummary {
            errored: 1,
            ..HarnessSummary::default()
        };
        assert!(summary.has_errors());
        assert!(!HarnessSummary::default().has_errors());
    }
}
