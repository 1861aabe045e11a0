//! Error taxonomy of the harness.
//!
//! Fixture-scoped errors ([`HarnessError::ExternalTool`], [`HarnessError::MalformedLog`],
//! [`HarnessError::FixtureRead`]) are recorded against the fixture and the run moves on. Everything else aborts the run.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use systest_core::LogFormatError;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("failed to walk fixture tree under {}", .root.display())]
    #[diagnostic(
        code(systest::discovery),
        help("check that --fixtures-dir points at a readable directory")
    )]
    Discovery {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("external tool failed for {}: {reason}", .source_file.display())]
    #[diagnostic(code(systest::external_tool))]
    ExternalTool { source_file: PathBuf, reason: String },

    #[error("malformed result log {}", .path.display())]
    #[diagnostic(
        code(systest::malformed_log),
        help("every `<failed>` line must sit a fixed number of lines below a line ending its case id with `</id>`")
    )]
    MalformedLog {
        path: PathBuf,
        #[source]
        source: LogFormatError,
    },

    #[error("cannot write report {}", .path.display())]
    #[diagnostic(code(systest::report))]
    Report {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read fixture file {}", .path.display())]
    #[diagnostic(code(systest::fixture_read))]
    FixtureRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl HarnessError {
    /// True for errors that only invalidate the fixture being processed.
    pub fn is_fixture_scoped(&self) -> bool {
        matches!(
            self,
            HarnessError::ExternalTool { .. } | HarnessError::MalformedLog { .. } | HarnessError::FixtureRead { .. }
        )
    }
}
