#![forbid(unsafe_code)]
//! Fixture-driven system-test harness
//!
//! `systest` finds pairs of source and query fixtures in a directory tree, runs an external analyzer build target
//! once per pair, parses the result log the analyzer writes and collects one report block per fixture.
//!
//! The pure pieces (naming conventions, log grammar, report wording) live in the `systest_core` crate; this crate
//! owns the filesystem walk, the external process, the report file and the CLI.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **True invariants**: use `.expect("INVARIANT: reason")` with a clear explanation.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod report;

pub use cli::harness::{ConsoleReporter, FixtureOutcome, HarnessDriver, HarnessReporter, HarnessSummary};
pub use cli::harness_interfaces::{FixtureExecutor, MakeExecutor};
pub use config::HarnessConfig;
pub use discovery::{DirectoryGroup, FixtureDiscoverer, FixtureIndex, FixturePair};
pub use errors::HarnessError;
pub use report::ReportWriter;
