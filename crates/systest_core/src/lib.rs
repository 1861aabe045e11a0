//! Provide the pure, deterministic pieces of the systest harness.
//!
//! This crate holds everything the harness decides without touching the filesystem or spawning processes:
//! - fixture naming conventions (which file is a source, what its query companion is called),
//! - the result-log grammar (case-id extraction, failure attribution, query-file case counting),
//! - the wording of report lines.
//!
//! ## Notes
//!
//! - **No IO**, no global mutable state. The `systest` crate owns directory walking, process spawning and the
//!   report file; it feeds text and file names into the helpers here.

pub mod conventions;
pub mod log;
pub mod report;

pub use conventions::{Convention, PairingRule, SourceMatch};
pub use log::{LogFormatError, LogLayout, ParsedResult, expected_case_count, extract_case_id, parse_log};
