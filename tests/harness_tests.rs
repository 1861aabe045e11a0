//! End-to-end tests of the harness driver with a scripted executor.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use systest::{
    FixtureExecutor, FixtureIndex, FixtureOutcome, FixturePair, HarnessConfig, HarnessDriver, HarnessError,
    HarnessReporter, HarnessSummary,
};
use systest_core::{Convention, LogLayout, PairingRule};
use tempfile::TempDir;

/// Writes a canned log per fixture prefix; prefixes without a log leave no output behind.
#[derive(Default)]
struct ScriptedExecutor {
    logs: HashMap<String, String>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedExecutor {
    fn with_log(mut self, prefix: &str, log: String) -> Self {
        self.logs.insert(prefix.to_string(), log);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl FixtureExecutor for ScriptedExecutor {
    fn execute(&self, pair: &FixturePair, work_dir: &Path) -> Result<(), HarnessError> {
        self.calls.borrow_mut().push(pair.source_path().display().to_string());
        if let Some(log) = self.logs.get(&pair.prefix) {
            fs::write(work_dir.join(pair.output_path()), log).unwrap();
        }
        Ok(())
    }
}

#[derive(Default)]
struct RecordingReporter {
    discovered: usize,
    started: Vec<String>,
    outcomes: Vec<(String, bool)>,
    finished: Option<HarnessSummary>,
}

impl HarnessReporter for RecordingReporter {
    fn on_discovery_complete(&mut self, index: &FixtureIndex) {
        self.discovered = index.len();
    }

    fn on_fixture_start(&mut self, pair: &FixturePair) {
        self.started.push(pair.prefix.clone());
    }

    fn on_fixture_complete(&mut self, pair: &FixturePair, outcome: &FixtureOutcome) {
        let ok = matches!(outcome, FixtureOutcome::Reported(_));
        self.outcomes.push((pair.prefix.clone(), ok));
    }

    fn on_run_complete(&mut self, summary: &HarnessSummary) {
        self.finished = Some(summary.clone());
    }
}

fn record(id: u64, failed: bool) -> String {
    let status = if failed { "<failed>" } else { "<passed/>" };
    format!(
        "<query>\n<id ReturnTuple=\"1\">{id}</id><querystr><![CDATA[assign a; Select a]]></querystr>\n\
         <stuans>1</stuans>\n<correct>1</correct>\n<time_taken>2.0</time_taken>\n{status}\n</query>\n"
    )
}

fn log(cases: &[(u64, bool)]) -> String {
    let body: String = cases.iter().map(|(id, failed)| record(*id, *failed)).collect();
    format!("<test_results>\n<queries>\n{body}</queries>\n</test_results>\n")
}

fn touch(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

/// Tests05/{follows,parent} with two tagged pairs and one unmatched source.
fn fixture_tree() -> TempDir {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let query_block = "1 - comment\nstmt s;\nSelect s\n1\n5000\n";
    touch(root, "Tests05/follows/iter1_source.txt", "procedure p { x = 1; }\n");
    touch(root, "Tests05/follows/iter1_queries.txt", &query_block.repeat(2));
    touch(root, "Tests05/follows/iter2_source.txt", "procedure p { y = 2; }\n");
    touch(root, "Tests05/follows/iter2_queries.txt", &query_block.repeat(3));
    touch(root, "Tests05/parent/iter3_source.txt", "procedure q { z = 3; }\n");
    touch(root, "Tests05/notes.txt", "not a fixture\n");
    tmp
}

fn config(tmp: &TempDir) -> HarnessConfig {
    HarnessConfig::new()
        .with_work_dir(tmp.path())
        .with_fixtures_dir("Tests05")
        .with_run_tests(true)
        .with_keep_output(false)
}

fn report_text(tmp: &TempDir) -> String {
    fs::read_to_string(tmp.path().join("Tests05/results.txt")).unwrap()
}

#[test]
fn test_report_has_one_block_per_fixture_in_discovery_order() {
    let tmp = fixture_tree();
    let executor = ScriptedExecutor::default()
        .with_log("iter1", log(&[(1, false), (2, true)]))
        .with_log("iter2", log(&[(1, true), (2, true), (3, true)]));
    let config = config(&tmp);
    let mut reporter = RecordingReporter::default();

    let summary = HarnessDriver::new(&config, &executor).run(&mut reporter).unwrap();

    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.unmatched, 1);
    assert_eq!(summary.reported, 2);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed_cases, 1);
    assert!(!summary.has_errors());

    assert_eq!(
        report_text(&tmp),
        "Directory path: Tests05/follows\n\
         Source file: Tests05/follows/iter1_source.txt\n\
         Queries file: Tests05/follows/iter1_queries.txt\n\
         Failed TCs: 1\n\
         Number of Failed TC: 1\n\n\
         Directory path: Tests05/follows\n\
         Source file: Tests05/follows/iter2_source.txt\n\
         Queries file: Tests05/follows/iter2_queries.txt\n\
         All test cases passed\n\
         Number of Failed TC: 0\n\n"
    );
    assert_eq!(reporter.started, vec!["iter1", "iter2"]);
    assert_eq!(reporter.finished, Some(summary));
}

#[test]
fn test_execution_disabled_leaves_empty_report_and_runs_nothing() {
    let tmp = fixture_tree();
    let executor = ScriptedExecutor::default().with_log("iter1", log(&[(1, true)]));
    let config = config(&tmp).with_run_tests(false);
    let mut reporter = RecordingReporter::default();

    let summary = HarnessDriver::new(&config, &executor).run(&mut reporter).unwrap();

    assert!(executor.calls().is_empty());
    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.reported, 0);
    assert_eq!(report_text(&tmp), "");
    assert!(reporter.started.is_empty());
}

#[test]
fn test_outputs_removed_when_not_kept() {
    let tmp = fixture_tree();
    let executor = ScriptedExecutor::default()
        .with_log("iter1", log(&[(1, true)]))
        .with_log("iter2", log(&[(1, true)]));
    let config = config(&tmp).with_keep_output(false);

    let summary = HarnessDriver::new(&config, &executor)
        .run(&mut RecordingReporter::default())
        .unwrap();

    assert_eq!(summary.outputs_removed, 2);
    assert!(!tmp.path().join("Tests05/follows/iter1_out.txt").exists());
    assert!(!tmp.path().join("Tests05/follows/iter2_out.txt").exists());
}

#[test]
fn test_outputs_kept_when_requested() {
    let tmp = fixture_tree();
    let executor = ScriptedExecutor::default()
        .with_log("iter1", log(&[(1, true)]))
        .with_log("iter2", log(&[(1, true)]));
    let config = config(&tmp).with_keep_output(true);

    let summary = HarnessDriver::new(&config, &executor)
        .run(&mut RecordingReporter::default())
        .unwrap();

    assert_eq!(summary.outputs_removed, 0);
    assert!(tmp.path().join("Tests05/follows/iter1_out.txt").exists());
    assert!(tmp.path().join("Tests05/follows/iter2_out.txt").exists());
}

#[test]
fn test_missing_output_log_is_recorded_and_run_continues() {
    let tmp = fixture_tree();
    // iter1 produces no log at all
    let executor = ScriptedExecutor::default().with_log("iter2", log(&[(4, false)]));
    let config = config(&tmp);
    let mut reporter = RecordingReporter::default();

    let summary = HarnessDriver::new(&config, &executor).run(&mut reporter).unwrap();

    assert_eq!(executor.calls().len(), 2);
    assert_eq!(summary.errored, 1);
    assert_eq!(summary.reported, 1);
    assert!(summary.has_errors());
    assert_eq!(
        reporter.outcomes,
        vec![("iter1".to_string(), false), ("iter2".to_string(), true)]
    );

    let report = report_text(&tmp);
    assert!(!report.contains("iter1_source.txt"));
    assert!(report.contains("Failed TCs: 4\n"));
}

#[test]
fn test_leftover_log_from_earlier_run_is_not_reported() {
    let tmp = fixture_tree();
    touch(tmp.path(), "Tests05/follows/iter1_out.txt", &log(&[(1, false)]));
    touch(tmp.path(), "Tests05/follows/iter2_out.txt", &log(&[(1, true)]));
    // the tool succeeds but writes nothing
    let executor = ScriptedExecutor::default();
    let config = config(&tmp).with_keep_output(true);
    let mut reporter = RecordingReporter::default();

    let summary = HarnessDriver::new(&config, &executor).run(&mut reporter).unwrap();

    assert_eq!(summary.reported, 0);
    assert_eq!(summary.errored, 2);
    assert_eq!(
        reporter.outcomes,
        vec![("iter1".to_string(), false), ("iter2".to_string(), false)]
    );
    assert_eq!(report_text(&tmp), "");
    assert!(!tmp.path().join("Tests05/follows/iter1_out.txt").exists());
}

#[test]
fn test_unreadable_query_file_is_recorded_and_run_continues() {
    let tmp = fixture_tree();
    fs::write(tmp.path().join("Tests05/follows/iter1_queries.txt"), [0xff, 0xfe, 0x00]).unwrap();
    let executor = ScriptedExecutor::default()
        .with_log("iter1", log(&[(1, true)]))
        .with_log("iter2", log(&[(1, true)]));
    let config = config(&tmp).with_convention(Convention::default().with_case_counting(true));
    let mut reporter = RecordingReporter::default();

    let summary = HarnessDriver::new(&config, &executor).run(&mut reporter).unwrap();

    assert_eq!(executor.calls().len(), 2);
    assert_eq!(summary.errored, 1);
    assert_eq!(summary.reported, 1);
    assert_eq!(
        reporter.outcomes,
        vec![("iter1".to_string(), false), ("iter2".to_string(), true)]
    );
    assert!(report_text(&tmp).contains("Source file: Tests05/follows/iter2_source.txt\n"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_report_write_failure_aborts_and_cleans_up_produced_logs() {
    let tmp = fixture_tree();
    let executor = ScriptedExecutor::default()
        .with_log("iter1", log(&[(1, true)]))
        .with_log("iter2", log(&[(1, true)]));
    // opens fine, every write fails with ENOSPC
    let config = config(&tmp).with_report_path("/dev/full");

    let err = HarnessDriver::new(&config, &executor)
        .run(&mut RecordingReporter::default())
        .unwrap_err();

    assert!(matches!(err, HarnessError::Report { .. }));
    assert_eq!(executor.calls(), vec!["Tests05/follows/iter1_source.txt".to_string()]);
    assert!(!tmp.path().join("Tests05/follows/iter1_out.txt").exists());
    assert!(!tmp.path().join("Tests05/follows/iter2_out.txt").exists());
}

#[test]
fn test_malformed_log_is_recorded_and_its_output_still_cleaned() {
    let tmp = fixture_tree();
    let executor = ScriptedExecutor::default()
        .with_log("iter1", log(&[(1, false)]).replace(">1</id>", ">one</id>"))
        .with_log("iter2", log(&[(1, true)]));
    let config = config(&tmp);

    let summary = HarnessDriver::new(&config, &executor)
        .run(&mut RecordingReporter::default())
        .unwrap();

    assert_eq!(summary.errored, 1);
    assert_eq!(summary.reported, 1);
    assert_eq!(summary.outputs_removed, 2);
    assert!(!tmp.path().join("Tests05/follows/iter1_out.txt").exists());
}

#[test]
fn test_case_counting_adds_expected_and_completed_lines() {
    let tmp = fixture_tree();
    let executor = ScriptedExecutor::default()
        .with_log("iter1", log(&[(1, true)]))
        .with_log("iter2", log(&[(1, true), (2, false), (3, true)]));
    let config = config(&tmp).with_convention(Convention::default().with_case_counting(true));

    HarnessDriver::new(&config, &executor)
        .run(&mut RecordingReporter::default())
        .unwrap();

    let report = report_text(&tmp);
    let blocks: Vec<&str> = report.split("\n\n").filter(|b| !b.is_empty()).collect();
    assert_eq!(blocks.len(), 2);
    assert!(blocks[0].contains("Number of Expected TC: 2\nNumber of Completed TC: 1\nAll test cases passed"));
    assert!(blocks[1].contains("Number of Expected TC: 3\nNumber of Completed TC: 3\nFailed TCs: 2"));
}

#[test]
fn test_tag_restricts_discovery() {
    let tmp = fixture_tree();
    touch(tmp.path(), "Tests05/extra/milestone1_source.txt", "");
    touch(tmp.path(), "Tests05/extra/milestone1_queries.txt", "");
    let executor = ScriptedExecutor::default().with_log("milestone1", log(&[(1, true)]));
    let config = config(&tmp).with_convention(Convention::default().with_tag("milestone"));

    let summary = HarnessDriver::new(&config, &executor)
        .run(&mut RecordingReporter::default())
        .unwrap();

    assert_eq!(summary.discovered, 1);
    assert_eq!(executor.calls(), vec!["Tests05/extra/milestone1_source.txt".to_string()]);
}

#[test]
fn test_prefixed_convention_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    touch(tmp.path(), "Tests05/calls/source_calls.txt", "");
    touch(tmp.path(), "Tests05/calls/queries_calls.txt", "");
    let executor = ScriptedExecutor::default().with_log("calls", log(&[(1, true), (2, true)]));
    let config = config(&tmp).with_convention(Convention::new(PairingRule::Prefixed));

    let summary = HarnessDriver::new(&config, &executor)
        .run(&mut RecordingReporter::default())
        .unwrap();

    assert_eq!(summary.reported, 1);
    assert!(report_text(&tmp).starts_with(
        "Directory path: Tests05/calls\nSource file: Tests05/calls/source_calls.txt\n\
         Queries file: Tests05/calls/queries_calls.txt\n"
    ));
}

#[test]
fn test_custom_layout_changes_lookback() {
    let tmp = fixture_tree();
    let short_log = "<id>5</id>\n<time_taken>1</time_taken>\n<failed>\n<id>6</id>\n<time_taken>1</time_taken>\n<passed/>\n";
    let executor = ScriptedExecutor::default()
        .with_log("iter1", short_log.to_string())
        .with_log("iter2", short_log.to_string());
    let config = config(&tmp).with_layout(LogLayout {
        failed_lookback: 2,
        query_block_lines: 5,
    });

    let summary = HarnessDriver::new(&config, &executor)
        .run(&mut RecordingReporter::default())
        .unwrap();

    assert_eq!(summary.errored, 0);
    assert_eq!(summary.failed_cases, 2);
    assert!(report_text(&tmp).contains("Failed TCs: 5\n"));
}

#[test]
fn test_missing_fixture_root_aborts() {
    let tmp = tempfile::tempdir().unwrap();
    let executor = ScriptedExecutor::default();
    let config = config(&tmp).with_fixtures_dir(PathBuf::from("does/not/exist"));

    let err = HarnessDriver::new(&config, &executor)
        .run(&mut RecordingReporter::default())
        .unwrap_err();
    assert!(matches!(err, HarnessError::Discovery { .. }));
    assert!(!err.is_fixture_scoped());
}
