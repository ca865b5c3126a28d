//! Snapshot tests for the console reporter
//!
//! Drives full runs of the fixture plan into an uncolored [`ConsoleReporter`] and compares the
//! transcript against inline snapshots.
//!
//! Review changes: `cargo insta review`

use std::sync::Arc;

use systest::engine::{RunPlan, ScriptedEngine};
use systest::presentation::{ConsoleReporter, TablePresenter};
use systest::session::{RunSelection, drive, open_session};
use systest::{RunnerConfig, TestDescriptor};

const PLAN: &str = include_str!("fixtures/alpha_beta.json");

/// Catalog listing followed by the transcript of `selection`.
async fn transcript(selection: RunSelection) -> String {
    let plan = RunPlan::from_json(PLAN).expect("fixture plan parses");
    let mut session = open_session(Arc::new(ScriptedEngine::new(plan)), RunnerConfig::default())
        .await
        .expect("discovery completes");

    let mut reporter = ConsoleReporter::new(Vec::new());
    reporter.on_catalog_ready(session.coordinator.groups());
    for error in &session.discovery_errors {
        reporter.on_error(error);
    }
    let _ = drive(&mut session.coordinator, &mut reporter, &selection).await;

    String::from_utf8(reporter.into_inner()).expect("console output is UTF-8")
}

#[tokio::test]
async fn test_run_all_transcript() {
    let output = transcript(RunSelection::All).await;
    insta::assert_snapshot!(output, @r"
    AlphaTests
      ✗ testOne  Reason : Not yet executed
    BetaTests
      ✗ testTwo  Reason : Not yet executed
      ✗ testThree  Reason : Not yet executed
    BrokenTests
      ✗ testFine  Reason : Not yet executed
    SwiftTests
      ✗ testSwift  Reason : Not yet executed
    error: malformed test identifier `garbage`: expected an opening `[`
    ✓ AlphaTests::testOne
    ✗ BetaTests::testTwo  Reason : assertion X
    ✓ BetaTests::testThree
    ✓ BrokenTests::testFine
    ✓ SwiftTests::testSwift

    Failed : 1 of 10 tests
    Duration : 0.78s
    ");
}

#[tokio::test]
async fn test_run_unknown_test_transcript() {
    let output = transcript(RunSelection::One(TestDescriptor::new("Unknown", "testX"))).await;
    let tail: Vec<&str> = output.lines().skip(10).collect();
    insta::assert_snapshot!(tail.join("\n"), @"error: test [Unknown testX] not found");
}

#[tokio::test]
async fn test_repeated_run_transcript() {
    let plan = RunPlan::from_json(PLAN).expect("fixture plan parses");
    let mut session = open_session(Arc::new(ScriptedEngine::new(plan)), RunnerConfig::default())
        .await
        .expect("discovery completes");
    let one = RunSelection::One(TestDescriptor::new("AlphaTests", "testOne"));

    let mut reporter = ConsoleReporter::new(Vec::new());
    drive(&mut session.coordinator, &mut reporter, &one).await.expect("first run");
    drive(&mut session.coordinator, &mut reporter, &one).await.expect("second run");

    let output = String::from_utf8(reporter.into_inner()).expect("console output is UTF-8");
    insta::assert_snapshot!(output, @r"
    ✓ AlphaTests::testOne

    Failed : 0 of 6 tests
    Duration : 0.1s
    ✓ AlphaTests::testOne

    Failed : 0 of 7 tests
    Duration : 0.2s
    ");
}
