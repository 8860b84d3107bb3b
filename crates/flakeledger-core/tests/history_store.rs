use flakeledger_core::history::document::HistoryDocument;
use flakeledger_core::{
    HistoryStore, LedgerOptions, RunMetadata, TestOutcome, TestResultRecord, TestStatus,
};
use std::path::Path;

fn opts(dir: &Path, max_runs: usize, drilldown: bool) -> LedgerOptions {
    LedgerOptions {
        history_file: dir.join("test-history.json"),
        max_history_runs: max_runs,
        enable_history_drilldown: drilldown,
        ..LedgerOptions::default()
    }
}

fn run(n: usize) -> RunMetadata {
    RunMetadata::new(
        format!("run-{}", n),
        format!("2024-02-{:02}T10:00:00.000Z", n),
    )
}

fn results(n: usize) -> Vec<TestResultRecord> {
    vec![
        TestResultRecord::new("login", "logs in", TestStatus::Passed)
            .with_outcome(TestOutcome::Expected)
            .with_duration(100 * n as u64),
        TestResultRecord::new("cart", "adds to cart", TestStatus::Failed)
            .with_outcome(TestOutcome::Unexpected)
            .with_flakiness(0.4),
    ]
}

/// One process per update, the way CI invokes it.
fn record_runs(options: &LedgerOptions, runs: std::ops::RangeInclusive<usize>) {
    for n in runs {
        let mut store = HistoryStore::new(options.clone());
        store.update(&results(n), &run(n)).unwrap();
    }
}

#[test]
fn history_grows_until_capacity_then_drops_oldest() {
    let dir = tempfile::tempdir().unwrap();
    let options = opts(dir.path(), 5, false);

    record_runs(&options, 1..=5);
    let store = HistoryStore::open(options.clone());
    let entries = store.test_history("login");
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[0].duration, 100);
    assert_eq!(store.history().summaries.len(), 5);

    record_runs(&options, 6..=6);
    let store = HistoryStore::open(options);
    let entries = store.test_history("login");
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[0].duration, 200);
    assert_eq!(entries[4].duration, 600);
    let ids: Vec<_> = store
        .history()
        .summaries
        .iter()
        .map(|s| s.run_id.clone())
        .collect();
    assert_eq!(ids, vec!["run-2", "run-3", "run-4", "run-5", "run-6"]);
}

#[test]
fn resaving_unmodified_history_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let options = opts(dir.path(), 10, true);
    record_runs(&options, 1..=3);

    let before = std::fs::read_to_string(&options.history_file).unwrap();
    let store = HistoryStore::open(options.clone());
    store.save().unwrap();
    let after = std::fs::read_to_string(&options.history_file).unwrap();
    assert_eq!(before, after);

    let reloaded = HistoryStore::open(options);
    assert_eq!(reloaded.history(), store.history());
}

#[test]
fn legacy_mapping_is_upgraded_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let options = opts(dir.path(), 10, false);
    std::fs::write(
        &options.history_file,
        r#"{"t1":[{"passed":true,"duration":1000,"timestamp":"2024-01-01T00:00:00Z"}]}"#,
    )
    .unwrap();

    let store = HistoryStore::open(options.clone());
    assert_eq!(store.test_history("t1").len(), 1);
    assert!(store.history().runs.is_empty());
    assert!(store.history().summaries.is_empty());

    store.save().unwrap();
    let raw = std::fs::read_to_string(&options.history_file).unwrap();
    let doc = HistoryDocument::decode(&raw).unwrap();
    assert!(!doc.is_legacy());
}

#[test]
fn corrupt_history_resets_to_empty_and_update_still_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let options = opts(dir.path(), 10, false);
    std::fs::write(&options.history_file, "{\"tests\": {\"t1\": [").unwrap();

    let mut store = HistoryStore::open(options.clone());
    assert!(store.history().tests.is_empty());
    store.update(&results(1), &run(1)).unwrap();

    let store = HistoryStore::open(options);
    assert_eq!(store.test_history("cart").len(), 1);
}

#[test]
fn unknown_test_has_empty_history() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::open(opts(dir.path(), 10, false));
    assert!(store.test_history("nope").is_empty());
}

#[test]
fn drilldown_snapshots_follow_run_retention() {
    let dir = tempfile::tempdir().unwrap();
    let options = opts(dir.path(), 2, true);
    record_runs(&options, 1..=3);

    let runs_dir = dir.path().join("history-runs");
    assert!(!runs_dir.join("run-1.json").exists());
    assert!(runs_dir.join("run-2.json").exists());
    assert!(runs_dir.join("run-3.json").exists());

    let store = HistoryStore::open(options.clone());
    assert_eq!(store.path(), options.history_file.as_path());
    assert_eq!(store.snapshot_dir(), runs_dir);
    let history = store.history();
    let retained: Vec<_> = history.runs.iter().map(|r| r.run_id.clone()).collect();
    assert_eq!(retained, vec!["run-2", "run-3"]);
    let keys: Vec<_> = history.run_files.keys().cloned().collect();
    assert_eq!(keys, retained);
    assert_eq!(history.run_files["run-3"], "history-runs/run-3.json");

    let entries = store.test_history("login");
    assert_eq!(entries[1].run_id.as_deref(), Some("run-3"));

    let snap = store.run_snapshot("run-3").unwrap();
    assert_eq!(snap.run_id, "run-3");
    assert_eq!(snap.tests["cart"].status, TestStatus::Failed);
    assert!(store.run_snapshot("run-1").is_none());
}

#[test]
fn without_drilldown_no_snapshots_or_run_ids() {
    let dir = tempfile::tempdir().unwrap();
    let options = opts(dir.path(), 10, false);
    record_runs(&options, 1..=2);

    assert!(!dir.path().join("history-runs").exists());
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&options.history_file).unwrap()).unwrap();
    assert!(raw.get("runFiles").is_none());
    assert_eq!(raw["runs"], serde_json::json!([]));
    assert!(raw["tests"]["login"][0].get("runId").is_none());
    assert_eq!(raw["summaries"][1]["runId"], "run-2");
    assert_eq!(raw["summaries"][1]["passRate"], 50);
}

#[test]
fn baseline_defaults_to_latest_recorded_summary() {
    let dir = tempfile::tempdir().unwrap();
    let options = opts(dir.path(), 10, false);
    record_runs(&options, 1..=2);

    let store = HistoryStore::open(options);
    assert_eq!(store.baseline_run().unwrap().run_id, "run-2");
}

#[test]
fn explicit_baseline_never_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = opts(dir.path(), 10, false);
    record_runs(&options, 1..=3);

    options.baseline_run_id = Some("run-1".into());
    let store = HistoryStore::open(options.clone());
    assert_eq!(store.baseline_run().unwrap().run_id, "run-1");

    options.baseline_run_id = Some("run-42".into());
    let store = HistoryStore::open(options);
    assert!(store.baseline_run().is_none());
}

#[test]
fn comparison_against_baseline_finds_new_failures() {
    let dir = tempfile::tempdir().unwrap();
    let options = opts(dir.path(), 10, true);
    let mut first = HistoryStore::new(options.clone());
    first
        .update(
            &[TestResultRecord::new("login", "logs in", TestStatus::Passed)],
            &run(1),
        )
        .unwrap();

    let current = vec![TestResultRecord::new("login", "logs in", TestStatus::Failed)];
    let mut store = HistoryStore::new(options);
    let summary = store.update(&current, &run(2)).unwrap();
    let cmp = store.comparison(&summary, &current).unwrap();
    assert_eq!(cmp.changes.new_failures.len(), 1);
    assert_eq!(cmp.baseline_run.run_id, "run-1");
}

fn failing_login() -> Vec<TestResultRecord> {
    vec![TestResultRecord::new("login", "logs in", TestStatus::Failed)]
}

#[test]
fn single_run_capacity_still_sees_baseline_state() {
    let dir = tempfile::tempdir().unwrap();
    let options = opts(dir.path(), 1, false);
    HistoryStore::new(options.clone())
        .update(&failing_login(), &run(1))
        .unwrap();

    let mut store = HistoryStore::new(options);
    let summary = store.update(&failing_login(), &run(2)).unwrap();
    assert_eq!(store.test_history("login").len(), 1);

    let cmp = store.comparison(&summary, &failing_login()).unwrap();
    assert_eq!(cmp.baseline_run.run_id, "run-1");
    assert!(cmp.changes.new_failures.is_empty());
    assert!(cmp.changes.new_tests.is_empty());
}

#[test]
fn rerun_with_same_timestamp_reports_new_failure() {
    let dir = tempfile::tempdir().unwrap();
    let options = opts(dir.path(), 10, false);
    let stamp = "2024-03-01T09:00:00.000Z";
    HistoryStore::new(options.clone())
        .update(
            &[TestResultRecord::new("login", "logs in", TestStatus::Passed)],
            &RunMetadata::new("run-1", stamp),
        )
        .unwrap();

    let mut store = HistoryStore::new(options);
    let summary = store
        .update(&failing_login(), &RunMetadata::new("run-2", stamp))
        .unwrap();
    let cmp = store.comparison(&summary, &failing_login()).unwrap();
    assert_eq!(cmp.changes.new_failures.len(), 1);
    assert_eq!(cmp.changes.new_failures[0].test_id, "login");
}

#[test]
fn colliding_sanitized_run_ids_keep_their_own_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let options = opts(dir.path(), 2, true);
    for (n, id) in ["build 7", "build_7", "run-3"].into_iter().enumerate() {
        let mut store = HistoryStore::new(options.clone());
        store
            .update(&results(n + 1), &RunMetadata::new(id, format!("2024-04-0{}T00:00:00.000Z", n + 1)))
            .unwrap();
    }

    let store = HistoryStore::open(options);
    let keys: Vec<_> = store.history().run_files.keys().cloned().collect();
    assert_eq!(keys, vec!["build_7", "run-3"]);
    let snap = store.run_snapshot("build_7").unwrap();
    assert_eq!(snap.run_id, "build_7");
    assert!(store.run_snapshot("build 7").is_none());
    assert_eq!(std::fs::read_dir(store.snapshot_dir()).unwrap().count(), 2);
}

#[test]
fn write_failure_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "file, not a dir").unwrap();
    let options = LedgerOptions {
        history_file: blocker.join("test-history.json"),
        ..LedgerOptions::default()
    };
    let mut store = HistoryStore::new(options);
    let err = store.update(&results(1), &run(1)).unwrap_err();
    assert!(err.to_string().contains("blocker"));
}
