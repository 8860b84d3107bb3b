//! Current run versus baseline run.
//!
//! A test's baseline state is its history entry belonging to the baseline
//! run: matched on `runId` when drilldown tagged the entries, otherwise on the
//! run timestamp.

use crate::bounded::BoundedSeq;
use crate::errors::{write_json, LedgerResult};
use crate::history::TestHistory;
use crate::model::{RunSummary, TestHistoryEntry, TestResultRecord, TestStatus};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Relative duration change that counts as a regression or improvement.
const DURATION_CHANGE_RATIO: f64 = 0.2;
/// Changes smaller than this (ms) are noise regardless of ratio.
const DURATION_CHANGE_MIN_MS: u64 = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunComparison {
    #[serde(default)]
    pub baseline_run: RunSummary,
    #[serde(default)]
    pub current_run: RunSummary,
    #[serde(default)]
    pub changes: RunChanges,
}

impl RunComparison {
    /// Writes the comparison as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> LedgerResult<()> {
        write_json(path, self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunChanges {
    /// Failing now; absent from or passing in the baseline.
    pub new_failures: Vec<TestResultRecord>,
    pub fixed_tests: Vec<TestResultRecord>,
    pub new_tests: Vec<TestResultRecord>,
    pub regressions: Vec<TestResultRecord>,
    pub improvements: Vec<TestResultRecord>,
}

pub fn compare(
    baseline: &RunSummary,
    current: &RunSummary,
    results: &[TestResultRecord],
    history: &TestHistory,
) -> RunComparison {
    let mut changes = RunChanges::default();

    for result in results {
        let prior = history
            .tests
            .get(&result.test_id)
            .and_then(|entries| baseline_entry(entries, baseline));

        match prior {
            None => {
                changes.new_tests.push(result.clone());
                if result.is_failure() {
                    changes.new_failures.push(result.clone());
                }
            }
            Some(prior) => {
                if result.is_failure() && prior.passed {
                    changes.new_failures.push(result.clone());
                }
                if result.status == TestStatus::Passed && !prior.passed && !prior.skipped {
                    changes.fixed_tests.push(result.clone());
                }
                if !prior.skipped && result.status != TestStatus::Skipped {
                    match duration_shift(prior.duration, result.duration) {
                        Some(Shift::Slower) => changes.regressions.push(result.clone()),
                        Some(Shift::Faster) => changes.improvements.push(result.clone()),
                        None => {}
                    }
                }
            }
        }
    }

    RunComparison {
        baseline_run: baseline.clone(),
        current_run: current.clone(),
        changes,
    }
}

fn baseline_entry<'a>(
    entries: &'a BoundedSeq<TestHistoryEntry>,
    baseline: &RunSummary,
) -> Option<&'a TestHistoryEntry> {
    entries
        .iter()
        .rev()
        .find(|e| e.run_id.as_deref() == Some(baseline.run_id.as_str()))
        .or_else(|| {
            entries
                .iter()
                .rev()
                .find(|e| e.run_id.is_none() && e.timestamp == baseline.timestamp)
        })
}

enum Shift {
    Slower,
    Faster,
}

fn duration_shift(before: u64, after: u64) -> Option<Shift> {
    let delta = before.abs_diff(after);
    if before == 0 || delta < DURATION_CHANGE_MIN_MS {
        return None;
    }
    if (delta as f64) / (before as f64) <= DURATION_CHANGE_RATIO {
        return None;
    }
    Some(if after > before {
        Shift::Slower
    } else {
        Shift::Faster
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RunMetadata;

    fn entry(passed: bool, duration: u64, ts: &str, run_id: Option<&str>) -> TestHistoryEntry {
        TestHistoryEntry {
            passed,
            duration,
            timestamp: ts.into(),
            skipped: false,
            retry: 0,
            run_id: run_id.map(str::to_string),
        }
    }

    fn baseline() -> RunSummary {
        RunSummary {
            run_id: "run-1".into(),
            timestamp: "2024-01-01T00:00:00Z".into(),
            ..RunSummary::default()
        }
    }

    fn history(pairs: &[(&str, TestHistoryEntry)]) -> TestHistory {
        let mut h = TestHistory::default();
        for (id, e) in pairs {
            h.tests.entry(id.to_string()).or_default().push(e.clone());
        }
        h
    }

    #[test]
    fn classifies_failures_fixes_and_new_tests() {
        let ts = "2024-01-01T00:00:00Z";
        let h = history(&[
            ("was-green", entry(true, 100, ts, None)),
            ("was-red", entry(false, 100, ts, None)),
            ("still-red", entry(false, 100, ts, None)),
        ]);
        let results = vec![
            TestResultRecord::new("was-green", "a", TestStatus::Failed),
            TestResultRecord::new("was-red", "b", TestStatus::Passed),
            TestResultRecord::new("still-red", "c", TestStatus::TimedOut),
            TestResultRecord::new("brand-new", "d", TestStatus::Failed),
        ];
        let current = crate::summarize(&results, &RunMetadata::new("run-2", "2024-01-02T00:00:00Z"));
        let cmp = compare(&baseline(), &current, &results, &h);

        let ids = |v: &[TestResultRecord]| v.iter().map(|r| r.test_id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&cmp.changes.new_failures), vec!["was-green", "brand-new"]);
        assert_eq!(ids(&cmp.changes.fixed_tests), vec!["was-red"]);
        assert_eq!(ids(&cmp.changes.new_tests), vec!["brand-new"]);
        assert_eq!(cmp.baseline_run.run_id, "run-1");
        assert_eq!(cmp.current_run.run_id, "run-2");
    }

    #[test]
    fn entries_from_other_runs_are_not_baseline_state() {
        let h = history(&[
            ("t", entry(true, 100, "2024-01-01T00:00:00Z", Some("run-1"))),
            ("t", entry(false, 100, "2023-12-31T00:00:00Z", Some("run-0"))),
        ]);
        let results = vec![TestResultRecord::new("t", "t", TestStatus::Failed)];
        let cmp = compare(&baseline(), &RunSummary::default(), &results, &h);
        assert_eq!(cmp.changes.new_failures.len(), 1);
        assert!(cmp.changes.new_tests.is_empty());
    }

    #[test]
    fn duration_shifts_need_ratio_and_minimum() {
        let ts = "2024-01-01T00:00:00Z";
        let h = history(&[
            ("slow", entry(true, 1000, ts, None)),
            ("fast", entry(true, 1000, ts, None)),
            ("noise", entry(true, 100, ts, None)),
        ]);
        let results = vec![
            TestResultRecord::new("slow", "s", TestStatus::Passed).with_duration(1500),
            TestResultRecord::new("fast", "f", TestStatus::Passed).with_duration(500),
            TestResultRecord::new("noise", "n", TestStatus::Passed).with_duration(190),
        ];
        let cmp = compare(&baseline(), &RunSummary::default(), &results, &h);
        assert_eq!(cmp.changes.regressions.len(), 1);
        assert_eq!(cmp.changes.regressions[0].test_id, "slow");
        assert_eq!(cmp.changes.improvements.len(), 1);
        assert_eq!(cmp.changes.improvements[0].test_id, "fast");
    }

    #[test]
    fn saved_comparison_reloads_from_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/ci/comparison.json");
        let results = vec![TestResultRecord::new("t", "t", TestStatus::Failed)];
        let cmp = compare(&baseline(), &RunSummary::default(), &results, &TestHistory::default());
        cmp.save(&path).unwrap();
        let loaded = crate::input::load_comparison(&path).unwrap();
        assert_eq!(loaded, cmp);
    }

    #[test]
    fn embedded_comparison_decodes_with_missing_sections() {
        let raw = r#"{"changes":{"newFailures":[{"testId":"x","title":"x","status":"failed"}]}}"#;
        let cmp: RunComparison = serde_json::from_str(raw).unwrap();
        assert_eq!(cmp.changes.new_failures.len(), 1);
        assert!(cmp.changes.fixed_tests.is_empty());
    }
}
