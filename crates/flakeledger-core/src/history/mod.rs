//! Bounded run/test history persisted as one JSON file.
//!
//! A process performs at most one update cycle: load (or default), append
//! this run, optionally snapshot it, persist. Writes overwrite the whole file
//! without an atomic rename; concurrent writers race and the last one wins.
//! A torn write shows up on the next load as a parse failure, which resets to
//! an empty history with a warning.

pub mod document;
pub mod snapshots;

use crate::bounded::BoundedSeq;
use crate::comparison::{compare, RunComparison};
use crate::config::LedgerOptions;
use crate::errors::{write_json, LedgerResult};
use crate::model::{RunMetadata, RunSnapshotFile, RunSummary, TestHistoryEntry, TestResultRecord};
use crate::summary::summarize;
use document::{null_as_default, HistoryDocument};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Aggregate root of the ledger. Field order is the on-disk key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestHistory {
    #[serde(default, deserialize_with = "null_as_default")]
    pub runs: BoundedSeq<RunMetadata>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tests: BTreeMap<String, BoundedSeq<TestHistoryEntry>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summaries: BoundedSeq<RunSummary>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub run_files: BTreeMap<String, String>,
}

impl TestHistory {
    /// Applies `capacity` to every retained sequence.
    pub fn rebound(&mut self, capacity: usize) {
        self.runs.rebound(capacity);
        self.summaries.rebound(capacity);
        for entries in self.tests.values_mut() {
            entries.rebound(capacity);
        }
    }

    fn record_entry(&mut self, test_id: &str, entry: TestHistoryEntry, capacity: usize) {
        self.tests
            .entry(test_id.to_string())
            .or_insert_with(|| BoundedSeq::new(capacity))
            .push(entry);
    }
}

pub struct HistoryStore {
    options: LedgerOptions,
    history: TestHistory,
    loaded: bool,
    /// The ledger as it stood right before this process appended its run.
    before_update: Option<TestHistory>,
}

impl HistoryStore {
    pub fn new(options: LedgerOptions) -> Self {
        Self {
            options,
            history: TestHistory::default(),
            loaded: false,
            before_update: None,
        }
    }

    /// Creates the store and loads it right away.
    pub fn open(options: LedgerOptions) -> Self {
        let mut store = Self::new(options);
        store.load();
        store
    }

    pub fn path(&self) -> &Path {
        &self.options.history_file
    }

    pub fn options(&self) -> &LedgerOptions {
        &self.options
    }

    pub fn history(&self) -> &TestHistory {
        &self.history
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn snapshot_dir(&self) -> PathBuf {
        self.options.history_dir().join(snapshots::SNAPSHOT_DIR)
    }

    /// Reads the history file, upgrading the legacy layout in memory.
    ///
    /// Never fails: a missing file yields an empty history, an unreadable or
    /// corrupt one an empty history plus a warning.
    pub fn load(&mut self) {
        let path = self.options.history_file.clone();
        self.history = match std::fs::read_to_string(&path) {
            Ok(raw) => match HistoryDocument::decode(&raw) {
                Ok(doc) => {
                    if doc.is_legacy() {
                        tracing::info!(path = %path.display(), "upgrading legacy history layout");
                    }
                    doc.into_history()
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "history file is corrupt; starting with empty history"
                    );
                    TestHistory::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => TestHistory::default(),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "cannot read history file; starting with empty history"
                );
                TestHistory::default()
            }
        };
        self.history.rebound(self.options.max_history_runs);
        self.loaded = true;
    }

    /// Appends this run to the ledger and persists it.
    ///
    /// Loads first if nothing was loaded yet. Returns the run's summary.
    /// Only write failures are reported; snapshot eviction is best effort.
    pub fn update(
        &mut self,
        results: &[TestResultRecord],
        run: &RunMetadata,
    ) -> LedgerResult<RunSummary> {
        if !self.loaded {
            self.load();
        }
        let capacity = self.options.max_history_runs;
        let drilldown = self.options.enable_history_drilldown;

        self.before_update = Some(self.history.clone());

        let entry_run_id = drilldown.then_some(run.run_id.as_str());
        for result in results {
            let entry = TestHistoryEntry::from_result(result, &run.timestamp, entry_run_id);
            self.history.record_entry(&result.test_id, entry, capacity);
        }

        let summary = summarize(results, run);
        self.history.summaries.push(summary.clone());

        if drilldown {
            self.history.runs.push(run.clone());
            let history_dir = self.options.history_dir();
            let snapshot = snapshots::build(results, run, &self.options);
            let rel = snapshots::write(&history_dir, &snapshot)?;
            self.history.run_files.insert(run.run_id.clone(), rel);
            let dropped = snapshots::reconcile(&history_dir, &mut self.history);
            if !dropped.is_empty() {
                tracing::debug!(runs = ?dropped, "evicted run snapshots");
            }
        }

        self.save()?;
        tracing::info!(
            path = %self.options.history_file.display(),
            run_id = %run.run_id,
            tests = results.len(),
            "history updated"
        );
        Ok(summary)
    }

    /// Overwrites the history file with the in-memory ledger.
    pub fn save(&self) -> LedgerResult<()> {
        write_json(&self.options.history_file, &self.history)
    }

    /// Entries for one test, oldest first; empty when unknown.
    pub fn test_history(&self, test_id: &str) -> Vec<TestHistoryEntry> {
        self.history
            .tests
            .get(test_id)
            .map(BoundedSeq::to_vec)
            .unwrap_or_default()
    }

    /// History the current run is compared against: the ledger before this
    /// process's own update, or the loaded ledger when nothing was appended.
    fn baseline_history(&self) -> &TestHistory {
        self.before_update.as_ref().unwrap_or(&self.history)
    }

    /// Summary this run should be compared against.
    ///
    /// With a pinned `baselineRunId` only that run qualifies; a miss returns
    /// `None` rather than falling back. Otherwise the latest summary recorded
    /// before this process's own update.
    pub fn baseline_run(&self) -> Option<&RunSummary> {
        if !self.options.enable_comparison {
            return None;
        }
        let summaries = &self.baseline_history().summaries;
        match &self.options.baseline_run_id {
            Some(id) => summaries.iter().find(|s| &s.run_id == id),
            None => summaries.last(),
        }
    }

    /// Compares `results` against the baseline run.
    ///
    /// Baseline test states come from the ledger as it stood before this
    /// run was appended, so eviction and entries of the current run never
    /// leak into the comparison.
    pub fn comparison(
        &self,
        current: &RunSummary,
        results: &[TestResultRecord],
    ) -> Option<RunComparison> {
        let baseline = self.baseline_run()?;
        Some(compare(baseline, current, results, self.baseline_history()))
    }

    /// Full detail of a retained run, when drilldown recorded one.
    pub fn run_snapshot(&self, run_id: &str) -> Option<RunSnapshotFile> {
        let rel = self.history.run_files.get(run_id)?;
        snapshots::read(&self.options.history_dir().join(rel))
    }
}
