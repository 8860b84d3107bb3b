//! Per-run snapshot files (`history-runs/<runId>.json`).
//!
//! A snapshot exists exactly while its run is retained in `runs`. Removal of
//! evicted snapshots is best effort: a file that cannot be deleted is logged
//! and forgotten, and the history write still goes ahead.

use super::TestHistory;
use crate::config::LedgerOptions;
use crate::errors::{write_json, LedgerResult};
use crate::model::{
    Attachments, RunMetadata, RunSnapshotFile, StepRecord, TestResultRecord, TestResultSnapshot,
};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

pub const SNAPSHOT_DIR: &str = "history-runs";

const PW_API_CATEGORY: &str = "pw:api";

/// Hex digits of the run-id digest appended to rewritten stems.
const ID_DIGEST_LEN: usize = 12;

/// Run ids become file names; anything outside `[A-Za-z0-9._-]` maps to `_`.
///
/// A rewritten stem gets a digest of the raw id appended, so distinct run ids
/// never share a snapshot file.
pub fn file_name(run_id: &str) -> String {
    let stem: String = run_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem == run_id && !stem.is_empty() {
        return format!("{}.json", stem);
    }
    let digest = hex::encode(Sha256::digest(run_id.as_bytes()));
    format!("{}-{}.json", stem, &digest[..ID_DIGEST_LEN])
}

/// Path of a snapshot relative to the history directory, with `/` separators.
pub fn relative_path(run_id: &str) -> String {
    format!("{}/{}", SNAPSHOT_DIR, file_name(run_id))
}

pub fn build(results: &[TestResultRecord], run: &RunMetadata, opts: &LedgerOptions) -> RunSnapshotFile {
    let tests = results
        .iter()
        .map(|r| (r.test_id.clone(), snapshot_of(r, opts)))
        .collect::<BTreeMap<_, _>>();
    RunSnapshotFile {
        run_id: run.run_id.clone(),
        timestamp: run.timestamp.clone(),
        tests,
    }
}

fn snapshot_of(r: &TestResultRecord, opts: &LedgerOptions) -> TestResultSnapshot {
    TestResultSnapshot {
        title: r.title.clone(),
        file: r.file.clone(),
        status: r.status,
        outcome: r.outcome,
        duration: r.duration,
        retry: r.retry,
        error: r.error.clone(),
        flakiness_score: r.flakiness_score,
        stability_score: r.stability_score.clone(),
        tags: r.tags.clone(),
        steps: filter_steps(&r.steps, opts),
        attachments: filter_attachments(&r.attachments, opts),
    }
}

fn filter_steps(steps: &[StepRecord], opts: &LedgerOptions) -> Vec<StepRecord> {
    steps
        .iter()
        .filter(|s| !(opts.filter_pw_api_steps && s.category.as_deref() == Some(PW_API_CATEGORY)))
        .map(|s| StepRecord {
            steps: filter_steps(&s.steps, opts),
            ..s.clone()
        })
        .collect()
}

fn filter_attachments(attachments: &Attachments, opts: &LedgerOptions) -> Attachments {
    let keep = |uri: &str| !(opts.csp_safe && uri.starts_with("data:"));
    let refs = |list: &[String]| list.iter().filter(|u| keep(u.as_str())).cloned().collect::<Vec<_>>();
    Attachments {
        screenshots: refs(&attachments.screenshots),
        videos: refs(&attachments.videos),
        traces: refs(&attachments.traces),
        network_logs: if opts.enable_network_logs {
            refs(&attachments.network_logs)
        } else {
            Vec::new()
        },
        custom: attachments
            .custom
            .iter()
            .filter(|c| keep(c.path.as_str()))
            .cloned()
            .collect(),
    }
}

/// Writes the snapshot under `history_dir` and returns its relative path.
pub fn write(history_dir: &Path, snapshot: &RunSnapshotFile) -> LedgerResult<String> {
    let rel = relative_path(&snapshot.run_id);
    write_json(&history_dir.join(&rel), snapshot)?;
    Ok(rel)
}

pub fn read(path: &Path) -> Option<RunSnapshotFile> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read run snapshot");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "run snapshot is corrupt");
            None
        }
    }
}

/// Drops every `runFiles` key whose run is no longer retained and deletes its file.
///
/// Returns the run ids that were dropped.
pub fn reconcile(history_dir: &Path, history: &mut TestHistory) -> Vec<String> {
    let retained: HashSet<&str> = history.runs.iter().map(|r| r.run_id.as_str()).collect();
    let stale: Vec<String> = history
        .run_files
        .keys()
        .filter(|id| !retained.contains(id.as_str()))
        .cloned()
        .collect();

    let mut released = Vec::new();
    for run_id in &stale {
        if let Some(rel) = history.run_files.remove(run_id) {
            released.push(rel);
        }
    }
    for rel in released {
        // A retained run may still point at the same file.
        if history.run_files.values().any(|kept| *kept == rel) {
            continue;
        }
        remove_best_effort(&history_dir.join(rel));
    }
    stale
}

/// Deletes `path`, ignoring any failure.
///
/// Snapshot cleanup must never fail a history update. A missing file is the
/// expected steady state after a manual cleanup; other errors are logged at
/// debug level and the orphan is left behind.
pub fn remove_best_effort(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed evicted run snapshot"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "could not remove run snapshot")
        }
    }
}
