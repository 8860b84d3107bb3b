//! Flaky-test quarantine.
//!
//! The quarantine file is written by one run and read by later, unrelated
//! processes to exclude the listed tests. Reading never fails: anything wrong
//! with the file means "nothing quarantined".

use crate::errors::{write_json, LedgerResult};
use crate::model::{TestOutcome, TestResultRecord};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarantineEntry {
    pub test_id: String,
    pub title: String,
    pub file: String,
    pub flakiness_score: f64,
    pub quarantined_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarantineFile {
    pub generated_at: String,
    pub threshold: f64,
    #[serde(default)]
    pub entries: Vec<QuarantineEntry>,
}

/// Tests to quarantine, most flaky first.
///
/// Skipped outcomes and unscored results never qualify. Equal scores keep
/// their input order.
pub fn select(
    results: &[TestResultRecord],
    threshold: f64,
    max_quarantined: usize,
    now: &str,
) -> Vec<QuarantineEntry> {
    let mut entries: Vec<QuarantineEntry> = results
        .iter()
        .filter(|r| r.outcome != Some(TestOutcome::Skipped))
        .filter_map(|r| r.flakiness_score.map(|score| (r, score)))
        .filter(|(_, score)| *score >= threshold)
        .map(|(r, score)| QuarantineEntry {
            test_id: r.test_id.clone(),
            title: r.title.clone(),
            file: r.file.clone(),
            flakiness_score: score,
            quarantined_at: now.to_string(),
        })
        .collect();
    entries.sort_by(|a, b| b.flakiness_score.total_cmp(&a.flakiness_score));
    entries.truncate(max_quarantined);
    entries
}

/// Selects and persists the quarantine list.
///
/// With nothing to quarantine, returns `None` and leaves any existing file
/// at `output` untouched.
pub fn generate(
    results: &[TestResultRecord],
    threshold: f64,
    max_quarantined: usize,
    output: &Path,
) -> LedgerResult<Option<QuarantineFile>> {
    let now = crate::now_rfc3339();
    let entries = select(results, threshold, max_quarantined, &now);
    if entries.is_empty() {
        return Ok(None);
    }
    let file = QuarantineFile {
        generated_at: now,
        threshold,
        entries,
    };
    write_json(output, &file)?;
    tracing::info!(
        path = %output.display(),
        quarantined = file.entries.len(),
        "quarantine file written"
    );
    Ok(Some(file))
}

impl QuarantineFile {
    /// Reads a quarantine file; `None` when missing, unreadable or malformed.
    pub fn load(path: &Path) -> Option<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no quarantine file");
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read quarantine file");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(file) => Some(file),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "quarantine file is malformed; ignoring");
                None
            }
        }
    }

    pub fn contains(&self, test_id: &str) -> bool {
        self.entries.iter().any(|e| e.test_id == test_id)
    }

    /// Alternation of every title, escaped so each matches only verbatim.
    pub fn pattern(&self) -> Option<Regex> {
        let alternatives: Vec<String> = self
            .entries
            .iter()
            .filter(|e| !e.title.is_empty())
            .map(|e| regex::escape(&e.title))
            .collect();
        if alternatives.is_empty() {
            return None;
        }
        match Regex::new(&alternatives.join("|")) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(error = %e, "cannot build quarantine pattern; ignoring quarantine");
                None
            }
        }
    }
}

/// Title filter for a later run; `None` means exclude nothing.
pub fn pattern_from_file(path: &Path) -> Option<Regex> {
    QuarantineFile::load(path)?.pattern()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TestStatus;

    fn flaky(id: &str, score: f64) -> TestResultRecord {
        TestResultRecord::new(id, format!("title {}", id), TestStatus::Passed)
            .with_outcome(TestOutcome::Flaky)
            .with_file("suite.spec.ts")
            .with_flakiness(score)
    }

    #[test]
    fn select_filters_sorts_and_caps() {
        let mut skipped = flaky("skipped", 0.9);
        skipped.outcome = Some(TestOutcome::Skipped);
        let results = vec![
            flaky("low", 0.29),
            flaky("mid-1", 0.5),
            skipped,
            TestResultRecord::new("unscored", "u", TestStatus::Failed),
            flaky("high", 0.8),
            flaky("mid-2", 0.5),
            flaky("edge", 0.3),
        ];
        let entries = select(&results, 0.3, 3, "now");
        let ids: Vec<_> = entries.iter().map(|e| e.test_id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid-1", "mid-2"]);
        assert!(entries.iter().all(|e| e.quarantined_at == "now"));
        assert_eq!(entries[0].file, "suite.spec.ts");
    }

    #[test]
    fn threshold_is_inclusive() {
        let entries = select(&[flaky("edge", 0.3)], 0.3, 50, "now");
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn empty_selection_leaves_existing_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".smart-quarantine.json");
        std::fs::write(&path, "previous").unwrap();
        let out = generate(&[flaky("calm", 0.1)], 0.3, 50, &path).unwrap();
        assert!(out.is_none());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous");
    }

    #[test]
    fn pattern_matches_titles_literally() {
        let file = QuarantineFile {
            generated_at: "now".into(),
            threshold: 0.3,
            entries: vec![QuarantineEntry {
                test_id: "t".into(),
                title: "Test (with) [brackets]".into(),
                file: "f".into(),
                flakiness_score: 0.5,
                quarantined_at: "now".into(),
            }],
        };
        let re = file.pattern().unwrap();
        assert!(re.is_match("Test (with) [brackets]"));
        assert!(!re.is_match("Test with brackets"));
        assert!(file.contains("t"));
        assert!(!file.contains("other"));
    }

    #[test]
    fn missing_or_broken_file_means_no_pattern() {
        let dir = tempfile::tempdir().unwrap();
        assert!(pattern_from_file(&dir.path().join("absent.json")).is_none());

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{\"entries\": [").unwrap();
        assert!(pattern_from_file(&broken).is_none());

        let empty = dir.path().join("empty.json");
        std::fs::write(
            &empty,
            r#"{"generatedAt":"2024-01-01T00:00:00Z","threshold":0.3,"entries":[]}"#,
        )
        .unwrap();
        assert!(pattern_from_file(&empty).is_none());
    }
}
