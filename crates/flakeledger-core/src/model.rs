//! Records exchanged with the test host and persisted in the history ledger.
//!
//! Field names follow the camelCase JSON the reporter side writes, so every
//! struct here is `rename_all = "camelCase"`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flakiness score at or above which a result counts as flaky in a run summary.
///
/// Fixed; independent of the configurable quarantine threshold and gate limits.
pub const SUMMARY_FLAKY_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestStatus {
    Passed,
    Failed,
    TimedOut,
    Skipped,
    Interrupted,
}

impl TestStatus {
    /// `failed` or `timedOut`.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::TimedOut)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestOutcome {
    Expected,
    Unexpected,
    Flaky,
    Skipped,
}

/// Letter grade A (best) to F (worst).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StabilityGrade {
    A,
    B,
    C,
    D,
    F,
}

impl StabilityGrade {
    /// A=5 ... F=1.
    pub fn score(self) -> u8 {
        match self {
            Self::A => 5,
            Self::B => 4,
            Self::C => 3,
            Self::D => 2,
            Self::F => 1,
        }
    }

    /// Inverse of [`StabilityGrade::score`]; values outside 1..=5 clamp.
    pub fn from_score(score: u8) -> Self {
        match score {
            5..=u8::MAX => Self::A,
            4 => Self::B,
            3 => Self::C,
            2 => Self::D,
            _ => Self::F,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl std::fmt::Display for StabilityGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StabilityScore {
    pub overall: f64,
    pub grade: StabilityGrade,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flakiness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reliability: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub title: String,
    #[serde(default)]
    pub duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepRecord>,
}

/// Attachment references (paths or URIs) grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachments {
    #[serde(default)]
    pub screenshots: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    #[serde(default)]
    pub traces: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub network_logs: Vec<String>,
    #[serde(default)]
    pub custom: Vec<CustomAttachment>,
}

impl Attachments {
    pub fn is_empty(&self) -> bool {
        self.screenshots.is_empty()
            && self.videos.is_empty()
            && self.traces.is_empty()
            && self.network_logs.is_empty()
            && self.custom.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomAttachment {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub path: String,
}

/// One test's result in the run currently being recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResultRecord {
    pub test_id: String,
    pub title: String,
    #[serde(default)]
    pub file: String,
    pub status: TestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<TestOutcome>,
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub retry: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flakiness_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability_score: Option<StabilityScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set upstream only when the test ran slower than its history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_trend: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepRecord>,
    #[serde(default, skip_serializing_if = "Attachments::is_empty")]
    pub attachments: Attachments,
}

impl TestResultRecord {
    pub fn new(test_id: impl Into<String>, title: impl Into<String>, status: TestStatus) -> Self {
        Self {
            test_id: test_id.into(),
            title: title.into(),
            file: String::new(),
            status,
            outcome: None,
            duration: 0,
            retry: 0,
            flakiness_score: None,
            stability_score: None,
            error: None,
            performance_trend: None,
            tags: Vec::new(),
            steps: Vec::new(),
            attachments: Attachments::default(),
        }
    }

    pub fn with_outcome(mut self, outcome: TestOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    pub fn with_flakiness(mut self, score: f64) -> Self {
        self.flakiness_score = Some(score);
        self
    }

    pub fn with_grade(mut self, grade: StabilityGrade) -> Self {
        self.stability_score = Some(StabilityScore {
            overall: f64::from(grade.score()) * 20.0,
            grade,
            flakiness: None,
            performance: None,
            reliability: None,
        });
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = file.into();
        self
    }

    pub fn with_duration(mut self, duration: u64) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }

    pub fn grade(&self) -> Option<StabilityGrade> {
        self.stability_score.as_ref().map(|s| s.grade)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestHistoryEntry {
    pub passed: bool,
    #[serde(default)]
    pub duration: u64,
    pub timestamp: String,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default)]
    pub retry: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

impl TestHistoryEntry {
    pub fn from_result(result: &TestResultRecord, timestamp: &str, run_id: Option<&str>) -> Self {
        Self {
            passed: result.status == TestStatus::Passed,
            duration: result.duration,
            timestamp: timestamp.to_string(),
            skipped: result.status == TestStatus::Skipped,
            retry: result.retry,
            run_id: run_id.map(str::to_string),
        }
    }
}

/// Aggregate counts for one run. Missing keys decode as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunSummary {
    pub run_id: String,
    pub timestamp: String,
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub flaky: u32,
    pub slow: u32,
    pub duration: u64,
    pub pass_rate: u32,
}

/// Identity of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    pub run_id: String,
    pub timestamp: String,
}

impl RunMetadata {
    pub fn new(run_id: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// Full per-test detail kept in a run snapshot file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResultSnapshot {
    pub title: String,
    pub file: String,
    pub status: TestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<TestOutcome>,
    pub duration: u64,
    pub retry: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flakiness_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability_score: Option<StabilityScore>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepRecord>,
    #[serde(default)]
    pub attachments: Attachments,
}

/// `<historyDir>/history-runs/<runId>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshotFile {
    pub run_id: String,
    pub timestamp: String,
    pub tests: BTreeMap<String, TestResultSnapshot>,
}
