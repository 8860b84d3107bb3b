//! Quality gates: configured thresholds against the current run.
//!
//! [`evaluate`] is pure. A rule is evaluated only when its key is configured;
//! an unconfigured rule produces no entry at all. A configured rule whose
//! input is unavailable (no stability grades, no comparison) is reported as
//! skipped and counts as passed.

pub mod report;

use crate::comparison::RunComparison;
use crate::model::{StabilityGrade, TestOutcome, TestResultRecord, TestStatus};
use crate::summary::{count, percent};
use serde::{Deserialize, Serialize};

pub use report::format_gate_report;

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QualityGateConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_failures: Option<u32>,
    /// Percent, 0..=100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_pass_rate: Option<f64>,
    /// Percent, 0..=100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_flaky_rate: Option<f64>,
    /// A through D.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_stability_grade: Option<StabilityGrade>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_new_failures: Option<bool>,
}

impl QualityGateConfig {
    pub fn is_empty(&self) -> bool {
        self.max_failures.is_none()
            && self.min_pass_rate.is_none()
            && self.max_flaky_rate.is_none()
            && self.min_stability_grade.is_none()
            && !self.no_new_failures.unwrap_or(false)
    }

    pub fn validate(&self) -> Result<(), String> {
        for (key, value) in [
            ("minPassRate", self.min_pass_rate),
            ("maxFlakyRate", self.max_flaky_rate),
        ] {
            if let Some(v) = value {
                if !(0.0..=100.0).contains(&v) {
                    return Err(format!("{} must be a percentage within 0..=100 (got {})", key, v));
                }
            }
        }
        if self.min_stability_grade == Some(StabilityGrade::F) {
            return Err("minStabilityGrade must be one of A, B, C, D".into());
        }
        Ok(())
    }

    /// Keys set in `other` replace the ones here.
    pub fn merge(&mut self, other: &QualityGateConfig) {
        if other.max_failures.is_some() {
            self.max_failures = other.max_failures;
        }
        if other.min_pass_rate.is_some() {
            self.min_pass_rate = other.min_pass_rate;
        }
        if other.max_flaky_rate.is_some() {
            self.max_flaky_rate = other.max_flaky_rate;
        }
        if other.min_stability_grade.is_some() {
            self.min_stability_grade = other.min_stability_grade;
        }
        if other.no_new_failures.is_some() {
            self.no_new_failures = other.no_new_failures;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GateRule {
    MaxFailures,
    MinPassRate,
    MaxFlakyRate,
    MinStabilityGrade,
    NoNewFailures,
}

impl GateRule {
    pub fn label(self) -> &'static str {
        match self {
            Self::MaxFailures => "Max failures",
            Self::MinPassRate => "Min pass rate",
            Self::MaxFlakyRate => "Max flaky rate",
            Self::MinStabilityGrade => "Min stability grade",
            Self::NoNewFailures => "No new failures",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityGateRuleResult {
    pub rule: GateRule,
    pub passed: bool,
    pub actual: String,
    pub threshold: String,
    pub skipped: bool,
}

impl QualityGateRuleResult {
    fn checked(rule: GateRule, passed: bool, actual: String, threshold: String) -> Self {
        Self {
            rule,
            passed,
            actual,
            threshold,
            skipped: false,
        }
    }

    fn skipped(rule: GateRule, threshold: String) -> Self {
        Self {
            rule,
            passed: true,
            actual: NOT_AVAILABLE.to_string(),
            threshold,
            skipped: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityGateResult {
    pub passed: bool,
    pub rules: Vec<QualityGateRuleResult>,
}

impl QualityGateResult {
    pub fn evaluated(&self) -> impl Iterator<Item = &QualityGateRuleResult> {
        self.rules.iter().filter(|r| !r.skipped)
    }

    pub fn failed(&self) -> impl Iterator<Item = &QualityGateRuleResult> {
        self.evaluated().filter(|r| !r.passed)
    }
}

pub fn evaluate(
    config: &QualityGateConfig,
    results: &[TestResultRecord],
    comparison: Option<&RunComparison>,
) -> QualityGateResult {
    let mut rules = Vec::new();

    if let Some(max) = config.max_failures {
        let failures = count(results, |r| {
            r.outcome == Some(TestOutcome::Unexpected) && r.status.is_failure()
        });
        rules.push(QualityGateRuleResult::checked(
            GateRule::MaxFailures,
            failures <= max,
            failures.to_string(),
            format!("≤ {}", max),
        ));
    }

    if let Some(min) = config.min_pass_rate {
        let rate = rate_of(results, |r| {
            r.status == TestStatus::Passed
                || matches!(r.outcome, Some(TestOutcome::Expected | TestOutcome::Flaky))
        });
        rules.push(QualityGateRuleResult::checked(
            GateRule::MinPassRate,
            results.is_empty() || f64::from(rate) >= min,
            format!("{}%", rate),
            format!("≥ {}%", min),
        ));
    }

    if let Some(max) = config.max_flaky_rate {
        let rate = rate_of(results, |r| r.outcome == Some(TestOutcome::Flaky));
        rules.push(QualityGateRuleResult::checked(
            GateRule::MaxFlakyRate,
            results.is_empty() || f64::from(rate) <= max,
            format!("{}%", rate),
            format!("≤ {}%", max),
        ));
    }

    if let Some(min) = config.min_stability_grade {
        let threshold = format!("≥ {}", min);
        rules.push(match average_grade(results) {
            None => QualityGateRuleResult::skipped(GateRule::MinStabilityGrade, threshold),
            Some(avg) => QualityGateRuleResult::checked(
                GateRule::MinStabilityGrade,
                avg.score() >= min.score(),
                avg.to_string(),
                threshold,
            ),
        });
    }

    if config.no_new_failures == Some(true) {
        let threshold = "0".to_string();
        rules.push(match comparison {
            None => QualityGateRuleResult::skipped(GateRule::NoNewFailures, threshold),
            Some(cmp) => {
                let new_failures = cmp.changes.new_failures.len();
                QualityGateRuleResult::checked(
                    GateRule::NoNewFailures,
                    new_failures == 0,
                    new_failures.to_string(),
                    threshold,
                )
            }
        });
    }

    QualityGateResult {
        passed: rules.iter().all(|r| r.passed),
        rules,
    }
}

/// Rounded percentage of matching results; 0 for an empty run.
fn rate_of(results: &[TestResultRecord], pred: impl Fn(&TestResultRecord) -> bool) -> u32 {
    percent(count(results, pred) as usize, results.len())
}

/// Mean grade over graded results, rounded half away from zero.
fn average_grade(results: &[TestResultRecord]) -> Option<StabilityGrade> {
    let scores: Vec<u8> = results
        .iter()
        .filter_map(|r| r.grade())
        .map(StabilityGrade::score)
        .collect();
    if scores.is_empty() {
        return None;
    }
    let mean = scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64;
    Some(StabilityGrade::from_score(mean.round() as u8))
}
