use crate::model::{RunMetadata, RunSummary, TestResultRecord, TestStatus, SUMMARY_FLAKY_THRESHOLD};

/// Reduces one run's results to aggregate counts.
///
/// `duration` is the sum of per-test durations.
pub fn summarize(results: &[TestResultRecord], run: &RunMetadata) -> RunSummary {
    let total = results.len() as u32;
    let passed = count(results, |r| r.status == TestStatus::Passed);

    RunSummary {
        run_id: run.run_id.clone(),
        timestamp: run.timestamp.clone(),
        total,
        passed,
        failed: count(results, |r| r.status.is_failure()),
        skipped: count(results, |r| r.status == TestStatus::Skipped),
        flaky: count(results, |r| {
            r.flakiness_score
                .is_some_and(|s| s >= SUMMARY_FLAKY_THRESHOLD)
        }),
        slow: count(results, |r| r.performance_trend.is_some()),
        duration: results.iter().map(|r| r.duration).sum(),
        pass_rate: percent(passed as usize, total as usize),
    }
}

pub(crate) fn count(results: &[TestResultRecord], pred: impl Fn(&TestResultRecord) -> bool) -> u32 {
    results.iter().filter(|r| pred(r)).count() as u32
}

/// `round(part / total * 100)`, halves away from zero; 0 when `total` is 0.
pub fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as u32
}
