use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::report_model::{PulseReport, TestStatus};
use crate::model::timestamp::chronological;
use crate::status::resolver::effective_status;

/// One chart point per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: String,
    pub total_tests: u64,
    pub passed: u64,
    /// Includes timed-out tests
    pub failed: u64,
    pub skipped: u64,
    pub flaky: u64,
    pub duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flakiness_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_count: Option<usize>,
}

/// Build the trend series, oldest run first.
///
/// Counts come from per-test results classified by effective status. A
/// run without results falls back to its own summary counters, with
/// `flaky` left at 0.
pub fn summarize_trend(runs: &[PulseReport]) -> Vec<TrendPoint> {
    let mut points: Vec<TrendPoint> = runs.iter().map(trend_point).collect();
    points.sort_by(|a, b| chronological(&a.date, &b.date));
    points
}

pub fn trend_point(report: &PulseReport) -> TrendPoint {
    let run = &report.run;
    let (passed, failed, skipped, flaky) = if report.results.is_empty() {
        (
            run.passed,
            run.failed + run.timed_out.unwrap_or(0),
            run.skipped,
            0,
        )
    } else {
        let mut counts = (0, 0, 0, 0);
        for test in &report.results {
            match effective_status(test) {
                TestStatus::Passed => counts.0 += 1,
                TestStatus::Failed | TestStatus::TimedOut => counts.1 += 1,
                TestStatus::Skipped => counts.2 += 1,
                TestStatus::Flaky => counts.3 += 1,
                TestStatus::Pending => {}
            }
        }
        counts
    };

    TrendPoint {
        date: run.timestamp.clone(),
        total_tests: run.total_tests,
        passed,
        failed,
        skipped,
        flaky,
        duration: run.duration,
        flakiness_rate: run.flakiness_rate,
        worker_count: worker_count(report),
    }
}

/// Distinct non-negative worker ids seen in the run's results.
fn worker_count(report: &PulseReport) -> Option<usize> {
    let workers: HashSet<u64> = report
        .results
        .iter()
        .filter_map(|test| test.worker_id.as_ref()?.numeric())
        .filter(|id| *id >= 0.0)
        // -0.0 and 0.0 are the same worker
        .map(|id| (id + 0.0).to_bits())
        .collect();
    (!workers.is_empty()).then_some(workers.len())
}
