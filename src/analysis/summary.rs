use serde::Serialize;

use crate::model::report_model::{PulseReport, TestStatus};
use crate::status::resolver::effective_status;

// ============================================================================
// Run summary metrics
// ============================================================================

/// Headline numbers for a single run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub timestamp: String,
    pub total: usize,
    pub passed: usize,
    /// Includes timed-out tests
    pub failed: usize,
    pub skipped: usize,
    pub flaky: usize,
    pub pending: usize,

    /// Earlier attempts that failed, timed out or were flaky
    pub total_retries: usize,

    /// Tests with at least one such attempt
    pub retried_tests: usize,

    pub avg_duration_ms: f64,

    /// Wall-clock duration of the run, from the run metadata
    pub duration_ms: f64,
}

impl RunSummary {
    pub fn pass_rate(&self) -> f64 {
        percentage(self.passed, self.total)
    }

    pub fn flaky_rate(&self) -> f64 {
        percentage(self.flaky, self.total)
    }

    pub fn fail_rate(&self) -> f64 {
        percentage(self.failed, self.total)
    }

    pub fn skip_rate(&self) -> f64 {
        percentage(self.skipped, self.total)
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// Summarise the per-test results of one run by effective status.
pub fn summarize_run(report: &PulseReport) -> RunSummary {
    let mut summary = RunSummary {
        timestamp: report.run.timestamp.clone(),
        total: report.results.len(),
        duration_ms: report.run.duration,
        ..RunSummary::default()
    };
    let mut duration_sum = 0.0;

    for test in &report.results {
        match effective_status(test) {
            TestStatus::Passed => summary.passed += 1,
            TestStatus::Failed | TestStatus::TimedOut => summary.failed += 1,
            TestStatus::Skipped => summary.skipped += 1,
            TestStatus::Flaky => summary.flaky += 1,
            TestStatus::Pending => summary.pending += 1,
        }

        let unsuccessful = test
            .retry_history
            .iter()
            .filter(|attempt| {
                attempt
                    .parsed_status()
                    .is_some_and(|s| s.is_failure() || s == TestStatus::Flaky)
            })
            .count();
        if unsuccessful > 0 {
            summary.total_retries += unsuccessful;
            summary.retried_tests += 1;
        }

        duration_sum += test.duration;
    }

    if summary.total > 0 {
        summary.avg_duration_ms = duration_sum / summary.total as f64;
    }
    summary
}
