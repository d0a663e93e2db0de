use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::model::report_model::{PulseReport, TestRecord, TestStatus};
use crate::model::timestamp::chronological;
use crate::status::resolver::effective_status;
use crate::store::report_store::ReportStore;

// ============================================================================
// Flaky test data model
// ============================================================================

/// A test's status in one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlakyOccurrence {
    pub run_timestamp: String,
    pub status: TestStatus,
}

/// Cross-run statistics for one `(suite_name, id)` test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlakyTestDetail {
    pub id: String,
    pub name: String,
    pub suite_name: String,

    /// Occurrences in ascending run-timestamp order
    pub occurrences: Vec<FlakyOccurrence>,

    pub passed_count: usize,

    /// `failed` and `timedOut` occurrences
    pub failed_count: usize,
    pub skipped_count: usize,
    pub pending_count: usize,
    pub total_runs: usize,
    pub first_seen: String,
    pub last_seen: String,
}

impl FlakyTestDetail {
    /// Share of runs that failed, in `0.0..=1.0`.
    pub fn failure_ratio(&self) -> f64 {
        if self.total_runs == 0 {
            0.0
        } else {
            self.failed_count as f64 / self.total_runs as f64
        }
    }
}

/// Result of a flakiness analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlakyAnalysis {
    /// Tests whose effective status is `flaky` in the current run
    pub current_flaky: Vec<FlakyTestDetail>,

    /// Tests that both passed and failed across historical runs
    pub historical_flaky: Vec<FlakyTestDetail>,
}

// ============================================================================
// Analysis
// ============================================================================

/// Flakiness across the current run and the historical snapshots.
///
/// The current run is classified with the effective-status rules; the
/// historical pass looks only at raw statuses and never includes the
/// current run.
pub fn analyze_flakiness(current: Option<&PulseReport>, historical: &[PulseReport]) -> FlakyAnalysis {
    FlakyAnalysis {
        current_flaky: current.map(current_run_flaky).unwrap_or_default(),
        historical_flaky: historical_flaky(historical),
    }
}

/// Every test in `report` whose effective status is `flaky`, as a
/// single-run aggregate.
pub fn current_run_flaky(report: &PulseReport) -> Vec<FlakyTestDetail> {
    let timestamp = report.timestamp();
    report
        .results
        .iter()
        .filter(|test| effective_status(test) == TestStatus::Flaky)
        .map(|test| FlakyTestDetail {
            id: test.id.clone(),
            name: test.name.clone(),
            suite_name: test.suite_name.clone(),
            occurrences: vec![FlakyOccurrence {
                run_timestamp: timestamp.to_string(),
                status: TestStatus::Flaky,
            }],
            // A flaky test passed in the end
            passed_count: 1,
            failed_count: 0,
            skipped_count: 0,
            pending_count: 0,
            total_runs: 1,
            first_seen: timestamp.to_string(),
            last_seen: timestamp.to_string(),
        })
        .collect()
}

/// Tests that have been seen both passing and failing (or timing out)
/// across the given runs.
///
/// Sorted by failure ratio, then by number of runs, both descending.
pub fn historical_flaky(runs: &[PulseReport]) -> Vec<FlakyTestDetail> {
    let mut groups: Vec<TestHistory<'_>> = Vec::new();
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();

    for run in runs {
        for test in &run.results {
            let slot = *index.entry(test.join_key()).or_insert_with(|| {
                groups.push(TestHistory::new(test));
                groups.len() - 1
            });
            groups[slot].occurrences.push(FlakyOccurrence {
                run_timestamp: run.timestamp().to_string(),
                status: test.status,
            });
        }
    }
    debug!(tests = groups.len(), runs = runs.len(), "grouped historical results");

    let mut flaky: Vec<FlakyTestDetail> = groups
        .into_iter()
        .filter(TestHistory::is_flaky)
        .map(TestHistory::into_detail)
        .collect();

    flaky.sort_by(by_failure_ratio_then_runs);
    flaky
}

fn by_failure_ratio_then_runs(a: &FlakyTestDetail, b: &FlakyTestDetail) -> Ordering {
    // b.failed / b.total vs a.failed / a.total without dividing
    let lhs = b.failed_count * a.total_runs;
    let rhs = a.failed_count * b.total_runs;
    lhs.cmp(&rhs).then_with(|| b.total_runs.cmp(&a.total_runs))
}

/// Raw-status history of one test, in run order as encountered.
struct TestHistory<'a> {
    first: &'a TestRecord,
    occurrences: Vec<FlakyOccurrence>,
}

impl<'a> TestHistory<'a> {
    fn new(first: &'a TestRecord) -> Self {
        Self {
            first,
            occurrences: Vec::new(),
        }
    }

    fn is_flaky(&self) -> bool {
        let has_passed = self
            .occurrences
            .iter()
            .any(|o| o.status == TestStatus::Passed);
        let has_failed = self.occurrences.iter().any(|o| o.status.is_failure());
        has_passed && has_failed
    }

    fn into_detail(self) -> FlakyTestDetail {
        let mut occurrences = self.occurrences;
        occurrences.sort_by(|a, b| chronological(&a.run_timestamp, &b.run_timestamp));

        let count = |pred: fn(TestStatus) -> bool| {
            occurrences.iter().filter(|o| pred(o.status)).count()
        };
        let passed_count = count(|s| s == TestStatus::Passed);
        let failed_count = count(TestStatus::is_failure);
        let skipped_count = count(|s| s == TestStatus::Skipped);
        let pending_count = count(|s| s == TestStatus::Pending);

        let first_seen = occurrences
            .first()
            .map(|o| o.run_timestamp.clone())
            .unwrap_or_default();
        let last_seen = occurrences
            .last()
            .map(|o| o.run_timestamp.clone())
            .unwrap_or_default();

        FlakyTestDetail {
            id: self.first.id.clone(),
            name: self.first.name.clone(),
            suite_name: self.first.suite_name.clone(),
            total_runs: occurrences.len(),
            occurrences,
            passed_count,
            failed_count,
            skipped_count,
            pending_count,
            first_seen,
            last_seen,
        }
    }
}

// ============================================================================
// Store-backed analysis
// ============================================================================

/// Flakiness analysis with an explicit success flag instead of an error.
///
/// A historical load failure keeps the current-run results and reports
/// the failure in `error`; the same holds the other way round.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlakyAnalysisOutcome {
    pub success: bool,
    pub current_flaky: Vec<FlakyTestDetail>,
    pub historical_flaky: Vec<FlakyTestDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FlakyAnalysisOutcome {
    /// No flaky tests in either view.
    pub fn is_empty(&self) -> bool {
        self.current_flaky.is_empty() && self.historical_flaky.is_empty()
    }
}

pub fn analyze_store_flakiness(store: &ReportStore) -> FlakyAnalysisOutcome {
    let mut errors = Vec::new();

    let current = store.load_current_run().unwrap_or_else(|e| {
        error!(error = %e, "could not load current run for flakiness analysis");
        errors.push(e.to_string());
        None
    });

    let historical = store.load_historical_runs().unwrap_or_else(|e| {
        error!(error = %e, "could not load historical runs for flakiness analysis");
        errors.push(e.to_string());
        Vec::new()
    });

    let analysis = analyze_flakiness(current.as_ref(), &historical);
    debug!(
        current = analysis.current_flaky.len(),
        historical = analysis.historical_flaky.len(),
        "flakiness analysis complete"
    );

    FlakyAnalysisOutcome {
        success: errors.is_empty(),
        current_flaky: analysis.current_flaky,
        historical_flaky: analysis.historical_flaky,
        error: (!errors.is_empty()).then(|| errors.join("; ")),
    }
}
