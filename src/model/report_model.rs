use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::model::report_value::ReportValue;

// ============================================================================
// Status vocabulary
// ============================================================================

/// Status of a single test as recorded by the upstream runner.
///
/// The same vocabulary is used for the effective (classified) status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
    TimedOut,
    Pending,
    Flaky,
}

impl TestStatus {
    pub const ALL: [TestStatus; 6] = [
        TestStatus::Passed,
        TestStatus::Failed,
        TestStatus::Skipped,
        TestStatus::TimedOut,
        TestStatus::Pending,
        TestStatus::Flaky,
    ];

    /// Wire name, as it appears in report JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::Skipped => "skipped",
            TestStatus::TimedOut => "timedOut",
            TestStatus::Pending => "pending",
            TestStatus::Flaky => "flaky",
        }
    }

    /// `failed` and `timedOut` both count as failures.
    pub fn is_failure(self) -> bool {
        matches!(self, TestStatus::Failed | TestStatus::TimedOut)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TestStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown test status '{}' (expected one of: passed, failed, skipped, timedOut, pending, flaky)",
                    s
                )
            })
    }
}

/// Secondary signal set by the runner independently of the final status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutcome {
    Flaky,
    Expected,
    Unexpected,
    Skipped,
}

impl TestOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            TestOutcome::Flaky => "flaky",
            TestOutcome::Expected => "expected",
            TestOutcome::Unexpected => "unexpected",
            TestOutcome::Skipped => "skipped",
        }
    }
}

// ============================================================================
// Per-test records
// ============================================================================

/// One earlier attempt of a retried test.
///
/// Attempt statuses are kept as written so that a runner-specific value
/// (e.g. `interrupted`) does not invalidate the whole report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryAttempt {
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Any other keys the runner attached to the attempt
    #[serde(flatten)]
    pub extra: BTreeMap<String, ReportValue>,
}

impl RetryAttempt {
    pub fn new(status: TestStatus) -> Self {
        Self {
            status: status.as_str().to_string(),
            duration: None,
            error_message: None,
            extra: BTreeMap::new(),
        }
    }

    /// Parsed status, `None` when the runner wrote something outside the
    /// known vocabulary.
    pub fn parsed_status(&self) -> Option<TestStatus> {
        self.status.parse().ok()
    }
}

/// Worker identifier, written as either a number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkerId {
    Number(f64),
    Text(String),
}

impl WorkerId {
    /// Numeric value of the identifier, if it has one.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            WorkerId::Number(n) => Some(*n),
            WorkerId::Text(s) => s.trim().parse::<f64>().ok(),
        }
        .filter(|n| n.is_finite())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<AnnotationLocation>,
}

/// A (possibly nested) step inside a test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStep {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_hook: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub steps: Vec<TestStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// One test execution within one run.
///
/// Only `id`, `suite_name`, `status`, `outcome`, `final_status` and
/// `retry_history` take part in classification; everything else is
/// descriptive. A record without `status` is rejected at ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub suite_name: String,

    /// Status of the final attempt
    pub status: TestStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<TestOutcome>,

    #[serde(
        default,
        rename = "final_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub final_status: Option<TestStatus>,

    /// Duration in milliseconds
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,

    /// Configured retry budget (not the number of attempts actually made)
    #[serde(default, deserialize_with = "null_as_default")]
    pub retries: u32,

    /// Earlier attempts, oldest first
    #[serde(default, deserialize_with = "null_as_default")]
    pub retry_history: Vec<RetryAttempt>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub steps: Vec<TestStep>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshots: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_path: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<ReportValue>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub annotations: Vec<Annotation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<WorkerId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_workers: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

impl TestRecord {
    /// Minimal record with the given identity and final status.
    pub fn new(id: &str, suite_name: &str, status: TestStatus) -> Self {
        Self {
            id: id.to_string(),
            run_id: None,
            name: id.to_string(),
            suite_name: suite_name.to_string(),
            status,
            outcome: None,
            final_status: None,
            duration: 0.0,
            start_time: None,
            end_time: None,
            browser: None,
            retries: 0,
            retry_history: Vec::new(),
            steps: Vec::new(),
            error_message: None,
            stdout: None,
            code_snippet: None,
            snippet: None,
            tags: Vec::new(),
            screenshots: None,
            video_path: None,
            trace_path: None,
            attachments: None,
            annotations: Vec::new(),
            worker_id: None,
            total_workers: None,
            config_file: None,
            metadata: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_outcome(mut self, outcome: TestOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    pub fn with_final_status(mut self, final_status: TestStatus) -> Self {
        self.final_status = Some(final_status);
        self
    }

    /// Append earlier attempts with the given statuses, oldest first.
    pub fn with_attempts(mut self, statuses: &[TestStatus]) -> Self {
        self.retry_history
            .extend(statuses.iter().map(|s| RetryAttempt::new(*s)));
        self
    }

    pub fn with_error(mut self, message: &str) -> Self {
        self.error_message = Some(message.to_string());
        self
    }

    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration = duration_ms;
        self
    }

    pub fn with_worker(mut self, worker: WorkerId) -> Self {
        self.worker_id = Some(worker);
        self
    }

    /// Key used to join the same test across runs.
    pub fn join_key(&self) -> (&str, &str) {
        (self.suite_name.as_str(), self.id.as_str())
    }
}

// ============================================================================
// Run-level records
// ============================================================================

/// Precomputed run summary written by the upstream reporter.
///
/// The counters are a fallback only; per-test results take precedence
/// whenever they are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,

    /// Run identity and sort key
    pub timestamp: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub total_tests: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub passed: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub failed: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skipped: u64,

    /// Total run duration in milliseconds
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timed_out: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flakiness_rate: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_project_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<ReportValue>,
}

impl RunMetadata {
    pub fn new(timestamp: &str) -> Self {
        Self {
            id: String::new(),
            timestamp: timestamp.to_string(),
            total_tests: 0,
            passed: 0,
            failed: 0,
            skipped: 0,
            duration: 0.0,
            timed_out: None,
            pending: None,
            flakiness_rate: None,
            user_project_dir: None,
            environment: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub generated_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_project_dir: Option<String>,
}

/// One full run: the current report file or a historical snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseReport {
    pub run: RunMetadata,

    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<TestRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ReportMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<ReportValue>,
}

impl PulseReport {
    pub fn new(timestamp: &str, results: Vec<TestRecord>) -> Self {
        Self {
            run: RunMetadata::new(timestamp),
            results,
            metadata: None,
            environment: None,
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.run.timestamp
    }

    /// Environment info, preferring the report-level block over the run's.
    pub fn environment(&self) -> Option<&ReportValue> {
        self.environment.as_ref().or(self.run.environment.as_ref())
    }
}

/// Treat an explicit JSON `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
