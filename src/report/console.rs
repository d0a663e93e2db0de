use crate::analysis::failures::FailureBreakdown;
use crate::analysis::flaky::{FlakyAnalysisOutcome, FlakyTestDetail};
use crate::analysis::summary::RunSummary;
use crate::analysis::trend::TrendPoint;
use crate::model::report_model::{TestRecord, TestStatus};
use crate::model::report_value::ReportValue;

// ============================================================================
// Console renderers: formatted terminal output
// ============================================================================

/// Format run summary metrics.
///
/// Produces output like:
/// ```text
/// === Run Summary: 2024-05-01T10:00:00.000Z ===
///
///   Total      12
///   Passed     9  (75.0% pass rate)
///   Flaky      1  (8.3% flaky rate)
///   Failed     1  (8.3% fail rate)
///   Skipped    1  (8.3% skip rate)
///   Retries    2  (1 tests retried)
///   Avg. time  1.2s per test
///   Duration   14.8s
/// ```
pub fn format_summary(summary: &RunSummary, environment: Option<&ReportValue>) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Run Summary: {} ===\n\n", summary.timestamp));
    out.push_str(&format!("  Total      {}\n", summary.total));
    out.push_str(&format!(
        "  Passed     {}  ({:.1}% pass rate)\n",
        summary.passed,
        summary.pass_rate()
    ));
    out.push_str(&format!(
        "  Flaky      {}  ({:.1}% flaky rate)\n",
        summary.flaky,
        summary.flaky_rate()
    ));
    out.push_str(&format!(
        "  Failed     {}  ({:.1}% fail rate)\n",
        summary.failed,
        summary.fail_rate()
    ));
    out.push_str(&format!(
        "  Skipped    {}  ({:.1}% skip rate)\n",
        summary.skipped,
        summary.skip_rate()
    ));
    if summary.pending > 0 {
        out.push_str(&format!("  Pending    {}\n", summary.pending));
    }
    out.push_str(&format!(
        "  Retries    {}  ({} tests retried)\n",
        summary.total_retries, summary.retried_tests
    ));
    out.push_str(&format!(
        "  Avg. time  {} per test\n",
        format_duration(summary.avg_duration_ms)
    ));
    out.push_str(&format!(
        "  Duration   {}\n",
        format_duration(summary.duration_ms)
    ));

    if let Some(env) = environment {
        out.push_str("\n--- Environment ---\n");
        out.push_str(&format_environment(env));
    }

    out
}

/// Render environment info as indented `key: value` lines.
pub fn format_environment(env: &ReportValue) -> String {
    let mut out = String::new();
    write_value(&mut out, env, 1);
    out
}

fn write_value(out: &mut String, value: &ReportValue, depth: usize) {
    let indent = "  ".repeat(depth);
    match value {
        ReportValue::Map(entries) => {
            for (key, value) in entries {
                if value.is_scalar() {
                    out.push_str(&format!("{}{}: {}\n", indent, key, value));
                } else {
                    out.push_str(&format!("{}{}:\n", indent, key));
                    write_value(out, value, depth + 1);
                }
            }
        }
        ReportValue::List(items) => {
            for (i, item) in items.iter().enumerate() {
                if item.is_scalar() {
                    out.push_str(&format!("{}- {}\n", indent, item));
                } else {
                    out.push_str(&format!("{}[{}]\n", indent, i));
                    write_value(out, item, depth + 1);
                }
            }
        }
        scalar => out.push_str(&format!("{}{}\n", indent, scalar)),
    }
}

/// Format a flakiness analysis.
///
/// An empty result prints an explicit "no flaky tests" line; a load
/// failure is shown with its message.
pub fn format_flaky_report(outcome: &FlakyAnalysisOutcome) -> String {
    let mut out = String::new();

    if let Some(ref error) = outcome.error {
        out.push_str(&format!("[ERROR] {}\n\n", error));
    }

    out.push_str(&format!(
        "=== Flaky in current run ({}) ===\n",
        outcome.current_flaky.len()
    ));
    if outcome.current_flaky.is_empty() {
        out.push_str("  No flaky tests found in the current run.\n");
    }
    for test in &outcome.current_flaky {
        out.push_str(&format!("  \u{26a0} {}  [{}]\n", test.name, test.suite_name));
    }

    out.push_str(&format!(
        "\n=== Historically flaky ({}) ===\n",
        outcome.historical_flaky.len()
    ));
    if outcome.historical_flaky.is_empty() {
        out.push_str("  No flaky tests found in historical runs.\n");
    }
    for test in &outcome.historical_flaky {
        out.push_str(&format_historical_line(test));
    }

    out
}

fn format_historical_line(test: &FlakyTestDetail) -> String {
    let history: String = test
        .occurrences
        .iter()
        .map(|o| status_glyph(o.status))
        .collect();
    format!(
        "  {:>5.1}% failing  {}/{} runs  {}  [{}]  {}\n      first seen {}, last seen {}\n",
        test.failure_ratio() * 100.0,
        test.failed_count,
        test.total_runs,
        test.name,
        test.suite_name,
        history,
        test.first_seen,
        test.last_seen
    )
}

/// Format the trend series, oldest first.
pub fn format_trends(points: &[TrendPoint]) -> String {
    if points.is_empty() {
        return "No historical data available.\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!("=== Trends ({} runs) ===\n\n", points.len()));
    out.push_str(&format!(
        "  {:<26} {:>6} {:>6} {:>6} {:>6} {:>6} {:>9} {:>7}\n",
        "date", "total", "pass", "fail", "skip", "flaky", "duration", "workers"
    ));
    for p in points {
        let workers = p
            .worker_count
            .map(|w| w.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "  {:<26} {:>6} {:>6} {:>6} {:>6} {:>6} {:>9} {:>7}\n",
            p.date,
            p.total_tests,
            p.passed,
            p.failed,
            p.skipped,
            p.flaky,
            format_duration(p.duration),
            workers
        ));
    }
    out
}

/// Format the failure categorization of a run.
pub fn format_failures(breakdown: &FailureBreakdown) -> String {
    if breakdown.total_failed == 0 {
        return "No failed tests in the current run.\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!(
        "=== Failures: {} tests in {} categories ===\n",
        breakdown.total_failed,
        breakdown.categories.len()
    ));
    for group in &breakdown.categories {
        out.push_str(&format!("\n{} ({})\n", group.category, group.count));
        if let Some(ref description) = group.description {
            out.push_str(&format!("  {}\n", description));
        }
        for test in &group.tests {
            out.push_str(&format!("  \u{2717} {}  [{}]\n", test.name, test.suite_name));
        }
    }
    out
}

/// Format a list of tests with their effective status.
pub fn format_test_list(tests: &[(&TestRecord, TestStatus)]) -> String {
    if tests.is_empty() {
        return "No matching tests.\n".to_string();
    }

    let mut out = String::new();
    for (test, status) in tests {
        out.push_str(&format!(
            "{} {:<8}  {}  [{}] ({})\n",
            status_glyph(*status),
            status.as_str(),
            test.name,
            test.suite_name,
            format_duration(test.duration)
        ));
    }
    out
}

fn status_glyph(status: TestStatus) -> char {
    match status {
        TestStatus::Passed => '\u{2713}',
        TestStatus::Failed | TestStatus::TimedOut => '\u{2717}',
        TestStatus::Flaky => '~',
        TestStatus::Skipped => '-',
        TestStatus::Pending => '?',
    }
}

/// Human-readable duration from milliseconds.
pub fn format_duration(ms: f64) -> String {
    if ms < 1000.0 {
        format!("{:.0}ms", ms)
    } else if ms < 60_000.0 {
        format!("{:.1}s", ms / 1000.0)
    } else {
        let minutes = (ms / 60_000.0).floor();
        let seconds = (ms - minutes * 60_000.0) / 1000.0;
        format!("{}m {:.0}s", minutes as u64, seconds)
    }
}
