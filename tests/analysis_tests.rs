use pulse_insights::analysis::failures::{
    OTHER_ERRORS, categorize_failures, categorize_message, strip_ansi,
};
use pulse_insights::analysis::summary::summarize_run;
use pulse_insights::model::report_model::{RetryAttempt, TestRecord, TestStatus};

mod common;
use crate::common::fixtures::{failed, passed, report};

// ============================================================================
// 1. Run summary
// ============================================================================

#[test]
fn summary_counts_by_effective_status() {
    let mut run = report(
        "2024-05-01T10:00:00Z",
        vec![
            passed("a").with_duration(100.0),
            passed("b")
                .with_attempts(&[TestStatus::Failed, TestStatus::TimedOut])
                .with_duration(300.0),
            failed("c").with_duration(200.0),
            TestRecord::new("d", "S", TestStatus::TimedOut).with_duration(400.0),
            TestRecord::new("e", "S", TestStatus::Skipped),
            TestRecord::new("f", "S", TestStatus::Pending),
        ],
    );
    run.run.duration = 5000.0;

    let summary = summarize_run(&run);
    assert_eq!(summary.total, 6);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.flaky, 1);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.pending, 1);
    assert_eq!(summary.total_retries, 2);
    assert_eq!(summary.retried_tests, 1);
    assert!((summary.avg_duration_ms - 1000.0 / 6.0).abs() < 1e-9);
    assert_eq!(summary.duration_ms, 5000.0);
}

#[test]
fn summary_retry_stats_ignore_passing_attempts() {
    let mut test = passed("a").with_attempts(&[TestStatus::Passed, TestStatus::Skipped]);
    test.retry_history.push(RetryAttempt::new(TestStatus::Flaky));
    let summary = summarize_run(&report("2024-05-01T10:00:00Z", vec![test]));
    assert_eq!(summary.total_retries, 1);
    assert_eq!(summary.retried_tests, 1);
    // A flaky attempt alone does not make the test flaky
    assert_eq!(summary.passed, 1);
}

#[test]
fn summary_rates() {
    let run = report(
        "2024-05-01T10:00:00Z",
        vec![passed("a"), passed("b"), passed("c"), failed("d")],
    );
    let summary = summarize_run(&run);
    assert_eq!(summary.pass_rate(), 75.0);
    assert_eq!(summary.fail_rate(), 25.0);
    assert_eq!(summary.flaky_rate(), 0.0);
}

#[test]
fn empty_run_summary_has_zero_rates() {
    let summary = summarize_run(&report("2024-05-01T10:00:00Z", vec![]));
    assert_eq!(summary.total, 0);
    assert_eq!(summary.avg_duration_ms, 0.0);
    assert_eq!(summary.pass_rate(), 0.0);
}

// ============================================================================
// 2. Failure message categories
// ============================================================================

#[test]
fn strips_ansi_codes() {
    assert_eq!(
        strip_ansi("\u{1b}[31mError:\u{1b}[39m boom\u{1b}[2K"),
        "Error: boom"
    );
}

#[test]
fn categorizes_by_first_matching_category() {
    assert_eq!(
        categorize_message(Some("Test timeout of 30000ms exceeded.")),
        "Timeout Errors"
    );
    assert_eq!(
        categorize_message(Some("Error: locator.click: Target closed")),
        "Locator/Selector Errors"
    );
    assert_eq!(
        categorize_message(Some("waiting for GetByRole('button')")),
        "Locator/Selector Errors"
    );
    assert_eq!(
        categorize_message(Some("\u{1b}[2mexpect(\u{1b}[22mreceived).toBe(expected)")),
        "Assertion Errors"
    );
    assert_eq!(
        categorize_message(Some("strict mode violation: resolved to 2 elements")),
        "Strict Mode Violations"
    );
    assert_eq!(
        categorize_message(Some("page.goto: net::ERR_NAME_NOT_RESOLVED")),
        "Navigation Errors"
    );
    assert_eq!(categorize_message(Some("segfault")), OTHER_ERRORS);
    assert_eq!(categorize_message(None), OTHER_ERRORS);
}

// ============================================================================
// 3. Failure breakdown
// ============================================================================

#[test]
fn breakdown_groups_failed_and_timed_out_tests() {
    let run = report(
        "2024-05-01T10:00:00Z",
        vec![
            failed("a").with_error("Timeout 5000ms exceeded"),
            TestRecord::new("b", "S", TestStatus::TimedOut).with_error("Test timeout exceeded"),
            failed("c").with_error("expect(received).toBe(expected)"),
            failed("d"),
            passed("e").with_error("timeout in retry"),
            TestRecord::new("f", "S", TestStatus::Flaky).with_error("timeout"),
        ],
    );

    let breakdown = categorize_failures(&run);
    assert_eq!(breakdown.total_failed, 4);
    let names: Vec<(&str, usize)> = breakdown
        .categories
        .iter()
        .map(|g| (g.category.as_str(), g.count))
        .collect();
    assert_eq!(
        names,
        vec![("Timeout Errors", 2), ("Assertion Errors", 1), (OTHER_ERRORS, 1)]
    );
    assert!(breakdown.categories[0].description.is_some());
    assert!(breakdown.categories[2].description.is_none());
}

#[test]
fn breakdown_deduplicates_by_name_and_caps_examples() {
    let run = report(
        "2024-05-01T10:00:00Z",
        vec![
            failed("a").with_name("same").with_error("timeout 1"),
            failed("b").with_name("same").with_error("timeout 2"),
            failed("c").with_error("timeout 3"),
            failed("d").with_error("timeout 4"),
            failed("e").with_error("timeout 5"),
        ],
    );

    let breakdown = categorize_failures(&run);
    assert_eq!(breakdown.total_failed, 4);
    let group = &breakdown.categories[0];
    assert_eq!(group.count, 4);
    assert_eq!(group.tests[0].id, "a");
    assert_eq!(group.example_error_messages.len(), 3);
    assert_eq!(group.example_error_messages[0].as_deref(), Some("timeout 1"));
}

#[test]
fn breakdown_of_clean_run_is_empty() {
    let breakdown = categorize_failures(&report("2024-05-01T10:00:00Z", vec![passed("a")]));
    assert_eq!(breakdown.total_failed, 0);
    assert!(breakdown.categories.is_empty());
}
