use std::collections::BTreeMap;

use pulse_insights::analysis::failures::categorize_failures;
use pulse_insights::analysis::flaky::{FlakyAnalysisOutcome, analyze_flakiness};
use pulse_insights::analysis::summary::summarize_run;
use pulse_insights::analysis::trend::summarize_trend;
use pulse_insights::cli::commands::classify_tests;
use pulse_insights::model::report_model::TestStatus;
use pulse_insights::model::report_value::ReportValue;
use pulse_insights::report::console::{
    format_duration, format_environment, format_failures, format_flaky_report, format_summary,
    format_test_list, format_trends,
};

mod common;
use crate::common::fixtures::{failed, passed, report};

fn mixed_run() -> pulse_insights::PulseReport {
    let mut run = report(
        "2024-05-01T10:00:00Z",
        vec![
            passed("a").with_name("Smoke: Home Page"),
            passed("b")
                .with_name("Smoke: About Page")
                .with_attempts(&[TestStatus::Failed]),
            failed("c")
                .with_name("Form: Login")
                .with_error("Timeout 30000ms exceeded"),
        ],
    );
    run.run.duration = 14_800.0;
    run
}

// ============================================================================
// 1. Summary
// ============================================================================

#[test]
fn summary_output_contains_counts_and_rates() {
    let out = format_summary(&summarize_run(&mixed_run()), None);
    assert!(out.starts_with("=== Run Summary: 2024-05-01T10:00:00Z ==="));
    assert!(out.contains("Total      3"));
    assert!(out.contains("Passed     1  (33.3% pass rate)"));
    assert!(out.contains("Flaky      1  (33.3% flaky rate)"));
    assert!(out.contains("Failed     1  (33.3% fail rate)"));
    assert!(out.contains("Retries    1  (1 tests retried)"));
    assert!(out.contains("Duration   14.8s"));
    assert!(!out.contains("Environment"));
}

#[test]
fn summary_output_renders_environment() {
    let mut cpu = BTreeMap::new();
    cpu.insert("cores".to_string(), ReportValue::Number(serde_json::Number::from(8u64)));
    let mut env = BTreeMap::new();
    env.insert("host".to_string(), ReportValue::String("ci-3".into()));
    env.insert("cpu".to_string(), ReportValue::Map(cpu));
    env.insert(
        "browsers".to_string(),
        ReportValue::List(vec![
            ReportValue::String("chromium".into()),
            ReportValue::String("webkit".into()),
        ]),
    );
    let env = ReportValue::Map(env);

    let out = format_summary(&summarize_run(&mixed_run()), Some(&env));
    assert!(out.contains("--- Environment ---"));
    assert_eq!(
        format_environment(&env),
        "  browsers:\n    - chromium\n    - webkit\n  cpu:\n    cores: 8\n  host: ci-3\n"
    );
}

// ============================================================================
// 2. Flaky report
// ============================================================================

#[test]
fn flaky_report_shows_no_data_state() {
    let out = format_flaky_report(&FlakyAnalysisOutcome {
        success: true,
        ..Default::default()
    });
    assert!(out.contains("No flaky tests found in the current run."));
    assert!(out.contains("No flaky tests found in historical runs."));
    assert!(!out.contains("[ERROR]"));
}

#[test]
fn flaky_report_shows_error_message() {
    let out = format_flaky_report(&FlakyAnalysisOutcome {
        success: false,
        error: Some("could not read history directory '/x/history'".into()),
        ..Default::default()
    });
    assert!(out.starts_with("[ERROR] could not read history directory '/x/history'"));
}

#[test]
fn flaky_report_lists_tests() {
    let history = vec![
        report("2024-05-01T10:00:00Z", vec![passed("t").with_name("Login")]),
        report("2024-05-02T10:00:00Z", vec![failed("t").with_name("Login")]),
    ];
    let analysis = analyze_flakiness(Some(&mixed_run()), &history);
    let out = format_flaky_report(&FlakyAnalysisOutcome {
        success: true,
        current_flaky: analysis.current_flaky,
        historical_flaky: analysis.historical_flaky,
        error: None,
    });
    assert!(out.contains("=== Flaky in current run (1) ==="));
    assert!(out.contains("Smoke: About Page  [S]"));
    assert!(out.contains("=== Historically flaky (1) ==="));
    assert!(out.contains(" 50.0% failing  1/2 runs  Login  [S]  \u{2713}\u{2717}"));
    assert!(out.contains("first seen 2024-05-01T10:00:00Z, last seen 2024-05-02T10:00:00Z"));
}

// ============================================================================
// 3. Trends, failures, test list
// ============================================================================

#[test]
fn trends_output() {
    assert_eq!(format_trends(&[]), "No historical data available.\n");

    let out = format_trends(&summarize_trend(&[mixed_run()]));
    assert!(out.starts_with("=== Trends (1 runs) ==="));
    assert!(out.contains("2024-05-01T10:00:00Z"));
    assert!(out.contains("14.8s"));
}

#[test]
fn failures_output() {
    let out = format_failures(&categorize_failures(&mixed_run()));
    assert!(out.starts_with("=== Failures: 1 tests in 1 categories ==="));
    assert!(out.contains("Timeout Errors (1)"));
    assert!(out.contains("\u{2717} Form: Login  [S]"));

    let clean = report("2024-05-01T10:00:00Z", vec![passed("a")]);
    assert_eq!(
        format_failures(&categorize_failures(&clean)),
        "No failed tests in the current run.\n"
    );
}

#[test]
fn test_list_filters_by_effective_status() {
    let run = mixed_run();
    let flaky = classify_tests(&run.results, Some(TestStatus::Flaky));
    assert_eq!(flaky.len(), 1);
    assert_eq!(flaky[0].0.id, "b");

    let out = format_test_list(&flaky);
    assert!(out.starts_with("~ flaky     Smoke: About Page  [S]"));

    assert_eq!(
        format_test_list(&classify_tests(&run.results, Some(TestStatus::Pending))),
        "No matching tests.\n"
    );
    assert_eq!(classify_tests(&run.results, None).len(), 3);
}

#[test]
fn durations() {
    assert_eq!(format_duration(250.0), "250ms");
    assert_eq!(format_duration(1500.0), "1.5s");
    assert_eq!(format_duration(125_000.0), "2m 5s");
}
