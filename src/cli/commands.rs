use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::analysis::failures::categorize_failures;
use crate::analysis::flaky::analyze_store_flakiness;
use crate::analysis::summary::summarize_run;
use crate::analysis::trend::summarize_trend;
use crate::cli::config::OutputFormat;
use crate::model::report_model::{PulseReport, TestRecord, TestStatus};
use crate::report::console::{
    format_failures, format_flaky_report, format_summary, format_test_list, format_trends,
};
use crate::status::cache::StatusCache;
use crate::store::report_store::ReportStore;

// ============================================================================
// Commands
//
// Each returns whether the requested data was fully available; the binary
// maps `false` to a non-zero exit code.
// ============================================================================

pub fn cmd_summary(store: &ReportStore, format: OutputFormat) -> Result<bool> {
    let Some(report) = current_run(store)? else {
        return Ok(true);
    };
    let summary = summarize_run(&report);
    match format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Console => print!("{}", format_summary(&summary, report.environment())),
    }
    Ok(true)
}

pub fn cmd_flaky(store: &ReportStore, format: OutputFormat) -> Result<bool> {
    let outcome = analyze_store_flakiness(store);
    info!(
        current = outcome.current_flaky.len(),
        historical = outcome.historical_flaky.len(),
        success = outcome.success,
        "flakiness analysis"
    );
    match format {
        OutputFormat::Json => print_json(&outcome)?,
        OutputFormat::Console => print!("{}", format_flaky_report(&outcome)),
    }
    Ok(outcome.success)
}

pub fn cmd_trends(store: &ReportStore, format: OutputFormat) -> Result<bool> {
    let runs = store
        .load_historical_runs()
        .context("failed to load historical reports")?;
    let points = summarize_trend(&runs);
    debug!(points = points.len(), "built trend series");
    match format {
        OutputFormat::Json => print_json(&points)?,
        OutputFormat::Console => print!("{}", format_trends(&points)),
    }
    Ok(true)
}

pub fn cmd_failures(store: &ReportStore, format: OutputFormat) -> Result<bool> {
    let Some(report) = current_run(store)? else {
        return Ok(true);
    };
    let breakdown = categorize_failures(&report);
    match format {
        OutputFormat::Json => print_json(&breakdown)?,
        OutputFormat::Console => print!("{}", format_failures(&breakdown)),
    }
    Ok(true)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClassifiedTest<'a> {
    id: &'a str,
    name: &'a str,
    suite_name: &'a str,
    raw_status: TestStatus,
    effective_status: TestStatus,
    duration: f64,
}

pub fn cmd_tests(
    store: &ReportStore,
    status: Option<TestStatus>,
    format: OutputFormat,
) -> Result<bool> {
    let Some(report) = current_run(store)? else {
        return Ok(true);
    };
    let classified = classify_tests(&report.results, status);

    match format {
        OutputFormat::Json => {
            let rows: Vec<ClassifiedTest<'_>> = classified
                .iter()
                .map(|(test, effective)| ClassifiedTest {
                    id: &test.id,
                    name: &test.name,
                    suite_name: &test.suite_name,
                    raw_status: test.status,
                    effective_status: *effective,
                    duration: test.duration,
                })
                .collect();
            print_json(&rows)?;
        }
        OutputFormat::Console => print!("{}", format_test_list(&classified)),
    }
    Ok(true)
}

pub fn cmd_config(store: &ReportStore) -> Result<bool> {
    print_json(&store.report_config())?;
    Ok(true)
}

// ============================================================================
// Helpers
// ============================================================================

/// Pair each test with its effective status, keeping only `filter` matches.
pub fn classify_tests(
    tests: &[TestRecord],
    filter: Option<TestStatus>,
) -> Vec<(&TestRecord, TestStatus)> {
    let mut cache = StatusCache::new();
    let classified: Vec<(&TestRecord, TestStatus)> = tests
        .iter()
        .map(|test| (test, cache.resolve(test)))
        .filter(|(_, effective)| filter.is_none_or(|wanted| wanted == *effective))
        .collect();
    debug!(
        classified = tests.len(),
        distinct = cache.len(),
        hits = cache.hits(),
        "classified tests"
    );
    classified
}

/// Load the current run, printing a "no data" line when there is none.
fn current_run(store: &ReportStore) -> Result<Option<PulseReport>> {
    let report = store
        .load_current_run()
        .context("failed to load current run report")?;
    if report.is_none() {
        println!(
            "No current run report found at {}",
            store.current_report_path().display()
        );
    }
    Ok(report)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
