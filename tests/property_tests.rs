use pulse_insights::analysis::flaky::historical_flaky;
use pulse_insights::analysis::trend::summarize_trend;
use pulse_insights::model::report_model::{PulseReport, TestOutcome, TestRecord, TestStatus};
use pulse_insights::status::resolver::effective_status;
use proptest::prelude::*;

fn any_status() -> impl Strategy<Value = TestStatus> {
    proptest::sample::select(TestStatus::ALL.to_vec())
}

fn non_failure_status() -> impl Strategy<Value = TestStatus> {
    any_status().prop_filter("no failed/timedOut attempts", |s| !s.is_failure())
}

fn any_outcome() -> impl Strategy<Value = Option<TestOutcome>> {
    proptest::option::of(proptest::sample::select(vec![
        TestOutcome::Expected,
        TestOutcome::Unexpected,
        TestOutcome::Flaky,
        TestOutcome::Skipped,
    ]))
}

/// Arbitrary record with every classification input randomised.
fn any_record() -> impl Strategy<Value = TestRecord> {
    (
        any_status(),
        any_outcome(),
        proptest::option::of(any_status()),
        proptest::collection::vec(any_status(), 0..5),
    )
        .prop_map(|(status, outcome, final_status, attempts)| {
            let mut test = TestRecord::new("t", "S", status).with_attempts(&attempts);
            test.outcome = outcome;
            test.final_status = final_status;
            test
        })
}

/// Records with no flaky signal other than the retry history.
fn record_without_flaky_markers(status: TestStatus, attempts: &[TestStatus]) -> TestRecord {
    TestRecord::new("t", "S", status).with_attempts(attempts)
}

proptest! {
    /// Property: outcome `flaky` wins over every other field
    #[test]
    fn prop_flaky_outcome_always_flaky(test in any_record()) {
        let test = test.with_outcome(TestOutcome::Flaky);
        prop_assert_eq!(effective_status(&test), TestStatus::Flaky);
    }

    /// Property: a pass with no failed/timedOut attempt stays passed,
    /// including repeat-each histories of passing attempts
    #[test]
    fn prop_clean_pass_stays_passed(
        attempts in proptest::collection::vec(non_failure_status(), 0..6)
    ) {
        let test = record_without_flaky_markers(TestStatus::Passed, &attempts);
        prop_assert_eq!(effective_status(&test), TestStatus::Passed);
    }

    /// Property: a pass after at least one failed or timed-out attempt is flaky
    #[test]
    fn prop_pass_after_failure_is_flaky(
        before in proptest::collection::vec(any_status(), 0..3),
        failure in prop_oneof![Just(TestStatus::Failed), Just(TestStatus::TimedOut)],
        after in proptest::collection::vec(any_status(), 0..3),
    ) {
        let mut attempts = before;
        attempts.push(failure);
        attempts.extend(after);
        let test = record_without_flaky_markers(TestStatus::Passed, &attempts);
        prop_assert_eq!(effective_status(&test), TestStatus::Flaky);
    }

    /// Property: a failed test is never upgraded by passing attempts
    #[test]
    fn prop_failed_stays_failed(
        attempts in proptest::collection::vec(any_status(), 0..6)
    ) {
        let test = record_without_flaky_markers(TestStatus::Failed, &attempts);
        prop_assert_eq!(effective_status(&test), TestStatus::Failed);
    }

    /// Property: classification is deterministic
    #[test]
    fn prop_effective_status_idempotent(test in any_record()) {
        let copy = test.clone();
        prop_assert_eq!(effective_status(&test), effective_status(&test));
        prop_assert_eq!(effective_status(&test), effective_status(&copy));
    }

    /// Property: a test is historically flaky exactly when it was seen
    /// both passing and failing
    #[test]
    fn prop_historical_qualification(
        statuses in proptest::collection::vec(any_status(), 1..8)
    ) {
        let runs: Vec<PulseReport> = statuses
            .iter()
            .enumerate()
            .map(|(day, status)| {
                PulseReport::new(
                    &format!("2024-05-{:02}T10:00:00Z", day + 1),
                    vec![TestRecord::new("t", "S", *status)],
                )
            })
            .collect();

        let expected = statuses.contains(&TestStatus::Passed)
            && statuses.iter().any(|s| s.is_failure());
        let flaky = historical_flaky(&runs);
        prop_assert_eq!(flaky.len() == 1, expected);

        if let Some(detail) = flaky.first() {
            prop_assert_eq!(detail.total_runs, statuses.len());
            prop_assert!(detail.passed_count + detail.failed_count <= detail.total_runs);
        }
    }

    /// Property: trend points come out in ascending date order whatever
    /// the input order
    #[test]
    fn prop_trend_sorted(days in proptest::collection::vec(1u32..29, 0..10)) {
        let runs: Vec<PulseReport> = days
            .iter()
            .map(|day| PulseReport::new(&format!("2024-02-{:02}T10:00:00Z", day), vec![]))
            .collect();

        let dates: Vec<String> = summarize_trend(&runs).into_iter().map(|p| p.date).collect();
        prop_assert_eq!(dates.len(), runs.len());
        let mut sorted = dates.clone();
        sorted.sort();
        prop_assert_eq!(dates, sorted);
    }
}
