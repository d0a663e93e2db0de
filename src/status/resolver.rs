use serde::Serialize;

use crate::model::report_model::{TestOutcome, TestRecord, TestStatus};

// ============================================================================
// Effective status rules
// ============================================================================

/// One entry of the precedence table.
///
/// When `applies` holds for a record, the record's effective status is
/// `status` and no later rule is consulted.
pub struct StatusRule {
    pub name: &'static str,
    pub applies: fn(&TestRecord) -> bool,
    pub status: TestStatus,
}

/// Precedence-ordered rules, evaluated top-down.
///
/// A record matching none of them keeps its raw status.
pub const STATUS_RULES: &[StatusRule] = &[
    StatusRule {
        name: "outcome_flaky",
        applies: outcome_is_flaky,
        status: TestStatus::Flaky,
    },
    StatusRule {
        name: "status_flaky",
        applies: status_is_flaky,
        status: TestStatus::Flaky,
    },
    StatusRule {
        name: "passed_after_failed_attempt",
        applies: passed_after_failed_attempt,
        status: TestStatus::Flaky,
    },
    StatusRule {
        name: "final_status_flaky",
        applies: final_status_is_flaky,
        status: TestStatus::Flaky,
    },
];

/// Name reported when no rule in `STATUS_RULES` matched.
pub const RAW_STATUS_RULE: &str = "raw_status";

/// Effective status together with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub status: TestStatus,
    pub rule: &'static str,
}

/// Classify a test, reporting which rule decided it.
pub fn resolve_effective_status(test: &TestRecord) -> Resolution {
    STATUS_RULES
        .iter()
        .find(|rule| (rule.applies)(test))
        .map(|rule| Resolution {
            status: rule.status,
            rule: rule.name,
        })
        .unwrap_or(Resolution {
            status: test.status,
            rule: RAW_STATUS_RULE,
        })
}

/// The single authoritative status of a test result.
pub fn effective_status(test: &TestRecord) -> TestStatus {
    resolve_effective_status(test).status
}

// ============================================================================
// Predicates
// ============================================================================

pub fn outcome_is_flaky(test: &TestRecord) -> bool {
    test.outcome == Some(TestOutcome::Flaky)
}

pub fn status_is_flaky(test: &TestRecord) -> bool {
    test.status == TestStatus::Flaky
}

/// Passed in the end but failed or timed out on at least one earlier
/// attempt. Repeated passing attempts (repeat-each) do not count, and a
/// test whose final attempt failed is left alone.
pub fn passed_after_failed_attempt(test: &TestRecord) -> bool {
    test.status == TestStatus::Passed
        && test
            .retry_history
            .iter()
            .any(|attempt| attempt.parsed_status().is_some_and(TestStatus::is_failure))
}

/// Explicit `final_status: flaky`, honoured only for retried tests.
pub fn final_status_is_flaky(test: &TestRecord) -> bool {
    !test.retry_history.is_empty() && test.final_status == Some(TestStatus::Flaky)
}
