use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::model::report_model::{PulseReport, TestRecord};

// ============================================================================
// Failure categories
// ============================================================================

/// A keyword bucket for failure messages.
#[derive(Debug, Clone, Copy)]
pub struct FailureCategory {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub description: &'static str,
}

/// Checked in order; the first category with a matching keyword wins.
pub const FAILURE_CATEGORIES: &[FailureCategory] = &[
    FailureCategory {
        name: "Timeout Errors",
        keywords: &["timeout", "exceeded"],
        description: "Tests that failed due to exceeding a specified time limit for an operation.",
    },
    FailureCategory {
        name: "Locator/Selector Errors",
        keywords: &[
            "locator",
            "selector",
            "getByRole",
            "getByText",
            "getByLabel",
            "getByPlaceholder",
            "element not found",
            "no element found",
        ],
        description: "Failures related to finding or interacting with UI elements on the page.",
    },
    FailureCategory {
        name: "Assertion Errors",
        keywords: &["expect(", "expected", "assertion failed"],
        description: "Tests where a specific condition or value did not meet the expected criteria.",
    },
    FailureCategory {
        name: "Strict Mode Violations",
        keywords: &["strict mode violation"],
        description: "Failures caused by strict mode, often when a locator resolves to multiple elements.",
    },
    FailureCategory {
        name: "Navigation Errors",
        keywords: &["navigation failed", "page.goto", "frame.goto"],
        description: "Errors that occurred during page navigation actions.",
    },
];

pub const OTHER_ERRORS: &str = "Other Errors";

const MAX_EXAMPLES: usize = 3;

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[mGKH]").expect("valid ANSI escape pattern"));

/// Remove terminal colour codes from an error message.
pub fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}

/// Category name for a failure message.
pub fn categorize_message(message: Option<&str>) -> &'static str {
    let normalized = strip_ansi(message.unwrap_or("Unknown error")).to_lowercase();
    FAILURE_CATEGORIES
        .iter()
        .find(|category| {
            category
                .keywords
                .iter()
                .any(|keyword| normalized.contains(&keyword.to_lowercase()))
        })
        .map(|category| category.name)
        .unwrap_or(OTHER_ERRORS)
}

// ============================================================================
// Breakdown
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedTest {
    pub id: String,
    pub name: String,
    pub suite_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<&TestRecord> for FailedTest {
    fn from(test: &TestRecord) -> Self {
        Self {
            id: test.id.clone(),
            name: test.name.clone(),
            suite_name: test.suite_name.clone(),
            error_message: test.error_message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureGroup {
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub count: usize,
    pub tests: Vec<FailedTest>,
    /// Up to three original (unstripped) messages
    pub example_error_messages: Vec<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureBreakdown {
    pub categories: Vec<FailureGroup>,
    pub total_failed: usize,
}

/// Group the run's failed and timed-out tests by error category.
///
/// Tests are deduplicated by name, keeping the first. Groups are ordered by
/// size, largest first.
pub fn categorize_failures(report: &PulseReport) -> FailureBreakdown {
    let mut seen_names = HashSet::new();
    let failed: Vec<&TestRecord> = report
        .results
        .iter()
        .filter(|test| test.status.is_failure())
        .filter(|test| seen_names.insert(test.name.as_str()))
        .collect();

    let mut groups: Vec<FailureGroup> = Vec::new();
    for test in &failed {
        let category = categorize_message(test.error_message.as_deref());
        let group = match groups.iter().position(|g| g.category == category) {
            Some(i) => &mut groups[i],
            None => {
                groups.push(FailureGroup {
                    category: category.to_string(),
                    description: FAILURE_CATEGORIES
                        .iter()
                        .find(|c| c.name == category)
                        .map(|c| c.description.to_string()),
                    count: 0,
                    tests: Vec::new(),
                    example_error_messages: Vec::new(),
                });
                let last = groups.len() - 1;
                &mut groups[last]
            }
        };
        group.count += 1;
        group.tests.push(FailedTest::from(*test));
        if group.example_error_messages.len() < MAX_EXAMPLES {
            group.example_error_messages.push(test.error_message.clone());
        }
    }

    groups.sort_by(|a, b| b.count.cmp(&a.count));
    FailureBreakdown {
        categories: groups,
        total_failed: failed.len(),
    }
}
